//! Query Plan
//!
//! A plan is the validated combination of filter clauses, an optional sort
//! and pagination for one request. Plans are immutable once built; the
//! planner is the only way to construct one.

use url::form_urlencoded;

use dq_core::Pagination;

use crate::filters::{FilterClause, TypedFilter};
use crate::sorts::TypedSort;

/// How filter clauses are written into the query string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStyle {
    /// `filter=field:op:value`, one parameter per clause
    #[default]
    Filter,
    /// `field=value`, for endpoints that only understand equality
    Flat,
}

impl QueryStyle {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "filter" => Some(Self::Filter),
            "flat" => Some(Self::Flat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Flat => "flat",
        }
    }
}

/// Stages the server performs. Pushed stages are sent in the server query
/// and skipped by the projector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pushdown {
    pub filters: bool,
    pub sort: bool,
    pub pagination: bool,
}

impl Pushdown {
    /// Everything happens client-side (records are fetched in full)
    pub fn none() -> Self {
        Self::default()
    }

    /// The server filters, sorts and paginates
    pub fn all() -> Self {
        Self {
            filters: true,
            sort: true,
            pagination: true,
        }
    }

    /// The server filters; sort and pagination stay client-side
    pub fn filters_only() -> Self {
        Self {
            filters: true,
            ..Self::default()
        }
    }

    /// Pagination on the server is only correct when the server also saw
    /// every filter and the sort
    pub fn is_consistent(&self) -> bool {
        !self.pagination || (self.filters && self.sort)
    }
}

/// A validated query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    filters: Vec<TypedFilter>,
    sort: Option<TypedSort>,
    pagination: Pagination,
    style: QueryStyle,
    pushdown: Pushdown,
}

impl QueryPlan {
    pub(crate) fn new(
        filters: Vec<TypedFilter>,
        sort: Option<TypedSort>,
        pagination: Pagination,
        style: QueryStyle,
        pushdown: Pushdown,
    ) -> Self {
        Self {
            filters,
            sort,
            pagination,
            style,
            pushdown,
        }
    }

    /// Filters in caller order
    pub fn filters(&self) -> &[TypedFilter] {
        &self.filters
    }

    /// The caller's clauses, in order
    pub fn clauses(&self) -> impl Iterator<Item = &FilterClause> {
        self.filters.iter().map(|f| f.clause())
    }

    pub fn sort(&self) -> Option<&TypedSort> {
        self.sort.as_ref()
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn style(&self) -> QueryStyle {
        self.style
    }

    pub fn pushdown(&self) -> Pushdown {
        self.pushdown
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Filters the projector still has to apply
    pub fn residual_filters(&self) -> &[TypedFilter] {
        if self.pushdown.filters {
            &[]
        } else {
            &self.filters
        }
    }

    /// The sort the projector still has to apply
    pub fn residual_sort(&self) -> Option<&TypedSort> {
        self.sort.as_ref().filter(|_| !self.pushdown.sort)
    }

    /// The pagination the projector still has to apply
    pub fn residual_pagination(&self) -> Option<Pagination> {
        (!self.pushdown.pagination).then_some(self.pagination)
    }

    /// Render the whole plan as a query-string fragment (no leading `?`).
    ///
    /// Clauses keep caller order, then `sort`, `skip` and `limit` follow.
    /// Zero `skip`/`limit` are omitted; an empty plan renders `""`.
    pub fn render(&self) -> String {
        self.render_stages(Pushdown::all())
    }

    /// Render only the stages pushed to the server
    pub fn server_query(&self) -> String {
        self.render_stages(self.pushdown)
    }

    fn render_stages(&self, stages: Pushdown) -> String {
        let mut params: Vec<String> = Vec::new();

        if stages.filters {
            for clause in self.clauses() {
                params.push(match self.style {
                    QueryStyle::Filter => format!(
                        "filter={}:{}:{}",
                        encode(&clause.field),
                        clause.operator,
                        encode(&clause.value)
                    ),
                    QueryStyle::Flat => {
                        format!("{}={}", encode(&clause.field), encode(&clause.value))
                    }
                });
            }
        }

        if stages.sort {
            if let Some(sort) = &self.sort {
                params.push(format!("sort={}", encode(&sort.clause().to_param())));
            }
        }

        if stages.pagination {
            if self.pagination.skip > 0 {
                params.push(format!("skip={}", self.pagination.skip));
            }
            if self.pagination.limit > 0 {
                params.push(format!("limit={}", self.pagination.limit));
            }
        }

        params.join("&")
    }
}

/// Percent-encode one query-string component
pub(crate) fn encode(component: &str) -> String {
    form_urlencoded::byte_serialize(component.as_bytes()).collect()
}

/// Decode one query-string component. A literal `=` belongs to the
/// component, never separates it.
pub(crate) fn decode(component: &str) -> String {
    let escaped = component.replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}
