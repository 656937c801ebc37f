//! Query Planner
//!
//! Validates filter clauses, the sort and pagination against a field
//! allow-list and produces an immutable [`QueryPlan`]. Also parses rendered
//! query strings back into plans.

use dq_core::config::QuerySettings;
use dq_core::{ConfigError, Pagination};
use tracing::debug;

use crate::fields::FieldSet;
use crate::filters::{FilterClause, Operator, TypedFilter};
use crate::query::{decode, Pushdown, QueryPlan, QueryStyle};
use crate::sorts::{SortClause, TypedSort};

/// Parameter names the renderer emits for sort and pagination
const RESERVED_PARAMS: &[&str] = &["filter", "sort", "skip", "limit"];

/// Plans queries for one record type
#[derive(Debug, Clone, Default)]
pub struct QueryPlanner {
    fields: FieldSet,
    settings: QuerySettings,
    style: QueryStyle,
    pushdown: Pushdown,
}

impl QueryPlanner {
    /// Create a planner over the given allow-list
    pub fn new(fields: FieldSet) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_style(mut self, style: QueryStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_pushdown(mut self, pushdown: Pushdown) -> Self {
        self.pushdown = pushdown;
        self
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// Validate and build a plan. Fails on the first invalid clause.
    pub fn plan(
        &self,
        clauses: Vec<FilterClause>,
        sort: Option<SortClause>,
        page: Pagination,
    ) -> Result<QueryPlan, ConfigError> {
        if !self.pushdown.is_consistent() {
            return Err(ConfigError::InvalidPushdown(
                "server pagination requires server filtering and sorting".to_string(),
            ));
        }

        let mut filters = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let field = self.fields.filterable(&clause.field)?;
            if self.style == QueryStyle::Flat && RESERVED_PARAMS.contains(&clause.field.as_str()) {
                return Err(ConfigError::ReservedField {
                    field: clause.field,
                    style: self.style.as_str(),
                });
            }
            if self.style == QueryStyle::Flat && clause.operator != Operator::Eq {
                return Err(ConfigError::OperatorNotRenderable {
                    field: clause.field,
                    operator: clause.operator.to_string(),
                    style: self.style.as_str(),
                });
            }
            filters.push(TypedFilter::bind(clause, field.kind)?);
        }

        let sort = match sort {
            Some(clause) => {
                let field = self.fields.sortable(&clause.field)?;
                Some(TypedSort::new(clause, field.kind))
            }
            None => None,
        };

        if let Some(max) = self.settings.max_limit {
            if page.limit > max {
                return Err(ConfigError::LimitExceeded {
                    limit: page.limit,
                    max,
                });
            }
        }

        debug!(
            filters = filters.len(),
            sort = sort.as_ref().map(|s| s.clause().to_param()),
            skip = page.skip,
            limit = page.limit,
            "Planned query"
        );

        Ok(QueryPlan::new(filters, sort, page, self.style, self.pushdown))
    }

    /// Start a fluent plan
    pub fn builder(&self) -> PlanBuilder<'_> {
        PlanBuilder::new(self)
    }

    /// Parse a rendered query string back into a plan. A leading `?` is
    /// ignored. Parameters are read in the planner's style.
    pub fn parse(&self, query: &str) -> Result<QueryPlan, ConfigError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut clauses = Vec::new();
        let mut sort = None;
        let mut page = Pagination::unbounded();

        for param in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = param.split_once('=').unwrap_or((param, ""));
            let key = decode(raw_key);

            match key.as_str() {
                "sort" => {
                    if sort.is_some() {
                        return Err(ConfigError::MalformedQuery(
                            "more than one sort parameter".to_string(),
                        ));
                    }
                    let value = decode(raw_value);
                    sort = Some(SortClause::parse(&value).ok_or_else(|| {
                        ConfigError::MalformedQuery(format!("invalid sort {:?}", value))
                    })?);
                }
                "skip" => page.skip = parse_count("skip", raw_value)?,
                "limit" => page.limit = parse_count("limit", raw_value)?,
                "filter" if self.style == QueryStyle::Filter => {
                    clauses.push(parse_filter(raw_value)?);
                }
                _ if self.style == QueryStyle::Flat => {
                    clauses.push(FilterClause::eq(key, decode(raw_value)));
                }
                _ => {
                    return Err(ConfigError::MalformedQuery(format!(
                        "unexpected parameter {:?}",
                        key
                    )));
                }
            }
        }

        self.plan(clauses, sort, page)
    }
}

/// Colons inside the field or value are percent-encoded, so literal colons
/// in the raw parameter are the separators.
fn parse_filter(raw: &str) -> Result<FilterClause, ConfigError> {
    let mut parts = raw.splitn(3, ':');
    let (Some(field), Some(operator)) = (parts.next(), parts.next()) else {
        return Err(ConfigError::MalformedQuery(format!(
            "expected field:operator:value, got {:?}",
            decode(raw)
        )));
    };
    let value = parts.next().unwrap_or_default();

    let operator_name = decode(operator);
    let operator = Operator::from_str(&operator_name)
        .ok_or(ConfigError::UnknownOperator(operator_name))?;

    Ok(FilterClause::new(decode(field), operator, decode(value)))
}

fn parse_count(name: &str, raw: &str) -> Result<usize, ConfigError> {
    let value = decode(raw);
    value
        .parse()
        .map_err(|_| ConfigError::MalformedQuery(format!("invalid {} {:?}", name, value)))
}

/// Plan with default settings, filter style and no pushdown
pub fn plan(
    clauses: Vec<FilterClause>,
    sort: Option<SortClause>,
    page: Pagination,
    fields: &FieldSet,
) -> Result<QueryPlan, ConfigError> {
    QueryPlanner::new(fields.clone()).plan(clauses, sort, page)
}

/// Builder for constructing plans fluently
#[derive(Debug)]
pub struct PlanBuilder<'p> {
    planner: &'p QueryPlanner,
    clauses: Vec<FilterClause>,
    sort: Option<SortClause>,
    page: Pagination,
}

impl<'p> PlanBuilder<'p> {
    pub fn new(planner: &'p QueryPlanner) -> Self {
        Self {
            planner,
            clauses: vec![],
            sort: None,
            page: Pagination::unbounded(),
        }
    }

    // Filter methods

    /// Add a raw clause
    pub fn filter(mut self, clause: FilterClause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(FilterClause::eq(field, value))
    }

    pub fn ne(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(FilterClause::ne(field, value))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(FilterClause::new(field, Operator::Gt, value))
    }

    pub fn ge(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(FilterClause::new(field, Operator::Ge, value))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(FilterClause::new(field, Operator::Lt, value))
    }

    pub fn le(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(FilterClause::new(field, Operator::Le, value))
    }

    pub fn contains(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(FilterClause::contains(field, value))
    }

    pub fn starts_with(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(FilterClause::starts_with(field, value))
    }

    pub fn ends_with(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(FilterClause::ends_with(field, value))
    }

    // Sort methods

    pub fn sort(mut self, sort: SortClause) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn sort_asc(self, field: impl Into<String>) -> Self {
        self.sort(SortClause::asc(field))
    }

    pub fn sort_desc(self, field: impl Into<String>) -> Self {
        self.sort(SortClause::desc(field))
    }

    // Pagination methods

    pub fn page(mut self, page: Pagination) -> Self {
        self.page = page;
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.page.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.page.limit = limit;
        self
    }

    /// Validate and build the plan
    pub fn build(self) -> Result<QueryPlan, ConfigError> {
        self.planner.plan(self.clauses, self.sort, self.page)
    }
}
