//! Query Sort Orders
//!
//! A query sorts by at most one field. Records missing the sort field come
//! last in either direction.

use std::cmp::Ordering;

use dq_core::{FieldKind, Record, RecordError, TypedValue};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (A-Z, 1-9, oldest first)
    #[default]
    Asc,
    /// Descending order (Z-A, 9-1, newest first)
    Desc,
}

impl SortDirection {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Get the opposite direction
    pub fn reverse(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// A sort clause as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    /// The field to sort by
    pub field: String,
    /// The sort direction
    pub direction: SortDirection,
}

impl SortClause {
    /// Create a new sort clause
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Create ascending sort
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    /// Create descending sort
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Parse the wire form: `name` sorts ascending, `-name` descending.
    /// A `name:asc` / `name:desc` suffix is accepted as well and wins over
    /// the prefix forms; any other text is taken whole as the field name.
    pub fn parse(param: &str) -> Option<Self> {
        let suffixed = param
            .rsplit_once(':')
            .and_then(|(field, dir)| Some((field, SortDirection::from_str(dir)?)));

        let (field, direction) = match suffixed {
            Some(parsed) => parsed,
            None => match param.strip_prefix('-') {
                Some(field) => (field, SortDirection::Desc),
                None => (param.strip_prefix('+').unwrap_or(param), SortDirection::Asc),
            },
        };

        if field.is_empty() {
            return None;
        }
        Some(Self::new(field, direction))
    }

    /// The wire form used in rendered queries. Field names that the short
    /// forms would misread are written with an explicit direction suffix.
    pub fn to_param(&self) -> String {
        let plain = !self.field.contains(':') && !self.field.starts_with(['-', '+']);

        match (plain, self.direction) {
            (true, SortDirection::Asc) => self.field.clone(),
            (true, SortDirection::Desc) => format!("-{}", self.field),
            (false, direction) => format!("{}:{}", self.field, direction.as_str()),
        }
    }

    /// Reverse the sort direction
    pub fn reversed(mut self) -> Self {
        self.direction = self.direction.reverse();
        self
    }
}

/// A sort clause checked against the field allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedSort {
    clause: SortClause,
    kind: FieldKind,
}

impl TypedSort {
    pub(crate) fn new(clause: SortClause, kind: FieldKind) -> Self {
        Self { clause, kind }
    }

    pub fn clause(&self) -> &SortClause {
        &self.clause
    }

    pub fn field(&self) -> &str {
        &self.clause.field
    }

    pub fn direction(&self) -> SortDirection {
        self.clause.direction
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Extract the sort key of a record. A missing field is a `None` key;
    /// a value that does not parse as the field kind is an error.
    pub fn key<R: Record + ?Sized>(&self, record: &R) -> Result<Option<TypedValue>, RecordError> {
        match record.field(self.field()) {
            Some(raw) => self
                .kind
                .coerce(&raw)
                .map_err(|reason| RecordError::field(self.field(), reason)),
            None => Ok(None),
        }
    }

    /// Compare two keys in this sort's direction, missing keys last
    pub fn compare(&self, a: &Option<TypedValue>, b: &Option<TypedValue>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => {
                let ordering = a.compare(b).unwrap_or(Ordering::Equal);
                match self.direction() {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Stable-sort keyed items in place
    pub fn sort_keyed<T>(&self, items: &mut [(Option<TypedValue>, T)]) {
        items.sort_by(|a, b| self.compare(&a.0, &b.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_direction() {
        assert_eq!(SortDirection::from_str("asc"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::from_str("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::Asc.reverse(), SortDirection::Desc);
        assert_eq!(SortDirection::default(), SortDirection::Asc);
    }

    #[test]
    fn test_sort_clause_params() {
        assert_eq!(SortClause::parse("name"), Some(SortClause::asc("name")));
        assert_eq!(SortClause::parse("-created"), Some(SortClause::desc("created")));
        assert_eq!(SortClause::parse("created:desc"), Some(SortClause::desc("created")));
        assert_eq!(SortClause::parse("+name"), Some(SortClause::asc("name")));
        assert_eq!(SortClause::parse("-"), None);
        assert_eq!(SortClause::parse("name:DESC"), Some(SortClause::desc("name")));
        assert_eq!(
            SortClause::parse("attr:x"),
            Some(SortClause::asc("attr:x"))
        );

        assert_eq!(SortClause::desc("created").to_param(), "-created");
        assert_eq!(SortClause::asc("name").to_param(), "name");
        assert_eq!(SortClause::asc("name").reversed().direction, SortDirection::Desc);
    }

    #[test]
    fn test_awkward_field_names_round_trip() {
        for field in ["attr:x", "-x", "+x", "a:desc", "a:asc", " padded"] {
            for clause in [SortClause::asc(field), SortClause::desc(field)] {
                assert_eq!(
                    SortClause::parse(&clause.to_param()).as_ref(),
                    Some(&clause),
                    "{:?} rendered as {:?}",
                    clause,
                    clause.to_param()
                );
            }
        }
        assert_eq!(SortClause::asc("-x").to_param(), "-x:asc");
        assert_eq!(SortClause::desc("attr:x").to_param(), "attr:x:desc");
    }

    #[test]
    fn test_stable_sort_keeps_ties_in_order() {
        let sort = TypedSort::new(SortClause::asc("k"), FieldKind::Number);
        let records = [json!({"k": 1, "v": "a"}), json!({"k": 1, "v": "b"})];

        let mut keyed: Vec<_> = records
            .iter()
            .map(|r| (sort.key(r).unwrap(), r))
            .collect();
        sort.sort_keyed(&mut keyed);

        let order: Vec<_> = keyed.iter().map(|(_, r)| r["v"].as_str().unwrap()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_descending_with_missing_keys_last() {
        let sort = TypedSort::new(SortClause::desc("timeout"), FieldKind::Number);
        let records = [
            json!({"name": "none"}),
            json!({"name": "short", "timeout": 10}),
            json!({"name": "long", "timeout": "300"}),
        ];

        let mut keyed: Vec<_> = records
            .iter()
            .map(|r| (sort.key(r).unwrap(), r))
            .collect();
        sort.sort_keyed(&mut keyed);

        let order: Vec<_> = keyed.iter().map(|(_, r)| r["name"].as_str().unwrap()).collect();
        assert_eq!(order, vec!["long", "short", "none"]);
    }

    #[test]
    fn test_unparseable_sort_key() {
        let sort = TypedSort::new(SortClause::asc("created"), FieldKind::Date);
        let err = sort.key(&json!({"created": "yesterday"})).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("created"));
    }
}
