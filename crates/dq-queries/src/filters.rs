//! Query Filters
//!
//! A filter clause is one `field operator value` condition. Clauses are
//! combined with AND semantics; there is no OR or NOT.

use std::cmp::Ordering;
use std::fmt;

use dq_core::{ConfigError, FieldKind, Record, RecordError, TypedValue};

/// Filter operators that can be applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equals (eq)
    Eq,
    /// Not equals (ne)
    Ne,
    /// Greater than (gt)
    Gt,
    /// Less than (lt)
    Lt,
    /// Greater than or equal (ge)
    Ge,
    /// Less than or equal (le)
    Le,
    /// Substring match (contains)
    Contains,
    /// Prefix match (startswith)
    StartsWith,
    /// Suffix match (endswith)
    EndsWith,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
        Self::Ge,
        Self::Le,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
    ];

    /// Parse operator from its wire name or symbol
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "eq" | "=" | "==" => Some(Self::Eq),
            "ne" | "!=" | "<>" => Some(Self::Ne),
            "gt" | ">" => Some(Self::Gt),
            "lt" | "<" => Some(Self::Lt),
            "ge" | "gte" | ">=" => Some(Self::Ge),
            "le" | "lte" | "<=" => Some(Self::Le),
            "contains" | "~" => Some(Self::Contains),
            "startswith" | "sw" => Some(Self::StartsWith),
            "endswith" | "ew" => Some(Self::EndsWith),
            _ => None,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Le => "le",
            Self::Contains => "contains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
        }
    }

    /// gt/lt/ge/le
    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Ge | Self::Le)
    }

    /// contains/startswith/endswith
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Contains | Self::StartsWith | Self::EndsWith)
    }

    /// Check if this operator can be applied to a field of the given kind
    pub fn applies_to(&self, kind: FieldKind) -> bool {
        if self.is_ordering() {
            kind.is_ordered()
        } else if self.is_text() {
            kind == FieldKind::String
        } else {
            true
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single filter condition as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    /// The field being filtered (e.g., "name", "displayLabel")
    pub field: String,
    /// The operator to apply
    pub operator: Operator,
    /// The literal to compare against, as text
    pub value: String,
}

impl FilterClause {
    /// Create a new filter clause
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Create an equals clause
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Create a not equals clause
    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Ne, value)
    }

    /// Create a contains clause
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Contains, value)
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::StartsWith, value)
    }

    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::EndsWith, value)
    }

    /// Parse the `field:operator:value` form. The value may itself contain
    /// colons; everything after the second colon belongs to it.
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let mut parts = expression.splitn(3, ':');
        let field = parts.next().unwrap_or_default().trim();
        let operator = parts.next().ok_or_else(|| {
            ConfigError::MalformedQuery(format!(
                "expected field:operator:value, got {:?}",
                expression
            ))
        })?;
        let value = parts.next().unwrap_or_default();

        if field.is_empty() {
            return Err(ConfigError::MalformedQuery(format!(
                "missing field in {:?}",
                expression
            )));
        }

        let operator = Operator::from_str(operator.trim())
            .ok_or_else(|| ConfigError::UnknownOperator(operator.to_string()))?;

        Ok(Self::new(field, operator, value))
    }

    /// The `field:operator:value` form
    pub fn to_expression(&self) -> String {
        format!("{}:{}:{}", self.field, self.operator, self.value)
    }
}

/// A clause checked against its field's declared kind, with the literal
/// already coerced. Only the planner builds these.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedFilter {
    clause: FilterClause,
    kind: FieldKind,
    literal: TypedValue,
}

impl TypedFilter {
    /// Bind a clause to a field kind, rejecting operator/kind mismatches and
    /// literals that do not parse as the kind
    pub fn bind(clause: FilterClause, kind: FieldKind) -> Result<Self, ConfigError> {
        if !clause.operator.applies_to(kind) {
            return Err(ConfigError::OperatorTypeMismatch {
                field: clause.field,
                operator: clause.operator.to_string(),
                kind: kind.as_str(),
            });
        }

        let literal = kind
            .parse_literal(&clause.value)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: clause.field.clone(),
                kind: kind.as_str(),
                value: clause.value.clone(),
            })?;

        Ok(Self {
            clause,
            kind,
            literal,
        })
    }

    pub fn clause(&self) -> &FilterClause {
        &self.clause
    }

    pub fn field(&self) -> &str {
        &self.clause.field
    }

    pub fn operator(&self) -> Operator {
        self.clause.operator
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Evaluate against one record. See [`evaluate`].
    pub fn evaluate<R: Record + ?Sized>(&self, record: &R) -> Result<bool, RecordError> {
        evaluate(self, record)
    }
}

/// Evaluate one clause against one record.
///
/// A missing or null field never matches, whatever the operator. A present
/// value that does not parse as the field's kind yields an error, which
/// callers treat as "no match" plus a diagnostic.
pub fn evaluate<R: Record + ?Sized>(filter: &TypedFilter, record: &R) -> Result<bool, RecordError> {
    let Some(raw) = record.field(filter.field()) else {
        return Ok(false);
    };

    let value = match filter.kind.coerce(&raw) {
        Ok(Some(value)) => value,
        Ok(None) => return Ok(false),
        Err(reason) => return Err(RecordError::field(filter.field(), reason)),
    };

    let literal = &filter.literal;
    let matched = match filter.operator() {
        Operator::Eq => value == *literal,
        Operator::Ne => value != *literal,
        Operator::Gt => value.compare(literal) == Some(Ordering::Greater),
        Operator::Lt => value.compare(literal) == Some(Ordering::Less),
        Operator::Ge => matches!(
            value.compare(literal),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Le => matches!(
            value.compare(literal),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Contains => text_match(&value, literal, |v, l| v.contains(l)),
        Operator::StartsWith => text_match(&value, literal, |v, l| v.starts_with(l)),
        Operator::EndsWith => text_match(&value, literal, |v, l| v.ends_with(l)),
    };

    Ok(matched)
}

fn text_match(value: &TypedValue, literal: &TypedValue, f: impl Fn(&str, &str) -> bool) -> bool {
    match (value, literal) {
        (TypedValue::String(v), TypedValue::String(l)) => f(v, l),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bound(clause: FilterClause, kind: FieldKind) -> TypedFilter {
        TypedFilter::bind(clause, kind).unwrap()
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!(Operator::from_str("eq"), Some(Operator::Eq));
        assert_eq!(Operator::from_str("EQ"), Some(Operator::Eq));
        assert_eq!(Operator::from_str("!="), Some(Operator::Ne));
        assert_eq!(Operator::from_str(">="), Some(Operator::Ge));
        assert_eq!(Operator::from_str("startswith"), Some(Operator::StartsWith));
        assert_eq!(Operator::from_str("like"), None);

        for op in Operator::ALL {
            assert_eq!(Operator::from_str(op.as_str()), Some(op));
        }
    }

    #[test]
    fn test_operator_kind_compatibility() {
        assert!(Operator::Gt.applies_to(FieldKind::Number));
        assert!(Operator::Le.applies_to(FieldKind::Date));
        assert!(!Operator::Gt.applies_to(FieldKind::String));
        assert!(Operator::Contains.applies_to(FieldKind::String));
        assert!(!Operator::Contains.applies_to(FieldKind::Number));
        assert!(Operator::Eq.applies_to(FieldKind::Json));
    }

    #[test]
    fn test_clause_expression() {
        let clause = FilterClause::parse("ssoUrl:startswith:https://sso.example.com").unwrap();
        assert_eq!(clause.field, "ssoUrl");
        assert_eq!(clause.operator, Operator::StartsWith);
        assert_eq!(clause.value, "https://sso.example.com");
        assert_eq!(clause.to_expression(), "ssoUrl:startswith:https://sso.example.com");

        let empty = FilterClause::parse("description:eq:").unwrap();
        assert_eq!(empty.value, "");

        assert!(matches!(
            FilterClause::parse("name"),
            Err(ConfigError::MalformedQuery(_))
        ));
        assert!(matches!(
            FilterClause::parse("name:like:x"),
            Err(ConfigError::UnknownOperator(op)) if op == "like"
        ));
        assert!(matches!(
            FilterClause::parse(":eq:x"),
            Err(ConfigError::MalformedQuery(_))
        ));
    }

    #[test]
    fn test_bind_rejects_mismatch() {
        let err = TypedFilter::bind(FilterClause::new("name", Operator::Gt, "a"), FieldKind::String)
            .unwrap_err();
        assert_eq!(err.error_code(), "operator_type_mismatch");

        let err = TypedFilter::bind(FilterClause::new("timeout", Operator::Gt, "soon"), FieldKind::Number)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { kind: "number", .. }));
    }

    #[test]
    fn test_string_operators_ignore_case() {
        let record = json!({"name": "Acme Portal"});

        assert!(bound(FilterClause::eq("name", "acme portal"), FieldKind::String)
            .evaluate(&record)
            .unwrap());
        assert!(bound(FilterClause::contains("name", "PORT"), FieldKind::String)
            .evaluate(&record)
            .unwrap());
        assert!(bound(FilterClause::starts_with("name", "aCmE"), FieldKind::String)
            .evaluate(&record)
            .unwrap());
        assert!(bound(FilterClause::ends_with("name", "TAL"), FieldKind::String)
            .evaluate(&record)
            .unwrap());
        assert!(!bound(FilterClause::ne("name", "ACME PORTAL"), FieldKind::String)
            .evaluate(&record)
            .unwrap());
    }

    #[test]
    fn test_missing_field_never_matches() {
        let record = json!({"name": "App1", "owner": null});

        let contains = bound(FilterClause::contains("publisher", "Acme"), FieldKind::String);
        assert_eq!(contains.evaluate(&record), Ok(false));

        let ne = bound(FilterClause::ne("publisher", "Acme"), FieldKind::String);
        assert_eq!(ne.evaluate(&record), Ok(false));

        let null = bound(FilterClause::ne("owner", "x"), FieldKind::String);
        assert_eq!(null.evaluate(&record), Ok(false));
    }

    #[test]
    fn test_numeric_and_date_comparisons() {
        let record = json!({"timeout": "120", "created": "2024-05-01T10:00:00Z"});

        let gt = bound(FilterClause::new("timeout", Operator::Gt, "60"), FieldKind::Number);
        assert_eq!(gt.evaluate(&record), Ok(true));
        let le = bound(FilterClause::new("timeout", Operator::Le, "120"), FieldKind::Number);
        assert_eq!(le.evaluate(&record), Ok(true));
        let lt = bound(FilterClause::new("timeout", Operator::Lt, "120"), FieldKind::Number);
        assert_eq!(lt.evaluate(&record), Ok(false));

        let after = bound(FilterClause::new("created", Operator::Ge, "2024-05-01"), FieldKind::Date);
        assert_eq!(after.evaluate(&record), Ok(true));
        let before = bound(FilterClause::new("created", Operator::Lt, "2024-01-01"), FieldKind::Date);
        assert_eq!(before.evaluate(&record), Ok(false));
    }

    #[test]
    fn test_unparseable_record_value_is_reported() {
        let record = json!({"timeout": "forever"});
        let gt = bound(FilterClause::new("timeout", Operator::Gt, "60"), FieldKind::Number);

        let err = gt.evaluate(&record).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("timeout"));
        assert!(err.reason.contains("expected number"));
    }

    #[test]
    fn test_structural_equality() {
        let record = json!({"beta": true, "attributes": {"ldapGroups": ["eng"]}});

        let beta = bound(FilterClause::eq("beta", "TRUE"), FieldKind::Bool);
        assert_eq!(beta.evaluate(&record), Ok(true));

        let attrs = bound(
            FilterClause::eq("attributes", r#"{"ldapGroups":["eng"]}"#),
            FieldKind::Json,
        );
        assert_eq!(attrs.evaluate(&record), Ok(true));

        let other = bound(FilterClause::ne("attributes", "{}"), FieldKind::Json);
        assert_eq!(other.evaluate(&record), Ok(true));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let record = json!({"name": "App2", "type": "mobile"});
        let filter = bound(FilterClause::eq("type", "web"), FieldKind::String);
        let first = filter.evaluate(&record);
        for _ in 0..10 {
            assert_eq!(filter.evaluate(&record), first);
        }
    }
}
