//! Core error types for dirquery
//!
//! Query construction problems abort the whole query (`ConfigError`), while a
//! single bad record only produces a diagnostic (`RecordError`).

use thiserror::Error;

/// Top-level error for a query execution
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid query: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch failed: {message}")]
    Fetch { message: String },
}

impl QueryError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::Config(e) => e.error_code(),
            QueryError::Fetch { .. } => "fetch_failed",
        }
    }
}

/// Invalid query construction, surfaced before any fetch happens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Field {field} is not filterable")]
    FieldNotFilterable { field: String },

    #[error("Field {field} is not sortable")]
    FieldNotSortable { field: String },

    #[error("Operator {operator} cannot be applied to {kind} field {field}")]
    OperatorTypeMismatch {
        field: String,
        operator: String,
        kind: &'static str,
    },

    #[error("Value {value:?} is not a valid {kind} for field {field}")]
    InvalidValue {
        field: String,
        kind: &'static str,
        value: String,
    },

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Operator {operator} on field {field} cannot be rendered in {style} style")]
    OperatorNotRenderable {
        field: String,
        operator: String,
        style: &'static str,
    },

    #[error("Limit {limit} exceeds maximum of {max}")]
    LimitExceeded { limit: usize, max: usize },

    #[error("Invalid pushdown: {0}")]
    InvalidPushdown(String),

    #[error("Field {field} collides with the {field} query parameter in {style} style")]
    ReservedField { field: String, style: &'static str },

    #[error("Malformed query: {0}")]
    MalformedQuery(String),
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::FieldNotFilterable { .. } => "field_not_filterable",
            ConfigError::FieldNotSortable { .. } => "field_not_sortable",
            ConfigError::OperatorTypeMismatch { .. } => "operator_type_mismatch",
            ConfigError::InvalidValue { .. } => "invalid_value",
            ConfigError::UnknownOperator(_) => "unknown_operator",
            ConfigError::OperatorNotRenderable { .. } => "operator_not_renderable",
            ConfigError::LimitExceeded { .. } => "limit_exceeded",
            ConfigError::InvalidPushdown(_) => "invalid_pushdown",
            ConfigError::ReservedField { .. } => "reserved_field",
            ConfigError::MalformedQuery(_) => "malformed_query",
        }
    }
}

/// A single malformed record. Never fatal; collected into `Diagnostics`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}{}{reason}", location(.index), field_prefix(.field))]
pub struct RecordError {
    /// Position of the record in the fetched batch, once known
    pub index: Option<usize>,
    /// Field that failed to parse, if the problem is field-specific
    pub field: Option<String>,
    pub reason: String,
}

impl RecordError {
    /// A record-level problem (wrong shape, not an object, ...)
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            index: None,
            field: None,
            reason: reason.into(),
        }
    }

    /// A field value that does not parse as its declared kind
    pub fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            index: None,
            field: Some(field.into()),
            reason: reason.into(),
        }
    }

    /// Attach the record position
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

fn location(index: &Option<usize>) -> String {
    index.map(|i| format!("record {}: ", i)).unwrap_or_default()
}

fn field_prefix(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!("field {}: ", f))
        .unwrap_or_default()
}

/// Per-record diagnostics collected during projection
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<RecordError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: RecordError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordError> {
        self.errors.iter()
    }

    /// Diagnostics raised for a specific field
    pub fn for_field(&self, field: &str) -> Vec<&RecordError> {
        self.errors
            .iter()
            .filter(|e| e.field.as_deref() == Some(field))
            .collect()
    }

    /// Check whether the record at `index` was reported
    pub fn has_record(&self, index: usize) -> bool {
        self.errors.iter().any(|e| e.index == Some(index))
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn into_vec(self) -> Vec<RecordError> {
        self.errors
    }
}

impl From<Vec<RecordError>> for Diagnostics {
    fn from(errors: Vec<RecordError>) -> Self {
        Self { errors }
    }
}
