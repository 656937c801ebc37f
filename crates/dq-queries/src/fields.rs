//! Field allow-lists and projection specs
//!
//! Every data source declares which fields of its records may be filtered
//! and sorted on, and which fields end up in its output.

use std::collections::HashSet;

use dq_core::{ConfigError, FieldKind};
use serde::{Deserialize, Serialize};

fn yes() -> bool {
    true
}

/// A declared record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name as it appears on the API record
    pub name: String,
    /// Declared kind
    #[serde(default)]
    pub kind: FieldKind,
    /// Whether filter clauses may name this field
    #[serde(default = "yes")]
    pub filterable: bool,
    /// Whether a sort clause may name this field
    #[serde(default = "yes")]
    pub sortable: bool,
    /// Output name in projected records (snake_case of `name` by default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Field {
    /// Create a new field of the given kind
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            filterable: true,
            sortable: true,
            output: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    /// Nested JSON, filterable by structural equality but not sortable
    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Json).with_sortable(false)
    }

    /// Set the output name
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Set filterable flag
    pub fn with_filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    /// Set sortable flag
    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Only projected, never filtered or sorted on
    pub fn output_only(self) -> Self {
        self.with_filterable(false).with_sortable(false)
    }

    /// Get the output name
    pub fn output_name(&self) -> String {
        self.output.clone().unwrap_or_else(|| snake_case(&self.name))
    }
}

/// Convert an API field name (`displayLabel`, `settings.ssoUrl`) to the
/// snake_case attribute form (`display_label`, `settings_sso_url`)
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c == '.' || c == '-' || c == ' ' {
            out.push('_');
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// The allow-list of fields for one record type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet {
    fields: Vec<Field>,
}

impl FieldSet {
    /// Create a new empty field set
    pub fn new() -> Self {
        Self { fields: vec![] }
    }

    /// Add a field
    pub fn add(&mut self, field: Field) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Add a field (builder pattern)
    pub fn with(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Get all fields
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve a field a filter clause may name
    pub fn filterable(&self, name: &str) -> Result<&Field, ConfigError> {
        self.get(name)
            .filter(|f| f.filterable)
            .ok_or_else(|| ConfigError::FieldNotFilterable {
                field: name.to_string(),
            })
    }

    /// Resolve a field a sort clause may name
    pub fn sortable(&self, name: &str) -> Result<&Field, ConfigError> {
        self.get(name)
            .filter(|f| f.sortable)
            .ok_or_else(|| ConfigError::FieldNotSortable {
                field: name.to_string(),
            })
    }

    /// Get all field names
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Names of filterable fields as a set
    pub fn filterable_names(&self) -> HashSet<&str> {
        self.fields
            .iter()
            .filter(|f| f.filterable)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Default projection: every declared field under its output name
    pub fn projection(&self) -> ProjectionSpec {
        ProjectionSpec {
            fields: self
                .fields
                .iter()
                .map(|f| ProjectedField::new(&f.name, f.output_name()))
                .collect(),
        }
    }
}

/// One source field copied into projected records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedField {
    pub source: String,
    pub output: String,
}

impl ProjectedField {
    pub fn new(source: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
        }
    }
}

/// The ordered list of fields a caller wants in its output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectionSpec {
    fields: Vec<ProjectedField>,
}

impl ProjectionSpec {
    pub fn new() -> Self {
        Self { fields: vec![] }
    }

    /// Copy `source` to `output`
    pub fn with(mut self, source: impl Into<String>, output: impl Into<String>) -> Self {
        self.fields.push(ProjectedField::new(source, output));
        self
    }

    /// Copy `source` under its snake_case name
    pub fn with_field(self, source: &str) -> Self {
        let output = snake_case(source);
        self.with(source, output)
    }

    /// Keep the same name on both sides
    pub fn identity<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fields: names
                .into_iter()
                .map(|n| ProjectedField::new(n, n))
                .collect(),
        }
    }

    pub fn fields(&self) -> &[ProjectedField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Narrow to the named outputs or sources, in the order given.
    /// Unknown names are ignored.
    pub fn select(&self, names: &[&str]) -> Self {
        Self {
            fields: names
                .iter()
                .filter_map(|name| {
                    self.fields
                        .iter()
                        .find(|f| f.output == *name || f.source == *name)
                        .cloned()
                })
                .collect(),
        }
    }
}
