//! Result Projector
//!
//! Applies the residual stages of a plan to fetched records and flattens each
//! survivor into the key/value shape a data source stores in state:
//!
//! 1. residual filtering (every clause must hold)
//! 2. stable sort
//! 3. skip, then limit
//! 4. projection, omitting absent and empty values
//!
//! A malformed record is dropped and reported; the rest of the batch
//! continues.

use std::borrow::Cow;

use dq_core::config::QuerySettings;
use dq_core::{Diagnostics, Partial, Record, RecordError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::fields::ProjectionSpec;
use crate::query::QueryPlan;

/// One flattened output record, in projection order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedRecord {
    entries: Vec<(String, Value)>,
}

impl ProjectedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing an earlier value under the same name
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.entries.into_iter().collect::<Map<String, Value>>())
    }
}

impl Serialize for ProjectedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Projected records are keyed by output names. Re-applying a plan to them
/// only sees the same fields when the projection keeps source names.
impl Record for ProjectedRecord {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.get(name).map(Cow::Borrowed)
    }
}

/// Flatten one value for output. Absent-equivalent values (null, empty
/// string, empty collection) are dropped; nested values become JSON text.
fn flatten(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        Value::Array(_) | Value::Object(_) => Some(Value::String(value.to_string())),
        other => Some(other.clone()),
    }
}

/// Applies plans to fetched records for one projection spec
#[derive(Debug, Clone)]
pub struct ResultProjector<'s> {
    spec: &'s ProjectionSpec,
    default_limit: Option<usize>,
}

impl<'s> ResultProjector<'s> {
    pub fn new(spec: &'s ProjectionSpec) -> Self {
        Self {
            spec,
            default_limit: None,
        }
    }

    /// Cap server-default pages (`limit = 0`) at this size
    pub fn with_default_limit(mut self, limit: Option<usize>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_settings(self, settings: &QuerySettings) -> Self {
        self.with_default_limit(settings.default_limit)
    }

    /// Run stages 1-3 and return the surviving records in output order
    pub fn select<'r, R: Record>(&self, records: &'r [R], plan: &QueryPlan) -> Partial<Vec<&'r R>> {
        let mut diagnostics = Diagnostics::new();
        let filters = plan.residual_filters();

        let mut survivors: Vec<(usize, &'r R)> = Vec::with_capacity(records.len());
        'records: for (index, record) in records.iter().enumerate() {
            if let Some(reason) = record.shape_error() {
                diagnostics.push(RecordError::malformed(reason).at(index));
                continue;
            }
            for filter in filters {
                match filter.evaluate(record) {
                    Ok(true) => {}
                    Ok(false) => continue 'records,
                    Err(err) => {
                        diagnostics.push(err.at(index));
                        continue 'records;
                    }
                }
            }
            survivors.push((index, record));
        }
        let matched = survivors.len();

        if let Some(sort) = plan.residual_sort() {
            let mut keyed = Vec::with_capacity(survivors.len());
            for (index, record) in survivors {
                match sort.key(record) {
                    Ok(key) => keyed.push((key, (index, record))),
                    Err(err) => diagnostics.push(err.at(index)),
                }
            }
            sort.sort_keyed(&mut keyed);
            survivors = keyed.into_iter().map(|(_, entry)| entry).collect();
        }

        if let Some(page) = plan.residual_pagination() {
            survivors = page.apply(survivors, self.default_limit);
        }

        for error in diagnostics.iter() {
            warn!(error = %error, "Skipping malformed record");
        }
        debug!(
            fetched = records.len(),
            matched,
            returned = survivors.len(),
            rejected = diagnostics.len(),
            "Applied query plan"
        );

        Partial::with_diagnostics(
            survivors.into_iter().map(|(_, record)| record).collect(),
            diagnostics,
        )
    }

    /// Run every stage and flatten the survivors
    pub fn project<R: Record>(&self, records: &[R], plan: &QueryPlan) -> Partial<Vec<ProjectedRecord>> {
        self.select(records, plan)
            .map(|selected| selected.into_iter().map(|r| self.shape(r)).collect())
    }

    /// Stage 4 for a single record
    pub fn shape<R: Record + ?Sized>(&self, record: &R) -> ProjectedRecord {
        let mut projected = ProjectedRecord::new();
        for field in self.spec.fields() {
            if let Some(value) = record.field(&field.source).and_then(|v| flatten(&v)) {
                projected.insert(field.output.clone(), value);
            }
        }
        projected
    }
}

/// Project with no default page size
pub fn project<R: Record>(
    records: &[R],
    plan: &QueryPlan,
    spec: &ProjectionSpec,
) -> Partial<Vec<ProjectedRecord>> {
    ResultProjector::new(spec).project(records, plan)
}
