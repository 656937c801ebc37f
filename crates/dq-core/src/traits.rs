//! Core traits
//!
//! The engine never assumes a concrete record schema. It only needs to look
//! up named fields on whatever the caller's API client returned.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

/// A raw record returned by the external API.
pub trait Record {
    /// Look up a field by name. Dotted names (`"settings.ssoUrl"`) walk into
    /// nested objects where the representation supports it.
    fn field(&self, name: &str) -> Option<Cow<'_, Value>>;

    /// Describe why this record cannot be queried at all, if it cannot
    fn shape_error(&self) -> Option<String> {
        None
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(name) {
        return Some(value);
    }

    let (head, rest) = name.split_once('.')?;
    descend(map.get(head)?, rest)
}

/// Numeric segments index into arrays
fn descend<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Object(inner) => lookup(inner, name),
        Value::Array(items) => {
            let (head, rest) = match name.split_once('.') {
                Some((head, rest)) => (head, Some(rest)),
                None => (name, None),
            };
            let item = items.get(head.parse::<usize>().ok()?)?;
            match rest {
                Some(rest) => descend(item, rest),
                None => Some(item),
            }
        }
        _ => None,
    }
}

impl Record for Map<String, Value> {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        lookup(self, name).map(Cow::Borrowed)
    }
}

impl Record for Value {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        match self {
            Value::Object(map) => map.field(name),
            _ => None,
        }
    }

    fn shape_error(&self) -> Option<String> {
        let found = match self {
            Value::Object(_) => return None,
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
        };
        Some(format!("expected a JSON object, found {}", found))
    }
}

impl Record for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.get(name).map(|v| Cow::Owned(Value::String(v.clone())))
    }
}

impl Record for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.get(name).map(|v| Cow::Owned(Value::String(v.clone())))
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        (**self).field(name)
    }

    fn shape_error(&self) -> Option<String> {
        (**self).shape_error()
    }
}
