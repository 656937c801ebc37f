//! Result type aliases and the partial-success result

use crate::error::{Diagnostics, QueryError, RecordError};

/// Standard Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// A value produced despite some records being rejected.
///
/// The caller decides whether a result with diagnostics is acceptable.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Partial<T> {
    /// A result with no diagnostics
    pub fn complete(value: T) -> Self {
        Self {
            value,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_diagnostics(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    /// True when no record was rejected
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn add_diagnostic(&mut self, error: RecordError) {
        self.diagnostics.push(error);
    }

    pub fn map<U, F>(self, f: F) -> Partial<U>
    where
        F: FnOnce(T) -> U,
    {
        Partial {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    pub fn into_parts(self) -> (T, Diagnostics) {
        (self.value, self.diagnostics)
    }

    /// Drop the value if any record was rejected
    pub fn into_complete(self) -> Result<T, Diagnostics> {
        if self.diagnostics.is_empty() {
            Ok(self.value)
        } else {
            Err(self.diagnostics)
        }
    }
}
