//! Pagination bounds
//!
//! Directory list endpoints page with `skip`/`limit`. A zero limit means
//! "whatever the server defaults to", never an empty page.

use serde::{Deserialize, Serialize};

/// Skip/limit pagination parameters
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct Pagination {
    /// Number of matching records to skip
    #[serde(default)]
    pub skip: usize,

    /// Maximum records to return, 0 for the server default
    #[serde(default)]
    pub limit: usize,
}

impl Pagination {
    pub fn new(skip: usize, limit: usize) -> Self {
        Self { skip, limit }
    }

    /// First page of the given size
    pub fn first(limit: usize) -> Self {
        Self { skip: 0, limit }
    }

    /// No bounds: start at the beginning, server default size
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether the limit defers to the server default
    pub fn is_server_default(&self) -> bool {
        self.limit == 0
    }

    /// The cap to apply locally, resolving a zero limit against `default`
    pub fn effective_limit(&self, default: Option<usize>) -> Option<usize> {
        if self.limit == 0 {
            default.filter(|d| *d > 0)
        } else {
            Some(self.limit)
        }
    }

    /// Apply skip then limit to an already ordered list
    pub fn apply<T>(&self, items: Vec<T>, default_limit: Option<usize>) -> Vec<T> {
        let iter = items.into_iter().skip(self.skip);
        match self.effective_limit(default_limit) {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }

    /// The next page after this one, if the limit is explicit and the
    /// offset still fits
    pub fn next(&self) -> Option<Self> {
        if self.limit == 0 {
            return None;
        }
        Some(Self {
            skip: self.skip.checked_add(self.limit)?,
            limit: self.limit,
        })
    }
}
