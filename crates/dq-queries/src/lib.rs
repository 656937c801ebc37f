//! # dq-queries
//!
//! Filter, sort, paginate and shape engine for directory data sources.
//!
//! Callers declare which fields of a record type may be filtered and sorted,
//! build a validated [`QueryPlan`] from caller-supplied clauses, render it as
//! a query string for the REST API, and project the returned records into a
//! flat key/value shape.
//!
//! ## Structure
//!
//! - `filters` - Clauses, operators and the predicate evaluator
//! - `sorts` - Single-field stable sort
//! - `fields` - Field allow-lists and projection specs
//! - `query` - The validated plan and its rendering
//! - `planner` - Plan construction and query-string parsing
//! - `projector` - Residual filtering, sort, pagination and shaping
//! - `executor` - Fetch-and-project over a [`RecordFetcher`]
//! - `catalog` - Field allow-lists for common resources
//!
//! ## Example
//!
//! ```
//! use dq_queries::{catalog, project, QueryPlanner};
//! use serde_json::json;
//!
//! let fields = catalog::applications();
//! let planner = QueryPlanner::new(fields.clone());
//! let plan = planner
//!     .builder()
//!     .eq("type", "web")
//!     .eq("status", "active")
//!     .sort_desc("name")
//!     .limit(10)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     plan.render(),
//!     "filter=type:eq:web&filter=status:eq:active&sort=-name&limit=10"
//! );
//!
//! let records = vec![
//!     json!({"name": "App1", "type": "web", "status": "active"}),
//!     json!({"name": "App2", "type": "mobile", "status": "active"}),
//! ];
//! let result = project(&records, &plan, &fields.projection());
//! assert_eq!(result.value.len(), 1);
//! assert_eq!(result.value[0].get_str("name"), Some("App1"));
//! ```

pub mod filters;
pub mod sorts;
pub mod fields;
pub mod query;
pub mod planner;
pub mod projector;
pub mod executor;
pub mod catalog;

// Re-exports for convenience
pub use filters::{evaluate, FilterClause, Operator, TypedFilter};
pub use sorts::{SortClause, SortDirection, TypedSort};
pub use fields::{snake_case, Field, FieldSet, ProjectedField, ProjectionSpec};
pub use query::{Pushdown, QueryPlan, QueryStyle};
pub use planner::{plan, PlanBuilder, QueryPlanner};
pub use projector::{project, ProjectedRecord, ResultProjector};
pub use executor::{FetchError, MemoryFetcher, QueryExecutor, RecordFetcher};
