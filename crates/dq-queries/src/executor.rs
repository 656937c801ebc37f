//! Query Executor
//!
//! Runs a plan end to end: renders the server query, fetches records through
//! a [`RecordFetcher`] and projects them.

use std::fmt::Display;

use async_trait::async_trait;
use dq_core::config::QuerySettings;
use dq_core::{Pagination, Partial, QueryError, QueryResult, Record};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::fields::ProjectionSpec;
use crate::filters::FilterClause;
use crate::planner::QueryPlanner;
use crate::projector::{ProjectedRecord, ResultProjector};
use crate::query::QueryPlan;
use crate::sorts::SortClause;

/// Source of raw records for one resource
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    type Record: Record + Send + Sync;
    type Error: Display + Send;

    /// Fetch records for a rendered server query (possibly empty)
    async fn fetch(&self, query: &str) -> Result<Vec<Self::Record>, Self::Error>;
}

/// In-memory fetcher errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Serves a fixed record list, ignoring the query it is given
pub struct MemoryFetcher {
    records: Vec<Value>,
    failure: Option<String>,
    last_query: RwLock<Option<String>>,
}

impl MemoryFetcher {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            failure: None,
            last_query: RwLock::new(None),
        }
    }

    /// A fetcher whose every fetch fails with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(vec![])
        }
    }

    /// Build from a JSON document: an array of records, or a single object
    pub fn from_json(document: Value) -> Self {
        match document {
            Value::Array(records) => Self::new(records),
            other => Self::new(vec![other]),
        }
    }

    /// The query string of the most recent fetch
    pub async fn last_query(&self) -> Option<String> {
        self.last_query.read().await.clone()
    }
}

#[async_trait]
impl RecordFetcher for MemoryFetcher {
    type Record = Value;
    type Error = FetchError;

    async fn fetch(&self, query: &str) -> Result<Vec<Value>, FetchError> {
        *self.last_query.write().await = Some(query.to_string());

        match &self.failure {
            Some(message) => Err(FetchError::Unavailable(message.clone())),
            None => Ok(self.records.clone()),
        }
    }
}

/// Ties planning, fetching and projection together
pub struct QueryExecutor<F> {
    fetcher: F,
    settings: QuerySettings,
}

impl<F: RecordFetcher> QueryExecutor<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            settings: QuerySettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch and project one plan
    #[instrument(skip_all, fields(query = %plan.server_query()))]
    pub async fn execute(
        &self,
        plan: &QueryPlan,
        spec: &ProjectionSpec,
    ) -> QueryResult<Partial<Vec<ProjectedRecord>>> {
        let query = plan.server_query();
        let records = self
            .fetcher
            .fetch(&query)
            .await
            .map_err(|e| QueryError::fetch(e.to_string()))?;
        debug!(fetched = records.len(), "Fetched records");

        Ok(ResultProjector::new(spec)
            .with_settings(&self.settings)
            .project(&records, plan))
    }

    /// Plan with the given planner, then execute
    pub async fn plan_and_execute(
        &self,
        planner: &QueryPlanner,
        clauses: Vec<FilterClause>,
        sort: Option<SortClause>,
        page: Pagination,
        spec: &ProjectionSpec,
    ) -> QueryResult<Partial<Vec<ProjectedRecord>>> {
        let plan = planner.plan(clauses, sort, page)?;
        self.execute(&plan, spec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Field, FieldSet};
    use crate::query::Pushdown;
    use dq_core::ConfigError;
    use serde_json::json;

    fn fields() -> FieldSet {
        FieldSet::new()
            .with(Field::string("name"))
            .with(Field::string("type"))
            .with(Field::string("status"))
    }

    fn fetcher() -> MemoryFetcher {
        MemoryFetcher::from_json(json!([
            {"name": "App1", "type": "web", "status": "active"},
            {"name": "App2", "type": "mobile", "status": "active"},
            {"name": "App3", "type": "web", "status": "inactive"}
        ]))
    }

    #[tokio::test]
    async fn test_execute_filters_locally() {
        let executor = QueryExecutor::new(fetcher());
        let planner = QueryPlanner::new(fields());
        let plan = planner
            .builder()
            .eq("type", "web")
            .eq("status", "active")
            .build()
            .unwrap();

        let result = executor.execute(&plan, &fields().projection()).await.unwrap();
        assert!(result.is_complete());
        assert_eq!(result.value.len(), 1);
        assert_eq!(result.value[0].get_str("name"), Some("App1"));
        // Nothing was pushed, so the server saw an empty query.
        assert_eq!(executor.fetcher().last_query().await.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_execute_sends_pushed_stages() {
        let executor = QueryExecutor::new(fetcher());
        let planner = QueryPlanner::new(fields()).with_pushdown(Pushdown::filters_only());
        let plan = planner
            .builder()
            .eq("type", "web")
            .sort_desc("name")
            .limit(1)
            .build()
            .unwrap();

        let result = executor.execute(&plan, &fields().projection()).await.unwrap();
        assert_eq!(
            executor.fetcher().last_query().await.as_deref(),
            Some("filter=type:eq:web")
        );
        // Sort and limit still ran locally over what came back.
        assert_eq!(result.value.len(), 1);
        assert_eq!(result.value[0].get_str("name"), Some("App3"));
    }

    #[tokio::test]
    async fn test_default_limit_applies() {
        let executor = QueryExecutor::new(fetcher()).with_settings(QuerySettings {
            default_limit: Some(2),
            max_limit: None,
        });
        let planner = QueryPlanner::new(fields());

        let result = executor
            .plan_and_execute(
                &planner,
                vec![],
                None,
                Pagination::unbounded(),
                &ProjectionSpec::identity(["name"]),
            )
            .await
            .unwrap();
        assert_eq!(result.value.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let executor = QueryExecutor::new(MemoryFetcher::failing("connection refused"));
        let plan = QueryPlanner::new(fields()).builder().build().unwrap();

        let err = executor.execute(&plan, &fields().projection()).await.unwrap_err();
        assert_eq!(err.error_code(), "fetch_failed");
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_invalid_plan_never_fetches() {
        let executor = QueryExecutor::new(fetcher());
        let planner = QueryPlanner::new(fields());

        let err = executor
            .plan_and_execute(
                &planner,
                vec![FilterClause::contains("publisher", "Acme")],
                None,
                Pagination::unbounded(),
                &fields().projection(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            QueryError::Config(ConfigError::FieldNotFilterable { .. })
        ));
        assert_eq!(executor.fetcher().last_query().await, None);
    }
}
