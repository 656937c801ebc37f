//! dirquery
//!
//! Runs one query over a JSON record dump and prints the projected records.

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dq_core::config::{EngineConfig, LoggingConfig};
use dq_core::Pagination;
use dq_queries::{
    catalog, FieldSet, FilterClause, MemoryFetcher, QueryExecutor, QueryPlan, QueryPlanner,
    QueryStyle, SortClause,
};

mod args;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    init_tracing(&config.logging);
    debug!(
        path = ?cli.config,
        default_limit = ?config.query.default_limit,
        max_limit = ?config.query.max_limit,
        "Loaded config"
    );

    let fields = load_fields(&cli).await?;
    let style = QueryStyle::from_str(&cli.style)
        .ok_or_else(|| anyhow!("Unknown query style {:?}", cli.style))?;
    let planner = QueryPlanner::new(fields)
        .with_settings(config.query.clone())
        .with_style(style);

    let plan = build_plan(&cli, &planner)?;
    if cli.render {
        println!("{}", plan.render());
        return Ok(());
    }

    let mut spec = planner.fields().projection();
    if !cli.select.is_empty() {
        let names: Vec<&str> = cli.select.iter().map(String::as_str).collect();
        spec = spec.select(&names);
    }

    let document = read_input(&cli.input).await?;
    let executor = QueryExecutor::new(MemoryFetcher::from_json(document))
        .with_settings(config.query.clone());
    let result = executor.execute(&plan, &spec).await?;

    info!(
        returned = result.value.len(),
        rejected = result.diagnostics.len(),
        "Query complete"
    );
    if cli.strict && !result.is_complete() {
        bail!(
            "{} record(s) rejected: {}",
            result.diagnostics.len(),
            result.diagnostics.full_messages().join("; ")
        );
    }

    println!("{}", serde_json::to_string_pretty(&result.value)?);
    Ok(())
}

/// Initialize tracing/logging on stderr, leaving stdout for results
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.filter));

    let json = logging.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text = (!logging.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

async fn load_fields(cli: &Cli) -> anyhow::Result<FieldSet> {
    if let Some(path) = &cli.fields {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("Invalid field list in {}", path.display()));
    }

    let Some(resource) = &cli.resource else {
        bail!(
            "Pass --fields or --resource (one of: {})",
            catalog::RESOURCES.join(", ")
        );
    };
    catalog::by_name(resource).ok_or_else(|| {
        anyhow!(
            "Unknown resource {:?} (expected one of: {})",
            resource,
            catalog::RESOURCES.join(", ")
        )
    })
}

fn build_plan(cli: &Cli, planner: &QueryPlanner) -> anyhow::Result<QueryPlan> {
    if let Some(query) = &cli.query {
        return Ok(planner.parse(query)?);
    }

    let clauses = cli
        .filters
        .iter()
        .map(|raw| FilterClause::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let sort = match &cli.sort {
        Some(raw) => Some(SortClause::parse(raw).ok_or_else(|| anyhow!("Invalid sort {:?}", raw))?),
        None => None,
    };

    Ok(planner.plan(clauses, sort, Pagination::new(cli.skip, cli.limit))?)
}

async fn read_input(input: &str) -> anyhow::Result<Value> {
    let raw = if input == "-" {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("Failed to read stdin")?;
        raw
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {}", input))?
    };

    let document: Value = serde_json::from_str(&raw).context("Input is not valid JSON")?;
    if !document.is_array() {
        warn!("Input is not a JSON array; treating it as a single record");
    }
    Ok(document)
}
