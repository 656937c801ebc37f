//! CLI argument definitions using clap
//!
//! ```text
//! dirquery --resource applications --filter type:eq:web --sort -name records.json
//! dirquery --fields fields.json --query 'filter=status:eq:active&limit=5' -
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Filter, sort, paginate and shape directory records
#[derive(Parser, Debug)]
#[command(name = "dirquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON file holding an array of records (`-` reads stdin)
    #[arg(default_value = "-")]
    pub input: String,

    /// Catalog resource whose fields may be queried
    #[arg(long, short = 'r', conflicts_with = "fields")]
    pub resource: Option<String>,

    /// JSON file declaring the queryable fields
    #[arg(long)]
    pub fields: Option<PathBuf>,

    /// Filter clause as `field:operator:value` (repeatable, all must hold)
    #[arg(long = "filter", short = 'f', value_name = "CLAUSE")]
    pub filters: Vec<String>,

    /// Sort field, prefixed with `-` for descending
    #[arg(long, short = 's', allow_hyphen_values = true)]
    pub sort: Option<String>,

    /// Records to skip after sorting
    #[arg(long, default_value_t = 0)]
    pub skip: usize,

    /// Maximum records to return (0 for the server default)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// A rendered query string to parse instead of the clause options
    #[arg(long, conflicts_with_all = ["filters", "sort", "skip", "limit"])]
    pub query: Option<String>,

    /// Query string style: `filter` or `flat`
    #[arg(long, default_value = "filter")]
    pub style: String,

    /// Comma-separated output names to keep
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Print the rendered query string and exit
    #[arg(long)]
    pub render: bool,

    /// Fail if any record was rejected
    #[arg(long)]
    pub strict: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}
