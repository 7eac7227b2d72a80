//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// sqlwhy - explain surprising SQL query results via diagnostic sub-queries
#[derive(Parser, Debug)]
#[command(name = "sqlwhy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Analysis mode to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// DuckDB database path (":memory:" for an empty in-memory session)
    #[arg(short, long, global = true, env = "SQLWHY_DATABASE", default_value = ":memory:")]
    pub database: String,

    /// SQL dialect the query is written in
    #[arg(long, global = true, default_value = "duckdb")]
    pub dialect: String,

    /// Seed a table from a CSV file before analyzing (TABLE=FILE, repeatable)
    #[arg(long, global = true, value_name = "TABLE=FILE")]
    pub load: Vec<String>,
}

/// Available analysis modes
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank per-group contributions to a surprising aggregate value
    Agg(AggArgs),

    /// Detect join-key mismatches and fan-out behind unexpected cardinality
    Join(JoinArgs),

    /// Attribute per-tuple filtering to individual WHERE conjuncts
    Predicate(PredicateArgs),

    /// Find the minimal relaxation that admits a missing tuple
    #[command(name = "why-not")]
    WhyNot(WhyNotArgs),

    /// Print the parsed query model without touching the database
    Model(ModelArgs),
}

/// Arguments for the agg command
#[derive(Args, Debug)]
pub struct AggArgs {
    /// The aggregate query to explain
    #[arg(short, long)]
    pub query: String,

    /// Expectation for the aggregate value
    #[command(flatten)]
    pub expected: ExpectedValue,

    /// Key columns identifying tuples for ungrouped aggregates
    /// (comma-separated; grouped queries attribute per GROUP BY key)
    #[arg(short, long)]
    pub key: Option<String>,
}

/// Exactly one expectation flag, matching the query's aggregate function
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ExpectedValue {
    /// Expected SUM value
    #[arg(long)]
    pub expected_sum: Option<f64>,

    /// Expected COUNT value
    #[arg(long)]
    pub expected_count: Option<f64>,

    /// Expected AVG value
    #[arg(long)]
    pub expected_avg: Option<f64>,
}

impl ExpectedValue {
    pub fn value(&self) -> f64 {
        self.expected_sum
            .or(self.expected_count)
            .or(self.expected_avg)
            .unwrap_or_default()
    }
}

/// Arguments for the join command
#[derive(Args, Debug)]
pub struct JoinArgs {
    /// The join query to explain
    #[arg(short, long)]
    pub query: String,

    /// Expected output row count, to report the gap against
    #[arg(long)]
    pub expected_count: Option<i64>,
}

/// Arguments for the predicate command
#[derive(Args, Debug)]
pub struct PredicateArgs {
    /// The filtering query to explain
    #[arg(short, long)]
    pub query: String,

    /// Key columns identifying tuples across the FROM/JOIN (comma-separated)
    #[arg(short, long)]
    pub key: String,
}

/// Arguments for the why-not command
#[derive(Args, Debug)]
pub struct WhyNotArgs {
    /// The query the tuple is missing from
    #[arg(short, long)]
    pub query: String,

    /// Base table (or alias) the missing tuple lives in
    #[arg(short, long)]
    pub table: String,

    /// Predicate identifying the missing tuple, e.g. "order_id = 5"
    #[arg(short, long)]
    pub key: String,

    /// How much of the search to show
    #[arg(short, long, value_enum, default_value = "summary")]
    pub output: OutputMode,
}

/// Rendering depth for why-not explanations
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Only the minimal constraint set
    Summary,
    /// Minimal set plus every tested relaxation step
    Detailed,
    /// Both views
    Both,
}

/// Arguments for the model command
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// The query to parse
    #[arg(short, long)]
    pub query: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub output: ModelOutput,
}

/// Model output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOutput {
    /// JSON query model
    Json,
    /// Human-readable breakdown
    Pretty,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
