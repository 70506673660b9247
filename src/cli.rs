//! Command-line surface.
//!
//! The interesting work happens in [`crate::query`] and [`crate::render`];
//! this module only declares the clap surface and converts the `list` args
//! into a CLI-agnostic [`QueryRequest`].

use clap::{Args, Parser, Subcommand};

use crate::query::QueryRequest;

#[derive(Debug, Parser)]
#[command(name = "triage", version, about = "Query and render crash-analytics aggregates")]
pub struct Cli {
    /// Accept invalid TLS certificates.
    #[arg(short = 'k', global = true)]
    pub insecure: bool,

    /// Enable request/response debug logging.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query a project and render grouped aggregates.
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show a project's attribute metadata.
    Describe {
        /// Project as `[universe/]project`.
        name: String,
        /// Only show attributes whose name matches this regex.
        filter: Option<String>,
    },

    /// Fetch one object's raw record.
    Get {
        /// Project as `[universe/]project`.
        name: String,
        /// Object identifier.
        object: String,
    },

    /// Authenticate against an endpoint and persist the session.
    Login {
        /// Backend endpoint URL.
        endpoint: String,
    },

    /// Fail with the given message (exercises the error path).
    Error {
        message: String,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Project as `[universe/]project`.
    pub name: String,

    /// Filter predicate as `<column>,<operation>,<value>`; repeatable,
    /// multiple predicates on one column are conjunctive.
    #[arg(long)]
    pub filter: Vec<String>,

    /// Select raw columns instead of aggregating.
    #[arg(long)]
    pub select: Vec<String>,

    /// Group results by this attribute.
    #[arg(long)]
    pub factor: Option<String>,

    /// Restrict to objects newer than e.g. `1d`, `2w`, `30m`.
    #[arg(long)]
    pub age: Option<String>,

    /// Fold: first value of the attribute per group.
    #[arg(long)]
    pub head: Vec<String>,

    /// Fold: category breakdown of the attribute per group.
    #[arg(long)]
    pub histogram: Vec<String>,

    /// Fold: representative value of the attribute per group.
    #[arg(long)]
    pub unique: Vec<String>,

    /// Fold: bucketed numeric distribution of the attribute per group.
    #[arg(long)]
    pub quantize: Vec<String>,

    /// Fold: bucketed numeric distribution of the attribute per group.
    #[arg(long)]
    pub bin: Vec<String>,

    /// Fold: min/max of the attribute per group.
    #[arg(long)]
    pub range: Vec<String>,

    /// Order groups by this attribute.
    #[arg(long)]
    pub sort: Option<String>,

    /// Render at most this many groups.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Invert the sort order.
    #[arg(long)]
    pub reverse: bool,

    /// Print the wire query instead of issuing it.
    #[arg(long)]
    pub query: bool,

    /// Print the raw response JSON instead of rendering.
    #[arg(long)]
    pub raw: bool,
}

impl ListArgs {
    pub fn to_request(&self) -> QueryRequest {
        QueryRequest {
            filters: self.filter.clone(),
            select: self.select.clone(),
            factor: self.factor.clone(),
            age: self.age.clone(),
            head: self.head.clone(),
            histogram: self.histogram.clone(),
            unique: self.unique.clone(),
            quantize: self.quantize.clone(),
            bin: self.bin.clone(),
            range: self.range.clone(),
        }
    }
}
