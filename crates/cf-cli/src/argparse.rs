use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cfq",
    about = "Build delivery API queries and resolve collection payloads",
    version,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Pick which subcommand to use
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the query string for a set of filters
    Query(QueryArgs),
    /// Parse a query string and print it in canonical order
    Parse(ParseArgs),
    /// Resolve the links in a collection payload
    Resolve(ResolveArgs),
}

#[derive(Args, Default)]
pub struct QueryArgs {
    /// Restrict to one content type
    #[arg(long)]
    pub content_type: Option<String>,

    /// Equality filter, FIELD=VALUE
    #[arg(long = "eq", value_name = "FIELD=VALUE")]
    pub equals: Vec<String>,

    /// Inequality filter, FIELD=VALUE
    #[arg(long = "ne", value_name = "FIELD=VALUE")]
    pub not_equals: Vec<String>,

    /// Matches any of the values, FIELD=A,B,C
    #[arg(long = "in", value_name = "FIELD=VALUES")]
    pub includes: Vec<String>,

    /// Matches none of the values, FIELD=A,B,C
    #[arg(long = "nin", value_name = "FIELD=VALUES")]
    pub excludes: Vec<String>,

    /// Matches all of the values, FIELD=A,B,C
    #[arg(long = "all", value_name = "FIELD=VALUES")]
    pub includes_all: Vec<String>,

    /// Existence check, FIELD=true or FIELD=false
    #[arg(long, value_name = "FIELD=BOOL")]
    pub exists: Vec<String>,

    /// Full text match on one field, FIELD=TEXT
    #[arg(long = "match", value_name = "FIELD=TEXT")]
    pub matches: Vec<String>,

    #[arg(long, value_name = "FIELD=VALUE")]
    pub lt: Vec<String>,

    #[arg(long, value_name = "FIELD=VALUE")]
    pub lte: Vec<String>,

    #[arg(long, value_name = "FIELD=VALUE")]
    pub gt: Vec<String>,

    #[arg(long, value_name = "FIELD=VALUE")]
    pub gte: Vec<String>,

    /// Full text search across all fields
    #[arg(long = "search", value_name = "TERM")]
    pub full_text: Option<String>,

    /// Sort field, prefixed with '-' for descending; repeat for tie breakers
    #[arg(long, allow_hyphen_values = true)]
    pub order: Vec<String>,

    #[arg(long)]
    pub limit: Option<i64>,

    #[arg(long)]
    pub skip: Option<i64>,

    /// Link levels to include, 0 to 10
    #[arg(long)]
    pub include: Option<i64>,

    #[arg(long)]
    pub locale: Option<String>,

    /// Comma separated field projection
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Asset mime type group, e.g. image
    #[arg(long)]
    pub mime_type: Option<String>,

    #[arg(long)]
    pub links_to_entry: Option<String>,

    #[arg(long)]
    pub links_to_asset: Option<String>,
}

#[derive(Args)]
pub struct ParseArgs {
    /// Query string, with or without a leading '?'
    pub query: String,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// JSON file holding a collection payload
    pub payload: PathBuf,

    /// Link levels to resolve, 0 to 10
    #[arg(long, default_value_t = 1)]
    pub include: i64,

    /// Treat items as assets instead of entries
    #[arg(long)]
    pub assets: bool,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}
