//! cfq
//!
//! Builds delivery API query strings from flags and resolves the links in
//! saved collection payloads.

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cf_core::config::ClientOptions;
use cf_delivery::{Asset, Entry, Page};
use cf_query::{MimeTypeRestriction, Query, QueryBuilder, SortOrder};

mod argparse;

use argparse::{Cli, Commands, ParseArgs, QueryArgs, ResolveArgs};

fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let output = match cli.command {
        Commands::Query(args) => {
            let default_locale = match ClientOptions::from_env() {
                Ok(options) => options.default_locale,
                Err(e) => {
                    debug!("No client options in environment: {}", e);
                    None
                }
            };
            build_query(&args, default_locale)?.to_query_string()
        }
        Commands::Parse(args) => parse_query(&args)?,
        Commands::Resolve(args) => {
            let raw = std::fs::read_to_string(&args.payload)
                .with_context(|| format!("reading {}", args.payload.display()))?;
            let payload: Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not JSON", args.payload.display()))?;
            resolve_payload(&args, &payload)?
        }
    };

    println!("{}", output);
    Ok(())
}

/// Initialize tracing/logging on stderr so stdout stays machine readable
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,cfq=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();
}

fn split_pair(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{}'", raw))
}

fn split_list(raw: &str) -> anyhow::Result<(&str, Vec<&str>)> {
    let (field, values) = split_pair(raw)?;
    Ok((field, values.split(',').collect()))
}

fn build_query(args: &QueryArgs, default_locale: Option<String>) -> anyhow::Result<QueryBuilder> {
    let mut builder = QueryBuilder::new();

    if let Some(content_type) = &args.content_type {
        builder = builder.content_type_is(content_type);
    }
    for raw in &args.equals {
        let (field, value) = split_pair(raw)?;
        builder = builder.field_equals(field, value)?;
    }
    for raw in &args.not_equals {
        let (field, value) = split_pair(raw)?;
        builder = builder.field_does_not_equal(field, value)?;
    }
    for raw in &args.includes {
        let (field, values) = split_list(raw)?;
        builder = builder.field_includes(field, values)?;
    }
    for raw in &args.excludes {
        let (field, values) = split_list(raw)?;
        builder = builder.field_excludes(field, values)?;
    }
    for raw in &args.includes_all {
        let (field, values) = split_list(raw)?;
        builder = builder.field_includes_all(field, values)?;
    }
    for raw in &args.exists {
        let (field, value) = split_pair(raw)?;
        let must_exist = match value {
            "true" => true,
            "false" => false,
            other => bail!("--exists expects true or false, got '{}'", other),
        };
        builder = builder.field_exists(field, must_exist)?;
    }
    for raw in &args.matches {
        let (field, text) = split_pair(raw)?;
        builder = builder.field_matches(field, text)?;
    }
    for raw in &args.lt {
        let (field, value) = split_pair(raw)?;
        builder = builder.field_less_than(field, value)?;
    }
    for raw in &args.lte {
        let (field, value) = split_pair(raw)?;
        builder = builder.field_less_than_or_equal_to(field, value)?;
    }
    for raw in &args.gt {
        let (field, value) = split_pair(raw)?;
        builder = builder.field_greater_than(field, value)?;
    }
    for raw in &args.gte {
        let (field, value) = split_pair(raw)?;
        builder = builder.field_greater_than_or_equal_to(field, value)?;
    }
    if let Some(term) = &args.full_text {
        builder = builder.full_text_search(term)?;
    }

    if !args.order.is_empty() {
        let mut sorts = SortOrder::new();
        for order in &args.order {
            sorts.extend(SortOrder::parse(order)?);
        }
        builder = builder.order_by(sorts)?;
    }
    if let Some(limit) = args.limit {
        builder = builder.limit(limit)?;
    }
    if let Some(skip) = args.skip {
        builder = builder.skip(skip)?;
    }
    if let Some(include) = args.include {
        builder = builder.include(include)?;
    }
    if let Some(locale) = args.locale.clone().or(default_locale) {
        builder = builder.locale_is(locale);
    }
    if !args.select.is_empty() {
        builder = builder.select(&args.select)?;
    }
    if let Some(group) = &args.mime_type {
        let restriction = MimeTypeRestriction::from_str(group)
            .ok_or_else(|| anyhow!("unknown mime type group '{}'", group))?;
        builder = builder.mime_type_is(restriction);
    }
    if let Some(id) = &args.links_to_entry {
        builder = builder.links_to_entry(id);
    }
    if let Some(id) = &args.links_to_asset {
        builder = builder.links_to_asset(id);
    }

    info!(filters = builder.query().filters.len(), "Built query");
    Ok(builder)
}

fn parse_query(args: &ParseArgs) -> anyhow::Result<String> {
    let query = Query::parse(&args.query)?;
    Ok(query.to_query_string())
}

fn resolve_payload(args: &ResolveArgs, payload: &Value) -> anyhow::Result<String> {
    let items: Vec<Value> = if args.assets {
        let page = Page::<Asset>::from_payload(payload)?.resolve_links(args.include);
        info!(items = page.len(), total = page.total, "Resolved assets");
        page.iter().map(Asset::to_json).collect()
    } else {
        let page = Page::<Entry>::from_payload(payload)?.resolve_links(args.include);
        info!(
            items = page.len(),
            total = page.total,
            unresolvable = page.errors.len(),
            "Resolved entries"
        );
        page.iter().map(Entry::to_json).collect()
    };

    let items = Value::Array(items);
    let rendered = if args.compact {
        serde_json::to_string(&items)?
    } else {
        serde_json::to_string_pretty(&items)?
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cli_parses_query_flags() {
        let cli = Cli::try_parse_from([
            "cfq",
            "query",
            "--content-type",
            "cat",
            "--eq",
            "fields.color=rainbow",
            "--order",
            "-sys.createdAt",
            "--limit",
            "3",
        ])
        .unwrap();

        let Commands::Query(args) = cli.command else {
            panic!("expected query subcommand");
        };
        let builder = build_query(&args, None).unwrap();
        assert_eq!(
            builder.to_query_string(),
            "content_type=cat&fields.color=rainbow&order=-sys.createdAt&limit=3"
        );
    }

    #[test]
    fn test_build_query_lists_and_locale() {
        let args = QueryArgs {
            includes: vec!["fields.likes=rainbows,fish".to_string()],
            exists: vec!["fields.bestFriend=false".to_string()],
            order: vec!["fields.name".to_string(), "-sys.updatedAt".to_string()],
            select: vec!["sys.id".to_string(), "fields.name".to_string()],
            ..Default::default()
        };

        let qs = build_query(&args, Some("tlh".to_string())).unwrap().to_query_string();
        assert_eq!(
            qs,
            "fields.likes[in]=rainbows,fish&fields.bestFriend[exists]=false\
             &order=fields.name,-sys.updatedAt&locale=tlh&select=sys.id,fields.name"
        );
    }

    #[test]
    fn test_build_query_rejects_bad_input() {
        let bad_pair = QueryArgs {
            equals: vec!["fields.color".to_string()],
            ..Default::default()
        };
        assert!(build_query(&bad_pair, None).is_err());

        let bad_limit = QueryArgs {
            limit: Some(0),
            ..Default::default()
        };
        assert!(build_query(&bad_limit, None).is_err());

        let bad_exists = QueryArgs {
            exists: vec!["fields.name=maybe".to_string()],
            ..Default::default()
        };
        assert!(build_query(&bad_exists, None).is_err());

        let bad_mime = QueryArgs {
            mime_type: Some("hologram".to_string()),
            ..Default::default()
        };
        assert!(build_query(&bad_mime, None).is_err());
    }

    #[test]
    fn test_parse_canonicalizes() {
        let args = ParseArgs {
            query: "?limit=3&content_type=cat".to_string(),
        };
        assert_eq!(parse_query(&args).unwrap(), "content_type=cat&limit=3");
    }

    #[test]
    fn test_resolve_payload() {
        let payload = json!({
            "total": 1,
            "items": [{
                "sys": {"id": "nyancat", "type": "Entry"},
                "fields": {"bestFriend": {"sys": {"type": "Link", "linkType": "Entry", "id": "happycat"}}}
            }],
            "includes": {"Entry": [{"sys": {"id": "happycat", "type": "Entry"}, "fields": {"name": "Happy Cat"}}]}
        });
        let args = ResolveArgs {
            payload: "payload.json".into(),
            include: 1,
            assets: false,
            compact: true,
        };

        let rendered: Value = serde_json::from_str(&resolve_payload(&args, &payload).unwrap()).unwrap();
        assert_eq!(rendered[0]["fields"]["bestFriend"]["fields"]["name"], "Happy Cat");
    }
}
