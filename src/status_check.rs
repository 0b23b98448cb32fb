//! check command: Verify bookmark URLs are reachable
//!
//! Prints one JSON report to stdout (compact unless `--pretty`); each input
//! item comes back with its probe outcome under `_meta`.

use crate::config::{CheckConfig, DEFAULT_CONCURRENCY, DEFAULT_USER_AGENT};
use crate::dedupe::CanonicalBookmarkImport;
use crate::probe::{StatusOutcome, StatusProbe};
use crate::settled::run_all_bounded;
use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::io::{self, BufRead};
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Args)]
pub struct CheckArgs {
    /// JSON file with an array of {"url": ...} objects (or `import` output)
    #[arg(value_name = "FILE")]
    file: Option<String>,

    /// Check a single URL
    #[arg(long)]
    url: Option<String>,

    /// Read URLs from stdin (one per line)
    #[arg(long)]
    stdin: bool,

    /// Timeout per URL in milliseconds (250-180000)
    #[arg(long, default_value = "5000", value_parser = clap::value_parser!(u64).range(250..=180_000))]
    timeout: u64,

    /// Max probes in flight (1-256)
    #[arg(short, long, default_value = "16", value_parser = clap::value_parser!(u16).range(1..=256))]
    concurrency: u16,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

/// Anything carrying a URL to probe
pub trait HasUrl {
    fn url(&self) -> &str;
}

impl HasUrl for CanonicalBookmarkImport {
    fn url(&self) -> &str {
        &self.url
    }
}

/// A loosely typed input record; fields besides `url` pass through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkItem {
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LinkItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra: Map::new(),
        }
    }
}

impl HasUrl for LinkItem {
    fn url(&self) -> &str {
        &self.url
    }
}

/// Key under which a probe outcome is attached to an item
pub const META_KEY: &str = "_meta";

/// An input item with its probe outcome under `_meta`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotated<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(rename = "_meta")]
    pub meta: StatusOutcome,
}

/// Report printed by the check command
#[derive(Debug, Serialize)]
pub struct StatusReport<T> {
    pub ok: usize,
    pub failed: usize,
    pub results: Vec<Annotated<T>>,
}

impl<T> StatusReport<T> {
    pub fn new(results: Vec<Annotated<T>>) -> Self {
        let ok = results.iter().filter(|r| r.meta.ok).count();
        Self {
            ok,
            failed: results.len() - ok,
            results,
        }
    }
}

/// Probes a batch of items with bounded fan-out
pub struct StatusChecker {
    probe: StatusProbe,
    config: CheckConfig,
}

impl StatusChecker {
    pub fn new(config: CheckConfig) -> Result<Self> {
        let probe = StatusProbe::new(&config.user_agent)?;
        Ok(Self::with_probe(probe, config))
    }

    pub fn with_probe(probe: StatusProbe, config: CheckConfig) -> Self {
        Self { probe, config }
    }

    /// Probe every item; output order matches input order
    pub async fn check_all<T: HasUrl>(&self, items: Vec<T>) -> Vec<Annotated<T>> {
        let timeout_ms = self.config.timeout_ms;
        let probe = &self.probe;

        let tasks = items.into_iter().map(|item| async move {
            let meta = probe.probe(item.url(), timeout_ms).await;
            debug!(url = %item.url(), status = meta.status, "probed");
            Ok::<_, Infallible>(Annotated { item, meta })
        });

        let settled = run_all_bounded(tasks, self.config.concurrency).await;
        debug!("{}", settled.summary());
        settled.fulfilled
    }
}

/// Probe `items` with a default client and the given per-probe deadline
pub async fn check_all<T: HasUrl>(items: Vec<T>, timeout_ms: u64) -> Result<Vec<Annotated<T>>> {
    let checker = StatusChecker::new(CheckConfig {
        timeout_ms,
        concurrency: DEFAULT_CONCURRENCY,
        user_agent: DEFAULT_USER_AGENT.to_string(),
    })?;
    Ok(checker.check_all(items).await)
}

/// Run the check command
pub async fn run_check(args: CheckArgs) -> Result<()> {
    let items = get_items(&args).await?;

    if items.is_empty() {
        eprintln!("No URLs found.");
        std::process::exit(1);
    }

    info!(
        "Checking {} URLs ({} parallel)...",
        items.len(),
        args.concurrency
    );

    let config = CheckConfig {
        timeout_ms: args.timeout,
        concurrency: args.concurrency as usize,
        ..CheckConfig::default()
    };
    let checker = StatusChecker::new(config)?;
    let report = StatusReport::new(checker.check_all(items).await);

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    info!("Done: {}/{} OK", report.ok, report.ok + report.failed);
    Ok(())
}

/// Get items from file, --url, or stdin
async fn get_items(args: &CheckArgs) -> Result<Vec<LinkItem>> {
    if let Some(url) = &args.url {
        return Ok(vec![LinkItem::new(url.clone())]);
    }

    if args.stdin {
        let stdin = io::stdin();
        let items = stdin
            .lock()
            .lines()
            .map_while(Result::ok)
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .map(LinkItem::new)
            .collect();
        return Ok(items);
    }

    if let Some(file) = &args.file {
        let content = fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read file: {}", file))?;
        return parse_items(&content).with_context(|| format!("Failed to parse file: {}", file));
    }

    eprintln!("Usage:");
    eprintln!("  linkhoard check <items.json>     Check URLs from a JSON array or import output");
    eprintln!("  linkhoard check --url <URL>      Check single URL");
    eprintln!("  linkhoard check --stdin          Read URLs from stdin");
    std::process::exit(1);
}

/// Accept a bare array of items or an `import` report with a `bookmarks` array
fn parse_items(content: &str) -> Result<Vec<LinkItem>> {
    let value: Value = serde_json::from_str(content)?;
    let array = match value {
        Value::Object(mut map) if map.contains_key("bookmarks") => map.remove("bookmarks"),
        other => Some(other),
    };

    let Some(Value::Array(entries)) = array else {
        anyhow::bail!("expected a JSON array of objects with a \"url\" field");
    };

    let mut items = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<LinkItem>(entry) {
            Ok(mut item) => {
                // outcome from an earlier run; replaced by this one
                item.extra.remove(META_KEY);
                items.push(item);
            }
            Err(e) => warn!(index = idx, error = %e, "skipping entry without url"),
        }
    }
    Ok(items)
}
