//! import command: Import browser-exported bookmark files
//!
//! Every file is read in turn, its anchors normalized, and the combined pool
//! deduplicated once, so duplicates across files resolve globally.

use crate::add_date::decode_add_date;
use crate::anchors::{extract_anchors, AnchorCandidate};
use crate::canonical::{try_canonicalize, UrlPolicy};
use crate::config::{load_policy, ImportConfig};
use crate::dedupe::{dedupe, CanonicalBookmarkImport, ImportRecord};
use crate::title::normalize_title;
use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Args)]
pub struct ImportArgs {
    /// Bookmark HTML files, directories or glob patterns
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// YAML file with allowed_protocols / blocked_hostnames / blocked_search_params
    #[arg(long, value_name = "FILE")]
    pub policy: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Something that can be read to text as one bookmark export
pub trait BookmarkSource {
    /// Display name used in logs and errors
    fn name(&self) -> String;

    /// Read the whole source as text
    fn read_text(&self) -> impl Future<Output = Result<String>> + Send;
}

impl BookmarkSource for PathBuf {
    fn name(&self) -> String {
        self.display().to_string()
    }

    async fn read_text(&self) -> Result<String> {
        let bytes = tokio::fs::read(self)
            .await
            .with_context(|| format!("Failed to read file: {}", self.display()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// An already loaded export, e.g. an uploaded form field
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    pub name: String,
    pub contents: String,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

impl BookmarkSource for InMemoryFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn read_text(&self) -> Result<String> {
        Ok(self.contents.clone())
    }
}

/// Outcome of one import batch
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub files: usize,
    pub anchors: usize,
    pub imported: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub bookmarks: Vec<CanonicalBookmarkImport>,
}

impl ImportReport {
    /// "N imported, M rejected"
    pub fn summary(&self) -> String {
        format!("{} imported, {} rejected", self.imported, self.rejected)
    }
}

/// Run the import command
pub async fn run_import(args: ImportArgs) -> Result<()> {
    let files = expand_files(&args.files).await?;
    if files.is_empty() {
        bail!("No bookmark files found");
    }

    let policy = match &args.policy {
        Some(path) => load_policy(path).await?,
        None => UrlPolicy::default(),
    };
    let config = ImportConfig { policy };

    info!("Importing {} file(s)...", files.len());
    let report = import_report(&files, &config).await?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    info!("Done: {}", report.summary());
    Ok(())
}

/// Import and deduplicate all sources as one batch
pub async fn import_files<S: BookmarkSource>(
    sources: &[S],
    config: &ImportConfig,
) -> Result<Vec<CanonicalBookmarkImport>> {
    Ok(import_report(sources, config).await?.bookmarks)
}

/// Like [`import_files`] but keeps the batch statistics
pub async fn import_report<S: BookmarkSource>(
    sources: &[S],
    config: &ImportConfig,
) -> Result<ImportReport> {
    let mut records = Vec::new();
    let mut anchors = 0;
    let mut rejected = 0;

    for source in sources {
        let html = source.read_text().await?;
        let candidates = extract_anchors(&html);
        info!(file = %source.name(), anchors = candidates.len(), "scanned");

        anchors += candidates.len();
        for candidate in candidates {
            let record = normalize_candidate(candidate, &config.policy);
            if record.url.is_none() {
                rejected += 1;
            }
            records.push(record);
        }
    }

    let accepted = records.len() - rejected;
    let bookmarks = dedupe(records);

    Ok(ImportReport {
        files: sources.len(),
        anchors,
        imported: bookmarks.len(),
        rejected,
        duplicates: accepted - bookmarks.len(),
        bookmarks,
    })
}

/// Run one anchor through URL, title and date normalization
pub fn normalize_candidate(candidate: AnchorCandidate, policy: &UrlPolicy) -> ImportRecord {
    let url = match candidate.href.as_deref() {
        Some(href) => match try_canonicalize(href, policy) {
            Ok(url) => Some(url),
            Err(reason) => {
                debug!(%reason, "rejected anchor");
                None
            }
        },
        None => {
            debug!(text = %candidate.inner_text, "anchor without href");
            None
        }
    };

    ImportRecord {
        url,
        title: normalize_title(&candidate.inner_text),
        created_at: decode_add_date(candidate.add_date_raw.as_deref()),
    }
}

/// Expand file arguments to actual file paths, in argument order
async fn expand_files(patterns: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let pattern_str = pattern.to_string_lossy();

        if pattern_str.contains('*') {
            let mut matched: Vec<PathBuf> = glob::glob(&pattern_str)?
                .collect::<std::result::Result<_, _>>()?;
            matched.retain(|p| p.is_file());
            matched.sort();
            files.extend(matched);
        } else if pattern.is_dir() {
            let mut entries = tokio::fs::read_dir(pattern).await?;
            let mut found = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.is_file() && is_html(&path) {
                    found.push(path);
                }
            }
            found.sort();
            files.extend(found);
        } else {
            // unreadable paths fail the whole batch when read
            files.push(pattern.clone());
        }
    }

    Ok(files)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}
