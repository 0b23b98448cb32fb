//! Import deduplication
//!
//! Records are ordered by creation time and the earliest record for each
//! URL wins. The resulting batch is unique by URL and ascending by
//! `created_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A normalized record before deduplication; `url` is `None` when rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub url: Option<String>,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A bookmark that passed every sanitation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalBookmarkImport {
    pub url: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Sort by `created_at` (stable) and keep the first record per URL
pub fn dedupe(mut records: Vec<ImportRecord>) -> Vec<CanonicalBookmarkImport> {
    records.sort_by_key(|r| r.created_at);

    let mut seen = HashSet::new();
    let mut batch = Vec::with_capacity(records.len());

    for record in records {
        let Some(url) = record.url.filter(|u| !u.is_empty()) else {
            continue;
        };
        if seen.insert(url.clone()) {
            batch.push(CanonicalBookmarkImport {
                url,
                title: record.title,
                created_at: record.created_at,
            });
        } else {
            tracing::debug!(url = %url, "dropping later duplicate");
        }
    }

    batch
}
