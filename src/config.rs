//! Runtime configuration for the import and status pipelines

use crate::canonical::UrlPolicy;
use anyhow::{Context, Result};
use std::path::Path;

/// Default per-probe deadline in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Default number of probes in flight
pub const DEFAULT_CONCURRENCY: usize = 16;

/// User agent sent with every status probe
pub const DEFAULT_USER_AGENT: &str = concat!("linkhoard/", env!("CARGO_PKG_VERSION"));

/// Configuration for the import pipeline
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    pub policy: UrlPolicy,
}

/// Configuration for the status pipeline
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub timeout_ms: u64,
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            concurrency: DEFAULT_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Load a [`UrlPolicy`] from a YAML file; missing keys keep their defaults
pub async fn load_policy(path: &Path) -> Result<UrlPolicy> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read policy: {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(UrlPolicy::default());
    }

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse policy: {}", path.display()))
}
