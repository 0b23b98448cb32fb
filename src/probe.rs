//! Status probe: one bounded-time HEAD request per URL
//!
//! A probe never fails. Network errors, deadlines and external aborts are
//! folded into a synthetic [`StatusOutcome`]:
//! - deadline exceeded: `408 Timeout`
//! - aborted by the caller: `504 Aborted`
//! - anything else: `500` with a short description

use anyhow::Result;
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Max length of the description carried by a generic failure
const MAX_ERROR_LEN: usize = 120;

/// Result of one probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutcome {
    /// True only for 2xx responses
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
}

/// Why a probe produced no response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("deadline exceeded")]
    Timeout,
    #[error("aborted")]
    Aborted,
    #[error("{0}")]
    Generic(String),
}

impl From<ProbeFailure> for StatusOutcome {
    fn from(failure: ProbeFailure) -> Self {
        let (status, status_text) = match failure {
            ProbeFailure::Timeout => (408, "Timeout".to_string()),
            ProbeFailure::Aborted => (504, "Aborted".to_string()),
            ProbeFailure::Generic(text) => (500, text),
        };
        StatusOutcome {
            ok: false,
            status,
            status_text,
        }
    }
}

impl ProbeFailure {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ProbeFailure::Timeout;
        }
        let err = err.without_url();
        ProbeFailure::Generic(truncate(&describe(&err), MAX_ERROR_LEN))
    }
}

/// Issues HEAD requests through one shared HTTP client
#[derive(Debug, Clone)]
pub struct StatusProbe {
    client: reqwest::Client,
}

impl StatusProbe {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Probe `url`, giving up after `timeout_ms`
    pub async fn probe(&self, url: &str, timeout_ms: u64) -> StatusOutcome {
        let (_handle, registration) = AbortHandle::new_pair();
        self.probe_abortable(url, timeout_ms, registration).await
    }

    /// Probe `url`; aborting the paired [`AbortHandle`] ends it with `504 Aborted`
    pub async fn probe_abortable(
        &self,
        url: &str,
        timeout_ms: u64,
        registration: AbortRegistration,
    ) -> StatusOutcome {
        match self.head(url, timeout_ms, registration).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                tracing::debug!(url = %url, %failure, "probe failed");
                failure.into()
            }
        }
    }

    async fn head(
        &self,
        url: &str,
        timeout_ms: u64,
        registration: AbortRegistration,
    ) -> Result<StatusOutcome, ProbeFailure> {
        let request = self.client.head(url).send();
        let deadline = tokio::time::timeout(Duration::from_millis(timeout_ms), request);

        let response = Abortable::new(deadline, registration)
            .await
            .map_err(|_| ProbeFailure::Aborted)?
            .map_err(|_| ProbeFailure::Timeout)?
            .map_err(ProbeFailure::from_reqwest)?;

        let status = response.status();
        Ok(StatusOutcome {
            ok: status.is_success(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }
}

/// Error text with its causes, e.g. "error sending request: connection refused"
fn describe(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
