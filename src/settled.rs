//! Settled union: run many fallible futures, keep every outcome
//!
//! One failing task never aborts its siblings. Results are partitioned into
//! `fulfilled` and `rejected`, each in original task order.

use futures::future::join_all;
use futures::{stream, StreamExt};
use serde::Serialize;
use std::future::Future;

/// Partitioned outcomes of a batch of tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settled<T, E> {
    pub fulfilled: Vec<T>,
    pub rejected: Vec<E>,
}

impl<T, E> Default for Settled<T, E> {
    fn default() -> Self {
        Self {
            fulfilled: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T, E> FromIterator<Result<T, E>> for Settled<T, E> {
    fn from_iter<I: IntoIterator<Item = Result<T, E>>>(iter: I) -> Self {
        let mut settled = Settled::default();
        for result in iter {
            match result {
                Ok(value) => settled.fulfilled.push(value),
                Err(err) => settled.rejected.push(err),
            }
        }
        settled
    }
}

impl<T, E> Settled<T, E> {
    pub fn total(&self) -> usize {
        self.fulfilled.len() + self.rejected.len()
    }

    /// "N fulfilled, M rejected"
    pub fn summary(&self) -> String {
        format!(
            "{} fulfilled, {} rejected",
            self.fulfilled.len(),
            self.rejected.len()
        )
    }
}

/// Run every task at once
pub async fn run_all<I, F, T, E>(tasks: I) -> Settled<T, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    join_all(tasks).await.into_iter().collect()
}

/// Run tasks with at most `limit` in flight (a zero limit is treated as one)
pub async fn run_all_bounded<I, F, T, E>(tasks: I, limit: usize) -> Settled<T, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    // a finished task frees its slot even while an earlier one is still running
    let mut indexed: Vec<(usize, Result<T, E>)> = stream::iter(tasks.into_iter().enumerate())
        .map(|(idx, task)| async move { (idx, task.await) })
        .buffer_unordered(limit.max(1))
        .collect()
        .await;

    indexed.sort_by_key(|(idx, _)| *idx);
    indexed.into_iter().map(|(_, result)| result).collect()
}
