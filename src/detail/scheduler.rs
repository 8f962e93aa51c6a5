//! Bounded fan-out of detail fetches for one poll cycle.
//!
//! Every id gets its own task; a shared semaphore caps how many fetch
//! attempts are in flight. Permits are held per attempt, not across backoff
//! sleeps, so a retrying id never blocks a slot while it waits.
//!
//! Each task owns its result until it is joined, so there is no shared
//! mutable state beyond the semaphore itself.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::error::FetchError;
use crate::models::{EventDetail, EventId};
use crate::retry::RetryPolicy;

use super::fetcher::DetailFetcher;

pub type FetchOutcome = Result<EventDetail, FetchError>;

#[derive(Clone)]
pub struct Scheduler {
    fetcher: DetailFetcher,
    concurrency: usize,
    retry: RetryPolicy,
    cycle_deadline: Duration,
}

impl Scheduler {
    pub fn new(
        fetcher: DetailFetcher,
        concurrency: usize,
        retry: RetryPolicy,
        cycle_deadline: Duration,
    ) -> Self {
        Scheduler {
            fetcher,
            concurrency: concurrency.max(1),
            retry,
            cycle_deadline,
        }
    }

    /// Fetch every id, returning exactly one outcome per distinct input id.
    ///
    /// Ids still outstanding at the cycle deadline are cancelled and recorded
    /// as `Timeout`; outcomes already collected are kept as they are.
    pub async fn run(&self, ids: &[EventId]) -> BTreeMap<EventId, FetchOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for id in ids {
            let id = id.clone();
            let fetcher = self.fetcher.clone();
            let semaphore = Arc::clone(&semaphore);
            let retry = self.retry;
            tasks.spawn(async move {
                let outcome = fetch_with_retry(&fetcher, &semaphore, &retry, &id).await;
                (id, outcome)
            });
        }

        let deadline = tokio::time::Instant::now() + self.cycle_deadline;
        let mut results = BTreeMap::new();
        let mut deadline_hit = false;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((id, outcome)))) => {
                    results.insert(id, outcome);
                }
                Ok(Some(Err(e))) => {
                    error!("Event fetch task failed: {}", e);
                }
                Ok(None) => break,
                Err(_) => {
                    deadline_hit = true;
                    break;
                }
            }
        }

        if deadline_hit {
            warn!(
                "Cycle deadline of {:?} reached with {} fetch(es) outstanding; cancelling",
                self.cycle_deadline,
                tasks.len()
            );
            tasks.abort_all();
        }

        for id in ids {
            results.entry(id.clone()).or_insert_with(|| {
                if deadline_hit {
                    Err(FetchError::Timeout)
                } else {
                    Err(FetchError::Transient("fetch task aborted".into()))
                }
            });
        }

        results
    }
}

async fn fetch_with_retry(
    fetcher: &DetailFetcher,
    semaphore: &Semaphore,
    retry: &RetryPolicy,
    id: &EventId,
) -> FetchOutcome {
    let mut attempt = 0;
    loop {
        let outcome = {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| FetchError::Transient(format!("semaphore closed: {}", e)))?;
            fetcher.fetch(id).await
        };

        match outcome {
            Ok(detail) => return Ok(detail),
            Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                let delay = retry.delay_for(attempt);
                debug!(
                    "Event {} attempt {} failed ({}); retrying in {:?}",
                    id,
                    attempt + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
