//! One poll cycle end to end, and the loop that repeats it.
//!
//! ```text
//!  Idle ──timer──▶ Running: lobby ∥ discovery ─▶ scheduler ─▶ aggregate ─▶ write
//!   ▲                                                                        │
//!   └──────────────────────── always, success or failure ◀──────────────────┘
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::artifacts::DebugArtifacts;
use crate::detail::Scheduler;
use crate::discovery::{extract_event_ids, DiscoverySource};
use crate::error::FetchError;
use crate::lobby::LobbyReader;
use crate::models::EventId;
use crate::snapshot::{aggregate, SnapshotWriter};

/// Counts and failures of one completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub fetched_at: DateTime<Utc>,
    pub ids_discovered: usize,
    pub events_scraped: usize,
    pub lobby_rows: usize,
    pub failures: Vec<(EventId, FetchError)>,
}

pub struct Pipeline {
    discovery: Arc<dyn DiscoverySource>,
    lobby: Arc<dyn LobbyReader>,
    scheduler: Scheduler,
    writer: SnapshotWriter,
    artifacts: Option<DebugArtifacts>,
    max_events: usize,
    cycles: AtomicU64,
}

impl Pipeline {
    pub fn new(
        discovery: Arc<dyn DiscoverySource>,
        lobby: Arc<dyn LobbyReader>,
        scheduler: Scheduler,
        writer: SnapshotWriter,
        artifacts: Option<DebugArtifacts>,
        max_events: usize,
    ) -> Self {
        Pipeline {
            discovery,
            lobby,
            scheduler,
            writer,
            artifacts,
            max_events,
            cycles: AtomicU64::new(0),
        }
    }

    /// Run one full cycle. An error means nothing was written this cycle and
    /// the previously published snapshot is still in place.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;

        let (lobby, ids) =
            futures_util::future::join(self.lobby.read_lobby(), self.discover_ids()).await;
        let lobby = lobby.with_context(|| format!("Lobby read via {} failed", self.lobby.name()))?;
        if let Some(artifacts) = &self.artifacts {
            artifacts.save_lobby(&lobby.raw);
        }

        let ids_discovered = ids.len();
        let picked: Vec<EventId> = ids.into_iter().take(self.max_events).collect();
        let outcomes = self.scheduler.run(&picked).await;

        let fetched_at = Utc::now();
        let (snapshot, failures) = aggregate(cycle, fetched_at, lobby.rows, outcomes);
        for (id, e) in &failures {
            warn!("Event {} dropped from cycle {}: [{}] {}", id, cycle, e.kind(), e);
        }

        self.writer
            .write(&snapshot)
            .with_context(|| format!("Snapshot write to {} failed", self.writer.path().display()))?;

        Ok(CycleReport {
            cycle,
            fetched_at,
            ids_discovered,
            events_scraped: snapshot.events.len(),
            lobby_rows: snapshot.lobby.len(),
            failures,
        })
    }

    /// Deduplicated ids for this cycle; any discovery failure yields none.
    async fn discover_ids(&self) -> Vec<EventId> {
        match self.discovery.fetch_listing().await {
            Ok(payload) => {
                if let Some(artifacts) = &self.artifacts {
                    artifacts.save_discovery(&payload);
                }
                let ids = extract_event_ids(&payload);
                if ids.is_empty() {
                    warn!("Discovery returned 0 event ids; see the last_api.json artifact for its shape");
                } else {
                    info!(
                        "Discovery returned {} event ids (fetching up to {})",
                        ids.len(),
                        self.max_events
                    );
                }
                ids
            }
            Err(e) => {
                warn!("[{}] discovery failed, no events this cycle: {}", self.discovery.name(), e);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Running,
}

/// What a finished `PollLoop::run` hands back.
#[derive(Debug, Default)]
pub struct PollSummary {
    /// Cycles started, including failed ones
    pub cycles: u64,
    /// Per-cycle outcomes, collected only for a bounded run
    pub reports: Vec<Result<CycleReport>>,
}

/// Runs cycles back to back with `interval` of idle time in between.
/// Cycles never overlap; a slow cycle delays the next one.
pub struct PollLoop {
    pipeline: Arc<Pipeline>,
    interval: Duration,
    state: PollState,
}

impl PollLoop {
    pub fn new(pipeline: Arc<Pipeline>, interval: Duration) -> Self {
        PollLoop {
            pipeline,
            interval,
            state: PollState::Idle,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Loop until `shutdown` resolves, or until `max_cycles` cycles have run.
    ///
    /// A cycle still running at shutdown is aborted along with its fetches.
    pub async fn run<F>(&mut self, max_cycles: Option<u64>, shutdown: F) -> PollSummary
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = PollSummary::default();

        loop {
            self.state = PollState::Running;
            summary.cycles += 1;
            // Own task so even a panic ends at the cycle boundary.
            let pipeline = Arc::clone(&self.pipeline);
            let mut task = tokio::spawn(async move { pipeline.run_cycle().await });
            let joined = tokio::select! {
                joined = &mut task => Some(joined),
                _ = &mut shutdown => None,
            };
            self.state = PollState::Idle;
            let Some(joined) = joined else {
                task.abort();
                info!("Shutdown requested during a cycle; aborted it");
                break;
            };
            let outcome = log_cycle(joined);
            if max_cycles.is_some() {
                summary.reports.push(outcome);
            }

            if max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested; stopping poll loop");
                    break;
                }
            }
        }

        summary
    }
}

fn log_cycle(joined: Result<Result<CycleReport>, tokio::task::JoinError>) -> Result<CycleReport> {
    let outcome = match joined {
        Ok(result) => result,
        Err(join_err) => Err(anyhow::anyhow!("cycle task panicked: {}", join_err)),
    };

    match &outcome {
        Ok(report) => info!(
            cycle = report.cycle,
            fetched_at = %report.fetched_at.to_rfc3339(),
            ids = report.ids_discovered,
            events = report.events_scraped,
            failed = report.failures.len(),
            lobby_rows = report.lobby_rows,
            "Wrote snapshot"
        ),
        Err(e) => error!("Cycle failed: {:#}", e),
    }
    outcome
}
