use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

mod api;
mod artifacts;
mod config;
mod detail;
mod discovery;
mod error;
mod lobby;
mod models;
mod pipeline;
mod retry;
mod snapshot;
mod text;

#[cfg(test)]
mod testutil;

use artifacts::DebugArtifacts;
use config::Config;
use detail::{DetailFetcher, HttpEventSource, Scheduler};
use discovery::{build_http_client, HttpDiscovery};
use lobby::HttpLobby;
use pipeline::{Pipeline, PollLoop};
use snapshot::SnapshotWriter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    info!(
        "Polling every {}s: up to {} events, {} in flight, output {}",
        config.interval_secs,
        config.max_events,
        config.event_concurrency,
        config.outfile.display()
    );

    let http = build_http_client(&config)?;

    let discovery = Arc::new(HttpDiscovery::new(
        http.clone(),
        &config.discovery_url,
        config.http_timeout(),
    ));
    let lobby = Arc::new(HttpLobby::new(
        http.clone(),
        &config.lobby_url,
        config.max_lobby,
        config.http_timeout(),
    ));
    let fetcher = DetailFetcher::new(
        Arc::new(HttpEventSource::new(http)),
        config.event_base()?,
        config.fetch_timeout(),
    );
    let scheduler = Scheduler::new(
        fetcher,
        config.event_concurrency,
        config.event_retry(),
        config.cycle_deadline(),
    );
    let writer = SnapshotWriter::new(&config.outfile, config.tempfile.clone());
    let artifacts = if config.no_debug_artifacts {
        None
    } else {
        Some(DebugArtifacts::new(&config.debug_dir))
    };

    let pipeline = Arc::new(Pipeline::new(
        discovery,
        lobby,
        scheduler,
        writer,
        artifacts,
        config.max_events,
    ));

    if !config.disable_api && !config.once {
        let app = api::router(api::AppState {
            snapshot_path: config.outfile.clone(),
        });
        let addr: SocketAddr = config.api_addr.parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Snapshot API listening on http://{}/live.json", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Snapshot API stopped: {}", e);
            }
        });
    }

    let mut poll = PollLoop::new(pipeline, config.interval());
    let max_cycles = if config.once { Some(1) } else { None };
    let summary = poll
        .run(max_cycles, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    info!("Stopped after {} cycle(s)", summary.cycles);
    Ok(())
}
