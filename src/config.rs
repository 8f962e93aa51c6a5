use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::retry::RetryPolicy;

/// Live odds snapshot poller
#[derive(Parser, Debug, Clone)]
#[command(name = "odds-snapshot", version, about)]
pub struct Config {
    /// Lobby capture URL (listing of all offered matches)
    #[arg(long, env = "LOBBY_URL", default_value = "https://www.radheexch.xyz/game/4")]
    pub lobby_url: String,

    /// Base URL of event pages; the event id is appended
    #[arg(
        long,
        env = "EVENT_BASE_URL",
        default_value = "https://www.radheexch.xyz/event/4/"
    )]
    pub event_base_url: String,

    /// Discovery endpoint returning the current event ids (any JSON shape)
    #[arg(
        long,
        env = "DISCOVERY_URL",
        default_value = "https://api.radheexch.xyz/delaymarkets/markets/eventtype/4"
    )]
    pub discovery_url: String,

    /// Seconds to sleep between poll cycles
    #[arg(long, env = "INTERVAL_SECS", default_value = "20")]
    pub interval_secs: u64,

    /// Maximum lobby rows kept per snapshot
    #[arg(long, env = "MAX_LOBBY", default_value = "25")]
    pub max_lobby: usize,

    /// Maximum event pages fetched per cycle
    #[arg(long, env = "MAX_EVENTS", default_value = "20")]
    pub max_events: usize,

    /// Event page fetches in flight at once
    #[arg(long, env = "EVENT_CONCURRENCY", default_value = "4")]
    pub event_concurrency: usize,

    /// Per-fetch timeout for one event page (milliseconds)
    #[arg(long, env = "FETCH_TIMEOUT_MS", default_value = "45000")]
    pub fetch_timeout_ms: u64,

    /// HTTP client timeout for discovery and lobby requests (seconds)
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "12")]
    pub http_timeout_secs: u64,

    /// Soft deadline for all event fetches of one cycle (seconds)
    #[arg(long, env = "CYCLE_DEADLINE_SECS", default_value = "180")]
    pub cycle_deadline_secs: u64,

    /// Retries for a timed-out or transiently failing event fetch
    #[arg(long, env = "MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// First retry delay (milliseconds); doubles per attempt
    #[arg(long, env = "RETRY_BASE_MS", default_value = "1000")]
    pub retry_base_ms: u64,

    /// Upper bound on a single retry delay (milliseconds)
    #[arg(long, env = "RETRY_MAX_MS", default_value = "10000")]
    pub retry_max_ms: u64,

    /// Add random jitter to retry delays
    #[arg(long, env = "RETRY_JITTER", default_value = "false")]
    pub retry_jitter: bool,

    /// Snapshot output file
    #[arg(long, env = "OUTFILE", default_value = "data/live.json")]
    pub outfile: PathBuf,

    /// Temp file used while writing (defaults to a hidden sibling of OUTFILE)
    #[arg(long, env = "TEMPFILE")]
    pub tempfile: Option<PathBuf>,

    /// Directory for raw discovery/lobby debug dumps
    #[arg(long, env = "DEBUG_DIR", default_value = "data")]
    pub debug_dir: PathBuf,

    /// Do not write debug dumps
    #[arg(long, env = "NO_DEBUG_ARTIFACTS", default_value = "false")]
    pub no_debug_artifacts: bool,

    #[arg(
        long,
        env = "USER_AGENT",
        default_value = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126 Safari/537.36"
    )]
    pub user_agent: String,

    #[arg(long, env = "REFERER", default_value = "https://www.radheexch.xyz/")]
    pub referer: String,

    #[arg(long, env = "ORIGIN", default_value = "https://www.radheexch.xyz")]
    pub origin: String,

    /// Snapshot API listen address
    #[arg(long, env = "API_ADDR", default_value = "127.0.0.1:8080")]
    pub api_addr: String,

    /// Do not serve the snapshot over HTTP
    #[arg(long, env = "DISABLE_API", default_value = "false")]
    pub disable_api: bool,

    /// Run a single cycle and exit
    #[arg(long, env = "ONCE", default_value = "false")]
    pub once: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.lobby_url)
            .map_err(|e| anyhow::anyhow!("lobby_url is not a valid URL: {}", e))?;
        Url::parse(&self.discovery_url)
            .map_err(|e| anyhow::anyhow!("discovery_url is not a valid URL: {}", e))?;
        let base = self.event_base()?;
        if !base.path().ends_with('/') {
            anyhow::bail!("event_base_url must end with '/'");
        }
        if self.interval_secs < 3 {
            anyhow::bail!("interval_secs must be at least 3");
        }
        if self.event_concurrency == 0 {
            anyhow::bail!("event_concurrency must be at least 1");
        }
        if self.fetch_timeout_ms == 0 || self.http_timeout_secs == 0 {
            anyhow::bail!("timeouts must be positive");
        }
        if self.cycle_deadline_secs == 0 {
            anyhow::bail!("cycle_deadline_secs must be positive");
        }
        if self.retry_base_ms > self.retry_max_ms {
            anyhow::bail!("retry_base_ms must not exceed retry_max_ms");
        }
        if self.api_addr.parse::<std::net::SocketAddr>().is_err() {
            anyhow::bail!("api_addr is not a socket address: {}", self.api_addr);
        }
        Ok(())
    }

    pub fn event_base(&self) -> anyhow::Result<Url> {
        Url::parse(&self.event_base_url)
            .map_err(|e| anyhow::anyhow!("event_base_url is not a valid URL: {}", e))
    }

    pub fn event_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_ms),
            max_delay: Duration::from_millis(self.retry_max_ms),
            jitter: self.retry_jitter,
        }
    }

    /// Per-request limit for discovery and lobby calls. Event pages are
    /// bounded by `fetch_timeout` instead.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cycle_deadline(&self) -> Duration {
        Duration::from_secs(self.cycle_deadline_secs)
    }
}
