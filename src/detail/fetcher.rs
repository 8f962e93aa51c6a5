use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::models::{EventDetail, EventId};

use super::source::{EventLocator, EventPageSource};

/// Single-attempt fetch of one event's detail under a per-call timeout.
///
/// Retries belong to the scheduler; this never loops.
#[derive(Clone)]
pub struct DetailFetcher {
    source: Arc<dyn EventPageSource>,
    event_base: Url,
    timeout: Duration,
}

impl DetailFetcher {
    pub fn new(source: Arc<dyn EventPageSource>, event_base: Url, timeout: Duration) -> Self {
        DetailFetcher {
            source,
            event_base,
            timeout,
        }
    }

    pub async fn fetch(&self, event_id: &EventId) -> Result<EventDetail, FetchError> {
        let locator = EventLocator::new(&self.event_base, event_id).map_err(|e| {
            debug!("Event {} has no valid locator: {}", event_id, e);
            FetchError::NotFound
        })?;

        match tokio::time::timeout(self.timeout, self.source.load_event(&locator)).await {
            Ok(Ok(detail)) => Ok(detail),
            Ok(Err(e)) => {
                debug!("[{}] event {} failed: {}", self.source.name(), event_id, e);
                Err(e.into())
            }
            Err(_) => {
                debug!(
                    "[{}] event {} timed out after {:?}",
                    self.source.name(),
                    event_id,
                    self.timeout
                );
                Err(FetchError::Timeout)
            }
        }
    }
}
