use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::PageError;
use crate::models::{EventDetail, EventId};

use super::page::{parse_event_page, PageCapture};

/// Where one event page lives.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLocator {
    pub event_id: EventId,
    pub url: Url,
}

impl EventLocator {
    /// `base` must end with `/` for the id to be appended as a path segment.
    pub fn new(base: &Url, event_id: &EventId) -> Result<Self, url::ParseError> {
        Ok(EventLocator {
            event_id: event_id.clone(),
            url: base.join(event_id.as_str())?,
        })
    }
}

/// Render/parse boundary: turns an event locator into structured event data.
#[async_trait]
pub trait EventPageSource: Send + Sync {
    async fn load_event(&self, locator: &EventLocator) -> Result<EventDetail, PageError>;

    fn name(&self) -> &str;
}

/// Event pages fetched from a render service that answers with a JSON
/// capture of the page's market boxes.
pub struct HttpEventSource {
    http: Client,
}

impl HttpEventSource {
    pub fn new(http: Client) -> Self {
        HttpEventSource { http }
    }
}

#[async_trait]
impl EventPageSource for HttpEventSource {
    fn name(&self) -> &str {
        "http-event-pages"
    }

    async fn load_event(&self, locator: &EventLocator) -> Result<EventDetail, PageError> {
        debug!("Loading event page {}", locator.url);
        let resp = self.http.get(locator.url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PageError::Status(status.as_u16()));
        }
        let body = resp.bytes().await?;
        let capture: PageCapture =
            serde_json::from_slice(&body).map_err(|e| PageError::Decode(e.to_string()))?;
        parse_event_page(locator.event_id.clone(), locator.url.as_str(), capture)
    }
}
