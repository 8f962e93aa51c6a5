use std::path::PathBuf;
use thiserror::Error;

/// Terminal outcome of a single event-detail fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("timed out")]
    Timeout,
    #[error("event page not found")]
    NotFound,
    #[error("unparseable event page: {0}")]
    ParseFailure(String),
    #[error("transient error: {0}")]
    Transient(String),
}

impl FetchError {
    /// Timeouts and transient errors reflect load, not a bad id or page shape.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Timeout | FetchError::Transient(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::NotFound => "not_found",
            FetchError::ParseFailure(_) => "parse_failure",
            FetchError::Transient(_) => "transient",
        }
    }
}

/// Low-level failure reported by an event page source.
#[derive(Debug, Clone, Error)]
pub enum PageError {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to decode page capture: {0}")]
    Decode(String),
    #[error("page has no market content")]
    Empty,
}

impl From<reqwest::Error> for PageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PageError::Timeout
        } else if let Some(status) = e.status() {
            PageError::Status(status.as_u16())
        } else if e.is_decode() {
            PageError::Decode(e.to_string())
        } else {
            PageError::Network(e.to_string())
        }
    }
}

impl From<PageError> for FetchError {
    fn from(e: PageError) -> Self {
        match e {
            PageError::Status(404) | PageError::Status(410) => FetchError::NotFound,
            PageError::Status(code) => FetchError::Transient(format!("HTTP status {}", code)),
            PageError::Timeout => FetchError::Timeout,
            PageError::Network(msg) => FetchError::Transient(msg),
            PageError::Decode(msg) => FetchError::ParseFailure(msg),
            PageError::Empty => FetchError::ParseFailure("page has no market content".into()),
        }
    }
}

/// Discovery endpoint failures. Both variants degrade to "no events this cycle".
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("discovery payload is not JSON: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to serialise snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WriteError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::Transient("reset".into()).is_retryable());
        assert!(!FetchError::NotFound.is_retryable());
        assert!(!FetchError::ParseFailure("no table".into()).is_retryable());
    }

    #[test]
    fn test_page_error_translation() {
        assert_eq!(FetchError::from(PageError::Status(404)), FetchError::NotFound);
        assert_eq!(FetchError::from(PageError::Status(410)), FetchError::NotFound);
        assert_eq!(
            FetchError::from(PageError::Status(503)),
            FetchError::Transient("HTTP status 503".into())
        );
        assert_eq!(FetchError::from(PageError::Timeout), FetchError::Timeout);
        assert!(matches!(
            FetchError::from(PageError::Decode("eof".into())),
            FetchError::ParseFailure(_)
        ));
        assert!(matches!(
            FetchError::from(PageError::Empty),
            FetchError::ParseFailure(_)
        ));
        assert!(matches!(
            FetchError::from(PageError::Network("refused".into())),
            FetchError::Transient(_)
        ));
    }
}
