pub mod client;
pub mod extract;

pub use client::{build_http_client, DiscoverySource, HttpDiscovery};
pub use extract::extract_event_ids;
