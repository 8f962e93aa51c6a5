pub mod fetcher;
pub mod page;
pub mod scheduler;
pub mod source;

pub use fetcher::DetailFetcher;
pub use scheduler::{FetchOutcome, Scheduler};
pub use source::{EventLocator, EventPageSource, HttpEventSource};
