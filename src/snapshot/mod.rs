pub mod aggregator;
pub mod slug;
pub mod writer;

pub use aggregator::aggregate;
pub use writer::SnapshotWriter;
