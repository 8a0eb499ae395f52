//! Background workers
//!
//! Owner-scoped batch passes over the metadata store. None of these runs on
//! its own schedule; the facade invokes them from `flush` and `rehydrate`,
//! strictly sequentially, so each pass observes the effects of the previous
//! one.

mod archive;
mod compact;
mod consolidation;
mod rehydrate;

pub use archive::ArchiverWorker;
pub use compact::Compactor;
pub use consolidation::ConsolidationWorker;
pub use rehydrate::RehydratorWorker;
