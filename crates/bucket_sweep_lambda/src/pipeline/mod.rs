//! The sweep pipeline: list a folder page by page, classify each page with
//! bounded concurrent metadata fetches, then delete the expired keys in
//! batches.

pub mod classifier;
pub mod deleter;
pub mod lister;
pub mod orchestrator;

pub use orchestrator::{SweepOrchestrator, SweepState};
