//! Mining pipeline
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   Chunk    ┌────────────┐  Page[]  ┌───────────┐
//! │   Splitter   │ ─────────► │ PageParser │ ───────► │ Extractor │
//! │ (dump::*)    │            │            │          │ (Grammar) │
//! └──────────────┘            └────────────┘          └───────────┘
//!                                                           │
//!                                                  ExtractionBatch
//!                                                           ▼
//!                                                   ┌──────────────┐
//!                                                   │ MiningStatus │
//!                                                   └──────────────┘
//! ```
//!
//! The [`Miner`] pulls one chunk at a time, so memory use is bounded by
//! `pages_per_chunk` plus the retained outcomes.

pub mod coordinator;
pub mod progress;
pub mod status;

pub use coordinator::{Miner, MinerOptions};
pub use progress::MiningProgress;
pub use status::{ExtractionBatch, ExtractionOutcome, MiningStatus};
