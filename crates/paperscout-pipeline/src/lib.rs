//! paperscout-pipeline — Orchestration of the triage run.
//!
//! Wires discovery output through dedup, hybrid scoring, and tiered
//! content extraction, with collaborator traits at the seams.

pub mod memory;
pub mod run;
pub mod traits;

pub use memory::InMemoryReferenceManager;
pub use run::{run_pipeline, Collaborators, PipelineOutput, RunSummary};
pub use traits::{FinalizedRecord, ReferenceManager, ReferenceQuery, Summarizer};
