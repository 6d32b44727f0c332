//! paperscout-ingestion — Candidate discovery and identity resolution.
//!
//! - Data models (`Candidate`, `ReferenceItem`)
//! - arXiv discovery client (Atom feed)
//! - Identity resolver: duplicate detection against the reference corpus

pub mod dedup;
pub mod models;
pub mod sources;
