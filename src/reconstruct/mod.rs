//! Multi-region reconstruction.
//!
//! Each region contributes a [`RegionBundle`]: its kmer database, the
//! alignment of its ASVs and its ASV frequency table. Reconstruction runs in
//! four steps:
//!
//! 1. **Validation**: bundles must agree on region labels, kmer group ids and
//!    ASV ids before any abundance moves ([`manifest`])
//! 2. **Linking**: references reached by the same ASV evidence are joined
//!    with a union-find; each component is one feature ([`graph`])
//! 3. **Redistribution**: every ASV's abundance is split across its features
//!    and summed over regions ([`engine`])
//! 4. **Filtering and summary**: low-abundance features are dropped and
//!    per-feature statistics computed ([`summary`])
//!
//! Feature ids are the sorted reference ids joined by `|`, so identical
//! inputs always produce identical ids and tables.

pub mod engine;
pub mod graph;
pub mod manifest;
pub mod summary;

use thiserror::Error;

pub use engine::{reconstruct_counts, LinkPolicy, Reconstruction, ReconstructionConfig};
pub use manifest::RegionBundle;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconstructionError {
    #[error("Manifest mismatch in region '{region}': {reason}")]
    ManifestMismatch { region: String, reason: String },

    #[error("Reconstruction invariant violated: {0}")]
    ReconstructionInvariant(String),

    #[error("Invalid reconstruction configuration: {0}")]
    InvalidConfig(String),
}
