//! Placing ASVs on a regional kmer database.
//!
//! - [`aligner`]: Fixed-position, mismatch-bounded alignment of ASVs to kmers
//! - [`trim`]: Post-hoc trimming of variable-length ASVs to one length
//!
//! ## Alignment model
//!
//! Both ASVs and kmers start at the same primer-defined position and share a
//! single length, so no gaps or offsets are considered:
//!
//! | ASV      | Kmer     | Mismatches | `max_mismatch = 1` |
//! |----------|----------|------------|--------------------|
//! | `ACGT`   | `ACGT`   | 0          | hit                |
//! | `ACGT`   | `ACGA`   | 1          | hit                |
//! | `ACGT`   | `TCGA`   | 2          | no hit             |
//! | `ACG`    | `ACGT`   | -          | `LengthMismatch`   |
//!
//! Every kmer group within the bound is reported. Ambiguity between groups is
//! resolved later, during reconstruction.

pub mod aligner;
pub mod trim;

pub use aligner::{align_regional_kmers, AlignError, AlignmentConfig, AlignmentResult};
pub use trim::{trim_posthoc, TrimError, TrimResult};
