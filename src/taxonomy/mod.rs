//! Consensus taxonomy for reconstructed features.
//!
//! A reconstructed feature may own several references with different
//! taxonomy strings. The consensus keeps every rank, from the root down,
//! where the references agree and stops at the first disagreement.
//!
//! Which labels count as "missing" depends on the source database:
//!
//! | Database     | Missing labels                                        |
//! |--------------|-------------------------------------------------------|
//! | `none`       | empty or prefix-only (`g__`)                          |
//! | `greengenes` | empty or prefix-only (`g__`)                          |
//! | `silva`      | prefix-only (`D_5__`), `uncultured*`, `unidentified*`, `unknown*`, `metagenome*`; `Ambiguous_taxa` when ambiguity is treated as missing |
//!
//! ## Example
//!
//! ```rust
//! use smurf_solver::taxonomy::{consensus_taxonomy, TaxonomyPolicy};
//!
//! let consensus = consensus_taxonomy(
//!     &["k__Bacteria; p__Firmicutes; g__Blautia", "k__Bacteria; p__Firmicutes; g__"],
//!     &TaxonomyPolicy::default(),
//! );
//! assert_eq!(consensus, "k__Bacteria; p__Firmicutes; g__Blautia");
//! ```

pub mod policy;
pub mod reconcile;

use thiserror::Error;

pub use policy::{AmbiguityHandling, Database, DefineMissing, TaxonomyPolicy};
pub use reconcile::{consensus_taxonomy, reconstruct_taxonomy};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("Feature '{feature}' includes reference '{reference}' which has no taxonomy")]
    UnknownReference { feature: String, reference: String },

    #[error("Invalid taxonomy policy: {0}")]
    InvalidPolicy(String),
}
