//! # smurf-solver
//!
//! A library for reconstructing full-length marker gene profiles from
//! amplicon sequencing of several short variable regions.
//!
//! Sequencing a handful of 16S regions separately gives short reads that can
//! rarely be placed on a single reference. Taken together, though, the
//! regions narrow a sample's organisms down much further. `smurf-solver`
//! joins the regional evidence into features, each made of the references
//! that the data cannot tell apart, and reports their abundance per sample.
//!
//! ## Features
//!
//! - **Regional kmer databases**: In silico PCR with degenerate primers and
//!   expansion of degenerate reference bases
//! - **Fixed-position alignment**: Every kmer within a mismatch bound is a hit
//! - **Reconstruction**: Union-find over references, abundance redistribution
//!   weighted by degenerate multiplicity, summed across regions
//! - **Consensus taxonomy**: Greengenes and Silva aware handling of missing
//!   and ambiguous labels
//! - **Deterministic output**: Ordered maps and content-derived ids
//!
//! ## Example
//!
//! ```rust
//! use smurf_solver::core::kmer::KmerMap;
//! use smurf_solver::core::alignment::KmerAlignment;
//! use smurf_solver::core::table::FrequencyTable;
//! use smurf_solver::reconstruct::{reconstruct_counts, ReconstructionConfig, RegionBundle};
//!
//! // One region, one reference, one ASV observed 10 times
//! let mut kmer_map = KmerMap::new("v4", 4);
//! kmer_map.add_reference("REF1", &["ACGT".to_string()]);
//! let group = kmer_map.groups.keys().next().unwrap().clone();
//!
//! let mut alignment = KmerAlignment::new("v4", 0, 4);
//! alignment.insert("asv1", group, 0);
//!
//! let mut table = FrequencyTable::new();
//! table.add("asv1", "S1", 10.0);
//!
//! let bundle = RegionBundle::new("v4", kmer_map, alignment, table);
//! let result = reconstruct_counts(&[bundle], None, &ReconstructionConfig::default()).unwrap();
//! assert_eq!(result.table.get("REF1", "S1"), 10.0);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Sequences, kmer maps, alignments, tables and reconstruction maps
//! - [`database`]: Degenerate filtering, expansion and regional extraction
//! - [`matching`]: ASV to kmer alignment and post-hoc trimming
//! - [`reconstruct`]: Multi-region reconstruction engine
//! - [`taxonomy`]: Consensus taxonomy of reconstructed features
//! - [`parsing`]: FASTA, TSV and JSON artifact I/O
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod database;
pub mod matching;
pub mod parsing;
pub mod reconstruct;
pub mod taxonomy;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::alignment::KmerAlignment;
pub use core::kmer::{KmerGroup, KmerMap};
pub use core::reconstruction::{ReconstructionMap, ReconstructionSummary};
pub use core::sequence::SequenceRecord;
pub use core::table::FrequencyTable;
pub use core::types::*;
pub use reconstruct::{reconstruct_counts, Reconstruction, ReconstructionConfig, RegionBundle};
pub use taxonomy::{reconstruct_taxonomy, TaxonomyPolicy};
pub use utils::pool::ExecutionConfig;
