//! Regional kmer database construction.
//!
//! Turns a full-length reference collection into one [`KmerMap`] per
//! amplified region:
//!
//! - [`filter`]: Prefilter references with too many degenerate positions
//! - [`extract`]: In-silico PCR, trimming and kmer collapsing
//! - [`expand`]: IUPAC degenerate base expansion
//!
//! ## Example
//!
//! ```rust
//! use smurf_solver::core::sequence::SequenceRecord;
//! use smurf_solver::database::extract::{prepare_extracted_region, ExtractionConfig};
//! use smurf_solver::utils::pool::ExecutionConfig;
//!
//! let references = vec![
//!     SequenceRecord::new("REF1", "ACGTACGT"),
//!     SequenceRecord::new("REF2", "ACGTTTTT"),
//! ];
//! let config = ExtractionConfig::new("v4", 4);
//! let result = prepare_extracted_region(&references, &config, &ExecutionConfig::sequential()).unwrap();
//!
//! // Both references share the same 4 bp region and collapse into one group
//! assert_eq!(result.kmer_map.len(), 1);
//! ```
//!
//! [`KmerMap`]: crate::core::kmer::KmerMap

pub mod expand;
pub mod extract;
pub mod filter;
