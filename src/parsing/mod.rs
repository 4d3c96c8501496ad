//! Readers and writers for pipeline inputs and artifacts.
//!
//! This module provides:
//!
//! - **FASTA**: Reference and representative sequences, plain or gzip compressed
//! - **TSV**: Frequency tables, taxonomy, manifests, discards and summaries
//! - **Artifacts**: JSON kmer maps, alignments and reconstruction maps with a
//!   version envelope
//!
//! ## Tabular formats
//!
//! | File            | Header                                              |
//! |-----------------|-----------------------------------------------------|
//! | Frequency table | `#OTU ID<TAB>sample...`                             |
//! | Taxonomy        | `Feature ID<TAB>Taxon[<TAB>Confidence]`              |
//! | Manifest        | `id<TAB>kmer-map<TAB>alignment-map<TAB>frequency-table` |
//!
//! ## Example
//!
//! ```rust
//! use smurf_solver::parsing::tsv::parse_frequency_table_text;
//!
//! let table = parse_frequency_table_text("#OTU ID\tS1\tS2\nasv1\t10\t0\n").unwrap();
//! assert_eq!(table.get("asv1", "S1"), 10.0);
//! assert_eq!(table.samples.len(), 2);
//! ```

pub mod artifact;
pub mod fasta;
pub mod tsv;

use thiserror::Error;

use crate::utils::validation::MAX_RECORDS;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Too many records: {0} exceeds maximum allowed ({MAX_RECORDS})")]
    TooManyRecords(usize),
}
