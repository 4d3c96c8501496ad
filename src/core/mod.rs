//! Core data types shared by every stage of the reconstruction pipeline.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`SequenceRecord`]: An identified nucleotide sequence (reference or ASV)
//! - [`KmerGroup`], [`KmerMap`]: The regional kmer database and its mapping back to references
//! - [`KmerAlignment`]: ASV to kmer group hits for one region
//! - [`FrequencyTable`]: Feature x sample abundance matrix
//! - [`ReconstructionMap`]: Final feature to reference mapping
//! - [`Discard`], [`DiscardReason`]: Itemized, non-fatal drops
//!
//! ## Nucleotide Alphabet
//!
//! Sequences use the IUPAC nucleotide alphabet:
//!
//! | Code | Bases | Code | Bases |
//! |------|-------|------|-------|
//! | A    | A     | K    | G, T  |
//! | C    | C     | M    | A, C  |
//! | G    | G     | B    | C, G, T |
//! | T/U  | T     | D    | A, G, T |
//! | R    | A, G  | H    | A, C, T |
//! | Y    | C, T  | V    | A, C, G |
//! | S    | C, G  | N    | A, C, G, T |
//! | W    | A, T  |      |       |
//!
//! Sequences are normalized to uppercase with `U` read as `T`.
//!
//! [`SequenceRecord`]: sequence::SequenceRecord
//! [`KmerGroup`]: kmer::KmerGroup
//! [`KmerMap`]: kmer::KmerMap
//! [`KmerAlignment`]: alignment::KmerAlignment
//! [`FrequencyTable`]: table::FrequencyTable
//! [`ReconstructionMap`]: reconstruction::ReconstructionMap
//! [`Discard`]: types::Discard
//! [`DiscardReason`]: types::DiscardReason

pub mod alignment;
pub mod kmer;
pub mod reconstruction;
pub mod sequence;
pub mod table;
pub mod types;
