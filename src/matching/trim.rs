//! Post-hoc trimming of variable-length ASVs.
//!
//! Denoisers may emit ASVs of slightly different lengths for one region.
//! Alignment needs every ASV at the kmer length, so ASVs are cut to a common
//! length and those that become identical are collapsed into one feature.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::info;

use crate::core::sequence::{normalize, SequenceRecord};
use crate::core::table::FrequencyTable;
use crate::core::types::{Discard, DiscardReason};
use crate::utils::validation::{first_invalid_base, sequence_hash};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrimError {
    #[error("No representative sequences to trim")]
    Empty,

    #[error("Feature '{0}' is in the frequency table but has no representative sequence")]
    MissingSequence(String),
}

/// Trimmed table and sequences
#[derive(Debug, Clone, PartialEq)]
pub struct TrimResult {
    pub table: FrequencyTable,
    /// One record per collapsed feature, in id order
    pub sequences: Vec<SequenceRecord>,
    /// ASVs shorter than the trim length or with non-IUPAC characters
    pub discards: Vec<Discard>,
    /// Length actually used
    pub trim_length: usize,
}

/// Trim ASVs to `trim_length` and collapse duplicates.
///
/// A `trim_length` of 0 uses the shortest representative sequence. ASVs
/// shorter than the trim length are dropped with `LengthMismatch`, and ASVs
/// holding a character outside the IUPAC alphabet with `InvalidBase`. The id of a
/// collapsed feature is the md5 of its trimmed sequence when
/// `hashed_feature_ids` is set, otherwise the lexicographically first
/// contributing id. Counts of collapsed ASVs are summed per sample.
///
/// # Errors
///
/// Returns `TrimError::Empty` without sequences and
/// `TrimError::MissingSequence` when a table feature has no sequence.
pub fn trim_posthoc(
    table: &FrequencyTable,
    rep_seqs: &[SequenceRecord],
    trim_length: usize,
    hashed_feature_ids: bool,
) -> Result<TrimResult, TrimError> {
    if rep_seqs.is_empty() {
        return Err(TrimError::Empty);
    }

    let sequences: BTreeMap<&str, String> = rep_seqs
        .iter()
        .map(|r| (r.id.as_str(), normalize(&r.sequence)))
        .collect();
    if let Some(missing) = table.feature_ids().find(|f| !sequences.contains_key(f.as_str())) {
        return Err(TrimError::MissingSequence(missing.clone()));
    }

    let trim_length = if trim_length == 0 {
        sequences
            .values()
            .filter(|s| first_invalid_base(s).is_none())
            .map(String::len)
            .min()
            .unwrap_or(0)
    } else {
        trim_length
    };

    let mut discards = Vec::new();
    // Trimmed sequence -> contributing ASV ids
    let mut collapsed: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for record in rep_seqs {
        let sequence = &sequences[record.id.as_str()];
        if first_invalid_base(sequence).is_some() {
            discards.push(Discard::new(&record.id, DiscardReason::InvalidBase));
            continue;
        }
        if sequence.len() < trim_length {
            discards.push(Discard::new(&record.id, DiscardReason::LengthMismatch));
            continue;
        }
        collapsed
            .entry(&sequence[..trim_length])
            .or_default()
            .insert(record.id.as_str());
    }

    let mut trimmed_table = FrequencyTable::new();
    for sample in &table.samples {
        trimmed_table.add_sample(sample.clone());
    }
    let mut trimmed_sequences = Vec::with_capacity(collapsed.len());
    for (sequence, members) in &collapsed {
        let id = if hashed_feature_ids {
            sequence_hash(sequence)
        } else {
            members.iter().next().map_or_else(String::new, ToString::to_string)
        };
        trimmed_table.add_feature(id.clone());
        for member in members {
            if let Some(row) = table.row(member) {
                for (sample, value) in row {
                    trimmed_table.add(&id, sample, *value);
                }
            }
        }
        trimmed_sequences.push(SequenceRecord::new(id, *sequence));
    }
    trimmed_sequences.sort_by(|a, b| a.id.cmp(&b.id));

    info!(
        input = rep_seqs.len(),
        output = trimmed_sequences.len(),
        discarded = discards.len(),
        trim_length,
        "Trimmed representative sequences"
    );

    Ok(TrimResult {
        table: trimmed_table,
        sequences: trimmed_sequences,
        discards,
        trim_length,
    })
}
