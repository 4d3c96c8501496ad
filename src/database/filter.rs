use tracing::info;

use crate::core::sequence::{normalize, SequenceRecord};
use crate::core::types::{Discard, DiscardReason};
use crate::database::expand::degenerate_positions;
use crate::utils::pool::{map_reduce_chunks, ExecutionConfig, PoolError};
use crate::utils::validation::first_invalid_base;

/// Result of prefiltering a full-length database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResult {
    /// References kept, in input order
    pub kept: Vec<SequenceRecord>,
    /// References dropped and why
    pub discards: Vec<Discard>,
}

impl FilterResult {
    fn merge(mut self, other: Self) -> Self {
        self.kept.extend(other.kept);
        self.discards.extend(other.discards);
        self
    }
}

/// Drop references with more than `max_degen` degenerate positions.
///
/// Sequences with symbols outside the IUPAC alphabet are dropped as
/// `InvalidBase`. Kept records are returned normalized.
///
/// # Errors
///
/// Returns `PoolError` if the execution configuration is invalid.
pub fn filter_degenerate(
    references: &[SequenceRecord],
    max_degen: usize,
    exec: &ExecutionConfig,
) -> Result<FilterResult, PoolError> {
    // Chunks are contiguous, so keep their index to restore input order
    let indexed: Vec<(usize, &SequenceRecord)> = references.iter().enumerate().collect();

    let mut partial = map_reduce_chunks(
        &indexed,
        exec,
        |chunk| filter_chunk(chunk, max_degen),
        Vec::new,
        |mut a, b| {
            a.extend(b);
            a
        },
    )?;
    partial.sort_by_key(|(index, _)| *index);

    let result = partial
        .into_iter()
        .map(|(_, r)| r)
        .fold(FilterResult::default(), FilterResult::merge);

    info!(
        kept = result.kept.len(),
        discarded = result.discards.len(),
        max_degen,
        "Filtered degenerate sequences"
    );
    Ok(result)
}

fn filter_chunk(
    chunk: &[(usize, &SequenceRecord)],
    max_degen: usize,
) -> Vec<(usize, FilterResult)> {
    chunk
        .iter()
        .map(|(index, record)| {
            let sequence = normalize(&record.sequence);
            let mut result = FilterResult::default();
            if first_invalid_base(&sequence).is_some() {
                result
                    .discards
                    .push(Discard::new(&record.id, DiscardReason::InvalidBase));
            } else if degenerate_positions(&sequence) > max_degen {
                result
                    .discards
                    .push(Discard::new(&record.id, DiscardReason::ExcessDegeneracy));
            } else {
                result.kept.push(SequenceRecord::new(&record.id, sequence));
            }
            (*index, result)
        })
        .collect()
}
