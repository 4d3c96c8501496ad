//! Fixed-position, mismatch-bounded alignment of ASVs to a regional kmer database.
//!
//! ASVs and kmers are assumed to start at the same position and share one
//! length, so the comparison is a plain Hamming distance. Every kmer group
//! within `max_mismatch` is kept; ties are not broken here.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::alignment::KmerAlignment;
use crate::core::kmer::KmerMap;
use crate::core::sequence::{normalize, SequenceRecord};
use crate::core::types::{count_by_reason, Discard, DiscardReason};
use crate::utils::pool::{map_reduce_chunks, ExecutionConfig, PoolError};
use crate::utils::validation::first_invalid_base;

/// Default inclusive mismatch bound between an ASV and a kmer
pub const DEFAULT_MAX_MISMATCH: u32 = 2;

/// Default ASV chunk size for alignment
pub const DEFAULT_ALIGN_CHUNK_SIZE: usize = 1_000;

#[derive(Error, Debug)]
pub enum AlignError {
    #[error("Invalid alignment configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Alignment parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentConfig {
    /// Region label; the kmer map's region is used when empty
    pub region: String,
    /// Inclusive mismatch bound
    pub max_mismatch: u32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            max_mismatch: DEFAULT_MAX_MISMATCH,
        }
    }
}

impl AlignmentConfig {
    #[must_use]
    pub fn new(max_mismatch: u32) -> Self {
        Self {
            max_mismatch,
            ..Self::default()
        }
    }
}

/// Alignment for one region plus the ASVs that could not be placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentResult {
    pub alignment: KmerAlignment,
    /// Unaligned ASVs, in input order
    pub discards: Vec<Discard>,
}

/// Hamming distance with early termination.
///
/// Returns `None` as soon as the distance exceeds `threshold`. Callers must
/// pass sequences of equal length.
#[must_use]
pub fn hamming_within(a: &[u8], b: &[u8], threshold: u32) -> Option<u32> {
    let mut distance = 0;
    for (&x, &y) in a.iter().zip(b) {
        if x != y {
            distance += 1;
            if distance > threshold {
                return None;
            }
        }
    }
    Some(distance)
}

/// Align representative sequences against every kmer group of a region.
///
/// ASVs with a non-IUPAC character are discarded with `InvalidBase`, ASVs
/// whose length differs from the kmer length with `LengthMismatch`, and ASVs with no group within `max_mismatch` are discarded
/// with `NoMatch`. Neither gets an alignment entry.
///
/// # Errors
///
/// Returns `AlignError::InvalidConfig` if the kmer map is empty, or
/// `AlignError::Pool` if the execution config is invalid.
pub fn align_regional_kmers(
    kmer_map: &KmerMap,
    rep_seqs: &[SequenceRecord],
    config: &AlignmentConfig,
    exec: &ExecutionConfig,
) -> Result<AlignmentResult, AlignError> {
    if kmer_map.is_empty() {
        return Err(AlignError::InvalidConfig(format!(
            "kmer database for region '{}' is empty",
            kmer_map.region
        )));
    }
    if usize::try_from(config.max_mismatch).map_or(true, |m| m > kmer_map.trim_length) {
        warn!(
            max_mismatch = config.max_mismatch,
            kmer_length = kmer_map.trim_length,
            "max_mismatch exceeds the kmer length; every ASV of that length aligns"
        );
    }

    let region = if config.region.is_empty() {
        kmer_map.region.clone()
    } else {
        if config.region != kmer_map.region {
            warn!(
                requested = %config.region,
                database = %kmer_map.region,
                "Alignment region label differs from the kmer database region"
            );
        }
        config.region.clone()
    };
    let kmer_length = kmer_map.trim_length;

    let kmers: Vec<(&str, &[u8])> = kmer_map
        .groups
        .values()
        .map(|g| (g.id.as_str(), g.sequence.as_bytes()))
        .collect();

    let mut discards: Vec<(usize, Discard)> = Vec::new();
    let mut candidates: Vec<(usize, &str, String)> = Vec::with_capacity(rep_seqs.len());
    for (index, record) in rep_seqs.iter().enumerate() {
        let sequence = normalize(&record.sequence);
        if first_invalid_base(&sequence).is_some() {
            discards.push((index, Discard::new(&record.id, DiscardReason::InvalidBase)));
        } else if sequence.len() == kmer_length {
            candidates.push((index, record.id.as_str(), sequence));
        } else {
            discards.push((index, Discard::new(&record.id, DiscardReason::LengthMismatch)));
        }
    }

    let max_mismatch = config.max_mismatch;
    let alignment = map_reduce_chunks(
        &candidates,
        exec,
        |chunk| {
            let mut partial = KmerAlignment::new(&region, max_mismatch, kmer_length);
            for (_, asv, sequence) in chunk {
                let bytes = sequence.as_bytes();
                for (kmer, kmer_seq) in &kmers {
                    if let Some(distance) = hamming_within(bytes, kmer_seq, max_mismatch) {
                        partial.insert(*asv, *kmer, distance);
                    }
                }
            }
            partial
        },
        || KmerAlignment::new(&region, max_mismatch, kmer_length),
        KmerAlignment::merge,
    )?;

    let aligned: BTreeSet<&str> = alignment.hits.keys().map(String::as_str).collect();
    for (index, asv, _) in &candidates {
        if !aligned.contains(asv) {
            discards.push((*index, Discard::new(*asv, DiscardReason::NoMatch)));
        }
    }
    discards.sort_by_key(|(index, _)| *index);
    let discards: Vec<Discard> = discards.into_iter().map(|(_, d)| d).collect();

    for (reason, count) in count_by_reason(&discards) {
        debug!(%reason, count, "Discarded representative sequences");
    }
    info!(
        region = %region,
        asvs = rep_seqs.len(),
        aligned = alignment.len(),
        pairs = alignment.pair_count(),
        discarded = discards.len(),
        max_mismatch,
        "Aligned representative sequences to regional kmers"
    );

    Ok(AlignmentResult {
        alignment,
        discards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kmer_map(seqs: &[(&str, &str)]) -> KmerMap {
        let mut map = KmerMap::new("v4", 4);
        for (reference, seq) in seqs {
            map.add_reference(reference, &[seq.to_string()]);
        }
        map
    }

    #[test]
    fn test_hamming_within() {
        assert_eq!(hamming_within(b"ACGT", b"ACGT", 0), Some(0));
        assert_eq!(hamming_within(b"ACGT", b"ACGA", 1), Some(1));
        assert_eq!(hamming_within(b"ACGT", b"TGCA", 3), None);
        assert_eq!(hamming_within(b"ACGT", b"TGCA", 4), Some(4));
    }

    #[test]
    fn test_exact_alignment() {
        let map = kmer_map(&[("REF1", "ACGT")]);
        let asvs = vec![SequenceRecord::new("asv1", "ACGT")];
        let result = align_regional_kmers(
            &map,
            &asvs,
            &AlignmentConfig::new(0),
            &ExecutionConfig::sequential(),
        )
        .unwrap();

        let hits = result.alignment.get("asv1").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.values().next(), Some(&0));
        assert!(result.discards.is_empty());
        assert_eq!(result.alignment.region, "v4");
    }

    #[test]
    fn test_ties_are_kept() {
        let map = kmer_map(&[("REF1", "ACGA"), ("REF2", "ACGC"), ("REF3", "TTTT")]);
        let asvs = vec![SequenceRecord::new("asv1", "ACGT")];
        let result = align_regional_kmers(
            &map,
            &asvs,
            &AlignmentConfig::new(1),
            &ExecutionConfig::sequential(),
        )
        .unwrap();

        let hits = result.alignment.get("asv1").unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.values().all(|&m| m == 1));
    }

    #[test]
    fn test_discards_length_and_no_match() {
        let map = kmer_map(&[("REF1", "ACGT")]);
        let asvs = vec![
            SequenceRecord::new("short", "ACG"),
            SequenceRecord::new("far", "TGCA"),
            SequenceRecord::new("near", "acgt"),
        ];
        let result = align_regional_kmers(
            &map,
            &asvs,
            &AlignmentConfig::new(1),
            &ExecutionConfig::sequential(),
        )
        .unwrap();

        assert_eq!(result.alignment.len(), 1);
        assert!(result.alignment.get("near").is_some());
        assert_eq!(
            result.discards,
            vec![
                Discard::new("short", DiscardReason::LengthMismatch),
                Discard::new("far", DiscardReason::NoMatch),
            ]
        );
    }

    #[test]
    fn test_alignment_invariants() {
        let map = kmer_map(&[("a", "ACGT"), ("b", "ACTT"), ("c", "GGGG"), ("d", "TTGT")]);
        let asvs: Vec<SequenceRecord> = ["ACGT", "ACTA", "GGGC", "CCCC", "TTTT"]
            .iter()
            .enumerate()
            .map(|(i, s)| SequenceRecord::new(format!("asv{i}"), *s))
            .collect();
        let max_mismatch = 1;
        let result = align_regional_kmers(
            &map,
            &asvs,
            &AlignmentConfig::new(max_mismatch),
            &ExecutionConfig::sequential(),
        )
        .unwrap();

        for (asv, hits) in &result.alignment.hits {
            let asv_seq = &asvs.iter().find(|r| &r.id == asv).unwrap().sequence;
            for (kmer, mismatches) in hits {
                let kmer_seq = &map.get(kmer).unwrap().sequence;
                let distance = asv_seq
                    .bytes()
                    .zip(kmer_seq.bytes())
                    .filter(|(x, y)| x != y)
                    .count();
                assert_eq!(distance as u32, *mismatches);
                assert!(*mismatches <= max_mismatch);
            }
        }
        for discard in &result.discards {
            let asv_seq = &asvs.iter().find(|r| r.id == discard.id).unwrap().sequence;
            for group in map.groups.values() {
                assert!(hamming_within(asv_seq.as_bytes(), group.sequence.as_bytes(), max_mismatch).is_none());
            }
        }
    }

    #[test]
    fn test_chunking_does_not_change_result() {
        let map = kmer_map(&[("a", "ACGT"), ("b", "ACTT"), ("c", "GGGG")]);
        let asvs: Vec<SequenceRecord> = (0..40)
            .map(|i| {
                let seq = ["ACGT", "ACTA", "GGGC", "CCCC", "AC"][i % 5];
                SequenceRecord::new(format!("asv{i:02}"), seq)
            })
            .collect();
        let config = AlignmentConfig::new(1);
        let sequential =
            align_regional_kmers(&map, &asvs, &config, &ExecutionConfig::sequential()).unwrap();
        for (chunk_size, workers) in [(1, 2), (7, 3), (1000, 0)] {
            let exec = ExecutionConfig::default()
                .with_chunk_size(chunk_size)
                .with_workers(workers);
            let parallel = align_regional_kmers(&map, &asvs, &config, &exec).unwrap();
            assert_eq!(sequential, parallel);
        }
    }

    #[test]
    fn test_empty_database_rejected() {
        let map = KmerMap::new("v4", 4);
        let result = align_regional_kmers(
            &map,
            &[],
            &AlignmentConfig::default(),
            &ExecutionConfig::sequential(),
        );
        assert!(matches!(result, Err(AlignError::InvalidConfig(_))));
    }

    #[test]
    fn test_mismatch_bound_longer_than_kmer() {
        let map = kmer_map(&[("a", "ACGT")]);
        let result = align_regional_kmers(
            &map,
            &[SequenceRecord::new("asv1", "TGCA")],
            &AlignmentConfig::new(5),
            &ExecutionConfig::sequential(),
        )
        .unwrap();
        assert_eq!(result.alignment.pair_count(), 1);
        assert!(result.discards.is_empty());
    }

    #[test]
    fn test_non_iupac_asv_discarded() {
        let map = kmer_map(&[("a", "ACGT")]);
        let result = align_regional_kmers(
            &map,
            &[SequenceRecord::new("asv1", "AC\u{e9}T"), SequenceRecord::new("asv2", "ACGT")],
            &AlignmentConfig::new(1),
            &ExecutionConfig::sequential(),
        )
        .unwrap();
        assert_eq!(result.discards, vec![Discard::new("asv1", DiscardReason::InvalidBase)]);
        assert_eq!(result.alignment.len(), 1);
    }
}
