use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{AsvId, KmerId, RegionId};

/// ASV to kmer group hits for one region.
///
/// Every listed pair satisfies `mismatches <= max_mismatch`. ASVs without a
/// qualifying hit never appear here; they are reported as discards instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmerAlignment {
    /// Region identifier
    pub region: RegionId,

    /// Inclusive mismatch bound used during alignment
    pub max_mismatch: u32,

    /// Length shared by the kmers and the aligned ASVs
    pub kmer_length: usize,

    /// ASV id -> (kmer group id -> mismatch count)
    pub hits: BTreeMap<AsvId, BTreeMap<KmerId, u32>>,
}

impl KmerAlignment {
    pub fn new(region: impl Into<String>, max_mismatch: u32, kmer_length: usize) -> Self {
        Self {
            region: region.into(),
            max_mismatch,
            kmer_length,
            hits: BTreeMap::new(),
        }
    }

    /// Record a hit, keeping the smaller mismatch count if the pair repeats
    pub fn insert(&mut self, asv: impl Into<String>, kmer: impl Into<String>, mismatches: u32) {
        let entry = self
            .hits
            .entry(asv.into())
            .or_default()
            .entry(kmer.into())
            .or_insert(mismatches);
        *entry = (*entry).min(mismatches);
    }

    /// Dictionary merge keyed by ASV id; commutative and associative
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (asv, kmers) in other.hits {
            for (kmer, mismatches) in kmers {
                self.insert(asv.clone(), kmer, mismatches);
            }
        }
        self
    }

    /// Hits for one ASV
    pub fn get(&self, asv: &str) -> Option<&BTreeMap<KmerId, u32>> {
        self.hits.get(asv)
    }

    /// Number of aligned ASVs
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Total number of (ASV, kmer group) pairs
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.hits.values().map(BTreeMap::len).sum()
    }
}
