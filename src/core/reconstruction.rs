use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::{FeatureId, KmerId, ReferenceId, RegionId};

/// Separator used when joining reference ids into a merged feature id
pub const FEATURE_ID_SEPARATOR: &str = "|";

/// Derive a feature id from its references.
///
/// Depends only on the sorted reference set, never on iteration order.
#[must_use]
pub fn feature_id<'a, I>(references: I) -> FeatureId
where
    I: IntoIterator<Item = &'a ReferenceId>,
{
    let sorted: BTreeSet<&str> = references.into_iter().map(String::as_str).collect();
    sorted.into_iter().collect::<Vec<_>>().join(FEATURE_ID_SEPARATOR)
}

/// A final reconstructed feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructedFeature {
    /// References that could not be told apart by the available regions
    pub references: BTreeSet<ReferenceId>,

    /// Region -> kmer groups that carried evidence for this feature
    pub provenance: BTreeMap<RegionId, BTreeSet<KmerId>>,
}

/// Final feature -> reference mapping for a multi-region run.
///
/// Reference sets of distinct features are pairwise disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionMap {
    pub features: BTreeMap<FeatureId, ReconstructedFeature>,
}

impl ReconstructionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, feature: &str) -> Option<&ReconstructedFeature> {
        self.features.get(feature)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Reference -> owning feature, or the first reference found twice
    pub fn reference_owners(&self) -> Result<BTreeMap<&str, &str>, ReferenceId> {
        let mut owners = BTreeMap::new();
        for (feature, entry) in &self.features {
            for reference in &entry.references {
                if owners.insert(reference.as_str(), feature.as_str()).is_some() {
                    return Err(reference.clone());
                }
            }
        }
        Ok(owners)
    }
}

/// Per-feature reconstruction statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    /// Regions with at least one aligned ASV supporting the feature
    pub num_regions: usize,

    /// Distinct (region, kmer group) pairs supporting the feature
    pub num_kmer_groups: usize,

    /// Kmers mapped across regions; counts expansions when degenerates are
    /// counted, otherwise original database sequences
    pub total_kmers_mapped: f64,

    pub mean_kmers_per_region: f64,

    pub stdv_kmers_per_region: f64,

    /// `region:asv` pairs that contributed abundance
    pub mapped_asvs: Vec<String>,
}

/// Summary rows keyed by feature id
pub type ReconstructionSummary = BTreeMap<FeatureId, FeatureSummary>;
