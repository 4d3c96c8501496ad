use std::collections::{BTreeMap, BTreeSet};

use crate::core::kmer::KmerMap;
use crate::core::reconstruction::{FeatureSummary, ReconstructionMap, ReconstructionSummary};
use crate::core::types::RegionId;

fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

fn multiplicity_to_f64(multiplicity: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        multiplicity as f64
    }
}

/// Per-feature statistics for the retained features of a reconstruction.
///
/// Kmers per region are counted as the summed degenerate multiplicities of
/// the supporting groups when `count_degenerates` is set, otherwise as the
/// number of distinct database sequences behind those groups. The standard
/// deviation is the population deviation over supporting regions.
#[must_use]
pub fn summarize(
    map: &ReconstructionMap,
    kmer_maps: &BTreeMap<RegionId, &KmerMap>,
    mapped_asvs: &BTreeMap<String, BTreeSet<String>>,
    count_degenerates: bool,
) -> ReconstructionSummary {
    let mut summary = ReconstructionSummary::new();
    for (feature, entry) in &map.features {
        let mut per_region: Vec<f64> = Vec::with_capacity(entry.provenance.len());
        let mut num_kmer_groups = 0;

        for (region, kmers) in &entry.provenance {
            num_kmer_groups += kmers.len();
            let Some(kmer_map) = kmer_maps.get(region) else {
                continue;
            };
            let groups = kmers.iter().filter_map(|k| kmer_map.get(k));
            let count = if count_degenerates {
                multiplicity_to_f64(groups.map(|g| g.total_multiplicity()).sum())
            } else {
                let references: BTreeSet<&str> = groups
                    .flat_map(|g| g.members.keys().map(String::as_str))
                    .collect();
                count_to_f64(references.len())
            };
            per_region.push(count);
        }

        let num_regions = entry.provenance.len();
        let total: f64 = per_region.iter().sum();
        let (mean, stdv) = if per_region.is_empty() {
            (0.0, 0.0)
        } else {
            let n = count_to_f64(per_region.len());
            let mean = total / n;
            let variance = per_region.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
            (mean, variance.sqrt())
        };

        summary.insert(
            feature.clone(),
            FeatureSummary {
                num_regions,
                num_kmer_groups,
                total_kmers_mapped: total,
                mean_kmers_per_region: mean,
                stdv_kmers_per_region: stdv,
                mapped_asvs: mapped_asvs
                    .get(feature)
                    .map(|asvs| asvs.iter().cloned().collect())
                    .unwrap_or_default(),
            },
        );
    }
    summary
}
