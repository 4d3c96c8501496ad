use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::kmer::{KmerGroup, KmerMap};
use crate::core::reconstruction::{ReconstructedFeature, ReconstructionMap, ReconstructionSummary};
use crate::core::table::FrequencyTable;
use crate::core::types::{AsvId, FeatureId, KmerId, ReferenceId, RegionId};
use crate::reconstruct::graph::{FeaturePartition, ReferenceGraph};
use crate::reconstruct::manifest::{validate_bundles, RegionBundle};
use crate::reconstruct::summary::summarize;
use crate::reconstruct::ReconstructionError;
use crate::utils::validation::is_unit_fraction;

/// Default per-nucleotide amplification and sequencing error rate
pub const DEFAULT_PER_NUCLEOTIDE_ERROR: f64 = 0.005;

/// Default inclusive mismatch bound applied to alignment pairs
pub const DEFAULT_MAX_MISMATCH: u32 = 2;

/// Default minimum per-sample relative abundance for a retained feature
pub const DEFAULT_MIN_ABUND: f64 = 1e-10;

/// Quantile of the binomial error model used to sanity-check `max_mismatch`
pub const ERROR_BOUND_QUANTILE: f64 = 0.999;

/// How alignment evidence links references into features
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum LinkPolicy {
    /// Every reference behind any hit of one ASV is linked
    #[default]
    Merge,
    /// References are linked only through a shared kmer group; an ASV whose
    /// hits span several components splits its abundance across them
    Split,
}

/// Reconstruction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// Expected per-nucleotide error rate, in [0, 1]
    pub per_nucleotide_error: f64,
    /// Alignment pairs above this mismatch count are ignored
    pub max_mismatch: u32,
    /// Minimum relative abundance in at least one sample, in [0, 1]
    pub min_abund: f64,
    /// Weight redistribution by degenerate multiplicity
    pub count_degenerates: bool,
    pub link_policy: LinkPolicy,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            per_nucleotide_error: DEFAULT_PER_NUCLEOTIDE_ERROR,
            max_mismatch: DEFAULT_MAX_MISMATCH,
            min_abund: DEFAULT_MIN_ABUND,
            count_degenerates: true,
            link_policy: LinkPolicy::default(),
        }
    }
}

impl ReconstructionConfig {
    /// # Errors
    ///
    /// Returns `ReconstructionError::InvalidConfig` when a rate lies outside
    /// [0, 1].
    pub fn validate(&self) -> Result<(), ReconstructionError> {
        if !is_unit_fraction(self.per_nucleotide_error) {
            return Err(ReconstructionError::InvalidConfig(format!(
                "per_nucleotide_error must be in [0, 1], got {}",
                self.per_nucleotide_error
            )));
        }
        if !is_unit_fraction(self.min_abund) {
            return Err(ReconstructionError::InvalidConfig(format!(
                "min_abund must be in [0, 1], got {}",
                self.min_abund
            )));
        }
        Ok(())
    }
}

/// Everything a multi-region reconstruction produces
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// Feature x sample abundances for retained features
    pub table: FrequencyTable,
    pub map: ReconstructionMap,
    pub summary: ReconstructionSummary,
    /// Features removed by the `min_abund` filter
    pub dropped_features: Vec<FeatureId>,
    /// Region -> abundance of table ASVs without a usable alignment
    pub unaligned_abundance: BTreeMap<RegionId, f64>,
}

fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Smallest mismatch count `k` with `P(X <= k) >= quantile` for
/// `X ~ Binomial(kmer_length, per_nucleotide_error)`.
#[must_use]
pub fn expected_mismatch_bound(kmer_length: usize, per_nucleotide_error: f64, quantile: f64) -> u32 {
    let n = u32::try_from(kmer_length).unwrap_or(u32::MAX);
    if per_nucleotide_error <= 0.0 {
        return 0;
    }
    if per_nucleotide_error >= 1.0 {
        return n;
    }
    let odds = per_nucleotide_error / (1.0 - per_nucleotide_error);
    let mut pmf = (count_to_f64(kmer_length) * (1.0 - per_nucleotide_error).ln()).exp();
    let mut cdf = 0.0;
    for k in 0..n {
        cdf += pmf;
        if cdf >= quantile {
            return k;
        }
        pmf *= f64::from(n - k) / f64::from(k + 1) * odds;
    }
    n
}

/// ASV hits of one region after the `max_mismatch` filter
struct RegionHits<'a> {
    region: &'a str,
    table: &'a FrequencyTable,
    kmer_map: &'a KmerMap,
    hits: BTreeMap<&'a AsvId, Vec<&'a KmerGroup>>,
    unaligned: f64,
}

fn resolve_hits(bundle: &RegionBundle, max_mismatch: u32) -> RegionHits<'_> {
    let mut hits = BTreeMap::new();
    for (asv, kmers) in &bundle.alignment.hits {
        let groups: Vec<&KmerGroup> = kmers
            .iter()
            .filter(|(_, mismatches)| **mismatches <= max_mismatch)
            .filter_map(|(kmer, _)| bundle.kmer_map.get(kmer))
            .collect();
        if !groups.is_empty() {
            hits.insert(asv, groups);
        }
    }
    let unaligned: f64 = bundle
        .table
        .feature_ids()
        .filter(|asv| !hits.contains_key(asv))
        .map(|asv| bundle.table.feature_total(asv))
        .sum();
    RegionHits {
        region: &bundle.region,
        table: &bundle.table,
        kmer_map: &bundle.kmer_map,
        hits,
        unaligned,
    }
}

/// Degeneracy weight of a group: each member counts the fraction of its
/// expansions that landed here
fn group_weight(group: &KmerGroup, kmer_map: &KmerMap) -> f64 {
    group
        .members
        .iter()
        .map(|(reference, &multiplicity)| {
            f64::from(multiplicity) / f64::from(kmer_map.expansion_count(reference))
        })
        .sum()
}

/// Feature shares of one ASV; weights sum to 1
fn shares(
    groups: &[&KmerGroup],
    kmer_map: &KmerMap,
    partition: &FeaturePartition,
    count_degenerates: bool,
) -> Vec<(FeatureId, f64)> {
    let mut weights: BTreeMap<&FeatureId, f64> = BTreeMap::new();
    for group in groups {
        let Some(feature) = group
            .members
            .keys()
            .find_map(|reference| partition.feature_of(reference))
        else {
            continue;
        };
        let weight = if count_degenerates {
            group_weight(group, kmer_map)
        } else {
            0.0
        };
        *weights.entry(feature).or_insert(0.0) += weight;
    }

    let total: f64 = weights.values().sum();
    let even = 1.0 / count_to_f64(weights.len().max(1));
    weights
        .into_iter()
        .map(|(feature, weight)| {
            let share = if count_degenerates && total > 0.0 {
                weight / total
            } else {
                even
            };
            (feature.clone(), share)
        })
        .collect()
}

/// One ASV of one region with its resolved feature shares
struct Assignment<'a> {
    region: &'a str,
    table: &'a FrequencyTable,
    asv: &'a AsvId,
    groups: &'a [&'a KmerGroup],
    shares: Vec<(FeatureId, f64)>,
}

/// Reconstruct one multi-region feature table from per-region bundles.
///
/// References linked by alignment evidence (see [`LinkPolicy`]) become one
/// feature whose id is the sorted reference ids joined by `|`. Each ASV's
/// abundance is split across its distinct features, evenly or weighted by
/// degenerate multiplicity, and contributions from all regions are summed.
/// Features below `min_abund` relative abundance in every sample are dropped.
///
/// # Errors
///
/// Returns `ReconstructionError::InvalidConfig` for out-of-range parameters
/// or no regions, `ReconstructionError::ManifestMismatch` when the bundles
/// disagree with each other or with `declared_references`, and
/// `ReconstructionError::ReconstructionInvariant` if an input or
/// redistributed abundance is negative or non-finite, or a reference is owned
/// twice.
pub fn reconstruct_counts(
    bundles: &[RegionBundle],
    declared_references: Option<&BTreeSet<ReferenceId>>,
    config: &ReconstructionConfig,
) -> Result<Reconstruction, ReconstructionError> {
    config.validate()?;
    if bundles.is_empty() {
        return Err(ReconstructionError::InvalidConfig(
            "at least one region is required".to_string(),
        ));
    }
    validate_bundles(bundles, declared_references)?;

    for bundle in bundles {
        let bound = expected_mismatch_bound(
            bundle.kmer_map.trim_length,
            config.per_nucleotide_error,
            ERROR_BOUND_QUANTILE,
        );
        if config.max_mismatch > bound {
            warn!(
                region = %bundle.region,
                max_mismatch = config.max_mismatch,
                expected = bound,
                "max_mismatch exceeds the mismatches expected from sequencing error"
            );
        }
    }

    let regions: Vec<RegionHits> = bundles
        .iter()
        .map(|b| resolve_hits(b, config.max_mismatch))
        .collect();

    let mut graph = ReferenceGraph::new(bundles.iter().map(|b| &b.kmer_map));
    for region in &regions {
        for groups in region.hits.values() {
            match config.link_policy {
                LinkPolicy::Merge => {
                    graph.link_all(groups.iter().flat_map(|g| g.members.keys()));
                }
                LinkPolicy::Split => {
                    for group in groups {
                        graph.link_all(group.members.keys());
                    }
                }
            }
        }
    }
    let partition = graph.into_features();
    debug!(features = partition.len(), "Resolved reference components");

    let features = &partition;
    let count_degenerates = config.count_degenerates;
    let assignments: Vec<Assignment> = regions
        .iter()
        .flat_map(|region| {
            region.hits.iter().map(move |(asv, groups)| Assignment {
                region: region.region,
                table: region.table,
                asv,
                groups,
                shares: shares(groups, region.kmer_map, features, count_degenerates),
            })
        })
        .collect();

    let mut samples = FrequencyTable::new();
    for bundle in bundles {
        for sample in &bundle.table.samples {
            samples.add_sample(sample.clone());
        }
    }

    // Redistribution is a fold over (region, ASV, sample) triples
    let mut table = assignments
        .iter()
        .flat_map(|a| {
            a.table
                .row(a.asv)
                .into_iter()
                .flatten()
                .map(move |(sample, &abundance)| (a, sample, abundance))
        })
        .fold(samples, |mut acc, (assignment, sample, abundance)| {
            for (feature, share) in &assignment.shares {
                acc.add(feature, sample, abundance * share);
            }
            acc
        });

    let mut provenance: BTreeMap<FeatureId, BTreeMap<RegionId, BTreeSet<KmerId>>> =
        BTreeMap::new();
    let mut mapped_asvs: BTreeMap<FeatureId, BTreeSet<String>> = BTreeMap::new();
    for assignment in &assignments {
        for group in assignment.groups {
            let Some(feature) = group
                .members
                .keys()
                .find_map(|reference| partition.feature_of(reference))
            else {
                continue;
            };
            provenance
                .entry(feature.clone())
                .or_default()
                .entry(assignment.region.to_string())
                .or_default()
                .insert(group.id.clone());
        }
        for (feature, _) in &assignment.shares {
            mapped_asvs
                .entry(feature.clone())
                .or_default()
                .insert(format!("{}:{}", assignment.region, assignment.asv));
        }
    }

    check_abundances(&table)?;
    let dropped_features = filter_min_abund(&mut table, config.min_abund);

    let mut map = ReconstructionMap::new();
    for (feature, references) in partition.features {
        if !table.contains_feature(&feature) {
            continue;
        }
        map.features.insert(
            feature.clone(),
            ReconstructedFeature {
                references,
                provenance: provenance.remove(&feature).unwrap_or_default(),
            },
        );
    }

    check_ownership(&map)?;

    let kmer_maps: BTreeMap<RegionId, &KmerMap> = bundles
        .iter()
        .map(|b| (b.region.clone(), &b.kmer_map))
        .collect();
    let summary = summarize(&map, &kmer_maps, &mapped_asvs, config.count_degenerates);

    let unaligned_abundance: BTreeMap<RegionId, f64> = regions
        .iter()
        .map(|r| (r.region.to_string(), r.unaligned))
        .collect();
    for (region, abundance) in &unaligned_abundance {
        if *abundance > 0.0 {
            debug!(region = %region, abundance, "Abundance without a usable alignment");
        }
    }

    info!(
        regions = bundles.len(),
        features = map.len(),
        dropped = dropped_features.len(),
        samples = table.samples.len(),
        "Reconstructed multi-region feature table"
    );

    Ok(Reconstruction {
        table,
        map,
        summary,
        dropped_features,
        unaligned_abundance,
    })
}

/// Drop features whose relative abundance is below `min_abund` in every
/// sample, returning their ids. Features without any abundance are dropped.
fn filter_min_abund(table: &mut FrequencyTable, min_abund: f64) -> Vec<FeatureId> {
    let totals = table.sample_totals();
    let dropped: Vec<FeatureId> = table
        .data
        .iter()
        .filter(|(_, row)| {
            !row.iter().any(|(sample, &value)| {
                let total = totals.get(sample).copied().unwrap_or(0.0);
                value > 0.0 && total > 0.0 && value / total >= min_abund
            })
        })
        .map(|(feature, _)| feature.clone())
        .collect();
    for feature in &dropped {
        table.remove_feature(feature);
    }
    if !dropped.is_empty() {
        debug!(count = dropped.len(), min_abund, "Dropped low-abundance features");
    }
    dropped
}

/// Every cell must be finite and non-negative before any feature is dropped
fn check_abundances(table: &FrequencyTable) -> Result<(), ReconstructionError> {
    for (feature, row) in &table.data {
        if let Some((sample, value)) = row.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
            return Err(ReconstructionError::ReconstructionInvariant(format!(
                "feature '{feature}' has abundance {value} in sample '{sample}'"
            )));
        }
    }
    Ok(())
}

fn check_ownership(map: &ReconstructionMap) -> Result<(), ReconstructionError> {
    map.reference_owners().map_err(|reference| {
        ReconstructionError::ReconstructionInvariant(format!(
            "reference '{reference}' is owned by more than one feature"
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::KmerAlignment;

    /// Build a bundle from (reference, kmer sequence) pairs and
    /// (asv, kmer sequence, mismatches, abundance in S1) hits
    fn bundle(
        region: &str,
        references: &[(&str, &[&str])],
        hits: &[(&str, &[(&str, u32)], f64)],
    ) -> RegionBundle {
        let mut kmer_map = KmerMap::new(region, 4);
        for (reference, seqs) in references {
            let seqs: Vec<String> = seqs.iter().map(ToString::to_string).collect();
            kmer_map.add_reference(reference, &seqs);
        }
        let mut alignment = KmerAlignment::new(region, 2, 4);
        let mut table = FrequencyTable::new();
        for (asv, kmers, abundance) in hits {
            for (seq, mismatches) in *kmers {
                alignment.insert(*asv, crate::utils::validation::sequence_hash(seq), *mismatches);
            }
            table.add(asv, "S1", *abundance);
        }
        RegionBundle::new(region, kmer_map, alignment, table)
    }

    fn naive() -> ReconstructionConfig {
        ReconstructionConfig {
            count_degenerates: false,
            min_abund: 0.0,
            ..ReconstructionConfig::default()
        }
    }

    #[test]
    fn test_single_reference() {
        let v4 = bundle("v4", &[("REF1", &["ACGT"])], &[("asv1", &[("ACGT", 0)], 10.0)]);
        let result = reconstruct_counts(&[v4], None, &naive()).unwrap();

        assert_eq!(result.map.len(), 1);
        assert!((result.table.get("REF1", "S1") - 10.0).abs() < 1e-12);
        let summary = &result.summary["REF1"];
        assert_eq!(summary.num_regions, 1);
        assert_eq!(summary.mapped_asvs, vec!["v4:asv1"]);
    }

    #[test]
    fn test_shared_kmer_merges_references() {
        let v4 = bundle(
            "v4",
            &[("REF1", &["ACGT"]), ("REF2", &["ACGT"])],
            &[("asv1", &[("ACGT", 0)], 10.0)],
        );
        let result = reconstruct_counts(&[v4], None, &naive()).unwrap();

        let feature = result.map.get("REF1|REF2").unwrap();
        assert_eq!(feature.references.len(), 2);
        assert!((result.table.get("REF1|REF2", "S1") - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_second_region_separates_by_asv_evidence() {
        // v2 cannot tell r1 from r2, v4 can; each v4 ASV hits one of them
        let v2 = bundle(
            "v2",
            &[("r1", &["AAAA"]), ("r2", &["AAAA"])],
            &[("a", &[("AAAA", 0)], 10.0)],
        );
        let v4 = bundle(
            "v4",
            &[("r1", &["CCCC"]), ("r2", &["GGGG"])],
            &[("b", &[("CCCC", 0)], 4.0), ("c", &[("GGGG", 0)], 6.0)],
        );
        let result = reconstruct_counts(&[v2, v4], None, &naive()).unwrap();

        // The v2 ASV links r1 and r2, so evidence merges them
        assert_eq!(result.map.len(), 1);
        assert!((result.table.get("r1|r2", "S1") - 20.0).abs() < 1e-12);
        assert_eq!(result.summary["r1|r2"].num_regions, 2);
        assert_eq!(result.summary["r1|r2"].num_kmer_groups, 3);
    }

    #[test]
    fn test_merge_policy_links_across_groups() {
        let v4 = bundle(
            "v4",
            &[("r1", &["ACGT"]), ("r2", &["ACGA"])],
            &[("asv1", &[("ACGT", 0), ("ACGA", 1)], 10.0)],
        );
        let result = reconstruct_counts(&[v4], None, &naive()).unwrap();
        assert_eq!(result.map.len(), 1);
        assert!(result.map.get("r1|r2").is_some());
    }

    #[test]
    fn test_split_policy_divides_abundance() {
        let v4 = bundle(
            "v4",
            &[("r1", &["ACGT"]), ("r2", &["ACGA"])],
            &[("asv1", &[("ACGT", 0), ("ACGA", 1)], 10.0)],
        );
        let config = ReconstructionConfig {
            link_policy: LinkPolicy::Split,
            ..naive()
        };
        let result = reconstruct_counts(&[v4], None, &config).unwrap();

        assert_eq!(result.map.len(), 2);
        assert!((result.table.get("r1", "S1") - 5.0).abs() < 1e-12);
        assert!((result.table.get("r2", "S1") - 5.0).abs() < 1e-12);
        assert!((result.table.total() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_split_policy_degenerate_weights() {
        // r2 spreads over two groups, so its share of ACGA is halved
        let v4 = bundle(
            "v4",
            &[("r1", &["ACGT"]), ("r2", &["ACGA", "ACGG"])],
            &[("asv1", &[("ACGT", 0), ("ACGA", 1)], 9.0)],
        );
        let config = ReconstructionConfig {
            link_policy: LinkPolicy::Split,
            count_degenerates: true,
            min_abund: 0.0,
            ..ReconstructionConfig::default()
        };
        let result = reconstruct_counts(&[v4], None, &config).unwrap();

        assert!((result.table.get("r1", "S1") - 6.0).abs() < 1e-12);
        assert!((result.table.get("r2", "S1") - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_mismatch_ignores_pairs() {
        let v4 = bundle(
            "v4",
            &[("r1", &["ACGT"]), ("r2", &["ACGA"])],
            &[("asv1", &[("ACGT", 0), ("ACGA", 1)], 10.0), ("asv2", &[("ACGA", 2)], 5.0)],
        );
        let config = ReconstructionConfig {
            max_mismatch: 0,
            ..naive()
        };
        let result = reconstruct_counts(&[v4], None, &config).unwrap();

        assert_eq!(result.map.len(), 1);
        assert!((result.table.get("r1", "S1") - 10.0).abs() < 1e-12);
        assert!((result.unaligned_abundance["v4"] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_min_abund_filter() {
        let v4 = bundle(
            "v4",
            &[("r1", &["ACGT"]), ("r2", &["TTTT"])],
            &[("asv1", &[("ACGT", 0)], 999.0), ("asv2", &[("TTTT", 0)], 1.0)],
        );
        let config = ReconstructionConfig {
            min_abund: 0.01,
            ..naive()
        };
        let result = reconstruct_counts(&[v4], None, &config).unwrap();

        assert_eq!(result.dropped_features, vec!["r2"]);
        assert!(result.map.get("r2").is_none());
        assert!(result.summary.get("r2").is_none());
        assert!(result.table.contains_feature("r1"));
    }

    #[test]
    fn test_deterministic() {
        let make = || {
            vec![
                bundle(
                    "v2",
                    &[("r1", &["AAAA"]), ("r2", &["AAAA"]), ("r3", &["CCCC"])],
                    &[("a", &[("AAAA", 0)], 3.0), ("b", &[("CCCC", 1)], 7.0)],
                ),
                bundle(
                    "v4",
                    &[("r1", &["GGGG"]), ("r2", &["GGGC"]), ("r3", &["TTTT"])],
                    &[("c", &[("GGGG", 0), ("GGGC", 1)], 5.0)],
                ),
            ]
        };
        let first = reconstruct_counts(&make(), None, &ReconstructionConfig::default()).unwrap();
        let second = reconstruct_counts(&make(), None, &ReconstructionConfig::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.map).unwrap(),
            serde_json::to_string(&second.map).unwrap()
        );
        assert!(first.map.reference_owners().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let v4 = bundle("v4", &[("REF1", &["ACGT"])], &[("asv1", &[("ACGT", 0)], 10.0)]);
        let config = ReconstructionConfig {
            min_abund: 1.5,
            ..naive()
        };
        assert!(matches!(
            reconstruct_counts(&[v4], None, &config),
            Err(ReconstructionError::InvalidConfig(_))
        ));
        assert!(matches!(
            reconstruct_counts(&[], None, &naive()),
            Err(ReconstructionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_negative_abundance_is_invariant_violation() {
        let v4 = bundle("v4", &[("REF1", &["ACGT"])], &[("asv1", &[("ACGT", 0)], -1.0)]);
        let config = ReconstructionConfig {
            min_abund: 0.0,
            ..naive()
        };
        let mut bundles = vec![v4];
        bundles[0].table.add("asv1", "S2", 4.0);
        assert!(matches!(
            reconstruct_counts(&bundles, None, &config),
            Err(ReconstructionError::ReconstructionInvariant(_))
        ));
    }

    #[test]
    fn test_negative_only_feature_is_not_filtered_away() {
        let v4 = bundle("v4", &[("REF1", &["ACGT"])], &[("asv1", &[("ACGT", 0)], -5.0)]);
        for min_abund in [0.0, DEFAULT_MIN_ABUND] {
            let config = ReconstructionConfig {
                min_abund,
                ..naive()
            };
            assert!(matches!(
                reconstruct_counts(&[v4.clone()], None, &config),
                Err(ReconstructionError::ReconstructionInvariant(_))
            ));
        }
    }

    #[test]
    fn test_nan_abundance_is_invariant_violation() {
        let v4 = bundle("v4", &[("REF1", &["ACGT"])], &[("asv1", &[("ACGT", 0)], f64::NAN)]);
        assert!(matches!(
            reconstruct_counts(&[v4], None, &ReconstructionConfig::default()),
            Err(ReconstructionError::ReconstructionInvariant(_))
        ));
    }

    #[test]
    fn test_separator_in_reference_id_rejected() {
        let v4 = bundle(
            "v4",
            &[("a|b", &["ACGT"]), ("c", &["TTTT"])],
            &[("asv1", &[("ACGT", 0)], 1.0)],
        );
        assert!(matches!(
            reconstruct_counts(&[v4], None, &naive()),
            Err(ReconstructionError::ManifestMismatch { .. })
        ));
    }

    #[test]
    fn test_expected_mismatch_bound() {
        assert_eq!(expected_mismatch_bound(100, 0.0, 0.999), 0);
        assert_eq!(expected_mismatch_bound(100, 1.0, 0.999), 100);
        // 100 bp at 0.5% error: P(X <= 3) < 0.999 <= P(X <= 4)
        assert_eq!(expected_mismatch_bound(100, 0.005, 0.999), 4);
        assert!(expected_mismatch_bound(4, 0.005, 0.999) <= 1);
    }
}
