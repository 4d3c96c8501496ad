//! Per-region artifact bundles and their referential checks.

use std::collections::BTreeSet;

use crate::core::alignment::KmerAlignment;
use crate::core::kmer::KmerMap;
use crate::core::reconstruction::FEATURE_ID_SEPARATOR;
use crate::core::table::FrequencyTable;
use crate::core::types::{ReferenceId, RegionId};
use crate::reconstruct::ReconstructionError;

/// The three artifacts one region contributes to a reconstruction
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBundle {
    pub region: RegionId,
    pub kmer_map: KmerMap,
    pub alignment: KmerAlignment,
    /// ASV x sample abundances for the region
    pub table: FrequencyTable,
}

impl RegionBundle {
    pub fn new(
        region: impl Into<String>,
        kmer_map: KmerMap,
        alignment: KmerAlignment,
        table: FrequencyTable,
    ) -> Self {
        Self {
            region: region.into(),
            kmer_map,
            alignment,
            table,
        }
    }
}

fn mismatch(region: &str, reason: String) -> ReconstructionError {
    ReconstructionError::ManifestMismatch {
        region: region.to_string(),
        reason,
    }
}

/// Check cross-region referential integrity before any abundance moves.
///
/// # Errors
///
/// Returns `ReconstructionError::ManifestMismatch` on the first violation:
/// a duplicated region, disagreeing region labels or kmer lengths, an
/// alignment hit on an unknown kmer group, an aligned ASV missing from the
/// frequency table, a reference id containing the feature id separator, or a
/// kmer map reference outside `declared_references`. A negative or
/// non-finite table cell is a `ReconstructionError::ReconstructionInvariant`.
pub fn validate_bundles(
    bundles: &[RegionBundle],
    declared_references: Option<&BTreeSet<ReferenceId>>,
) -> Result<(), ReconstructionError> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for bundle in bundles {
        let region = bundle.region.as_str();
        if !seen.insert(region) {
            return Err(mismatch(region, "region is listed more than once".to_string()));
        }
        if bundle.kmer_map.region != region {
            return Err(mismatch(
                region,
                format!("kmer map is labelled '{}'", bundle.kmer_map.region),
            ));
        }
        if bundle.alignment.region != region {
            return Err(mismatch(
                region,
                format!("alignment is labelled '{}'", bundle.alignment.region),
            ));
        }
        if bundle.alignment.kmer_length != bundle.kmer_map.trim_length {
            return Err(mismatch(
                region,
                format!(
                    "alignment kmer length {} differs from kmer map trim length {}",
                    bundle.alignment.kmer_length, bundle.kmer_map.trim_length
                ),
            ));
        }

        for (asv, hits) in &bundle.alignment.hits {
            if !bundle.table.contains_feature(asv) {
                return Err(mismatch(
                    region,
                    format!("aligned ASV '{asv}' is not in the frequency table"),
                ));
            }
            if let Some(kmer) = hits.keys().find(|k| bundle.kmer_map.get(k).is_none()) {
                return Err(mismatch(
                    region,
                    format!("ASV '{asv}' aligns to unknown kmer group '{kmer}'"),
                ));
            }
        }

        for (asv, row) in &bundle.table.data {
            if let Some((sample, value)) = row.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
                return Err(ReconstructionError::ReconstructionInvariant(format!(
                    "region '{region}': ASV '{asv}' has abundance {value} in sample '{sample}'"
                )));
            }
        }

        if let Some(reference) = bundle
            .kmer_map
            .reference_ids()
            .into_iter()
            .find(|r| r.contains(FEATURE_ID_SEPARATOR))
        {
            return Err(mismatch(
                region,
                format!("reference id '{reference}' contains '{FEATURE_ID_SEPARATOR}'"),
            ));
        }

        if let Some(declared) = declared_references {
            if let Some(reference) = bundle
                .kmer_map
                .reference_ids()
                .into_iter()
                .find(|r| !declared.contains(*r))
            {
                return Err(mismatch(
                    region,
                    format!("reference '{reference}' is not in the declared reference set"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(region: &str) -> RegionBundle {
        let mut kmer_map = KmerMap::new(region, 4);
        kmer_map.add_reference("REF1", &["ACGT".to_string()]);
        let kmer = kmer_map.groups.keys().next().unwrap().clone();
        let mut alignment = KmerAlignment::new(region, 1, 4);
        alignment.insert("asv1", kmer, 0);
        let mut table = FrequencyTable::new();
        table.add("asv1", "S1", 10.0);
        RegionBundle::new(region, kmer_map, alignment, table)
    }

    fn reason(result: Result<(), ReconstructionError>) -> String {
        match result {
            Err(ReconstructionError::ManifestMismatch { reason, .. }) => reason,
            other => panic!("expected manifest mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_bundles() {
        assert!(validate_bundles(&[bundle("v2"), bundle("v4")], None).is_ok());
        let declared: BTreeSet<String> = ["REF1".to_string()].into();
        assert!(validate_bundles(&[bundle("v4")], Some(&declared)).is_ok());
    }

    #[test]
    fn test_duplicate_region() {
        let result = validate_bundles(&[bundle("v4"), bundle("v4")], None);
        assert!(reason(result).contains("more than once"));
    }

    #[test]
    fn test_region_label_disagreement() {
        let mut b = bundle("v4");
        b.alignment.region = "v2".to_string();
        assert!(reason(validate_bundles(&[b], None)).contains("alignment is labelled"));
    }

    #[test]
    fn test_unknown_kmer_group() {
        let mut b = bundle("v4");
        b.alignment.insert("asv1", "deadbeef", 0);
        assert!(reason(validate_bundles(&[b], None)).contains("unknown kmer group"));
    }

    #[test]
    fn test_aligned_asv_missing_from_table() {
        let mut b = bundle("v4");
        b.table = FrequencyTable::new();
        assert!(reason(validate_bundles(&[b], None)).contains("not in the frequency table"));
    }

    #[test]
    fn test_negative_cell_rejected() {
        let mut b = bundle("v4");
        b.table.add("asv1", "S2", -3.0);
        assert!(matches!(
            validate_bundles(&[b], None),
            Err(ReconstructionError::ReconstructionInvariant(_))
        ));
    }

    #[test]
    fn test_reference_id_with_separator() {
        let mut b = bundle("v4");
        b.kmer_map.add_reference("a|b", &["TTTT".to_string()]);
        assert!(reason(validate_bundles(&[b], None)).contains("contains '|'"));
    }

    #[test]
    fn test_undeclared_reference() {
        let declared: BTreeSet<String> = ["REF2".to_string()].into();
        let result = validate_bundles(&[bundle("v4")], Some(&declared));
        assert!(reason(result).contains("'REF1'"));
    }
}
