use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sparse feature x sample abundance matrix.
///
/// Stored feature-major so per-feature redistribution walks one row at a
/// time. Zero cells are not stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    /// Sample ids declared by the table, including all-zero samples
    pub samples: BTreeSet<String>,

    /// Feature id -> (sample id -> abundance)
    pub data: BTreeMap<String, BTreeMap<String, f64>>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a sample without adding counts
    pub fn add_sample(&mut self, sample: impl Into<String>) {
        self.samples.insert(sample.into());
    }

    /// Declare a feature row without adding counts
    pub fn add_feature(&mut self, feature: impl Into<String>) {
        self.data.entry(feature.into()).or_default();
    }

    /// Add `value` to a cell
    pub fn add(&mut self, feature: &str, sample: &str, value: f64) {
        self.samples.insert(sample.to_string());
        let row = self.data.entry(feature.to_string()).or_default();
        if value != 0.0 {
            *row.entry(sample.to_string()).or_insert(0.0) += value;
        }
    }

    /// Value of a cell (0 when absent)
    #[must_use]
    pub fn get(&self, feature: &str, sample: &str) -> f64 {
        self.data
            .get(feature)
            .and_then(|row| row.get(sample))
            .copied()
            .unwrap_or(0.0)
    }

    /// Row for a feature
    pub fn row(&self, feature: &str) -> Option<&BTreeMap<String, f64>> {
        self.data.get(feature)
    }

    pub fn contains_feature(&self, feature: &str) -> bool {
        self.data.contains_key(feature)
    }

    /// Feature ids in order
    pub fn feature_ids(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Number of feature rows
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Column sums
    #[must_use]
    pub fn sample_totals(&self) -> BTreeMap<String, f64> {
        let mut totals: BTreeMap<String, f64> =
            self.samples.iter().map(|s| (s.clone(), 0.0)).collect();
        for row in self.data.values() {
            for (sample, value) in row {
                *totals.entry(sample.clone()).or_insert(0.0) += value;
            }
        }
        totals
    }

    /// Row sum for a feature
    #[must_use]
    pub fn feature_total(&self, feature: &str) -> f64 {
        self.data
            .get(feature)
            .map(|row| row.values().sum())
            .unwrap_or(0.0)
    }

    /// Sum of every cell
    #[must_use]
    pub fn total(&self) -> f64 {
        self.data.values().flat_map(BTreeMap::values).sum()
    }

    /// Remove a feature row, returning it
    pub fn remove_feature(&mut self, feature: &str) -> Option<BTreeMap<String, f64>> {
        self.data.remove(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut table = FrequencyTable::new();
        table.add("asv1", "s1", 10.0);
        table.add("asv1", "s1", 5.0);
        table.add("asv2", "s2", 3.0);

        assert!((table.get("asv1", "s1") - 15.0).abs() < 1e-12);
        assert!((table.get("asv1", "s2") - 0.0).abs() < 1e-12);
        assert_eq!(table.len(), 2);
        assert_eq!(table.samples.len(), 2);
    }

    #[test]
    fn test_totals() {
        let mut table = FrequencyTable::new();
        table.add("asv1", "s1", 10.0);
        table.add("asv2", "s1", 30.0);
        table.add("asv2", "s2", 5.0);
        table.add_sample("s3");

        let totals = table.sample_totals();
        assert!((totals["s1"] - 40.0).abs() < 1e-12);
        assert!((totals["s2"] - 5.0).abs() < 1e-12);
        assert!((totals["s3"] - 0.0).abs() < 1e-12);
        assert!((table.feature_total("asv2") - 35.0).abs() < 1e-12);
        assert!((table.total() - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_counts_keep_declared_rows() {
        let mut table = FrequencyTable::new();
        table.add("asv1", "s1", 0.0);
        assert!(table.contains_feature("asv1"));
        assert!(table.row("asv1").unwrap().is_empty());
    }
}
