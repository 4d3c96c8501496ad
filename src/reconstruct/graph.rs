//! Connected components over references.
//!
//! References are interned as dense integer ids and linked with a
//! union-find, so no object graph is ever built.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::unionfind::UnionFind;

use crate::core::kmer::KmerMap;
use crate::core::reconstruction::feature_id;
use crate::core::types::{FeatureId, ReferenceId};

/// Link graph over every reference seen in any region's kmer map.
///
/// Only references touched by a link call take part in a feature; the rest
/// had no aligned evidence.
#[derive(Debug, Clone)]
pub struct ReferenceGraph<'a> {
    names: Vec<&'a str>,
    lookup: BTreeMap<&'a str, usize>,
    sets: UnionFind<usize>,
    touched: Vec<bool>,
}

impl<'a> ReferenceGraph<'a> {
    /// Intern the references of all kmer maps, in sorted order
    pub fn new<I>(maps: I) -> Self
    where
        I: IntoIterator<Item = &'a KmerMap>,
    {
        let names: Vec<&'a str> = maps
            .into_iter()
            .flat_map(|map| {
                map.groups
                    .values()
                    .flat_map(|g| g.members.keys().map(String::as_str))
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let lookup = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let len = names.len();
        Self {
            names,
            lookup,
            sets: UnionFind::new(len),
            touched: vec![false; len],
        }
    }

    /// Put all given references in one component.
    ///
    /// Unknown references are ignored.
    pub fn link_all<I, S>(&mut self, references: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut first: Option<usize> = None;
        for reference in references {
            let Some(&id) = self.lookup.get(reference.as_ref()) else {
                continue;
            };
            self.touched[id] = true;
            match first {
                Some(anchor) => {
                    self.sets.union(anchor, id);
                }
                None => first = Some(id),
            }
        }
    }

    /// Number of interned references
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve the components of every touched reference into features
    #[must_use]
    pub fn into_features(self) -> FeaturePartition {
        let labels = self.sets.into_labeling();
        let mut components: BTreeMap<usize, BTreeSet<ReferenceId>> = BTreeMap::new();
        for (id, name) in self.names.iter().enumerate() {
            if self.touched[id] {
                components
                    .entry(labels[id])
                    .or_default()
                    .insert((*name).to_string());
            }
        }

        let mut features = BTreeMap::new();
        let mut owner = BTreeMap::new();
        for references in components.into_values() {
            let id = feature_id(&references);
            for reference in &references {
                owner.insert(reference.clone(), id.clone());
            }
            features.insert(id, references);
        }
        FeaturePartition { features, owner }
    }
}

/// Final features as disjoint reference sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeaturePartition {
    /// Feature id -> member references
    pub features: BTreeMap<FeatureId, BTreeSet<ReferenceId>>,
    owner: BTreeMap<ReferenceId, FeatureId>,
}

impl FeaturePartition {
    /// Feature owning a reference
    pub fn feature_of(&self, reference: &str) -> Option<&FeatureId> {
        self.owner.get(reference)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
