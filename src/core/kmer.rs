use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::{KmerId, ReferenceId, RegionId};
use crate::utils::validation::sequence_hash;

/// A concrete regional sequence shared by one or more references.
///
/// All members are byte-identical over the trimmed region. The multiplicity
/// of a member is the number of its degenerate expansions that produced this
/// exact sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmerGroup {
    /// md5 of `sequence`
    pub id: KmerId,

    /// Concrete (ACGT-only) sequence, `trim_length` long
    pub sequence: String,

    /// Reference id -> degenerate multiplicity
    pub members: BTreeMap<ReferenceId, u32>,
}

impl KmerGroup {
    pub fn new(sequence: impl Into<String>) -> Self {
        let sequence = sequence.into();
        Self {
            id: sequence_hash(&sequence),
            sequence,
            members: BTreeMap::new(),
        }
    }

    /// Total number of expanded sequences collapsed into this group
    #[must_use]
    pub fn total_multiplicity(&self) -> u64 {
        self.members.values().map(|&m| u64::from(m)).sum()
    }
}

/// The regional kmer database for one region.
///
/// Maps each collapsed kmer group to the references that produced it, and
/// remembers how many concrete expansions each reference generated so that
/// degeneracy-aware weights can be derived later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmerMap {
    /// Region identifier
    pub region: RegionId,

    /// Length of every kmer in the region
    pub trim_length: usize,

    /// Forward primer used for extraction, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fwd_primer: Option<String>,

    /// Reverse primer used for extraction, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_primer: Option<String>,

    /// Kmer group id -> group
    pub groups: BTreeMap<KmerId, KmerGroup>,

    /// Reference id -> number of concrete expansions generated from it
    pub expansions: BTreeMap<ReferenceId, u32>,
}

impl KmerMap {
    pub fn new(region: impl Into<String>, trim_length: usize) -> Self {
        Self {
            region: region.into(),
            trim_length,
            fwd_primer: None,
            rev_primer: None,
            groups: BTreeMap::new(),
            expansions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_primers(mut self, fwd: Option<String>, rev: Option<String>) -> Self {
        self.fwd_primer = fwd;
        self.rev_primer = rev;
        self
    }

    /// Add all concrete expansions of one reference.
    ///
    /// Identical expansions of the same reference collapse into one membership
    /// whose multiplicity counts them.
    pub fn add_reference(&mut self, reference: &str, expansions: &[String]) {
        for sequence in expansions {
            let id = sequence_hash(sequence);
            let group = self
                .groups
                .entry(id)
                .or_insert_with(|| KmerGroup::new(sequence.clone()));
            *group.members.entry(reference.to_string()).or_insert(0) += 1;
        }
        let total = u32::try_from(expansions.len()).unwrap_or(u32::MAX);
        *self.expansions.entry(reference.to_string()).or_insert(0) += total;
    }

    /// Union two partial maps built over disjoint or overlapping chunks.
    ///
    /// The merge is commutative and associative, so chunk completion order
    /// never changes the result. A membership seen in both keeps the larger
    /// multiplicity.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (id, group) in other.groups {
            match self.groups.get_mut(&id) {
                Some(existing) => {
                    for (reference, multiplicity) in group.members {
                        let entry = existing.members.entry(reference).or_insert(0);
                        *entry = (*entry).max(multiplicity);
                    }
                }
                None => {
                    self.groups.insert(id, group);
                }
            }
        }
        for (reference, count) in other.expansions {
            let entry = self.expansions.entry(reference).or_insert(0);
            *entry = (*entry).max(count);
        }
        if self.fwd_primer.is_none() {
            self.fwd_primer = other.fwd_primer;
        }
        if self.rev_primer.is_none() {
            self.rev_primer = other.rev_primer;
        }
        self
    }

    /// Get a group by id
    pub fn get(&self, id: &str) -> Option<&KmerGroup> {
        self.groups.get(id)
    }

    /// Number of kmer groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All references that produced at least one kmer
    #[must_use]
    pub fn reference_ids(&self) -> BTreeSet<&str> {
        self.expansions.keys().map(String::as_str).collect()
    }

    /// Group ids a reference contributes to, in id order
    #[must_use]
    pub fn groups_for_reference(&self, reference: &str) -> Vec<&KmerId> {
        self.groups
            .values()
            .filter(|g| g.members.contains_key(reference))
            .map(|g| &g.id)
            .collect()
    }

    /// Number of expansions generated from a reference (1 when unknown)
    #[must_use]
    pub fn expansion_count(&self, reference: &str) -> u32 {
        self.expansions.get(reference).copied().unwrap_or(1).max(1)
    }
}
