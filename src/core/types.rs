use serde::{Deserialize, Serialize};

/// Identifier of a full-length reference sequence
pub type ReferenceId = String;

/// Identifier of a collapsed kmer group (md5 of its concrete sequence)
pub type KmerId = String;

/// Identifier of an amplicon sequence variant
pub type AsvId = String;

/// Identifier of a sample column in a frequency table
pub type SampleId = String;

/// Identifier of an amplified region
pub type RegionId = String;

/// Identifier of a reconstructed feature
pub type FeatureId = String;

/// Why a sequence was dropped from a stage without failing the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscardReason {
    /// More degenerate positions than `max_degen`
    ExcessDegeneracy,
    /// Primer binding site not found within `primer_mismatch`
    PrimerNotFound,
    /// Sequence length incompatible with the required length
    LengthMismatch,
    /// No kmer group within `max_mismatch`
    NoMatch,
    /// Symbol outside the IUPAC nucleotide alphabet
    InvalidBase,
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExcessDegeneracy => write!(f, "excess-degeneracy"),
            Self::PrimerNotFound => write!(f, "primer-not-found"),
            Self::LengthMismatch => write!(f, "length-mismatch"),
            Self::NoMatch => write!(f, "no-match"),
            Self::InvalidBase => write!(f, "invalid-base"),
        }
    }
}

/// A single dropped sequence and the reason it was dropped
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Discard {
    pub id: String,
    pub reason: DiscardReason,
}

impl Discard {
    pub fn new(id: impl Into<String>, reason: DiscardReason) -> Self {
        Self {
            id: id.into(),
            reason,
        }
    }
}

/// Count discards by reason, in reason order
#[must_use]
pub fn count_by_reason(discards: &[Discard]) -> Vec<(DiscardReason, usize)> {
    let mut counts = std::collections::BTreeMap::new();
    for discard in discards {
        *counts.entry(discard.reason).or_insert(0usize) += 1;
    }
    counts.into_iter().collect()
}
