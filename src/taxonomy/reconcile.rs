use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::core::reconstruction::ReconstructionMap;
use crate::core::types::{FeatureId, ReferenceId};
use crate::taxonomy::policy::{label_name, rank_prefix, DefineMissing, TaxonomyPolicy};
use crate::taxonomy::TaxonomyError;

/// Consensus emitted when references already disagree at the first rank
pub const UNASSIGNED: &str = "Unassigned";

/// One rank of one reference after missing-label handling
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rank {
    /// Label as emitted in a consensus
    label: String,
    /// Defined labels win over missing ones unless missing labels are literal
    missing: bool,
}

/// Separator used by a set of taxonomy strings: `"; "` when any uses it
fn detect_separator<'a, I: IntoIterator<Item = &'a str>>(strings: I) -> &'static str {
    if strings.into_iter().any(|s| s.contains("; ")) {
        "; "
    } else {
        ";"
    }
}

fn ranks(taxonomy: &str, policy: &TaxonomyPolicy) -> Vec<Rank> {
    let mut ranks: Vec<Rank> = taxonomy
        .split(';')
        .map(str::trim)
        .map(|label| Rank {
            label: label.to_string(),
            missing: policy.define_missing != DefineMissing::Ignore && policy.is_missing(label),
        })
        .collect();

    // Drop the empty rank produced by a trailing separator
    if ranks.last().is_some_and(|r| r.label.is_empty()) && ranks.len() > 1 {
        ranks.pop();
    }

    if policy.define_missing == DefineMissing::Inherit {
        let mut ancestor: Option<String> = None;
        for rank in &mut ranks {
            if rank.missing {
                if let Some(name) = &ancestor {
                    rank.label = format!("{}{name}", rank_prefix(&rank.label));
                }
            } else {
                ancestor = Some(label_name(&rank.label).to_string());
            }
        }
    }
    ranks
}

/// Consensus rank at one depth, or `None` where the references diverge
fn consensus_rank<'a>(column: &[Option<&'a Rank>], literal: bool) -> Option<&'a str> {
    if literal {
        let first = column.first().copied().flatten()?;
        return column
            .iter()
            .all(|r| r.is_some_and(|r| r.label == first.label))
            .then_some(first.label.as_str());
    }

    let defined: BTreeSet<&str> = column
        .iter()
        .flatten()
        .filter(|r| !r.missing)
        .map(|r| r.label.as_str())
        .collect();
    match defined.len() {
        1 => defined.into_iter().next(),
        0 => {
            // Every reference is missing here; keep the label only if they agree
            let first = column.first().copied().flatten()?;
            column
                .iter()
                .all(|r| r.is_some_and(|r| r.label == first.label))
                .then_some(first.label.as_str())
        }
        _ => None,
    }
}

/// Consensus taxonomy of a set of taxonomy strings.
///
/// Ranks are compared from the root and the result is truncated at the
/// first divergent rank. The input separator (`"; "` or `";"`) is kept.
#[must_use]
pub fn consensus_taxonomy(taxonomies: &[&str], policy: &TaxonomyPolicy) -> String {
    let separator = detect_separator(taxonomies.iter().copied());
    let parsed: Vec<Vec<Rank>> = taxonomies.iter().map(|t| ranks(t, policy)).collect();
    let depth = parsed.iter().map(Vec::len).max().unwrap_or(0);
    let literal = policy.define_missing == DefineMissing::Ignore;

    let mut consensus: Vec<&str> = Vec::with_capacity(depth);
    for level in 0..depth {
        let column: Vec<Option<&Rank>> = parsed.iter().map(|r| r.get(level)).collect();
        match consensus_rank(&column, literal) {
            Some(label) => consensus.push(label),
            None => break,
        }
    }

    if consensus.iter().all(|label| label.is_empty()) {
        UNASSIGNED.to_string()
    } else {
        consensus.join(separator)
    }
}

/// Consensus taxonomy for every feature of a reconstruction map.
///
/// # Errors
///
/// Returns `TaxonomyError::UnknownReference` when a feature references an id
/// absent from `taxonomy`.
pub fn reconstruct_taxonomy(
    map: &ReconstructionMap,
    taxonomy: &BTreeMap<ReferenceId, String>,
    policy: &TaxonomyPolicy,
) -> Result<BTreeMap<FeatureId, String>, TaxonomyError> {
    let mut consensus = BTreeMap::new();
    for (feature, entry) in &map.features {
        let strings = entry
            .references
            .iter()
            .map(|reference| {
                taxonomy
                    .get(reference)
                    .map(String::as_str)
                    .ok_or_else(|| TaxonomyError::UnknownReference {
                        feature: feature.clone(),
                        reference: reference.clone(),
                    })
            })
            .collect::<Result<Vec<&str>, _>>()?;
        consensus.insert(feature.clone(), consensus_taxonomy(&strings, policy));
    }

    info!(
        features = consensus.len(),
        database = ?policy.database,
        define_missing = ?policy.define_missing,
        "Reconstructed consensus taxonomy"
    );
    Ok(consensus)
}
