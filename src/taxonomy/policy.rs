use serde::{Deserialize, Serialize};

use crate::taxonomy::TaxonomyError;

/// Silva marker for a label that could not be resolved
pub const SILVA_AMBIGUOUS_MARKER: &str = "Ambiguous_taxa";

/// Silva name prefixes that carry no taxonomic information
pub const SILVA_UNINFORMATIVE_PREFIXES: &[&str] =
    &["uncultured", "unidentified", "unknown", "metagenome"];

/// Reference database the taxonomy strings come from
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Database {
    #[default]
    None,
    Greengenes,
    Silva,
}

/// How missing labels take part in the consensus
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum DefineMissing {
    /// A defined label wins over a missing one
    #[default]
    Merge,
    /// Missing labels take the nearest defined ancestor's name, then merge
    Inherit,
    /// Missing labels are compared literally
    Ignore,
}

/// Whether database ambiguity markers count as missing
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityHandling {
    #[default]
    Missing,
    Ignore,
}

fn parse_choice<T: clap::ValueEnum>(option: &str, value: &str) -> Result<T, TaxonomyError> {
    T::from_str(value.trim(), true)
        .map_err(|_| TaxonomyError::InvalidPolicy(format!("unknown {option} '{value}'")))
}

/// Label handling for taxonomy reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyPolicy {
    pub database: Database,
    pub define_missing: DefineMissing,
    pub ambiguity_handling: AmbiguityHandling,
}

impl TaxonomyPolicy {
    #[must_use]
    pub fn new(
        database: Database,
        define_missing: DefineMissing,
        ambiguity_handling: AmbiguityHandling,
    ) -> Self {
        Self {
            database,
            define_missing,
            ambiguity_handling,
        }
    }

    /// Build a policy from option strings.
    ///
    /// # Errors
    ///
    /// Returns `TaxonomyError::InvalidPolicy` for an unrecognized choice.
    pub fn parse(
        database: &str,
        define_missing: &str,
        ambiguity_handling: &str,
    ) -> Result<Self, TaxonomyError> {
        Ok(Self::new(
            parse_choice("database", database)?,
            parse_choice("define_missing", define_missing)?,
            parse_choice("ambiguity_handling", ambiguity_handling)?,
        ))
    }

    /// Whether a label counts as missing for the consensus.
    ///
    /// Empty and prefix-only labels (`g__`, `D_5__`) are always missing;
    /// Silva adds uninformative names, and ambiguity markers when
    /// `ambiguity_handling` is `missing`.
    #[must_use]
    pub fn is_missing(&self, label: &str) -> bool {
        let name = label_name(label);
        if name.is_empty() {
            return true;
        }
        if self.database != Database::Silva {
            return false;
        }
        if self.ambiguity_handling == AmbiguityHandling::Missing && name == SILVA_AMBIGUOUS_MARKER {
            return true;
        }
        let lower = name.to_ascii_lowercase();
        SILVA_UNINFORMATIVE_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
    }
}

/// Rank prefix of a label (`g__`, `D_5__`), or "" when it has none
#[must_use]
pub fn rank_prefix(label: &str) -> &str {
    let bytes = label.as_bytes();
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && &bytes[1..3] == b"__" {
        return &label[..3];
    }
    if let Some(rest) = label.strip_prefix("D_") {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && rest[digits..].starts_with("__") {
            return &label[..2 + digits + 2];
        }
    }
    ""
}

/// Label without its rank prefix
#[must_use]
pub fn label_name(label: &str) -> &str {
    label[rank_prefix(label).len()..].trim()
}
