//! In-silico amplification and regional kmer database construction.
//!
//! Each reference goes through the same steps:
//!
//! 1. Locate the forward primer (and the reverse primer downstream of it)
//!    allowing up to `primer_mismatch` substitutions
//! 2. Excise the amplicon, optionally without the primers
//! 3. Keep `trim_length` bases from the forward end (or the reverse end with
//!    `trim_from_right`), optionally reverse complementing the result
//! 4. Expand degenerate codes and collapse identical kmers into groups
//!
//! References that fail a step are dropped and itemized; they never abort the
//! batch.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::kmer::KmerMap;
use crate::core::sequence::{codes_compatible, normalize, reverse_complement, SequenceRecord};
use crate::core::types::{count_by_reason, Discard, DiscardReason};
use crate::database::expand::{expand_degenerate, ExpandError, DEFAULT_MAX_DEGEN};
use crate::utils::pool::{map_reduce_chunks, ExecutionConfig, PoolError};
use crate::utils::validation::first_invalid_base;

/// Default number of substitutions allowed in a primer binding site
pub const DEFAULT_PRIMER_MISMATCH: usize = 2;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid extraction configuration: {0}")]
    InvalidConfig(String),

    #[error("Reference id '{0}' appears more than once")]
    DuplicateReference(String),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Parameters of a regional extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Region label; derived from the primers when empty
    pub region: String,

    /// Forward primer (5'-3', sense strand)
    pub fwd_primer: Option<String>,

    /// Reverse primer
    pub rev_primer: Option<String>,

    /// Kmer length; 0 uses the shortest retained amplicon
    pub trim_length: usize,

    /// Substitutions allowed in each primer binding site
    pub primer_mismatch: usize,

    /// Remove the primers from the amplicon before trimming
    pub trim_primers: bool,

    /// The reverse primer is given on the antisense strand
    pub reverse_complement_rev: bool,

    /// Keep the `trim_length` bases closest to the reverse primer
    pub trim_from_right: bool,

    /// Reverse complement each extracted kmer
    pub reverse_complement_result: bool,

    /// Maximum degenerate positions within a kmer
    pub max_degen: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            fwd_primer: None,
            rev_primer: None,
            trim_length: 0,
            primer_mismatch: DEFAULT_PRIMER_MISMATCH,
            trim_primers: true,
            reverse_complement_rev: true,
            trim_from_right: false,
            reverse_complement_result: false,
            max_degen: DEFAULT_MAX_DEGEN,
        }
    }
}

impl ExtractionConfig {
    #[must_use]
    pub fn new(region: impl Into<String>, trim_length: usize) -> Self {
        Self {
            region: region.into(),
            trim_length,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_primers(mut self, fwd: impl Into<String>, rev: Option<String>) -> Self {
        self.fwd_primer = Some(fwd.into());
        self.rev_primer = rev;
        self
    }

    /// Region label, falling back to `fwd-rev` when unnamed
    #[must_use]
    pub fn region_label(&self) -> String {
        if !self.region.is_empty() {
            return self.region.clone();
        }
        match (&self.fwd_primer, &self.rev_primer) {
            (Some(fwd), Some(rev)) => format!("{fwd}-{rev}"),
            (Some(fwd), None) => fwd.clone(),
            _ => "region".to_string(),
        }
    }

    /// # Errors
    ///
    /// Returns `ExtractError::InvalidConfig` for missing or malformed primers
    /// when `require_primers` is set, or primers outside the IUPAC alphabet.
    pub fn validate(&self, require_primers: bool) -> Result<(), ExtractError> {
        if require_primers {
            match &self.fwd_primer {
                Some(fwd) if !fwd.is_empty() => {}
                _ => {
                    return Err(ExtractError::InvalidConfig(
                        "a forward primer is required for primer-based extraction".to_string(),
                    ))
                }
            }
        }
        for (label, primer) in [("forward", &self.fwd_primer), ("reverse", &self.rev_primer)] {
            if let Some(primer) = primer {
                if let Some(position) = first_invalid_base(&normalize(primer)) {
                    return Err(ExtractError::InvalidConfig(format!(
                        "{label} primer '{primer}' has an invalid nucleotide at position {position}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Regional kmer database and the references that did not make it in
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub kmer_map: KmerMap,
    /// Dropped references, in input order
    pub discards: Vec<Discard>,
}

impl ExtractionResult {
    /// Collapsed kmers as sequence records keyed by group id
    #[must_use]
    pub fn kmer_sequences(&self) -> Vec<SequenceRecord> {
        self.kmer_map
            .groups
            .values()
            .map(|g| SequenceRecord::new(&g.id, &g.sequence))
            .collect()
    }
}

/// Find the best binding site of `primer` in `seq` at or after `from`.
///
/// Returns `(start, mismatches)` for the site with the fewest substitutions,
/// preferring the leftmost on ties. Degenerate codes on either side match any
/// base they share.
#[must_use]
pub fn find_primer(
    seq: &[u8],
    primer: &[u8],
    max_mismatch: usize,
    from: usize,
) -> Option<(usize, usize)> {
    if primer.is_empty() || seq.len() < primer.len() {
        return None;
    }
    let mut best: Option<(usize, usize)> = None;
    for start in from..=(seq.len() - primer.len()) {
        let limit = best.map_or(max_mismatch, |(_, m)| m.saturating_sub(1));
        let mut mismatches = 0;
        let mut within = true;
        for (&s, &p) in seq[start..start + primer.len()].iter().zip(primer) {
            if !codes_compatible(s, p) {
                mismatches += 1;
                if mismatches > limit {
                    within = false;
                    break;
                }
            }
        }
        if within {
            best = Some((start, mismatches));
            if mismatches == 0 {
                break;
            }
        }
    }
    best
}

struct Amplicon {
    index: usize,
    id: String,
    sequence: Result<String, DiscardReason>,
}

/// Primers normalized to the sense strand
struct PrimerPair {
    fwd: Vec<u8>,
    rev: Option<Vec<u8>>,
}

impl PrimerPair {
    fn from_config(config: &ExtractionConfig) -> Option<Self> {
        let fwd = normalize(config.fwd_primer.as_deref()?).into_bytes();
        let rev = config.rev_primer.as_deref().map(|rev| {
            let rev = normalize(rev);
            if config.reverse_complement_rev {
                reverse_complement(&rev).into_bytes()
            } else {
                rev.into_bytes()
            }
        });
        Some(Self { fwd, rev })
    }
}

fn amplify(
    sequence: &str,
    primers: Option<&PrimerPair>,
    config: &ExtractionConfig,
) -> Result<String, DiscardReason> {
    let normalized = normalize(sequence);
    if first_invalid_base(&normalized).is_some() {
        return Err(DiscardReason::InvalidBase);
    }
    let Some(primers) = primers else {
        return Ok(normalized);
    };

    let bytes = normalized.as_bytes();
    let (fwd_start, _) = find_primer(bytes, &primers.fwd, config.primer_mismatch, 0)
        .ok_or(DiscardReason::PrimerNotFound)?;
    let fwd_end = fwd_start + primers.fwd.len();
    let start = if config.trim_primers { fwd_end } else { fwd_start };

    let end = match &primers.rev {
        Some(rev) => {
            let (rev_start, _) = find_primer(bytes, rev, config.primer_mismatch, fwd_end)
                .ok_or(DiscardReason::PrimerNotFound)?;
            if config.trim_primers {
                rev_start
            } else {
                rev_start + rev.len()
            }
        }
        None => bytes.len(),
    };

    if end <= start {
        return Err(DiscardReason::LengthMismatch);
    }
    Ok(normalized[start..end].to_string())
}

fn trim_window(amplicon: &str, trim_length: usize, config: &ExtractionConfig) -> Option<String> {
    if amplicon.len() < trim_length {
        return None;
    }
    let window = if config.trim_from_right {
        &amplicon[amplicon.len() - trim_length..]
    } else {
        &amplicon[..trim_length]
    };
    Some(if config.reverse_complement_result {
        reverse_complement(window)
    } else {
        window.to_string()
    })
}

/// Build one chunk's partial kmer map from its amplicons
fn build_chunk(
    chunk: &[Amplicon],
    region: &str,
    trim_length: usize,
    config: &ExtractionConfig,
) -> (KmerMap, Vec<(usize, Discard)>) {
    let mut map = KmerMap::new(region, trim_length);
    let mut discards = Vec::new();

    for amplicon in chunk {
        let sequence = match &amplicon.sequence {
            Ok(sequence) => sequence,
            Err(reason) => {
                discards.push((amplicon.index, Discard::new(&amplicon.id, *reason)));
                continue;
            }
        };
        let Some(window) = trim_window(sequence, trim_length, config) else {
            discards.push((
                amplicon.index,
                Discard::new(&amplicon.id, DiscardReason::LengthMismatch),
            ));
            continue;
        };
        match expand_degenerate(&window, config.max_degen) {
            Ok(expansions) => map.add_reference(&amplicon.id, &expansions),
            Err(ExpandError::ExcessDegeneracy { .. }) => discards.push((
                amplicon.index,
                Discard::new(&amplicon.id, DiscardReason::ExcessDegeneracy),
            )),
            Err(ExpandError::InvalidBase { .. }) => discards.push((
                amplicon.index,
                Discard::new(&amplicon.id, DiscardReason::InvalidBase),
            )),
        }
    }

    (map, discards)
}

fn run_extraction(
    references: &[SequenceRecord],
    config: &ExtractionConfig,
    exec: &ExecutionConfig,
    primers: Option<&PrimerPair>,
) -> Result<ExtractionResult, ExtractError> {
    let mut seen = BTreeSet::new();
    if let Some(duplicate) = references.iter().find(|r| !seen.insert(r.id.as_str())) {
        return Err(ExtractError::DuplicateReference(duplicate.id.clone()));
    }

    let region = config.region_label();
    let indexed: Vec<(usize, &SequenceRecord)> = references.iter().enumerate().collect();

    let amplicons = map_reduce_chunks(
        &indexed,
        exec,
        |chunk| {
            chunk
                .iter()
                .map(|(index, record)| Amplicon {
                    index: *index,
                    id: record.id.clone(),
                    sequence: amplify(&record.sequence, primers, config),
                })
                .collect::<Vec<_>>()
        },
        Vec::new,
        |mut a, b| {
            a.extend(b);
            a
        },
    )?;

    let trim_length = if config.trim_length == 0 {
        let shortest = amplicons
            .iter()
            .filter_map(|a| a.sequence.as_ref().ok())
            .map(String::len)
            .min()
            .unwrap_or(0);
        debug!(trim_length = shortest, "Using shortest amplicon as trim length");
        shortest
    } else {
        config.trim_length
    };

    let (mut kmer_map, mut discards) = map_reduce_chunks(
        &amplicons,
        exec,
        |chunk| build_chunk(chunk, &region, trim_length, config),
        || (KmerMap::new(&region, trim_length), Vec::new()),
        |(map_a, mut discards_a), (map_b, discards_b)| {
            discards_a.extend(discards_b);
            (map_a.merge(map_b), discards_a)
        },
    )?;

    discards.sort_by_key(|(index, _)| *index);
    let discards: Vec<Discard> = discards.into_iter().map(|(_, d)| d).collect();

    if let Some(primers) = primers {
        kmer_map = kmer_map.with_primers(
            config.fwd_primer.clone(),
            config.rev_primer.clone(),
        );
        debug!(
            fwd_len = primers.fwd.len(),
            rev_len = primers.rev.as_ref().map_or(0, Vec::len),
            "Primer search complete"
        );
    }

    for (reason, count) in count_by_reason(&discards) {
        debug!(%reason, count, "Discarded references");
    }
    if kmer_map.is_empty() {
        warn!(region = %region, "No references survived extraction");
    }
    info!(
        region = %region,
        references = references.len(),
        kmer_groups = kmer_map.len(),
        trim_length,
        discarded = discards.len(),
        "Built regional kmer database"
    );

    Ok(ExtractionResult { kmer_map, discards })
}

/// Amplify a region from full-length references and build its kmer database.
///
/// # Errors
///
/// Returns `ExtractError::InvalidConfig` if the primers are missing or
/// malformed, `ExtractError::DuplicateReference` if a reference id repeats,
/// or `ExtractError::Pool` if the execution config is invalid.
pub fn extract_regional_database(
    references: &[SequenceRecord],
    config: &ExtractionConfig,
    exec: &ExecutionConfig,
) -> Result<ExtractionResult, ExtractError> {
    config.validate(true)?;
    let primers = PrimerPair::from_config(config).ok_or_else(|| {
        ExtractError::InvalidConfig("a forward primer is required".to_string())
    })?;
    run_extraction(references, config, exec, Some(&primers))
}

/// Build a kmer database from sequences that already span the region.
///
/// No primer search is done; sequences are trimmed, expanded and collapsed.
/// Primers, when given, are only recorded on the resulting map.
///
/// # Errors
///
/// Returns `ExtractError::InvalidConfig` if recorded primers are malformed,
/// `ExtractError::DuplicateReference` if a reference id repeats, or
/// `ExtractError::Pool` if the execution config is invalid.
pub fn prepare_extracted_region(
    references: &[SequenceRecord],
    config: &ExtractionConfig,
    exec: &ExecutionConfig,
) -> Result<ExtractionResult, ExtractError> {
    config.validate(false)?;
    let mut result = run_extraction(references, config, exec, None)?;
    result.kmer_map = result
        .kmer_map
        .with_primers(config.fwd_primer.clone(), config.rev_primer.clone());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, seq: &str) -> SequenceRecord {
        SequenceRecord::new(id, seq)
    }

    #[test]
    fn test_find_primer_exact_and_mismatch() {
        let seq = b"TTTTACGTACGGGG";
        assert_eq!(find_primer(seq, b"ACGTACG", 0, 0), Some((4, 0)));
        // One substitution in the primer
        assert_eq!(find_primer(seq, b"ACCTACG", 1, 0), Some((4, 1)));
        assert_eq!(find_primer(seq, b"ACCTACG", 0, 0), None);
    }

    #[test]
    fn test_find_primer_prefers_fewest_mismatches() {
        // Site at 0 has one mismatch, site at 6 is exact
        let seq = b"ACCTAAACGTAA";
        assert_eq!(find_primer(seq, b"ACGT", 1, 0), Some((6, 0)));
    }

    #[test]
    fn test_find_primer_degenerate_primer() {
        let seq = b"GGGACGTGGG";
        assert_eq!(find_primer(seq, b"ACRY", 0, 0), Some((3, 0)));
    }

    #[test]
    fn test_find_primer_respects_start() {
        let seq = b"ACGTTTACGT";
        assert_eq!(find_primer(seq, b"ACGT", 0, 1), Some((6, 0)));
        assert_eq!(find_primer(b"AC", b"ACGT", 0, 0), None);
    }

    #[test]
    fn test_prepare_single_reference() {
        let refs = vec![record("REF1", "ACGTACGT")];
        let config = ExtractionConfig::new("v4", 4);
        let result = prepare_extracted_region(&refs, &config, &ExecutionConfig::sequential()).unwrap();

        assert_eq!(result.kmer_map.len(), 1);
        let group = result.kmer_map.groups.values().next().unwrap();
        assert_eq!(group.sequence, "ACGT");
        assert_eq!(group.members.get("REF1"), Some(&1));
        assert!(result.discards.is_empty());
    }

    #[test]
    fn test_prepare_collapses_identical_prefixes() {
        let refs = vec![record("REF1", "ACGTACGT"), record("REF2", "ACGTTTTT")];
        let config = ExtractionConfig::new("v4", 4);
        let result = prepare_extracted_region(&refs, &config, &ExecutionConfig::sequential()).unwrap();

        assert_eq!(result.kmer_map.len(), 1);
        let group = result.kmer_map.groups.values().next().unwrap();
        let members: Vec<&str> = group.members.keys().map(String::as_str).collect();
        assert_eq!(members, vec!["REF1", "REF2"]);
    }

    #[test]
    fn test_prepare_drops_short_sequences() {
        let refs = vec![record("long", "ACGTACGT"), record("short", "ACG")];
        let config = ExtractionConfig::new("v4", 4);
        let result = prepare_extracted_region(&refs, &config, &ExecutionConfig::sequential()).unwrap();

        assert_eq!(result.kmer_map.reference_ids().len(), 1);
        assert_eq!(
            result.discards,
            vec![Discard::new("short", DiscardReason::LengthMismatch)]
        );
    }

    #[test]
    fn test_trim_length_zero_uses_shortest() {
        let refs = vec![record("a", "ACGTACGT"), record("b", "ACGTAC")];
        let config = ExtractionConfig::new("v4", 0);
        let result = prepare_extracted_region(&refs, &config, &ExecutionConfig::sequential()).unwrap();

        assert_eq!(result.kmer_map.trim_length, 6);
        assert_eq!(result.kmer_map.len(), 1);
    }

    #[test]
    fn test_degenerate_expansion_and_budget() {
        let refs = vec![record("deg", "ACGRTT"), record("toomany", "NNNNTT")];
        let config = ExtractionConfig {
            max_degen: 1,
            ..ExtractionConfig::new("v4", 4)
        };
        let result = prepare_extracted_region(&refs, &config, &ExecutionConfig::sequential()).unwrap();

        assert_eq!(result.kmer_map.len(), 2); // ACGA, ACGG
        assert_eq!(result.kmer_map.expansion_count("deg"), 2);
        assert_eq!(
            result.discards,
            vec![Discard::new("toomany", DiscardReason::ExcessDegeneracy)]
        );
    }

    #[test]
    fn test_extract_with_primers() {
        // fwd = AAAA, rev given antisense as CCCC (sense GGGG)
        let refs = vec![
            record("r1", "TTAAAAACGTACGTGGGGTT"),
            record("r2", "TTTTTTTTTTTTTTTTTTTT"),
        ];
        let config = ExtractionConfig::new("v4", 4).with_primers("AAAA", Some("CCCC".to_string()));
        let result =
            extract_regional_database(&refs, &config, &ExecutionConfig::sequential()).unwrap();

        let group = result.kmer_map.groups.values().next().unwrap();
        assert_eq!(group.sequence, "ACGT");
        assert_eq!(
            result.discards,
            vec![Discard::new("r2", DiscardReason::PrimerNotFound)]
        );
        assert_eq!(result.kmer_map.fwd_primer.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_extract_keep_primers_and_trim_from_right() {
        let refs = vec![record("r1", "TTAAAAACGTACGTGGGGTT")];
        let keep = ExtractionConfig {
            trim_primers: false,
            ..ExtractionConfig::new("v4", 6).with_primers("AAAA", Some("CCCC".to_string()))
        };
        let result = extract_regional_database(&refs, &keep, &ExecutionConfig::sequential()).unwrap();
        assert_eq!(result.kmer_map.groups.values().next().unwrap().sequence, "AAAAAC");

        let right = ExtractionConfig {
            trim_from_right: true,
            ..ExtractionConfig::new("v4", 4).with_primers("AAAA", Some("CCCC".to_string()))
        };
        let result = extract_regional_database(&refs, &right, &ExecutionConfig::sequential()).unwrap();
        assert_eq!(result.kmer_map.groups.values().next().unwrap().sequence, "ACGT");

        let flipped = ExtractionConfig {
            reverse_complement_result: true,
            ..ExtractionConfig::new("v4", 5).with_primers("AAAA", Some("CCCC".to_string()))
        };
        let result =
            extract_regional_database(&refs, &flipped, &ExecutionConfig::sequential()).unwrap();
        // ACGTA -> TACGT
        assert_eq!(result.kmer_map.groups.values().next().unwrap().sequence, "TACGT");
    }

    #[test]
    fn test_extract_requires_forward_primer() {
        let refs = vec![record("r1", "ACGT")];
        let config = ExtractionConfig::new("v4", 4);
        let result = extract_regional_database(&refs, &config, &ExecutionConfig::sequential());
        assert!(matches!(result, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_primer_rejected() {
        let config = ExtractionConfig::new("v4", 4).with_primers("AC-T", None);
        assert!(matches!(
            config.validate(true),
            Err(ExtractError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_region_label_fallback() {
        let config = ExtractionConfig::new("", 4).with_primers("AAAA", Some("CCCC".to_string()));
        assert_eq!(config.region_label(), "AAAA-CCCC");
        assert_eq!(ExtractionConfig::new("v2", 4).region_label(), "v2");
    }

    #[test]
    fn test_chunking_does_not_change_result() {
        let refs: Vec<SequenceRecord> = (0..25)
            .map(|i| {
                let body = ["ACGTAC", "ACGTTT", "ACRTAC", "TTTTAC", "AC"][i % 5];
                record(&format!("ref{i:02}"), body)
            })
            .collect();
        let config = ExtractionConfig::new("v4", 4);

        let sequential =
            prepare_extracted_region(&refs, &config, &ExecutionConfig::sequential()).unwrap();
        for (chunk_size, workers) in [(1, 2), (3, 4), (100, 0)] {
            let exec = ExecutionConfig::default()
                .with_chunk_size(chunk_size)
                .with_workers(workers);
            let parallel = prepare_extracted_region(&refs, &config, &exec).unwrap();
            assert_eq!(sequential, parallel);
        }
    }

    #[test]
    fn test_duplicate_reference_ids_rejected() {
        let refs = vec![record("r", "ACGTAA"), record("r", "TTTTAA")];
        let config = ExtractionConfig::new("v4", 4);
        for exec in [
            ExecutionConfig::sequential(),
            ExecutionConfig::default().with_chunk_size(1).with_workers(2),
        ] {
            let result = prepare_extracted_region(&refs, &config, &exec);
            assert!(matches!(result, Err(ExtractError::DuplicateReference(id)) if id == "r"));
        }
    }

    #[test]
    fn test_concrete_reference_in_exactly_one_group() {
        let refs = vec![
            record("a", "ACGTAC"),
            record("b", "ACGTTT"),
            record("c", "TTTTAC"),
        ];
        let config = ExtractionConfig::new("v4", 4);
        let result = prepare_extracted_region(&refs, &config, &ExecutionConfig::sequential()).unwrap();
        for id in ["a", "b", "c"] {
            assert_eq!(result.kmer_map.groups_for_reference(id).len(), 1);
        }
    }
}
