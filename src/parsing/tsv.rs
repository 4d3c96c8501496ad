use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::core::reconstruction::ReconstructionSummary;
use crate::core::table::FrequencyTable;
use crate::core::types::{Discard, FeatureId, ReferenceId, RegionId};
use crate::parsing::ParseError;
use crate::utils::validation::check_record_limit;

/// Header of the first column of a frequency table
pub const FEATURE_TABLE_HEADER: &str = "#OTU ID";

/// Header line of a taxonomy file
pub const TAXONOMY_HEADER: &str = "Feature ID\tTaxon";

/// Manifest columns, after the region `id` column
pub const MANIFEST_COLUMNS: [&str; 3] = ["kmer-map", "alignment-map", "frequency-table"];

/// Artifact locations for one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub region: RegionId,
    pub kmer_map: PathBuf,
    pub alignment_map: PathBuf,
    pub frequency_table: PathBuf,
}

/// Parse a frequency table file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if the content is invalid.
pub fn parse_frequency_table(path: &Path) -> Result<FrequencyTable, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_frequency_table_text(&content)
}

/// Parse a feature x sample table in biom TSV layout.
///
/// Lines starting with `#` are comments, except a `#OTU ID` line which is the
/// header. Without one, the first data line is the header.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for a missing header, a row with the
/// wrong number of fields, or a value that is not a non-negative number, and
/// `ParseError::TooManyRecords` if the limit is exceeded.
pub fn parse_frequency_table_text(text: &str) -> Result<FrequencyTable, ParseError> {
    let mut table = FrequencyTable::new();
    let mut samples: Option<Vec<String>> = None;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('#') && !line.starts_with(FEATURE_TABLE_HEADER) {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let Some(columns) = &samples else {
            let header: Vec<String> = fields[1..].iter().map(|s| s.trim().to_string()).collect();
            for sample in &header {
                table.add_sample(sample.clone());
            }
            samples = Some(header);
            continue;
        };

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;
        if fields.len() != columns.len() + 1 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has {} fields, expected {}",
                fields.len(),
                columns.len() + 1
            )));
        }
        if check_record_limit(table.len()).is_some() {
            return Err(ParseError::TooManyRecords(table.len()));
        }

        let feature = fields[0].trim();
        table.add_feature(feature);
        for (sample, raw) in columns.iter().zip(&fields[1..]) {
            let value: f64 = raw.trim().parse().map_err(|_| {
                ParseError::InvalidFormat(format!("Invalid count on line {line_num}: '{raw}'"))
            })?;
            if !value.is_finite() || value < 0.0 {
                return Err(ParseError::InvalidFormat(format!(
                    "Negative or non-finite count on line {line_num}: '{raw}'"
                )));
            }
            table.add(feature, sample, value);
        }
    }

    if samples.is_none() {
        return Err(ParseError::InvalidFormat(
            "No header found in frequency table".to_string(),
        ));
    }
    Ok(table)
}

/// Render a frequency table in biom TSV layout
#[must_use]
pub fn format_frequency_table(table: &FrequencyTable) -> String {
    let mut out = String::from(FEATURE_TABLE_HEADER);
    for sample in &table.samples {
        let _ = write!(out, "\t{sample}");
    }
    out.push('\n');
    for (feature, row) in &table.data {
        out.push_str(feature);
        for sample in &table.samples {
            let value = row.get(sample).copied().unwrap_or(0.0);
            let _ = write!(out, "\t{value}");
        }
        out.push('\n');
    }
    out
}

/// Parse a taxonomy file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if the content is invalid.
pub fn parse_taxonomy(path: &Path) -> Result<BTreeMap<ReferenceId, String>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_taxonomy_text(&content)
}

/// Parse `Feature ID<TAB>Taxon[<TAB>Confidence]` lines; the header is optional.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for lines with fewer than 2 fields or
/// duplicated ids, and `ParseError::TooManyRecords` if the limit is exceeded.
pub fn parse_taxonomy_text(text: &str) -> Result<BTreeMap<ReferenceId, String>, ParseError> {
    let mut taxonomy = BTreeMap::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();

        if first_data_line {
            first_data_line = false;
            let first = fields[0].trim().to_lowercase();
            if first == "feature id" || first == "featureid" || first == "id" {
                continue;
            }
        }

        let line_num = i + 1;
        if fields.len() < 2 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 2 fields"
            )));
        }
        if check_record_limit(taxonomy.len()).is_some() {
            return Err(ParseError::TooManyRecords(taxonomy.len()));
        }

        let id = fields[0].trim().to_string();
        if taxonomy
            .insert(id.clone(), fields[1].trim().to_string())
            .is_some()
        {
            return Err(ParseError::InvalidFormat(format!(
                "Duplicate taxonomy id '{id}' on line {line_num}"
            )));
        }
    }

    Ok(taxonomy)
}

/// Render feature taxonomies with a `Feature ID<TAB>Taxon` header
#[must_use]
pub fn format_taxonomy(taxonomy: &BTreeMap<FeatureId, String>) -> String {
    let mut out = format!("{TAXONOMY_HEADER}\n");
    for (feature, taxon) in taxonomy {
        let _ = writeln!(out, "{feature}\t{taxon}");
    }
    out
}

/// Parse a manifest file; relative paths resolve against its directory
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if the content is invalid.
pub fn parse_manifest(path: &Path) -> Result<Vec<ManifestEntry>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_manifest_text(&content, base)
}

/// Parse manifest text with an `id` column and the three artifact columns,
/// in any order.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` when a required column is missing, a
/// row is short, or a region id repeats.
pub fn parse_manifest_text(text: &str, base: &Path) -> Result<Vec<ManifestEntry>, ParseError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| !l.trim().is_empty() && !l.starts_with("#q2:"));

    let (_, header) = lines
        .next()
        .ok_or_else(|| ParseError::InvalidFormat("Manifest is empty".to_string()))?;
    let header: Vec<String> = header
        .split('\t')
        .map(|h| h.trim().trim_start_matches('#').to_lowercase().replace('_', "-"))
        .collect();
    let column = |name: &str| {
        header.iter().position(|h| h == name).ok_or_else(|| {
            ParseError::InvalidFormat(format!("Manifest is missing the '{name}' column"))
        })
    };
    let id_col = header
        .iter()
        .position(|h| h == "id" || h == "sample-id" || h == "region")
        .ok_or_else(|| ParseError::InvalidFormat("Manifest is missing the 'id' column".to_string()))?;
    let kmer_col = column(MANIFEST_COLUMNS[0])?;
    let alignment_col = column(MANIFEST_COLUMNS[1])?;
    let table_col = column(MANIFEST_COLUMNS[2])?;
    let width = [id_col, kmer_col, alignment_col, table_col]
        .into_iter()
        .max()
        .unwrap_or(0);

    let resolve = |raw: &str| {
        let path = Path::new(raw.trim());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    };

    let mut entries: Vec<ManifestEntry> = Vec::new();
    for (line_num, line) in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() <= width {
            return Err(ParseError::InvalidFormat(format!(
                "Manifest line {line_num} has {} fields, expected at least {}",
                fields.len(),
                width + 1
            )));
        }
        let region = fields[id_col].trim().to_string();
        if entries.iter().any(|e| e.region == region) {
            return Err(ParseError::InvalidFormat(format!(
                "Region '{region}' is listed more than once in the manifest"
            )));
        }
        entries.push(ManifestEntry {
            region,
            kmer_map: resolve(fields[kmer_col]),
            alignment_map: resolve(fields[alignment_col]),
            frequency_table: resolve(fields[table_col]),
        });
    }

    if entries.is_empty() {
        return Err(ParseError::InvalidFormat(
            "Manifest lists no regions".to_string(),
        ));
    }
    Ok(entries)
}

/// Render discards as `id<TAB>reason`
#[must_use]
pub fn format_discards(discards: &[Discard]) -> String {
    let mut out = String::from("id\treason\n");
    for discard in discards {
        let _ = writeln!(out, "{}\t{}", discard.id, discard.reason);
    }
    out
}

/// Render a reconstruction summary, one feature per line
#[must_use]
pub fn format_summary(summary: &ReconstructionSummary) -> String {
    let mut out = String::from(
        "feature-id\tnum-regions\tnum-kmer-groups\ttotal-kmers-mapped\tmean-kmer-per-region\tstdv-kmer-per-region\tmapped-asvs\n",
    );
    for (feature, row) in summary {
        let _ = writeln!(
            out,
            "{feature}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.num_regions,
            row.num_kmer_groups,
            row.total_kmers_mapped,
            row.mean_kmers_per_region,
            row.stdv_kmers_per_region,
            row.mapped_asvs.join(",")
        );
    }
    out
}
