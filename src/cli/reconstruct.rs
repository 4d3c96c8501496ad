use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Args};

use crate::cli::{OutputFormat, RunReport};
use crate::core::alignment::KmerAlignment;
use crate::core::kmer::KmerMap;
use crate::core::types::ReferenceId;
use crate::parsing::artifact;
use crate::parsing::fasta::read_fasta;
use crate::parsing::tsv::{
    format_frequency_table, format_summary, parse_frequency_table, parse_manifest, ManifestEntry,
};
use crate::reconstruct::engine::{
    DEFAULT_MAX_MISMATCH, DEFAULT_MIN_ABUND, DEFAULT_PER_NUCLEOTIDE_ERROR,
};
use crate::reconstruct::{reconstruct_counts, LinkPolicy, ReconstructionConfig, RegionBundle};

/// File names written into the output directory
const TABLE_FILE: &str = "feature-table.tsv";
const MAP_FILE: &str = "reconstruction-map.json";
const SUMMARY_JSON_FILE: &str = "reconstruction-summary.json";
const SUMMARY_TSV_FILE: &str = "reconstruction-summary.tsv";

#[derive(Args)]
pub struct ReconstructArgs {
    /// Manifest TSV with columns id, kmer-map, alignment-map, frequency-table
    #[arg(required = true)]
    pub manifest: PathBuf,

    /// Directory for the feature table, map and summary (created if missing)
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Reference FASTA declaring every allowed reference id
    #[arg(long)]
    pub references: Option<PathBuf>,

    /// Expected per-nucleotide error rate
    #[arg(long, default_value_t = DEFAULT_PER_NUCLEOTIDE_ERROR)]
    pub per_nucleotide_error: f64,

    /// Alignment pairs above this mismatch count are ignored
    #[arg(long, default_value_t = DEFAULT_MAX_MISMATCH)]
    pub max_mismatch: u32,

    /// Minimum relative abundance in at least one sample
    #[arg(long, default_value_t = DEFAULT_MIN_ABUND)]
    pub min_abund: f64,

    /// Weight abundance by degenerate multiplicity
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub count_degenerates: bool,

    /// How alignment evidence links references into features
    #[arg(long, value_enum, default_value = "merge")]
    pub link_policy: LinkPolicy,
}

/// Execute reconstruct subcommand
///
/// # Errors
///
/// Returns an error if the manifest or an artifact cannot be read, the
/// regions are inconsistent, or an output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ReconstructArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let entries = parse_manifest(&args.manifest)?;
    let bundles = entries
        .iter()
        .map(load_bundle)
        .collect::<anyhow::Result<Vec<_>>>()?;
    if verbose {
        eprintln!("Loaded {} regions from {}", bundles.len(), args.manifest.display());
    }

    let declared: Option<BTreeSet<ReferenceId>> = match &args.references {
        Some(path) => Some(read_fasta(path)?.into_iter().map(|r| r.id).collect()),
        None => None,
    };

    let config = ReconstructionConfig {
        per_nucleotide_error: args.per_nucleotide_error,
        max_mismatch: args.max_mismatch,
        min_abund: args.min_abund,
        count_degenerates: args.count_degenerates,
        link_policy: args.link_policy,
    };
    let result = reconstruct_counts(&bundles, declared.as_ref(), &config)?;

    std::fs::create_dir_all(&args.output_dir)?;
    let table_path = args.output_dir.join(TABLE_FILE);
    let map_path = args.output_dir.join(MAP_FILE);
    let summary_json_path = args.output_dir.join(SUMMARY_JSON_FILE);
    let summary_tsv_path = args.output_dir.join(SUMMARY_TSV_FILE);

    std::fs::write(&table_path, format_frequency_table(&result.table))?;
    artifact::save(&map_path, &result.map)?;
    artifact::save(&summary_json_path, &result.summary)?;
    std::fs::write(&summary_tsv_path, format_summary(&result.summary))?;

    let mut report = RunReport::new("reconstruct");
    report.count("regions", bundles.len());
    report.count("features", result.map.len());
    report.count("dropped-features", result.dropped_features.len());
    for (region, abundance) in &result.unaligned_abundance {
        report.value(&format!("unaligned-abundance:{region}"), *abundance);
    }
    report.output("table", &table_path);
    report.output("map", &map_path);
    report.output("summary", &summary_json_path);
    report.output("summary-tsv", &summary_tsv_path);
    report.print(format)
}

fn load_bundle(entry: &ManifestEntry) -> anyhow::Result<RegionBundle> {
    let kmer_map: KmerMap = load_artifact(&entry.kmer_map, &entry.region)?;
    let alignment: KmerAlignment = load_artifact(&entry.alignment_map, &entry.region)?;
    let table = parse_frequency_table(&entry.frequency_table).with_context(|| {
        format!(
            "reading frequency table {} for region {}",
            entry.frequency_table.display(),
            entry.region
        )
    })?;
    Ok(RegionBundle::new(&entry.region, kmer_map, alignment, table))
}

fn load_artifact<T: artifact::Artifact>(path: &Path, region: &str) -> anyhow::Result<T> {
    artifact::load(path)
        .with_context(|| format!("reading {} for region {region}", path.display()))
}
