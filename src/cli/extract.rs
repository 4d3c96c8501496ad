use std::path::PathBuf;

use clap::{ArgAction, Args};

use crate::cli::{write_discards, ExecutionArgs, OutputFormat, RunReport};
use crate::database::expand::DEFAULT_MAX_DEGEN;
use crate::database::extract::{
    extract_regional_database, prepare_extracted_region, ExtractionConfig, ExtractionResult,
    DEFAULT_PRIMER_MISMATCH,
};
use crate::parsing::artifact;
use crate::parsing::fasta::{read_fasta, write_fasta};
use crate::utils::pool::DEFAULT_CHUNK_SIZE;

/// Arguments shared by `extract` and `prepare`
#[derive(Args)]
pub struct ExtractArgs {
    /// Reference FASTA (plain or gzipped)
    #[arg(required = true)]
    pub references: PathBuf,

    /// Output kmer map (JSON)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Also write the collapsed kmers as FASTA
    #[arg(long)]
    pub kmers: Option<PathBuf>,

    /// Write dropped references and the reason to this TSV
    #[arg(long)]
    pub discards: Option<PathBuf>,

    /// Region label (defaults to `<fwd>-<rev>`)
    #[arg(long)]
    pub region: Option<String>,

    /// Forward primer, 5'-3' (required for `extract`)
    #[arg(long)]
    pub fwd_primer: Option<String>,

    /// Reverse primer
    #[arg(long)]
    pub rev_primer: Option<String>,

    /// Kmer length (0 uses the shortest retained amplicon)
    #[arg(long, default_value = "0")]
    pub trim_length: usize,

    /// Substitutions allowed in each primer binding site
    #[arg(long, default_value_t = DEFAULT_PRIMER_MISMATCH)]
    pub primer_mismatch: usize,

    /// Remove primers from the amplicon before trimming
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub trim_primers: bool,

    /// The reverse primer is given on the antisense strand
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub reverse_complement_rev: bool,

    /// Keep the bases closest to the reverse primer
    #[arg(long)]
    pub trim_from_right: bool,

    /// Reverse complement each extracted kmer
    #[arg(long)]
    pub reverse_complement_result: bool,

    /// Maximum degenerate positions per kmer
    #[arg(long, default_value_t = DEFAULT_MAX_DEGEN)]
    pub max_degen: usize,

    #[command(flatten)]
    pub execution: ExecutionArgs,
}

impl ExtractArgs {
    fn to_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            region: self.region.clone().unwrap_or_default(),
            fwd_primer: self.fwd_primer.clone(),
            rev_primer: self.rev_primer.clone(),
            trim_length: self.trim_length,
            primer_mismatch: self.primer_mismatch,
            trim_primers: self.trim_primers,
            reverse_complement_rev: self.reverse_complement_rev,
            trim_from_right: self.trim_from_right,
            reverse_complement_result: self.reverse_complement_result,
            max_degen: self.max_degen,
        }
    }
}

/// Execute extract subcommand
///
/// # Errors
///
/// Returns an error if the references cannot be read, the primers are
/// missing or invalid, or an output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run_extract(args: ExtractArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    run(&args, format, verbose, true)
}

/// Execute prepare subcommand
///
/// # Errors
///
/// Returns an error if the references cannot be read or an output cannot be
/// written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run_prepare(args: ExtractArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    run(&args, format, verbose, false)
}

fn run(
    args: &ExtractArgs,
    format: OutputFormat,
    verbose: bool,
    with_primers: bool,
) -> anyhow::Result<()> {
    let references = read_fasta(&args.references)?;
    if verbose {
        eprintln!("Read {} references from {}", references.len(), args.references.display());
    }

    let config = args.to_config();
    let exec = args.execution.to_config(DEFAULT_CHUNK_SIZE);
    let result = if with_primers {
        extract_regional_database(&references, &config, &exec)?
    } else {
        prepare_extracted_region(&references, &config, &exec)?
    };

    if result.kmer_map.is_empty() {
        eprintln!("Warning: the regional kmer database is empty.");
    }
    artifact::save(&args.output, &result.kmer_map)?;

    let mut report = RunReport::new(if with_primers { "extract" } else { "prepare" });
    fill_report(&mut report, references.len(), &result);
    report.output("kmer-map", &args.output);
    if let Some(path) = &args.kmers {
        write_fasta(path, &result.kmer_sequences())?;
        report.output("kmers", path);
    }
    write_discards(args.discards.as_deref(), &result.discards, &mut report)?;
    report.print(format)
}

fn fill_report(report: &mut RunReport, references: usize, result: &ExtractionResult) {
    report.count("references", references);
    report.count("references-kept", result.kmer_map.reference_ids().len());
    report.count("kmer-groups", result.kmer_map.len());
    report.count("kmer-length", result.kmer_map.trim_length);
}
