use std::path::PathBuf;

use clap::Args;

use crate::cli::{write_discards, ExecutionArgs, OutputFormat, RunReport};
use crate::core::kmer::KmerMap;
use crate::matching::aligner::{
    align_regional_kmers, AlignmentConfig, DEFAULT_ALIGN_CHUNK_SIZE, DEFAULT_MAX_MISMATCH,
};
use crate::parsing::artifact;
use crate::parsing::fasta::read_fasta;

#[derive(Args)]
pub struct AlignArgs {
    /// Regional kmer map (JSON from `extract` or `prepare`)
    #[arg(long)]
    pub kmer_map: PathBuf,

    /// Representative sequences (ASVs) of the same region
    #[arg(long)]
    pub rep_seqs: PathBuf,

    /// Output alignment (JSON)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Inclusive mismatch bound between an ASV and a kmer
    #[arg(long, default_value_t = DEFAULT_MAX_MISMATCH)]
    pub max_mismatch: u32,

    /// Region label (defaults to the kmer map's region)
    #[arg(long)]
    pub region: Option<String>,

    /// Write unaligned ASVs and the reason to this TSV
    #[arg(long)]
    pub discards: Option<PathBuf>,

    #[command(flatten)]
    pub execution: ExecutionArgs,
}

/// Execute align subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read, the kmer map is empty, or the
/// output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: AlignArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let kmer_map: KmerMap = artifact::load(&args.kmer_map)?;
    let rep_seqs = read_fasta(&args.rep_seqs)?;
    if verbose {
        eprintln!(
            "Aligning {} sequences to {} kmer groups of region {}",
            rep_seqs.len(),
            kmer_map.len(),
            kmer_map.region
        );
    }

    let config = AlignmentConfig {
        region: args.region.clone().unwrap_or_default(),
        max_mismatch: args.max_mismatch,
    };
    let exec = args.execution.to_config(DEFAULT_ALIGN_CHUNK_SIZE);
    let result = align_regional_kmers(&kmer_map, &rep_seqs, &config, &exec)?;

    artifact::save(&args.output, &result.alignment)?;

    let mut report = RunReport::new("align");
    report.count("sequences", rep_seqs.len());
    report.count("aligned", result.alignment.len());
    report.count("alignment-pairs", result.alignment.pair_count());
    report.output("alignment", &args.output);
    write_discards(args.discards.as_deref(), &result.discards, &mut report)?;
    report.print(format)
}
