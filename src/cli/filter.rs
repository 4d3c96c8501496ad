use std::path::PathBuf;

use clap::Args;

use crate::cli::{write_discards, ExecutionArgs, OutputFormat, RunReport};
use crate::database::expand::DEFAULT_MAX_DEGEN;
use crate::database::filter::filter_degenerate;
use crate::parsing::fasta::{read_fasta, write_fasta};
use crate::utils::pool::DEFAULT_CHUNK_SIZE;

#[derive(Args)]
pub struct FilterArgs {
    /// Full-length reference FASTA (plain or gzipped)
    #[arg(required = true)]
    pub references: PathBuf,

    /// Output FASTA of retained references
    #[arg(short, long)]
    pub output: PathBuf,

    /// Maximum degenerate positions per reference
    #[arg(long, default_value_t = DEFAULT_MAX_DEGEN)]
    pub max_degen: usize,

    /// Write dropped references and the reason to this TSV
    #[arg(long)]
    pub discards: Option<PathBuf>,

    #[command(flatten)]
    pub execution: ExecutionArgs,
}

/// Execute filter-degenerate subcommand
///
/// # Errors
///
/// Returns an error if the references cannot be read or the output cannot be
/// written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: FilterArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let references = read_fasta(&args.references)?;
    if verbose {
        eprintln!("Read {} references from {}", references.len(), args.references.display());
    }

    let exec = args.execution.to_config(DEFAULT_CHUNK_SIZE);
    let result = filter_degenerate(&references, args.max_degen, &exec)?;

    if result.kept.is_empty() {
        eprintln!("Warning: no references passed the degenerate base filter.");
    }
    write_fasta(&args.output, &result.kept)?;

    let mut report = RunReport::new("filter-degenerate");
    report.count("references", references.len());
    report.count("kept", result.kept.len());
    report.output("references", &args.output);
    write_discards(args.discards.as_deref(), &result.discards, &mut report)?;
    report.print(format)
}
