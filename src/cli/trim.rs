use std::path::PathBuf;

use clap::Args;

use crate::cli::{write_discards, OutputFormat, RunReport};
use crate::matching::trim::trim_posthoc;
use crate::parsing::fasta::{read_fasta, write_fasta};
use crate::parsing::tsv::{format_frequency_table, parse_frequency_table};

#[derive(Args)]
pub struct TrimArgs {
    /// ASV frequency table (TSV with `#OTU ID` header)
    #[arg(long)]
    pub table: PathBuf,

    /// Representative sequences of the table's ASVs
    #[arg(long)]
    pub rep_seqs: PathBuf,

    /// Trimmed frequency table (TSV)
    #[arg(long)]
    pub output_table: PathBuf,

    /// Trimmed representative sequences (FASTA)
    #[arg(long)]
    pub output_seqs: PathBuf,

    /// Length to trim to (0 uses the shortest sequence)
    #[arg(long, default_value = "0")]
    pub trim_length: usize,

    /// Name collapsed features by the md5 of their trimmed sequence
    #[arg(long)]
    pub hashed_feature_ids: bool,

    /// Write dropped ASVs and the reason to this TSV
    #[arg(long)]
    pub discards: Option<PathBuf>,
}

/// Execute trim-posthoc subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read, a table feature lacks a
/// sequence, or an output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: TrimArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let table = parse_frequency_table(&args.table)?;
    let rep_seqs = read_fasta(&args.rep_seqs)?;
    if verbose {
        eprintln!(
            "Trimming {} sequences ({} table features, {} samples)",
            rep_seqs.len(),
            table.len(),
            table.samples.len()
        );
    }

    let result = trim_posthoc(&table, &rep_seqs, args.trim_length, args.hashed_feature_ids)?;

    std::fs::write(&args.output_table, format_frequency_table(&result.table))?;
    write_fasta(&args.output_seqs, &result.sequences)?;

    let mut report = RunReport::new("trim-posthoc");
    report.count("sequences", rep_seqs.len());
    report.count("features", result.sequences.len());
    report.count("trim-length", result.trim_length);
    report.output("table", &args.output_table);
    report.output("sequences", &args.output_seqs);
    write_discards(args.discards.as_deref(), &result.discards, &mut report)?;
    report.print(format)
}
