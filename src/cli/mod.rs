//! Command-line interface for smurf-solver.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **filter-degenerate**: Drop references with too many degenerate bases
//! - **extract**: Amplify a region in silico and build its kmer database
//! - **prepare**: Build a kmer database from already extracted regions
//! - **align**: Align ASVs to a regional kmer database
//! - **trim-posthoc**: Trim variable-length ASVs to one length and collapse them
//! - **reconstruct**: Combine regions into full-length feature abundances
//! - **taxonomy**: Consensus taxonomy for reconstructed features
//!
//! ## Usage
//!
//! ```text
//! # Build the V4 kmer database
//! smurf-solver extract refs.fasta --fwd-primer GTGYCAGCMGCCGCGGTAA \
//!     --rev-primer GGACTACNVGGGTWTCTAAT --trim-length 150 --output v4-kmers.json
//!
//! # Align V4 ASVs
//! smurf-solver align --kmer-map v4-kmers.json --rep-seqs v4-asvs.fasta --output v4-aln.json
//!
//! # Reconstruct from every region listed in a manifest
//! smurf-solver reconstruct manifest.tsv --output-dir results/
//!
//! # JSON run report for scripting
//! smurf-solver --format json taxonomy --map results/reconstruction-map.json \
//!     --taxonomy refs-taxonomy.tsv --output taxonomy.tsv
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::core::types::{count_by_reason, Discard};
use crate::parsing::tsv::format_discards;
use crate::utils::pool::ExecutionConfig;

pub mod align;
pub mod extract;
pub mod filter;
pub mod reconstruct;
pub mod taxonomy;
pub mod trim;

#[derive(Parser)]
#[command(name = "smurf-solver")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Reconstruct full-length marker gene profiles from multiple amplicon regions")]
#[command(
    long_about = "smurf-solver combines short-read amplicons from several variable regions of a marker gene into one full-length profile.\n\nEach region is amplified in silico from a reference database, ASVs are aligned to the regional kmers, and evidence from every region is joined into features made of indistinguishable references:\n- Regional kmer databases with degenerate base expansion\n- Mismatch-bounded ASV to kmer alignment\n- Abundance redistribution and summation across regions\n- Consensus taxonomy per reconstructed feature"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format of the run report
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drop full-length references with too many degenerate positions
    FilterDegenerate(filter::FilterArgs),

    /// Extract a region with primers and build its kmer database
    Extract(extract::ExtractArgs),

    /// Build a kmer database from sequences that already span the region
    Prepare(extract::ExtractArgs),

    /// Align representative sequences to a regional kmer database
    Align(align::AlignArgs),

    /// Trim ASVs to a common length and collapse identical ones
    TrimPosthoc(trim::TrimArgs),

    /// Reconstruct full-length feature abundances from all regions
    Reconstruct(reconstruct::ReconstructArgs),

    /// Build consensus taxonomy for reconstructed features
    Taxonomy(taxonomy::TaxonomyArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Chunking and worker options shared by the parallel stages
#[derive(clap::Args, Debug, Clone)]
pub struct ExecutionArgs {
    /// Sequences per chunk (defaults depend on the stage)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Worker threads (0 uses every available core)
    #[arg(long, default_value = "0")]
    pub n_workers: usize,

    /// Run every chunk on the main thread
    #[arg(long)]
    pub debug: bool,
}

impl ExecutionArgs {
    #[must_use]
    pub fn to_config(&self, default_chunk_size: usize) -> ExecutionConfig {
        ExecutionConfig {
            chunk_size: self.chunk_size.unwrap_or(default_chunk_size),
            n_workers: self.n_workers,
            debug: self.debug,
        }
    }
}

/// What a subcommand did, printed in the requested format
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub command: String,
    /// Named counts, e.g. sequences read and kept
    pub counts: BTreeMap<String, usize>,
    /// Named real values, e.g. unaligned abundance per region
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, f64>,
    /// Discard reason -> number of sequences dropped
    pub discards: BTreeMap<String, usize>,
    /// Output name -> path written
    pub outputs: BTreeMap<String, PathBuf>,
}

impl RunReport {
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            ..Self::default()
        }
    }

    pub fn count(&mut self, name: &str, value: usize) {
        self.counts.insert(name.to_string(), value);
    }

    pub fn value(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn discards(&mut self, discards: &[Discard]) {
        for (reason, count) in count_by_reason(discards) {
            *self.discards.entry(reason.to_string()).or_insert(0) += count;
        }
    }

    pub fn output(&mut self, name: &str, path: &Path) {
        self.outputs.insert(name.to_string(), path.to_path_buf());
    }

    /// Print the report to stdout
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn print(&self, format: OutputFormat) -> anyhow::Result<()> {
        match format {
            OutputFormat::Text => self.print_text(),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(self)?),
            OutputFormat::Tsv => self.print_tsv(),
        }
        Ok(())
    }

    fn print_text(&self) {
        println!("{}", self.command);
        for (name, count) in &self.counts {
            println!("  {name:<24} {count}");
        }
        for (name, value) in &self.values {
            println!("  {name:<24} {value}");
        }
        if !self.discards.is_empty() {
            println!("\nDiscarded:");
            for (reason, count) in &self.discards {
                println!("  {reason:<24} {count}");
            }
        }
        if !self.outputs.is_empty() {
            println!("\nOutputs:");
            for (name, path) in &self.outputs {
                println!("  {name:<24} {}", path.display());
            }
        }
    }

    fn print_tsv(&self) {
        println!("section\tname\tvalue");
        for (name, count) in &self.counts {
            println!("count\t{name}\t{count}");
        }
        for (name, value) in &self.values {
            println!("value\t{name}\t{value}");
        }
        for (reason, count) in &self.discards {
            println!("discard\t{reason}\t{count}");
        }
        for (name, path) in &self.outputs {
            println!("output\t{name}\t{}", path.display());
        }
    }
}

/// Write itemized discards when a path was requested
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_discards(
    path: Option<&Path>,
    discards: &[Discard],
    report: &mut RunReport,
) -> anyhow::Result<()> {
    report.discards(discards);
    if let Some(path) = path {
        std::fs::write(path, format_discards(discards))?;
        report.output("discards", path);
    }
    Ok(())
}
