use std::path::PathBuf;

use clap::Args;

use crate::cli::{OutputFormat, RunReport};
use crate::core::reconstruction::ReconstructionMap;
use crate::parsing::artifact;
use crate::parsing::tsv::{format_taxonomy, parse_taxonomy};
use crate::taxonomy::reconcile::UNASSIGNED;
use crate::taxonomy::{
    reconstruct_taxonomy, AmbiguityHandling, Database, DefineMissing, TaxonomyPolicy,
};

#[derive(Args)]
pub struct TaxonomyArgs {
    /// Reconstruction map (JSON from `reconstruct`)
    #[arg(long)]
    pub map: PathBuf,

    /// Reference taxonomy (TSV: `Feature ID<TAB>Taxon`)
    #[arg(long)]
    pub taxonomy: PathBuf,

    /// Output feature taxonomy (TSV)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Source database of the reference taxonomy
    #[arg(long, value_enum, default_value = "none")]
    pub database: Database,

    /// How labels without a name are reconciled
    #[arg(long, value_enum, default_value = "merge")]
    pub define_missing: DefineMissing,

    /// Whether ambiguity markers count as missing
    #[arg(long, value_enum, default_value = "missing")]
    pub ambiguity_handling: AmbiguityHandling,
}

/// Execute taxonomy subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read, a reference lacks taxonomy,
/// or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: TaxonomyArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let map: ReconstructionMap = artifact::load(&args.map)?;
    let taxonomy = parse_taxonomy(&args.taxonomy)?;
    if verbose {
        eprintln!(
            "Reconciling taxonomy of {} features from {} references",
            map.len(),
            taxonomy.len()
        );
    }

    let policy = TaxonomyPolicy::new(args.database, args.define_missing, args.ambiguity_handling);
    let consensus = reconstruct_taxonomy(&map, &taxonomy, &policy)?;
    std::fs::write(&args.output, format_taxonomy(&consensus))?;

    let mut report = RunReport::new("taxonomy");
    report.count("features", consensus.len());
    report.count(
        "unassigned",
        consensus.values().filter(|t| t.as_str() == UNASSIGNED).count(),
    );
    report.output("taxonomy", &args.output);
    report.print(format)
}
