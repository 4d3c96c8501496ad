use clap::Parser;
use tracing_subscriber::EnvFilter;

use smurf_solver::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("smurf_solver=debug,info")
    } else {
        EnvFilter::new("smurf_solver=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::FilterDegenerate(args) => {
            cli::filter::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Extract(args) => {
            cli::extract::run_extract(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Prepare(args) => {
            cli::extract::run_prepare(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Align(args) => {
            cli::align::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::TrimPosthoc(args) => {
            cli::trim::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Reconstruct(args) => {
            cli::reconstruct::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Taxonomy(args) => {
            cli::taxonomy::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
