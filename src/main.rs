//! JobGuard resampling - command-line entry point

use clap::Parser;
use jobguard_resample::cli::{cmd_resample, cmd_variants, resolve_config, Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobguard=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resample { data, target, variant, seed, k_neighbors, config, output } => {
            let config = resolve_config(config.as_deref(), variant.as_deref(), seed, k_neighbors)?;
            cmd_resample(&data, &target, &config, output.as_deref())?;
        }
        Commands::Variants => {
            cmd_variants()?;
        }
    }

    Ok(())
}
