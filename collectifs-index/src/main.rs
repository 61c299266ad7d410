//! Point d'entrée CLI pour collectifs-index

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod report;

use cli::Commands;

/// Générer l'index des parcelles collectives d'un recensement foncier
#[derive(Parser)]
#[command(name = "collectifs-index")]
#[command(author, version)]
#[command(about = "Générer l'index des parcelles collectives depuis un recensement GeoJSON")]
#[command(
    long_about = "Parse un recensement foncier (GeoJSON ou liste brute de propriétés), fusionne les enregistrements par parcelle et écrit l'index des parcelles collectives.\n\nUn cache fichier optionnel évite de recalculer les parcelles déjà vues."
)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Index {
            input,
            output,
            cache,
            pretty,
        } => {
            info!(input = %input.display(), output = %output.display(), "Génération de l'index");
            cli::cmd_index(&input, &output, cache.as_deref(), pretty).await?;
        }
        Commands::Inspect { input, parcel } => {
            cli::cmd_inspect(&input, &parcel).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
