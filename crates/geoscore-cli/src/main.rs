//! geoscore command line entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use geoscore_cli::commands::{self, BuildMatrixOptions, PrepareOptions};
use geoscore_cli::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "geoscore", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the municipality feature matrix from a manifest
    BuildMatrix {
        /// Feature manifest
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the matrix here instead of the manifest's output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Build without writing the matrix
        #[arg(long)]
        no_save: bool,
    },

    /// Filter a saved matrix and split it into train and test sets
    Prepare {
        /// Saved feature matrix
        #[arg(short, long)]
        matrix: Option<PathBuf>,

        /// Training configuration
        #[arg(short, long)]
        training: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let settings = Settings::load()?;

    match cli.command {
        Command::BuildMatrix {
            config,
            output,
            no_save,
        } => {
            commands::build_matrix(&BuildMatrixOptions {
                config: config.unwrap_or(settings.features_config),
                output,
                no_save,
            })?;
        }
        Command::Prepare { matrix, training } => {
            commands::prepare(&PrepareOptions {
                matrix: matrix.unwrap_or(settings.matrix_path),
                training: training.unwrap_or(settings.training_config),
            })?;
        }
    }

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "geoscore_cli=info,geoscore_sdk=info,geoscore_runtime=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
