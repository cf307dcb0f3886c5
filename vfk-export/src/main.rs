//! Point d'entrée CLI pour vfk-export

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use vfk_export::cli::{self, Commands};
use vfk_export::ExportStatus;

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Reconstruire les géométries cadastrales VFK et les exporter en GeoJSON
#[derive(Parser)]
#[command(name = "vfk-export")]
#[command(author, version)]
#[command(about = "Reconstruire les géométries cadastrales VFK et les exporter en GeoJSON")]
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

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let report = match cli.command {
        Commands::Export {
            path,
            output,
            config,
            report,
        } => cli::cmd_export(&path, &output, &config, report.as_deref())?,
        Commands::Check {
            path,
            config,
            report,
        } => cli::cmd_check(&path, &config, report.as_deref())?,
    };

    if report.status == ExportStatus::Failed {
        anyhow::bail!("{}", report.summary());
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
