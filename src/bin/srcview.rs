//! srcview CLI binary entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use srcview::driver::{run_forward, run_reverse};
use srcview::layout::DiskLayout;
use srcview::Result;

/// Build-time source transformer: injects a diagnostic Source action into
/// controllers before the build and restores them after.
#[derive(Parser)]
#[command(name = "srcview")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Solution root to search for the web project (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward pass: inject the Source action into every controller file.
    #[command(name = "pre-build")]
    PreBuild,

    /// Reverse pass: restore originals from backups; publish views when the
    /// profile is Release.
    #[command(name = "post-build")]
    PostBuild {
        /// Publish output target directory
        target: PathBuf,

        /// Build profile name (publish copy runs only for Release)
        profile: String,
    },
}

fn run(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().map_err(|e| {
            srcview::SrcviewError::io(std::path::Path::new("."), e)
        })?,
    };
    let layout = DiskLayout::discover(&root)?;

    match cli.command {
        Commands::PreBuild => {
            run_forward(&layout)?;
        }
        Commands::PostBuild { target, profile } => {
            run_reverse(&layout, &target, &profile)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("srcview: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
