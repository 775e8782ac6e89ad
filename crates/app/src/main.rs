mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use showcase_core::VolumeSettings;
use tracing_subscriber::EnvFilter;

fn main() -> showcase_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { settings } => session::run_demo(settings),
        Commands::Volume { settings, set } => run_volume(&settings, set),
    }
}

fn run_volume(path: &PathBuf, set: Option<u8>) -> showcase_core::Result<()> {
    let settings = VolumeSettings::new(path);
    if let Some(volume) = set {
        settings.store(volume)?;
        tracing::info!(volume, path = %settings.path().display(), "volume stored");
    }
    println!("volume: {}", settings.load());
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive 3D scene showcase", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scripted session against in-memory collaborators.
    Demo {
        /// Optional settings file used to restore and persist the volume.
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
    /// Inspect or set the persisted volume.
    Volume {
        /// Path to the settings file.
        settings: PathBuf,
        /// New volume percentage to store before reading back.
        #[arg(short = 'v', long = "set")]
        set: Option<u8>,
    },
}
