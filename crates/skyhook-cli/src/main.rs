use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod input;
mod shutdown;

#[derive(Parser)]
#[command(name = "skyhook")]
#[command(about = "Pointer-chain position trainer")]
struct Args {
    /// Game description file (TOML).
    #[arg(short, long, default_value = "game.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Attach to the configured process and run the trainer loop.
    Run {
        /// Hotkey bindings file (TOML).
        #[arg(long, default_value = "hotkeys.toml")]
        hotkeys: PathBuf,

        /// Directory holding per-process waypoint files.
        #[arg(long, default_value = "positions")]
        data_dir: PathBuf,

        /// Override the configured horizontal move step.
        #[arg(long)]
        move_xy: Option<f32>,

        /// Override the configured vertical move step.
        #[arg(long)]
        move_z: Option<f32>,
    },
    /// Resolve the configured chains once and print addresses and values.
    Resolve,
    /// List and validate a waypoint file.
    Waypoints {
        /// Waypoint file; defaults to the conventional per-process file.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Directory holding per-process waypoint files.
        #[arg(long, default_value = "positions")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("skyhook=info".parse()?))
        .init();

    let args = Args::parse();
    match args.command {
        Command::Run {
            hotkeys,
            data_dir,
            move_xy,
            move_z,
        } => commands::run::run(&args.config, &hotkeys, &data_dir, move_xy, move_z),
        Command::Resolve => commands::resolve::run(&args.config),
        Command::Waypoints { file, data_dir } => {
            commands::waypoints::run(&args.config, file.as_deref(), &data_dir)
        }
    }
}
