//! Inspect and convert config files
//!
//! ```text
//! cargo run -p config --example config_dump -- show settings.cfg
//! cargo run -p config --example config_dump -- get settings.kdl app/window/width
//! cargo run -p config --example config_dump -- convert settings.cfg settings.bin
//! cargo run -p config --example config_dump -- diff old.cfg new.cfg
//! ```

use clap::{Parser, Subcommand};
use config::Config;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "config_dump")]
#[command(about = "Inspect and convert Crossworld config files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a file in the text format
    Show { file: PathBuf },
    /// Print the value at a slash-separated path
    Get { file: PathBuf, path: String },
    /// Convert between formats, chosen by extension (.cfg, .bin, .kdl)
    Convert { input: PathBuf, output: PathBuf },
    /// Print what changed from one file to another
    Diff { old: PathBuf, new: PathBuf },
}

fn read(path: &Path) -> config::Result<Config> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("bin") => Config::load_binary(path),
        Some("kdl") => Config::from_kdl_file(path),
        _ => Config::read_text_file(path),
    }
}

fn write(tree: &Config, path: &Path) -> config::Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("bin") => tree.save_binary(path),
        _ => tree.save(path),
    }
}

fn run(cli: Cli) -> config::Result<()> {
    match cli.command {
        Commands::Show { file } => {
            print!("{}", read(&file)?);
        }
        Commands::Get { file, path } => {
            let tree = read(&file)?;
            match tree.lookup(&path) {
                Some(node) if node.exists() => println!("{}", node.string("")),
                Some(node) => print!("{}", node),
                None => tracing::warn!("{} has no entry {}", file.display(), path),
            }
        }
        Commands::Convert { input, output } => {
            let tree = read(&input)?;
            write(&tree, &output)?;
            tracing::info!("converted {} to {}", input.display(), output.display());
        }
        Commands::Diff { old, new } => {
            let changes = read(&old)?.diff(&read(&new)?);
            print!("{}", changes);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
