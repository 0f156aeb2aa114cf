use clap::Parser;
use picsort::cli::{RunOptions, run_cli};
use std::path::PathBuf;
use std::process;

/// Sort pictures from an inbox tree into a date-structured archive.
#[derive(Parser)]
#[command(name = "picsort", version, about)]
struct Cli {
    /// Archive root (overrides the configured root)
    root: Option<PathBuf>,

    /// Path to a configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Prompt for new patterns when an entry matches nothing
    #[arg(short, long)]
    interactive: bool,
}

fn main() {
    let cli = Cli::parse();

    let options = RunOptions {
        root: cli.root,
        config: cli.config,
        interactive: cli.interactive,
    };

    if let Err(e) = run_cli(&options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
