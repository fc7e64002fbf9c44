//! cfgdrift CLI
//!
//! Command-line interface for parsing and comparing configuration backups

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cfgdrift")]
#[command(about = "cfgdrift - Network configuration drift detection", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: commands::CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse one backup and print its normalized tree
    Parse(commands::parse::ParseArgs),
    /// Compare two backups of one device
    Diff(commands::diff::DiffArgs),
    /// Compare every device listed in a YAML manifest
    Batch(commands::batch::BatchArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse(args) => commands::parse::execute(&cli.common, args),
        Commands::Diff(args) => commands::diff::execute(&cli.common, args),
        Commands::Batch(args) => commands::batch::execute(&cli.common, args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
