use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::*;
use reqtrack_cli::{run_server, ServeOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reqtrack")]
#[command(about = "reqtrack - requirements, ideas and change requests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// SQLite database file (overrides DATABASE_PATH)
        #[arg(long, conflicts_with = "in_memory")]
        database: Option<PathBuf>,
        /// Keep all data in memory for the lifetime of the process
        #[arg(long)]
        in_memory: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            port,
            database,
            in_memory,
        } => {
            println!("{}", "Starting reqtrack server...".green().bold());
            run_server(ServeOptions {
                port,
                database,
                in_memory,
            })
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
