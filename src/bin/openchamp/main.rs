//! openchamp CLI - developer tooling for the OpenChamp project

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("openchamp_tools=debug,openchamp=debug")
    } else {
        EnvFilter::new("openchamp_tools=info,openchamp=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let project_dir = cli.project_dir;

    match cli.command {
        Commands::Compile(args) => commands::compile::execute(project_dir, args),
        Commands::Export(args) => commands::export::execute(project_dir, args),
        Commands::Format(args) => commands::format::execute(project_dir, args),
        Commands::Variant(args) => commands::variant::execute(project_dir, args),
        Commands::Aseprite(args) => commands::aseprite::execute(project_dir, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
