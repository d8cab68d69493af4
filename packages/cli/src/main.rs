mod commands;
mod config;
mod discovery;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{compose, init, ComposeArgs, InitArgs};
use tracing_subscriber::EnvFilter;

/// ViewCompose CLI - merge module view extensions into computed views
#[derive(Parser, Debug)]
#[command(name = "viewcompose")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new ViewCompose project
    Init(InitArgs),

    /// Compose every extended view into a computed view
    Compose(ComposeArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Compose(args) => compose(args, &cwd),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
