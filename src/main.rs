use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod graph_cmd;
mod resolve_cmd;

/// Module dependency resolver
///
/// rove resolves a project's module dependency graph: it discovers
/// transitive requirements from one or more registries, selects exactly one
/// version per module (the maximum any reachable requirer asks for), applies
/// the root project's overrides, and emits fetch specifications plus
/// per-module repo mappings for the build system to consume.
///
/// QUICK START:
///
///   # declare deps and overrides in module.toml, registries in rove.toml
///   rove resolve
///
///   # inspect what was selected and why
///   rove graph
#[derive(Parser)]
#[command(name = "rove")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'rove <command> --help' for more information on a specific command.")]
struct Cli {
    /// Path to the root module manifest.
    #[arg(long, global = true, default_value = "module.toml")]
    manifest: PathBuf,

    /// Path to the resolver configuration.
    #[arg(long, global = true, default_value = "rove.toml")]
    config: PathBuf,

    /// Extra registry (path or URL); repeatable, highest priority first.
    #[arg(long = "registry", global = true, value_name = "LOCATION")]
    registries: Vec<String>,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the module graph and write the lockfile
    Resolve {
        /// Where to write the lockfile.
        #[arg(long, default_value = "rove.lock")]
        lock: PathBuf,

        /// Print the lockfile to stdout instead of writing it.
        #[arg(long)]
        print: bool,
    },

    /// Resolve and print the selected module graph
    Graph,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Resolve { lock, print } => resolve_cmd::run(&cli, lock, *print),
        Commands::Graph => graph_cmd::run(&cli),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("ROVE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
