mod cmd;
mod config_path;
mod credentials;
mod gate;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;
use vpurge_core::cancel::CancelToken;

#[derive(Parser)]
#[command(
    name = "vpurge",
    about = "Purge Verkada Command users, persons and plates that are not on an allow-list",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: nearest vpurge.yaml upward from cwd, then ~/.config/vpurge/)
    #[arg(long, global = true, env = "VPURGE_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log at debug level
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Organization ID to purge
        #[arg(long)]
        org_id: Option<String>,
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Inspect or validate the config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// List every remote record of one kind
    List {
        /// users, persons, or plates
        kind: String,
    },

    /// Show what a purge would keep and delete, without deleting
    Plan {
        /// users, persons, plates, or all
        kind: String,
    },

    /// Delete every record not on the allow-list
    Purge {
        /// users, persons, plates, or all
        kind: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        match &cli.command {
            Commands::Purge { .. } => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancelToken::new();
    if matches!(cli.command, Commands::Purge { .. }) {
        install_interrupt_handler(&cancel);
    }

    let config = config_path::resolve_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Init { org_id, force } => cmd::init::run(&config, org_id, force, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&config, subcommand, cli.json),
        Commands::List { kind } => cmd::list::run(&config, &kind, cli.json),
        Commands::Plan { kind } => cmd::plan::run(&config, &kind, cli.json),
        Commands::Purge { kind, yes } => cmd::purge::run(&config, &kind, yes, &cancel, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// First Ctrl-C stops new deletes and lets in-flight ones finish; a second
/// one exits immediately.
fn install_interrupt_handler(cancel: &CancelToken) {
    let token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if token.is_cancelled() {
            eprintln!("interrupted again; exiting");
            std::process::exit(130);
        }
        tracing::warn!("interrupt received; finishing in-flight deletes (Ctrl-C again to exit now)");
        token.cancel();
    }) {
        tracing::warn!("could not install Ctrl-C handler: {e}");
    }
}
