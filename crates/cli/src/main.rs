mod commands;
mod payload;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sputnik::{IdentityManager, KeyStoreConfig};
use tracing_subscriber::EnvFilter;

use commands::identity::IdentityCommand;
use commands::keyid::KeyIdCommand;
use commands::requests::RequestsCommand;

#[derive(Debug, Parser)]
#[clap(name = "sputnik", version, about = "Signed server-to-server requests for CloudKit Web Services")]
struct Args {
    /// Folder holding the private key, its DER derivation and the key ID
    /// (defaults to ~/.sputnik/secrets)
    #[clap(long, global = true, env = "SPUTNIK_SECRETS_DIR")]
    secrets_dir: Option<PathBuf>,
    /// Key ID to use instead of the stored one
    #[clap(long, global = true, env = "SPUTNIK_CLOUDKIT_KEYID", hide_env_values = true)]
    key_id: Option<String>,
    #[clap(short, long, global = true)]
    verbose: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show, create or remove the signing identity
    Identity {
        #[clap(subcommand)]
        command: IdentityCommand,
    },
    /// Show or store the key ID issued by the CloudKit dashboard
    Keyid {
        #[clap(subcommand)]
        command: KeyIdCommand,
    },
    /// Send signed requests
    Requests {
        #[clap(subcommand)]
        command: RequestsCommand,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = match args.secrets_dir {
        Some(dir) => KeyStoreConfig::new(dir),
        None => KeyStoreConfig::default_location()?,
    };
    let mut identity = IdentityManager::open(config).with_key_id_override(args.key_id);

    match args.command {
        Command::Identity { command } => commands::identity::run(command, &mut identity),
        Command::Keyid { command } => commands::keyid::run(command, &mut identity),
        Command::Requests { command } => commands::requests::run(command, &mut identity).await,
    }
}
