use anyhow::Result;
use clap::Subcommand;
use sputnik::{IdentityManager, KeyManager};
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum KeyIdCommand {
    /// Print the key ID used for signing
    Show,
    /// Store the key ID issued for the registered public key
    Store {
        key_id: String,
    },
}

pub fn run(command: KeyIdCommand, identity: &mut IdentityManager) -> Result<()> {
    match command {
        KeyIdCommand::Show => println!("{}", identity.key_id()?),
        KeyIdCommand::Store { key_id } => {
            identity.store_key_id(&key_id)?;
            info!(path = %identity.store().key_id_path().display(), "stored key id");
        }
    }
    Ok(())
}
