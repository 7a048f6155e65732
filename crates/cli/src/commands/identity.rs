use anyhow::Result;
use clap::Subcommand;
use sputnik::identity::{fingerprint, public_key_pem};
use sputnik::{IdentityManager, KeyManager};
use tracing::{info, warn};

#[derive(Debug, Subcommand)]
pub enum IdentityCommand {
    /// Print the public key to register in the CloudKit dashboard
    Show,
    /// Generate a new private key
    Create {
        /// Replace an existing identity. Its key ID is dropped as well
        #[clap(long)]
        force: bool,
    },
    /// Delete the private key, its derivation and the stored key ID
    Remove,
}

pub fn run(command: IdentityCommand, identity: &mut IdentityManager) -> Result<()> {
    match command {
        IdentityCommand::Show => show(identity),
        IdentityCommand::Create { force } => create(identity, force),
        IdentityCommand::Remove => remove(identity),
    }
}

fn show(identity: &mut IdentityManager) -> Result<()> {
    if !identity.signing_identity_exists()? {
        warn!("no signing identity found; create one with `sputnik identity create`");
        return Ok(());
    }

    let public_key = *identity.public_key()?;
    print!("{}", public_key_pem(&public_key)?);
    println!("fingerprint: {}", fingerprint(&public_key));

    match identity.key_id() {
        Ok(key_id) => println!("key id: {key_id}"),
        Err(e) if e.is_missing() => println!("key id: not stored"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn create(identity: &mut IdentityManager, force: bool) -> Result<()> {
    if !force && identity.signing_identity_exists()? {
        if let Ok(key_id) = identity.key_id() {
            info!(%key_id, "existing identity is registered");
        }
    }
    identity.create_signing_identity(force)?;

    let public_key = *identity.public_key()?;
    print!("{}", public_key_pem(&public_key)?);
    println!(
        "Register this public key in the CloudKit dashboard, then run `sputnik keyid store <key id>`."
    );
    Ok(())
}

fn remove(identity: &mut IdentityManager) -> Result<()> {
    if !identity.signing_identity_exists()? {
        info!("no signing identity to remove");
        return Ok(());
    }

    // Printed before removal so the user can match it in the dashboard.
    let public_key = public_key_pem(identity.public_key()?)?;
    identity.remove_signing_identity()?;

    println!("Removed signing identity with public key:");
    print!("{public_key}");
    println!("Revoke the matching key ID in the CloudKit dashboard.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sputnik::{KeyStoreConfig, SputnikError};

    fn identity(dir: &tempfile::TempDir) -> IdentityManager {
        IdentityManager::open(KeyStoreConfig::new(dir.path().join("secrets")))
    }

    #[test]
    fn show_without_identity_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        run(IdentityCommand::Show, &mut identity(&dir)).unwrap();
    }

    #[test]
    fn create_show_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut identity = identity(&dir);

        run(IdentityCommand::Create { force: false }, &mut identity).unwrap();
        assert!(identity.signing_identity_exists().unwrap());
        run(IdentityCommand::Show, &mut identity).unwrap();

        run(IdentityCommand::Remove, &mut identity).unwrap();
        assert!(!identity.signing_identity_exists().unwrap());
        assert!(!identity.store().private_key_path().exists());
    }

    #[test]
    fn create_twice_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let mut identity = identity(&dir);
        run(IdentityCommand::Create { force: false }, &mut identity).unwrap();
        let first = *identity.public_key().unwrap();

        let err = run(IdentityCommand::Create { force: false }, &mut identity).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SputnikError>(),
            Some(SputnikError::IdentityExists { .. })
        ));
        assert_eq!(*identity.public_key().unwrap(), first);

        run(IdentityCommand::Create { force: true }, &mut identity).unwrap();
        assert_ne!(*identity.public_key().unwrap(), first);
    }

    #[test]
    fn remove_without_identity_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        run(IdentityCommand::Remove, &mut identity(&dir)).unwrap();
    }
}
