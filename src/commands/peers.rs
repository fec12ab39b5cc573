//! Peers command - manage trusted peer public keys.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use versecrypt::crypto::{fingerprint, load_public_key, CryptoKey, PublicKey};
use versecrypt::peers::{FilePeerStore, PeerId, PeerKeyStore};
use versecrypt::Config;

use super::{CommandExecutor, DEFAULT_PACKAGE};

/// Manage the public keys of the people you talk to.
///
/// Peers are stored in ~/.versecrypt/peers.toml (or the `peers` path in
/// config.toml) and can be used with --peer in encrypt/decrypt.
#[derive(Args, Debug)]
pub struct PeersCommand {
    #[command(subcommand)]
    pub action: PeersAction,
}

#[derive(Subcommand, Debug)]
pub enum PeersAction {
    /// List all peers
    List,

    /// Add a peer's public key
    Add(PeersAddArgs),

    /// Remove a peer
    Remove(PeerSelector),

    /// Show a peer's key fingerprint
    Show(PeerSelector),
}

#[derive(Args, Debug)]
pub struct PeersAddArgs {
    #[command(flatten)]
    pub peer: PeerSelector,

    /// Path to the peer's public key (.pub)
    pub key_path: PathBuf,
}

#[derive(Args, Debug)]
pub struct PeerSelector {
    /// Peer username
    pub username: String,

    /// Messaging app the peer is reached through
    #[arg(long, default_value = DEFAULT_PACKAGE)]
    pub package: String,
}

impl PeerSelector {
    fn id(&self) -> PeerId {
        PeerId::new(&self.username, &self.package)
    }
}

impl CommandExecutor for PeersCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let path = config.peers_path()?;
        let mut store = FilePeerStore::open(&path)
            .with_context(|| format!("Failed to open peer store {}", path.display()))?;

        match &self.action {
            PeersAction::List => list_peers(&store),
            PeersAction::Add(args) => add_peer(&mut store, args),
            PeersAction::Remove(args) => remove_peer(&mut store, args),
            PeersAction::Show(args) => show_peer(&store, args),
        }
    }
}

fn list_peers(store: &FilePeerStore) -> Result<()> {
    let peers = store.list()?;

    if peers.is_empty() {
        println!("No peers configured.");
        println!();
        println!("Add a peer with:");
        println!("  versecrypt peers add <username> <key-path> [--package <app>]");
        return Ok(());
    }

    println!("Peers ({}):", peers.len());
    println!();
    for (id, key) in peers {
        match PublicKey::try_from(&key) {
            Ok(public) => println!("  {:<32} {}", id.to_string(), fingerprint(&public)),
            Err(e) => println!("  {:<32} (unusable key: {})", id.to_string(), e),
        }
    }

    Ok(())
}

fn add_peer(store: &mut FilePeerStore, args: &PeersAddArgs) -> Result<()> {
    let public = load_public_key(&args.key_path)
        .with_context(|| format!("Failed to load public key from {}", args.key_path.display()))?;

    let id = args.peer.id();
    store
        .insert(id.clone(), CryptoKey::from(&public))
        .with_context(|| format!("Failed to add peer {}", id))?;

    println!("Peer '{}' added.", id);
    println!("  Fingerprint: {}", fingerprint(&public));
    println!();
    println!("Verify this fingerprint with {} over another channel.", args.peer.username);

    Ok(())
}

fn remove_peer(store: &mut FilePeerStore, args: &PeerSelector) -> Result<()> {
    let id = args.id();
    store
        .remove(&id)
        .with_context(|| format!("Failed to remove peer {}", id))?;

    println!("Peer '{}' removed.", id);
    Ok(())
}

fn show_peer(store: &FilePeerStore, args: &PeerSelector) -> Result<()> {
    let id = args.id();
    let public = store.public_key(&id)?;

    println!("Peer: {}", id);
    println!("  Username:    {}", id.username);
    println!("  Package:     {}", id.package);
    println!("  Algorithm:   {}", public.algorithm());
    println!("  Fingerprint: {}", fingerprint(&public));
    println!();
    println!("{}", public.to_pem()?);

    Ok(())
}
