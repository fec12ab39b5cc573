//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.
//! Shared plumbing (reading input, building the codec, resolving peer keys)
//! lives here.

mod decode;
mod decrypt;
mod encode;
mod encrypt;
mod fingerprint;
mod keygen;
mod peers;
mod validate;

pub use decode::DecodeCommand;
pub use decrypt::DecryptCommand;
pub use encode::EncodeCommand;
pub use encrypt::EncryptCommand;
pub use fingerprint::FingerprintCommand;
pub use keygen::KeygenCommand;
pub use peers::PeersCommand;
pub use validate::ValidateCommand;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use versecrypt::corpus::{CorpusContext, CorpusProvider};
use versecrypt::crypto::{load_public_key, IdentityKeyPair, PublicKey};
use versecrypt::peers::{FilePeerStore, PeerId, PeerKeyStore};
use versecrypt::{Config, PoeticCodec};

/// Package name used when `--package` is not given.
pub const DEFAULT_PACKAGE: &str = "default";

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments and the user config.
    fn execute(&self, config: &Config) -> Result<()>;
}

/// Who the other side of a conversation is.
#[derive(Args, Debug, Clone)]
pub struct PeerArgs {
    /// Peer username, looked up in the peer store
    #[arg(long, conflicts_with = "peer_key", required_unless_present = "peer_key")]
    pub peer: Option<String>,

    /// Messaging app the peer is reached through
    #[arg(long, default_value = DEFAULT_PACKAGE)]
    pub package: String,

    /// Path to the peer's public key (.pub) instead of a stored peer
    #[arg(long)]
    pub peer_key: Option<PathBuf>,
}

impl PeerArgs {
    /// Resolves the peer's public key from a file or the peer store.
    pub fn resolve(&self, config: &Config) -> Result<PublicKey> {
        if let Some(path) = &self.peer_key {
            return load_public_key(path)
                .with_context(|| format!("Failed to load public key from {}", path.display()));
        }

        let Some(username) = &self.peer else {
            bail!("Either --peer or --peer-key is required");
        };

        let store_path = config.peers_path()?;
        let store = FilePeerStore::open(&store_path)
            .with_context(|| format!("Failed to open peer store {}", store_path.display()))?;
        let id = PeerId::new(username, &self.package);
        store
            .public_key(&id)
            .with_context(|| format!("No usable key for peer {}", id))
    }
}

/// Loads the local identity from `{path}.pub`/`{path}.key`, or from a
/// container file when `path` ends in `.id`.
pub fn load_identity(path: &Path) -> Result<IdentityKeyPair> {
    if path.extension().and_then(|e| e.to_str()) == Some("id") {
        let bytes = zeroize::Zeroizing::new(
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
        );
        return IdentityKeyPair::from_container_bytes(&bytes)
            .with_context(|| format!("Invalid identity container {}", path.display()));
    }

    IdentityKeyPair::load_from_files(path)
        .with_context(|| format!("Failed to load key pair {}", path.display()))
}

/// Reads all bytes from `path`, or from stdin when `path` is `None` or `-`.
pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(p) if p != Path::new("-") => {
            fs::read(p).with_context(|| format!("Failed to read {}", p.display()))
        }
        _ => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Reads UTF-8 text from `path` or stdin.
pub fn read_text(path: Option<&Path>) -> Result<String> {
    String::from_utf8(read_input(path)?).context("Input is not valid UTF-8")
}

/// Writes `data` to `path`, or to stdout when `path` is `None`.
pub fn write_output(path: Option<&Path>, data: &[u8]) -> Result<()> {
    match path {
        Some(p) => fs::write(p, data).with_context(|| format!("Failed to write {}", p.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Builds a codec over the configured corpus and loads it.
pub fn load_codec(config: &Config) -> Result<PoeticCodec<CorpusContext>> {
    let corpus = config.corpus_context();
    corpus.load().context("Failed to load word corpus")?;
    Ok(PoeticCodec::new(corpus))
}
