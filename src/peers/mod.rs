//! Peer public-key trust store.
//!
//! Peers are keyed by `(username, package)`: the same person can be reached
//! through several chat apps, and each app gets its own key entry.
//!
//! Two stores ship with the crate:
//! - [`MemoryPeerStore`] for tests and embedding
//! - [`FilePeerStore`], a TOML file (`~/.versecrypt/peers.toml` by default)

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::crypto::{write_private_file, CryptoKey, KeyError, PublicKey};

/// Errors that can occur when managing peer keys.
#[derive(Error, Debug)]
pub enum PeerError {
    #[error("Peer not found: {0}")]
    NotFound(PeerId),

    #[error("Peer already has a different key: {0}")]
    AlreadyExists(PeerId),

    #[error("Invalid peer record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

/// Identifies a peer on one messaging app.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId {
    pub username: String,
    pub package: String,
}

impl PeerId {
    pub fn new(username: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            package: package.into(),
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.package)
    }
}

/// Storage for peers' public keys.
pub trait PeerKeyStore {
    /// The stored key for `peer`, if any.
    fn lookup(&self, peer: &PeerId) -> Result<Option<CryptoKey>, PeerError>;

    /// Stores `key` for `peer`.
    ///
    /// Re-inserting the same key is a no-op. A different key for a known peer
    /// fails with [`PeerError::AlreadyExists`]; remove the old one first.
    fn insert(&mut self, peer: PeerId, key: CryptoKey) -> Result<(), PeerError>;

    /// Removes and returns the key for `peer`.
    fn remove(&mut self, peer: &PeerId) -> Result<CryptoKey, PeerError>;

    /// All peers, sorted.
    fn list(&self) -> Result<Vec<(PeerId, CryptoKey)>, PeerError>;

    fn exists(&self, peer: &PeerId) -> Result<bool, PeerError> {
        Ok(self.lookup(peer)?.is_some())
    }

    /// The peer's key, parsed and ready for key agreement.
    fn public_key(&self, peer: &PeerId) -> Result<PublicKey, PeerError> {
        let key = self
            .lookup(peer)?
            .ok_or_else(|| PeerError::NotFound(peer.clone()))?;
        Ok(PublicKey::try_from(&key)?)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// A [`PeerKeyStore`] that lives only in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryPeerStore {
    peers: HashMap<PeerId, CryptoKey>,
}

impl MemoryPeerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl PeerKeyStore for MemoryPeerStore {
    fn lookup(&self, peer: &PeerId) -> Result<Option<CryptoKey>, PeerError> {
        Ok(self.peers.get(peer).cloned())
    }

    fn insert(&mut self, peer: PeerId, key: CryptoKey) -> Result<(), PeerError> {
        if is_new_key(self.peers.get(&peer), &peer, &key)? {
            self.peers.insert(peer, key);
        }
        Ok(())
    }

    fn remove(&mut self, peer: &PeerId) -> Result<CryptoKey, PeerError> {
        self.peers
            .remove(peer)
            .ok_or_else(|| PeerError::NotFound(peer.clone()))
    }

    fn list(&self) -> Result<Vec<(PeerId, CryptoKey)>, PeerError> {
        let mut peers: Vec<_> = self
            .peers
            .iter()
            .map(|(id, key)| (id.clone(), key.clone()))
            .collect();
        peers.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(peers)
    }
}

/// True if `key` is new for `peer`; an error if `peer` holds a different key.
fn is_new_key(existing: Option<&CryptoKey>, peer: &PeerId, key: &CryptoKey) -> Result<bool, PeerError> {
    match existing {
        Some(current) if current == key => Ok(false),
        Some(_) => Err(PeerError::AlreadyExists(peer.clone())),
        None => Ok(true),
    }
}

// ============================================================================
// TOML file store
// ============================================================================

/// One `[[peers]]` entry in `peers.toml`.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct PeerRecord {
    username: String,
    package: String,
    algorithm: String,
    /// Base64 of the SPKI bytes.
    key: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct PeersFile {
    #[serde(default)]
    peers: Vec<PeerRecord>,
}

/// A [`PeerKeyStore`] backed by a TOML file.
///
/// The whole file is read on open; every mutation rewrites it.
#[derive(Debug)]
pub struct FilePeerStore {
    path: PathBuf,
    peers: BTreeMap<PeerId, CryptoKey>,
}

impl FilePeerStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PeerError> {
        let path = path.into();
        let mut peers = BTreeMap::new();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let file: PeersFile = toml::from_str(&content)?;

            for (index, record) in file.peers.into_iter().enumerate() {
                let encoded = BASE64
                    .decode(record.key.trim())
                    .map_err(|e| PeerError::InvalidRecord {
                        index,
                        reason: format!("key is not base64: {}", e),
                    })?;
                let id = PeerId::new(record.username, record.package);
                if peers.contains_key(&id) {
                    return Err(PeerError::InvalidRecord {
                        index,
                        reason: format!("duplicate entry for {}", id),
                    });
                }
                peers.insert(id, CryptoKey::new(encoded, record.algorithm));
            }
        }

        debug!(path = %path.display(), peers = peers.len(), "peer store opened");
        Ok(Self { path, peers })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Writes the store back to its file.
    pub fn save(&self) -> Result<(), PeerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = PeersFile {
            peers: self
                .peers
                .iter()
                .map(|(id, key)| PeerRecord {
                    username: id.username.clone(),
                    package: id.package.clone(),
                    algorithm: key.algorithm.clone(),
                    key: BASE64.encode(&key.encoded),
                })
                .collect(),
        };
        write_private_file(&self.path, toml::to_string_pretty(&file)?.as_bytes())?;

        Ok(())
    }
}

impl PeerKeyStore for FilePeerStore {
    fn lookup(&self, peer: &PeerId) -> Result<Option<CryptoKey>, PeerError> {
        Ok(self.peers.get(peer).cloned())
    }

    fn insert(&mut self, peer: PeerId, key: CryptoKey) -> Result<(), PeerError> {
        if !is_new_key(self.peers.get(&peer), &peer, &key)? {
            return Ok(());
        }
        self.peers.insert(peer.clone(), key);
        if let Err(e) = self.save() {
            // Keep the map in step with the file.
            self.peers.remove(&peer);
            return Err(e);
        }
        info!(peer = %peer, "peer key stored");
        Ok(())
    }

    fn remove(&mut self, peer: &PeerId) -> Result<CryptoKey, PeerError> {
        let key = self
            .peers
            .remove(peer)
            .ok_or_else(|| PeerError::NotFound(peer.clone()))?;
        if let Err(e) = self.save() {
            self.peers.insert(peer.clone(), key);
            return Err(e);
        }
        info!(peer = %peer, "peer key removed");
        Ok(key)
    }

    fn list(&self) -> Result<Vec<(PeerId, CryptoKey)>, PeerError> {
        Ok(self
            .peers
            .iter()
            .map(|(id, key)| (id.clone(), key.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{EcKeyManager, KeyManager};
    use tempfile::TempDir;

    fn peer_key() -> (PublicKey, CryptoKey) {
        let kp = EcKeyManager::default().generate_identity_key_pair().unwrap();
        let public = kp.public_key().clone();
        let crypto = CryptoKey::from(&public);
        (public, crypto)
    }

    #[test]
    fn test_memory_store_crud() {
        let mut store = MemoryPeerStore::new();
        let alice = PeerId::new("alice", "org.example.chat");
        let (public, key) = peer_key();

        assert!(!store.exists(&alice).unwrap());
        store.insert(alice.clone(), key.clone()).unwrap();
        assert!(store.exists(&alice).unwrap());
        assert_eq!(store.lookup(&alice).unwrap(), Some(key.clone()));
        assert_eq!(store.public_key(&alice).unwrap(), public);

        // Same key again is fine
        store.insert(alice.clone(), key.clone()).unwrap();
        assert_eq!(store.len(), 1);

        // A different key is refused
        let (_, other) = peer_key();
        assert!(matches!(
            store.insert(alice.clone(), other),
            Err(PeerError::AlreadyExists(_))
        ));

        assert_eq!(store.remove(&alice).unwrap(), key);
        assert!(matches!(store.remove(&alice), Err(PeerError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_package_scopes_identity() {
        let mut store = MemoryPeerStore::new();
        let (_, k1) = peer_key();
        let (_, k2) = peer_key();

        store.insert(PeerId::new("bob", "app.one"), k1.clone()).unwrap();
        store.insert(PeerId::new("bob", "app.two"), k2.clone()).unwrap();

        assert_eq!(store.lookup(&PeerId::new("bob", "app.one")).unwrap(), Some(k1));
        assert_eq!(store.lookup(&PeerId::new("bob", "app.two")).unwrap(), Some(k2));
        assert_eq!(store.lookup(&PeerId::new("bob", "app.three")).unwrap(), None);
    }

    #[test]
    fn test_public_key_missing_peer() {
        let store = MemoryPeerStore::new();
        assert!(matches!(
            store.public_key(&PeerId::new("nobody", "x")),
            Err(PeerError::NotFound(_))
        ));
    }

    #[test]
    fn test_public_key_wrong_algorithm() {
        let mut store = MemoryPeerStore::new();
        let (_, key) = peer_key();
        let peer = PeerId::new("carol", "x");
        store
            .insert(peer.clone(), CryptoKey::new(key.encoded.clone(), "RSA"))
            .unwrap();
        assert!(matches!(
            store.public_key(&peer),
            Err(PeerError::Key(KeyError::UnsupportedAlgorithm(_)))
        ));
    }

    #[test]
    fn test_list_sorted() {
        let mut store = MemoryPeerStore::new();
        for name in ["zoe", "adam", "mia"] {
            let (_, key) = peer_key();
            store.insert(PeerId::new(name, "p"), key).unwrap();
        }
        let names: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|(id, _)| id.username)
            .collect();
        assert_eq!(names, vec!["adam", "mia", "zoe"]);
    }

    #[test]
    fn test_file_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("peers.toml");
        let alice = PeerId::new("alice", "org.example.chat");
        let (public, key) = peer_key();

        {
            let mut store = FilePeerStore::open(&path).unwrap();
            assert!(store.is_empty());
            store.insert(alice.clone(), key.clone()).unwrap();
        }

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[[peers]]"));
        assert!(text.contains("username = \"alice\""));
        assert!(text.contains("algorithm = \"EC\""));

        let mut store = FilePeerStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.public_key(&alice).unwrap(), public);

        store.remove(&alice).unwrap();
        let store = FilePeerStore::open(&path).unwrap();
        assert!(store.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("peers.toml");
        let mut store = FilePeerStore::open(&path).unwrap();
        let (_, key) = peer_key();
        store.insert(PeerId::new("a", "b"), key).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_failed_write_leaves_no_trace() {
        let dir = TempDir::new().unwrap();
        // The parent "directory" is a regular file, so every save fails.
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let mut store = FilePeerStore::open(blocker.join("peers.toml")).unwrap();

        let alice = PeerId::new("alice", "org.example.chat");
        let (_, key) = peer_key();

        assert!(store.insert(alice.clone(), key.clone()).is_err());
        assert_eq!(store.lookup(&alice).unwrap(), None);
        assert!(store.is_empty());

        // A retry fails again instead of silently succeeding.
        assert!(store.insert(alice.clone(), key).is_err());
        assert!(!store.exists(&alice).unwrap());
    }

    #[test]
    fn test_file_store_failed_remove_keeps_peer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("peers.toml");
        let mut store = FilePeerStore::open(&path).unwrap();
        let alice = PeerId::new("alice", "org.example.chat");
        let (_, key) = peer_key();
        store.insert(alice.clone(), key.clone()).unwrap();

        // Replace the file with a directory so the rewrite fails.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.remove(&alice).is_err());
        assert_eq!(store.lookup(&alice).unwrap(), Some(key));
    }

    #[test]
    fn test_file_store_rejects_bad_base64() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("peers.toml");
        fs::write(
            &path,
            "[[peers]]\nusername = \"a\"\npackage = \"b\"\nalgorithm = \"EC\"\nkey = \"%%%\"\n",
        )
        .unwrap();

        assert!(matches!(
            FilePeerStore::open(&path),
            Err(PeerError::InvalidRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_file_store_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("peers.toml");
        let entry = "[[peers]]\nusername = \"a\"\npackage = \"b\"\nalgorithm = \"EC\"\nkey = \"AAAA\"\n";
        fs::write(&path, format!("{}{}", entry, entry)).unwrap();

        assert!(matches!(
            FilePeerStore::open(&path),
            Err(PeerError::InvalidRecord { index: 1, .. })
        ));
    }

    #[test]
    fn test_peer_id_display() {
        assert_eq!(PeerId::new("alice", "org.example").to_string(), "alice@org.example");
    }
}
