//! Key lifecycle: generation, reconstruction, fingerprints, validation.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::keys::{
    Curve, EphemeralKeyPair, IdentityKeyPair, KeyError, KeyPair, KeyRole, PrivateKey, PublicKey,
};

/// How many times key generation is retried before giving up.
pub const DEFAULT_KEYGEN_ATTEMPTS: u32 = 3;

/// Number of hash bytes shown in a fingerprint.
const FINGERPRINT_BYTES: usize = 8;

/// All elliptic-curve key operations, bound to one configured curve.
pub trait KeyManager: Send + Sync {
    /// The curve every key is generated on.
    fn curve(&self) -> Curve;

    /// Generates a long-lived identity key pair.
    fn generate_identity_key_pair(&self) -> Result<IdentityKeyPair, KeyError>;

    /// Generates a session-scoped key pair.
    fn generate_ephemeral_key_pair(&self) -> Result<EphemeralKeyPair, KeyError>;

    /// Parses a remotely received SPKI public key.
    ///
    /// This is the only way a peer key enters the system.
    fn reconstruct_public_key(&self, encoded: &[u8]) -> Result<PublicKey, KeyError>;

    /// Parses a PKCS#8 private key.
    fn reconstruct_private_key(&self, encoded: &[u8]) -> Result<PrivateKey, KeyError>;

    /// Returns the canonical encoding of `key`.
    fn serialize_public_key(&self, key: &PublicKey) -> Vec<u8> {
        key.encoded().to_vec()
    }

    /// Short, human-comparable fingerprint of `key`. See [`fingerprint`].
    fn calculate_fingerprint(&self, key: &PublicKey) -> String {
        fingerprint(key)
    }

    /// Returns true if both encodings parse.
    ///
    /// Does NOT check that the two keys belong together; use
    /// [`KeyPair::from_parts`] for that.
    fn validate_key_pair(&self, private_encoded: &[u8], public_encoded: &[u8]) -> bool {
        self.reconstruct_private_key(private_encoded).is_ok()
            && self.reconstruct_public_key(public_encoded).is_ok()
    }
}

/// P-256 key manager backed by the OS random number generator.
#[derive(Debug, Clone)]
pub struct EcKeyManager {
    curve: Curve,
    keygen_attempts: u32,
}

impl Default for EcKeyManager {
    fn default() -> Self {
        Self::new(Curve::default())
    }
}

impl EcKeyManager {
    pub fn new(curve: Curve) -> Self {
        Self {
            curve,
            keygen_attempts: DEFAULT_KEYGEN_ATTEMPTS,
        }
    }

    /// Sets the number of generation attempts (at least one).
    pub fn with_keygen_attempts(mut self, attempts: u32) -> Self {
        self.keygen_attempts = attempts.max(1);
        self
    }

    /// Generates a key pair from `rng`, retrying up to the configured number
    /// of attempts when the source fails or yields an out-of-range scalar.
    pub fn generate_with<R, G>(&self, rng: &mut G) -> Result<KeyPair<R>, KeyError>
    where
        R: KeyRole,
        G: RngCore + CryptoRng,
    {
        let mut last_error = String::new();

        for attempt in 1..=self.keygen_attempts {
            match sample_secret(rng) {
                Ok(secret) => {
                    debug!(curve = %self.curve, attempt, key_type = ?R::KEY_TYPE, "generated key pair");
                    return KeyPair::from_secret(secret);
                }
                Err(reason) => {
                    warn!(curve = %self.curve, attempt, %reason, "key generation attempt failed");
                    last_error = reason;
                }
            }
        }

        Err(KeyError::KeyGeneration {
            attempts: self.keygen_attempts,
            reason: last_error,
        })
    }
}

/// Draws a scalar from `rng`.
///
/// Values of zero or above the group order are rejected rather than reduced.
fn sample_secret<G: RngCore + CryptoRng>(rng: &mut G) -> Result<p256::SecretKey, String> {
    let mut bytes = Zeroizing::new([0u8; 32]);
    rng.try_fill_bytes(&mut bytes[..])
        .map_err(|e| format!("random source failed: {}", e))?;
    p256::SecretKey::from_slice(&bytes[..]).map_err(|_| "sampled scalar out of range".to_string())
}

impl KeyManager for EcKeyManager {
    fn curve(&self) -> Curve {
        self.curve
    }

    fn generate_identity_key_pair(&self) -> Result<IdentityKeyPair, KeyError> {
        self.generate_with(&mut OsRng)
    }

    fn generate_ephemeral_key_pair(&self) -> Result<EphemeralKeyPair, KeyError> {
        self.generate_with(&mut OsRng)
    }

    fn reconstruct_public_key(&self, encoded: &[u8]) -> Result<PublicKey, KeyError> {
        PublicKey::from_spki_der(encoded)
    }

    fn reconstruct_private_key(&self, encoded: &[u8]) -> Result<PrivateKey, KeyError> {
        PrivateKey::from_pkcs8_der(encoded)
    }
}

/// Fingerprint of a public key: SHA-256 over the SPKI bytes, first 8 bytes as
/// colon-separated uppercase hex (`A1:B2:C3:D4:E5:F6:07:18`).
///
/// 64 bits is enough for a person to compare over the phone. It is a display
/// aid, not an identity check.
pub fn fingerprint(key: &PublicKey) -> String {
    let hash = Sha256::digest(key.encoded());
    hash[..FINGERPRINT_BYTES]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}
