//! Binary container for persisting an identity key pair.
//!
//! Layout, all lengths big-endian `u32`:
//!
//! ```text
//! [len][private algorithm, UTF-8][len][PKCS#8 bytes]
//! [len][public algorithm, UTF-8][len][SPKI bytes]
//! ```
//!
//! External stores already hold records in this layout, so the framing must
//! stay byte-for-byte stable.

use zeroize::Zeroizing;

use super::keys::{IdentityKeyPair, KeyError, PrivateKey, PublicKey, EC_ALGORITHM};

const LEN_PREFIX: usize = 4;

/// Serializes an identity key pair into the container layout.
pub fn encode_identity_container(pair: &IdentityKeyPair) -> Zeroizing<Vec<u8>> {
    let private = pair.private_key();
    let public = pair.public_key();

    let fields: [&[u8]; 4] = [
        private.algorithm().as_bytes(),
        private.encoded(),
        public.algorithm().as_bytes(),
        public.encoded(),
    ];

    let total: usize = fields.iter().map(|f| LEN_PREFIX + f.len()).sum();
    let mut out = Zeroizing::new(Vec::with_capacity(total));
    for field in fields {
        out.extend_from_slice(&(field.len() as u32).to_be_bytes());
        out.extend_from_slice(field);
    }
    out
}

/// Parses a container back into an identity key pair.
///
/// Fails on truncated records, trailing bytes, non-UTF-8 or unknown algorithm
/// names, unparseable keys, and keys that do not form a pair.
pub fn decode_identity_container(bytes: &[u8]) -> Result<IdentityKeyPair, KeyError> {
    let mut reader = FieldReader { data: bytes, pos: 0 };

    let private_algorithm = reader.read_str("private algorithm")?;
    let private_bytes = reader.read_field("private key")?;
    let public_algorithm = reader.read_str("public algorithm")?;
    let public_bytes = reader.read_field("public key")?;

    if reader.pos != bytes.len() {
        return Err(KeyError::InvalidContainer(format!(
            "{} trailing byte(s)",
            bytes.len() - reader.pos
        )));
    }

    for algorithm in [private_algorithm, public_algorithm] {
        if algorithm != EC_ALGORITHM {
            return Err(KeyError::UnsupportedAlgorithm(algorithm.to_string()));
        }
    }

    let private = PrivateKey::from_pkcs8_der(private_bytes)?;
    let public = PublicKey::from_spki_der(public_bytes)?;
    IdentityKeyPair::from_parts(private, public)
}

impl IdentityKeyPair {
    /// See [`encode_identity_container`].
    pub fn to_container_bytes(&self) -> Zeroizing<Vec<u8>> {
        encode_identity_container(self)
    }

    /// See [`decode_identity_container`].
    pub fn from_container_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        decode_identity_container(bytes)
    }
}

struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], KeyError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| KeyError::InvalidContainer(format!("truncated {}", what)))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_field(&mut self, what: &str) -> Result<&'a [u8], KeyError> {
        let prefix = self.take(LEN_PREFIX, what)?;
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        self.take(len, what)
    }

    fn read_str(&mut self, what: &str) -> Result<&'a str, KeyError> {
        let bytes = self.read_field(what)?;
        std::str::from_utf8(bytes)
            .map_err(|_| KeyError::InvalidContainer(format!("{} is not UTF-8", what)))
    }
}
