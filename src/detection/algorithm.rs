//! Hash algorithm identifiers and digest values.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A hash algorithm supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5 (16-byte digest)
    Md5,
    /// SHA-1 (20-byte digest)
    Sha1,
    /// SHA-256 (32-byte digest)
    Sha256,
    /// SHA-512 (64-byte digest)
    Sha512,
}

impl HashAlgorithm {
    /// All supported algorithms, in lookup order.
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
    ];

    /// Length of a digest produced by this algorithm, in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Infer the algorithm from a raw digest length.
    pub fn from_digest_len(len: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.digest_len() == len)
    }

    /// Get the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha512" | "sha-512" => Ok(HashAlgorithm::Sha512),
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Md5 => write!(f, "MD5"),
            HashAlgorithm::Sha1 => write!(f, "SHA-1"),
            HashAlgorithm::Sha256 => write!(f, "SHA-256"),
            HashAlgorithm::Sha512 => write!(f, "SHA-512"),
        }
    }
}

/// A computed or known digest, tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawDigest")]
pub struct Digest {
    algorithm: HashAlgorithm,
    #[serde(with = "hex::serde")]
    bytes: Vec<u8>,
}

impl Digest {
    /// Create a digest, checking the length against the algorithm.
    pub fn new(algorithm: HashAlgorithm, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() != algorithm.digest_len() {
            return Err(Error::invalid_signature(
                hex::encode(&bytes),
                format!(
                    "{} digests are {} bytes, got {}",
                    algorithm,
                    algorithm.digest_len(),
                    bytes.len()
                ),
            ));
        }
        Ok(Self { algorithm, bytes })
    }

    /// Parse a hex digest for an explicit algorithm.
    pub fn from_hex(algorithm: HashAlgorithm, hex_str: &str) -> Result<Self> {
        let bytes = decode_hex(hex_str)?;
        Self::new(algorithm, bytes)
    }

    /// Parse a hex digest, inferring the algorithm from its length.
    pub fn infer_from_hex(hex_str: &str) -> Result<Self> {
        let bytes = decode_hex(hex_str)?;
        let algorithm = HashAlgorithm::from_digest_len(bytes.len()).ok_or_else(|| {
            Error::invalid_signature(
                hex_str.trim(),
                format!(
                    "{} hex characters does not match any known digest length",
                    hex_str.trim().len()
                ),
            )
        })?;
        Ok(Self { algorithm, bytes })
    }

    pub(crate) fn from_raw(algorithm: HashAlgorithm, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), algorithm.digest_len());
        Self { algorithm, bytes }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

#[derive(Deserialize)]
struct RawDigest {
    algorithm: HashAlgorithm,
    #[serde(with = "hex::serde")]
    bytes: Vec<u8>,
}

impl TryFrom<RawDigest> for Digest {
    type Error = Error;

    fn try_from(raw: RawDigest) -> Result<Self> {
        Digest::new(raw.algorithm, raw.bytes)
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.to_hex())
    }
}

fn decode_hex(hex_str: &str) -> Result<Vec<u8>> {
    let trimmed = hex_str.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_signature(trimmed, "empty digest"));
    }
    hex::decode(trimmed)
        .map_err(|e| Error::invalid_signature(trimmed, format!("not a hex digest: {}", e)))
}

/// Digests produced by one pass over an input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestSet {
    digests: BTreeMap<HashAlgorithm, Digest>,
    /// Number of bytes consumed from the input
    pub bytes_read: u64,
}

impl DigestSet {
    pub(crate) fn new(bytes_read: u64) -> Self {
        Self {
            digests: BTreeMap::new(),
            bytes_read,
        }
    }

    pub(crate) fn insert(&mut self, digest: Digest) {
        self.digests.insert(digest.algorithm(), digest);
    }

    /// Get the digest for an algorithm, if it was computed.
    pub fn get(&self, algorithm: HashAlgorithm) -> Option<&Digest> {
        self.digests.get(&algorithm)
    }

    /// Iterate digests in algorithm order.
    pub fn iter(&self) -> impl Iterator<Item = &Digest> {
        self.digests.values()
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}
