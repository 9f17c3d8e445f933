// src/hash.rs

//! Hashing for source archive integrity
//!
//! Recipes declare the digest of their release archive as `algorithm:hex`
//! (e.g. `sha256:77a2...`). A bare hex string is read as SHA-256, matching
//! the way most upstream formulae publish their digests.
//!
//! - **SHA-256**: the default, used for published release archives
//! - **XXH128**: fast non-cryptographic hash, accepted for locally mirrored sources

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use xxhash_rust::xxh3::Xxh3;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-256 (256-bit cryptographic hash)
    #[default]
    Sha256,

    /// XXH128 (128-bit non-cryptographic hash)
    Xxh128,
}

impl HashAlgorithm {
    /// Get the algorithm name as a string
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Xxh128 => "xxh128",
        }
    }

    /// Length of a digest in hex characters
    #[inline]
    pub const fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Xxh128 => 32,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "xxh128" | "xxhash" | "xxh3" => Ok(Self::Xxh128),
            _ => Err(HashError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Hash parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Unknown hash algorithm name
    UnknownAlgorithm(String),
    /// Digest string is empty
    Empty,
    /// Digest contains characters other than hex digits
    NotHex(String),
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAlgorithm(name) => {
                write!(f, "unknown hash algorithm: {} (supported: sha256, xxh128)", name)
            }
            Self::Empty => write!(f, "empty checksum"),
            Self::NotHex(value) => write!(f, "checksum is not hexadecimal: {}", value),
        }
    }
}

impl std::error::Error for HashError {}

/// An expected digest as declared by a recipe
///
/// The value must be hex digits; it is lowercased and not length-checked:
/// a short or placeholder digest is a digest that never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    pub algorithm: HashAlgorithm,
    pub value: String,
}

impl Checksum {
    /// Parse `algorithm:hex`, or bare hex as SHA-256
    pub fn parse(s: &str) -> Result<Self, HashError> {
        let s = s.trim();
        let (algorithm, value) = match s.split_once(':') {
            Some((algo, value)) => (algo.parse()?, value),
            None => (HashAlgorithm::Sha256, s),
        };
        if value.is_empty() {
            return Err(HashError::Empty);
        }
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HashError::NotHex(value.to_string()));
        }
        Ok(Self {
            algorithm,
            value: value.to_lowercase(),
        })
    }

    /// Whether the value has the shape of a real digest for its algorithm
    pub fn is_well_formed(&self) -> bool {
        self.value.len() == self.algorithm.hex_len()
    }

    /// Whether a computed hash matches this checksum
    pub fn matches(&self, actual: &Hash) -> bool {
        self.algorithm == actual.algorithm && self.value == actual.value
    }

    /// Cache-safe key derived from the checksum
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.algorithm.name(), self.value)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.name(), self.value)
    }
}

/// A computed hash value with its algorithm
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    pub algorithm: HashAlgorithm,
    /// The hash value as a lowercase hex string
    pub value: String,
}

impl Hash {
    /// Format as a prefixed string (e.g., "sha256:abc123...")
    pub fn to_prefixed_string(&self) -> String {
        format!("{}:{}", self.algorithm.name(), self.value)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Incremental hasher over any supported algorithm
pub struct Hasher {
    algorithm: HashAlgorithm,
    state: HasherState,
}

enum HasherState {
    Sha256(Sha256),
    Xxh128(Box<Xxh3>),
}

impl Hasher {
    /// Create a new hasher with the specified algorithm
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Sha256 => HasherState::Sha256(Sha256::new()),
            HashAlgorithm::Xxh128 => HasherState::Xxh128(Box::new(Xxh3::new())),
        };
        Self { algorithm, state }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HasherState::Sha256(hasher) => hasher.update(data),
            HasherState::Xxh128(hasher) => hasher.update(data),
        }
    }

    pub fn finalize(self) -> Hash {
        let value = match self.state {
            HasherState::Sha256(hasher) => format!("{:x}", hasher.finalize()),
            HasherState::Xxh128(hasher) => format!("{:032x}", hasher.digest128()),
        };
        Hash {
            algorithm: self.algorithm,
            value,
        }
    }
}

/// Compute hash of a byte slice
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> Hash {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize()
}

/// Compute hash of data from a reader
pub fn hash_reader<R: Read>(algorithm: HashAlgorithm, reader: &mut R) -> io::Result<Hash> {
    let mut hasher = Hasher::new(algorithm);
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize())
}

/// Hash a file, streaming its content
pub fn hash_file(algorithm: HashAlgorithm, path: &Path) -> io::Result<Hash> {
    let mut file = File::open(path)?;
    hash_reader(algorithm, &mut file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_sha256_known_value() {
        let hash = hash_bytes(HashAlgorithm::Sha256, b"hello world");
        assert_eq!(hash.value, HELLO_SHA256);
        assert_eq!(hash.to_prefixed_string(), format!("sha256:{}", HELLO_SHA256));
    }

    #[test]
    fn test_xxh128_length() {
        let hash = hash_bytes(HashAlgorithm::Xxh128, b"hello world");
        assert_eq!(hash.value.len(), 32);
    }

    #[test]
    fn test_streaming_matches_oneshot() {
        let data = vec![7u8; 20_000];
        let streamed = hash_reader(HashAlgorithm::Xxh128, &mut data.as_slice()).unwrap();
        assert_eq!(streamed, hash_bytes(HashAlgorithm::Xxh128, &data));
    }

    #[test]
    fn test_checksum_parse_prefixed_and_bare() {
        let c = Checksum::parse(&format!("sha256:{}", HELLO_SHA256.to_uppercase())).unwrap();
        assert_eq!(c.algorithm, HashAlgorithm::Sha256);
        assert_eq!(c.value, HELLO_SHA256);
        assert!(c.is_well_formed());

        let bare = Checksum::parse(HELLO_SHA256).unwrap();
        assert_eq!(bare, c);
    }

    #[test]
    fn test_checksum_unknown_algorithm() {
        assert!(matches!(
            Checksum::parse("md5:abc"),
            Err(HashError::UnknownAlgorithm(_))
        ));
        assert_eq!(Checksum::parse("sha256:"), Err(HashError::Empty));
    }

    #[test]
    fn test_checksum_rejects_non_hex() {
        assert_eq!(
            Checksum::parse("sha256:a/b"),
            Err(HashError::NotHex("a/b".to_string()))
        );
        assert!(matches!(Checksum::parse("../../etc"), Err(HashError::NotHex(_))));
    }

    #[test]
    fn test_placeholder_never_matches() {
        let placeholder = Checksum::parse("0").unwrap();
        assert!(!placeholder.is_well_formed());
        assert!(!placeholder.matches(&hash_bytes(HashAlgorithm::Sha256, b"")));
        assert_eq!(placeholder.cache_key(), "sha256_0");
    }

    #[test]
    fn test_checksum_matches() {
        let c = Checksum::parse(HELLO_SHA256).unwrap();
        assert!(c.matches(&hash_bytes(HashAlgorithm::Sha256, b"hello world")));
        assert!(!c.matches(&hash_bytes(HashAlgorithm::Sha256, b"hello")));
    }
}
