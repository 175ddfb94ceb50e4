//! BLAKE3 hashing primitives for content-addressed snapshots

use crate::error::SnapshotError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;

/// Files at or above this size are hashed through a memory map
pub const MMAP_THRESHOLD: u64 = 4 * 1024 * 1024;

/// A 256-bit BLAKE3 content hash
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct HashCode([u8; 32]);

impl HashCode {
    /// Create a new HashCode from bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a byte slice
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Well-known hash standing in for content that cannot be hashed,
    /// such as a directory header or a missing file.
    pub fn signature(name: &str) -> Self {
        let mut hasher = IncrementalHasher::new();
        hasher.put_bytes(b"SIGNATURE");
        hasher.put_bytes(name.as_bytes());
        hasher.finalize()
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        const HEX_CHARS: &[u8] = b"0123456789abcdef";
        let mut hex = String::with_capacity(64);
        for &byte in &self.0 {
            hex.push(HEX_CHARS[(byte >> 4) as usize] as char);
            hex.push(HEX_CHARS[(byte & 0xf) as usize] as char);
        }
        hex
    }

    /// Parse from hex string
    pub fn from_hex(hex: &str) -> Result<Self, SnapshotError> {
        if hex.len() != 64 {
            return Err(SnapshotError::InvalidHash(format!(
                "expected 64 characters, got {}",
                hex.len()
            )));
        }

        let mut bytes = [0u8; 32];
        for (i, pair) in hex.as_bytes().chunks_exact(2).enumerate() {
            let high = hex_char_to_nibble(pair[0])?;
            let low = hex_char_to_nibble(pair[1])?;
            bytes[i] = (high << 4) | low;
        }
        Ok(Self(bytes))
    }
}

fn hex_char_to_nibble(c: u8) -> Result<u8, SnapshotError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(SnapshotError::InvalidHash(format!(
            "invalid hex character: {}",
            c as char
        ))),
    }
}

impl std::fmt::Debug for HashCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HashCode({})", self.to_hex())
    }
}

impl std::fmt::Display for HashCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Signature mixed into every directory hash
pub fn dir_signature() -> HashCode {
    static SIGNATURE: OnceLock<HashCode> = OnceLock::new();
    *SIGNATURE.get_or_init(|| HashCode::signature("DIR"))
}

/// Hash of a location known not to exist
pub fn missing_file_signature() -> HashCode {
    static SIGNATURE: OnceLock<HashCode> = OnceLock::new();
    *SIGNATURE.get_or_init(|| HashCode::signature("MISSING"))
}

/// Hash of a symbolic link whose target does not exist
pub fn broken_link_signature() -> HashCode {
    static SIGNATURE: OnceLock<HashCode> = OnceLock::new();
    *SIGNATURE.get_or_init(|| HashCode::signature("BROKEN_LINK"))
}

/// Hash of a location that could not be read
pub fn unreadable_signature() -> HashCode {
    static SIGNATURE: OnceLock<HashCode> = OnceLock::new();
    *SIGNATURE.get_or_init(|| HashCode::signature("UNREADABLE"))
}

/// Hash bytes using BLAKE3
pub fn hash_bytes(data: &[u8]) -> HashCode {
    let hash = blake3::hash(data);
    HashCode::from_bytes(*hash.as_bytes())
}

/// Hash a file using BLAKE3 (streaming)
pub fn hash_file(path: &Path) -> io::Result<HashCode> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(HashCode::from_bytes(*hasher.finalize().as_bytes()))
}

/// Hash a file using memory-mapped I/O (for large files)
pub fn hash_file_mmap(path: &Path) -> io::Result<HashCode> {
    use memmap2::Mmap;

    let file = File::open(path)?;
    // SAFETY: the map is read-only and dropped before returning. A concurrent
    // writer can only make the hash stale, which the caller detects through
    // the length/mtime pair recorded next to it.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(hash_bytes(&mmap))
}

/// Incremental hasher used to aggregate child hashes into a parent hash
pub struct IncrementalHasher {
    inner: blake3::Hasher,
}

impl IncrementalHasher {
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Feed raw bytes
    pub fn put_bytes(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Feed a length-prefixed string so adjacent strings cannot run together
    pub fn put_string(&mut self, value: &str) {
        self.inner.update(&(value.len() as u32).to_le_bytes());
        self.inner.update(value.as_bytes());
    }

    pub fn put_hash(&mut self, hash: &HashCode) {
        self.inner.update(hash.as_bytes());
    }

    pub fn finalize(self) -> HashCode {
        HashCode::from_bytes(*self.inner.finalize().as_bytes())
    }
}

impl Default for IncrementalHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Content hasher for regular files
///
/// Length and modification time are passed along so implementations can
/// cache by them.
pub trait FileHasher: Send + Sync {
    fn hash(&self, path: &Path, length: u64, last_modified_millis: i64) -> io::Result<HashCode>;
}

/// Streams small files and memory-maps large ones
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFileHasher;

impl FileHasher for DefaultFileHasher {
    fn hash(&self, path: &Path, length: u64, _last_modified_millis: i64) -> io::Result<HashCode> {
        if length >= MMAP_THRESHOLD {
            hash_file_mmap(path)
        } else {
            hash_file(path)
        }
    }
}
