//! Streaming hash engine.

use crate::core::error::{Error, Result};
use crate::detection::algorithm::{Digest, DigestSet, HashAlgorithm};
use crate::utils::cancel::is_cancellation;
use md5::Md5;
use sha1::Sha1;
use sha2::Digest as _;
use sha2::{Sha256, Sha512};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Default chunk size for reading inputs (8KB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Largest read chunk the engine will allocate (16 MB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Incremental state for one algorithm.
enum HashState {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl HashState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => HashState::Md5(Md5::new()),
            HashAlgorithm::Sha1 => HashState::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => HashState::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => HashState::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            HashState::Md5(h) => h.update(chunk),
            HashState::Sha1(h) => h.update(chunk),
            HashState::Sha256(h) => h.update(chunk),
            HashState::Sha512(h) => h.update(chunk),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            HashState::Md5(h) => Digest::from_raw(HashAlgorithm::Md5, h.finalize().to_vec()),
            HashState::Sha1(h) => Digest::from_raw(HashAlgorithm::Sha1, h.finalize().to_vec()),
            HashState::Sha256(h) => {
                Digest::from_raw(HashAlgorithm::Sha256, h.finalize().to_vec())
            }
            HashState::Sha512(h) => {
                Digest::from_raw(HashAlgorithm::Sha512, h.finalize().to_vec())
            }
        }
    }
}

/// Computes several digests over a stream in a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEngine {
    chunk_size: usize,
}

impl Default for HashEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HashEngine {
    /// Create an engine with the default chunk size.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create an engine with a custom chunk size, clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.clamp(1, MAX_CHUNK_SIZE),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Read `reader` to the end once, feeding every chunk to each requested algorithm.
    ///
    /// A read failure aborts the whole computation; no partial digests are
    /// returned. Reads cancelled through a [`CancellableReader`] surface as
    /// [`Error::ScanCancelled`].
    ///
    /// [`CancellableReader`]: crate::utils::cancel::CancellableReader
    pub fn compute_digests<R: Read>(
        &self,
        mut reader: R,
        algorithms: &BTreeSet<HashAlgorithm>,
    ) -> Result<DigestSet> {
        let mut states: Vec<HashState> = algorithms.iter().map(|&a| HashState::new(a)).collect();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut total: u64 = 0;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if is_cancellation(&e) => return Err(Error::ScanCancelled),
                Err(e) => return Err(Error::stream_read(e)),
            };
            let chunk = &buffer[..bytes_read];
            for state in states.iter_mut() {
                state.update(chunk);
            }
            total += bytes_read as u64;
        }

        let mut digests = DigestSet::new(total);
        for state in states {
            digests.insert(state.finalize());
        }

        log::trace!(
            "Hashed {} bytes with {} algorithm(s)",
            total,
            digests.len()
        );
        Ok(digests)
    }

    /// Hash an in-memory buffer.
    pub fn hash_bytes(&self, data: &[u8], algorithms: &BTreeSet<HashAlgorithm>) -> DigestSet {
        let mut states: Vec<HashState> = algorithms.iter().map(|&a| HashState::new(a)).collect();
        for state in states.iter_mut() {
            state.update(data);
        }
        let mut digests = DigestSet::new(data.len() as u64);
        for state in states {
            digests.insert(state.finalize());
        }
        digests
    }

    /// Hash a file on disk, reporting failures against its path.
    pub fn hash_file(&self, path: &Path, algorithms: &BTreeSet<HashAlgorithm>) -> Result<DigestSet> {
        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        self.compute_digests(file, algorithms).map_err(|e| match e {
            Error::StreamRead { source } => Error::file_read(path, source),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn all_algorithms() -> BTreeSet<HashAlgorithm> {
        HashAlgorithm::ALL.into_iter().collect()
    }

    /// Reader that yields some bytes and then fails.
    struct FailingReader {
        remaining: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.remaining == 0 {
                return Err(std::io::Error::new(ErrorKind::BrokenPipe, "device gone"));
            }
            let n = buf.len().min(self.remaining);
            buf[..n].fill(0x41);
            self.remaining -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_known_vectors() {
        let engine = HashEngine::new();
        let digests = engine
            .compute_digests(Cursor::new(b"hello"), &all_algorithms())
            .unwrap();

        // Test vectors for "hello"
        assert_eq!(
            digests.get(HashAlgorithm::Md5).unwrap().to_hex(),
            "5d41402abc4b2a76b9719d911017c592"
        );
        assert_eq!(
            digests.get(HashAlgorithm::Sha1).unwrap().to_hex(),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(
            digests.get(HashAlgorithm::Sha256).unwrap().to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(digests.get(HashAlgorithm::Sha512).unwrap().as_bytes().len(), 64);
        assert_eq!(digests.bytes_read, 5);
    }

    #[test]
    fn test_only_requested_algorithms() {
        let engine = HashEngine::new();
        let algs: BTreeSet<_> = [HashAlgorithm::Md5].into_iter().collect();
        let digests = engine.compute_digests(Cursor::new(b"hello"), &algs).unwrap();

        assert_eq!(digests.len(), 1);
        assert!(digests.get(HashAlgorithm::Sha256).is_none());
    }

    #[test]
    fn test_empty_algorithm_set_drains_stream() {
        let engine = HashEngine::new();
        let digests = engine
            .compute_digests(Cursor::new(vec![7u8; 20_000]), &BTreeSet::new())
            .unwrap();
        assert!(digests.is_empty());
        assert_eq!(digests.bytes_read, 20_000);
    }

    #[test]
    fn test_empty_input() {
        let engine = HashEngine::new();
        let digests = engine
            .compute_digests(Cursor::new(Vec::new()), &all_algorithms())
            .unwrap();
        assert_eq!(
            digests.get(HashAlgorithm::Md5).unwrap().to_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(digests.bytes_read, 0);
    }

    #[test]
    fn test_read_failure_is_surfaced() {
        let engine = HashEngine::with_chunk_size(1024);
        let result = engine.compute_digests(FailingReader { remaining: 4096 }, &all_algorithms());
        assert!(matches!(result, Err(Error::StreamRead { .. })));
    }

    #[test]
    fn test_hash_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();

        let engine = HashEngine::new();
        let digests = engine.hash_file(file.path(), &all_algorithms()).unwrap();
        assert_eq!(
            digests,
            engine.hash_bytes(b"hello", &all_algorithms())
        );
    }

    #[test]
    fn test_hash_missing_file() {
        let engine = HashEngine::new();
        let result = engine.hash_file(Path::new("/nonexistent/sample.bin"), &all_algorithms());
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }

    #[test]
    fn test_chunk_size_is_clamped() {
        assert_eq!(HashEngine::with_chunk_size(0).chunk_size(), 1);
        assert_eq!(HashEngine::with_chunk_size(usize::MAX).chunk_size(), MAX_CHUNK_SIZE);
        assert_eq!(HashEngine::default().chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    proptest! {
        #[test]
        fn digests_do_not_depend_on_chunk_size(
            data in proptest::collection::vec(any::<u8>(), 0..20_000),
            chunk_size in 1usize..70_000,
        ) {
            let algs = all_algorithms();
            let reference = HashEngine::new().compute_digests(Cursor::new(&data), &algs).unwrap();
            let chunked = HashEngine::with_chunk_size(chunk_size)
                .compute_digests(Cursor::new(&data), &algs)
                .unwrap();
            prop_assert_eq!(&reference, &chunked);
            prop_assert_eq!(reference, HashEngine::new().hash_bytes(&data, &algs));
        }
    }
}
