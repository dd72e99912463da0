//! Hash matching engine for signature-based detection.

use crate::core::error::Result;
use crate::core::types::{ScanResult, Verdict};
use crate::detection::algorithm::DigestSet;
use crate::detection::store::SignatureStore;
use crate::utils::hash::HashEngine;
use std::io::{Cursor, Read};
use std::path::Path;

/// Matches inputs against a signature store.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner {
    engine: HashEngine,
}

impl Scanner {
    /// Create a scanner with the default hash engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner with a specific hash engine.
    pub fn with_engine(engine: HashEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &HashEngine {
        &self.engine
    }

    /// Scan a stream against the store.
    ///
    /// Only the algorithms the store needs are computed. An empty store is
    /// always clean and the input is not read. Read failures are returned as
    /// errors, never as a clean verdict.
    pub fn scan<R: Read>(&self, input: R, store: &SignatureStore) -> Result<ScanResult> {
        let algorithms = store.required_algorithms();
        if algorithms.is_empty() {
            log::debug!("Signature store is empty; reporting clean");
            return Ok(ScanResult::clean(DigestSet::default()));
        }

        let digests = self.engine.compute_digests(input, &algorithms)?;
        Ok(Self::match_digests(digests, store))
    }

    /// Scan a file on disk.
    pub fn scan_file(&self, path: &Path, store: &SignatureStore) -> Result<ScanResult> {
        let algorithms = store.required_algorithms();
        if algorithms.is_empty() {
            return Ok(ScanResult::clean(DigestSet::default()));
        }

        let digests = self.engine.hash_file(path, &algorithms)?;
        let result = Self::match_digests(digests, store);
        if result.is_match() {
            log::info!(
                "Signature match in {}: {}",
                path.display(),
                result
                    .matches()
                    .iter()
                    .map(|s| s.display_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Ok(result)
    }

    /// Scan an in-memory buffer.
    pub fn scan_bytes(&self, data: &[u8], store: &SignatureStore) -> Result<ScanResult> {
        self.scan(Cursor::new(data), store)
    }

    /// Look up each digest and collect every hit.
    fn match_digests(digests: DigestSet, store: &SignatureStore) -> ScanResult {
        let matches: Vec<_> = digests
            .iter()
            .flat_map(|digest| store.lookup(digest.algorithm(), digest.as_bytes()))
            .cloned()
            .collect();

        let verdict = if matches.is_empty() {
            Verdict::Clean
        } else {
            Verdict::Match(matches)
        };

        ScanResult { verdict, digests }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::detection::algorithm::{Digest, HashAlgorithm};
    use crate::detection::builtin::EICAR_STRING;
    use crate::detection::signature::Signature;
    use std::collections::BTreeSet;
    use std::io::{ErrorKind, Write};
    use tempfile::NamedTempFile;

    const SAMPLE: &[u8] = b"MZ\x90\x00 totally a ransomware sample";

    fn digest_of(data: &[u8], algorithm: HashAlgorithm) -> Digest {
        let algs: BTreeSet<_> = [algorithm].into_iter().collect();
        HashEngine::new()
            .hash_bytes(data, &algs)
            .get(algorithm)
            .cloned()
            .unwrap()
    }

    /// Reader that yields some bytes and then fails.
    struct FlakyReader {
        served: usize,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served >= 10_000 {
                return Err(std::io::Error::new(ErrorKind::ConnectionReset, "upload aborted"));
            }
            let n = buf.len().min(1000);
            buf[..n].fill(0);
            self.served += n;
            Ok(n)
        }
    }

    #[test]
    fn test_match_for_every_algorithm() {
        for algorithm in HashAlgorithm::ALL {
            let mut store = SignatureStore::new();
            store.load(vec![Signature::labeled(digest_of(SAMPLE, algorithm), "Sample")]);

            let result = Scanner::new().scan_bytes(SAMPLE, &store).unwrap();
            assert!(result.is_match(), "{} should match", algorithm);
            assert_eq!(result.matches()[0].algorithm(), algorithm);
        }
    }

    #[test]
    fn test_clean_when_hash_absent() {
        let store = SignatureStore::with_builtin().unwrap();
        let result = Scanner::new().scan_bytes(b"just a holiday photo", &store).unwrap();
        assert_eq!(result.verdict, Verdict::Clean);
        assert_eq!(result.digests.len(), 3);
    }

    #[test]
    fn test_empty_store_is_always_clean() {
        let store = SignatureStore::new();
        let scanner = Scanner::new();

        assert_eq!(scanner.scan_bytes(b"", &store).unwrap().verdict, Verdict::Clean);
        assert_eq!(scanner.scan_bytes(SAMPLE, &store).unwrap().verdict, Verdict::Clean);
        // Input is not even read
        let result = scanner.scan(FlakyReader { served: 10_000 }, &store).unwrap();
        assert_eq!(result.verdict, Verdict::Clean);
    }

    #[test]
    fn test_labeled_md5_scenario() {
        let mut store = SignatureStore::new();
        store.load(vec![Signature::labeled(
            digest_of(SAMPLE, HashAlgorithm::Md5),
            "WannaCry",
        )]);

        let result = Scanner::new().scan_bytes(SAMPLE, &store).unwrap();
        assert_eq!(result.matches().len(), 1);
        assert_eq!(result.matches()[0].label.as_deref(), Some("WannaCry"));

        let other = Scanner::new().scan_bytes(b"something else", &store).unwrap();
        assert_eq!(other.verdict, Verdict::Clean);
    }

    #[test]
    fn test_builtin_wannacry_signature_is_md5() {
        let store = SignatureStore::with_builtin().unwrap();
        let digest =
            Digest::from_hex(HashAlgorithm::Md5, "db349b97c37d22f5ea1d1841e3c89eb4").unwrap();
        let hits = store.lookup(digest.algorithm(), digest.as_bytes());
        assert_eq!(hits[0].label.as_deref(), Some("WannaCry"));
    }

    #[test]
    fn test_two_algorithms_same_sample() {
        let mut store = SignatureStore::new();
        store.load(vec![
            Signature::labeled(digest_of(SAMPLE, HashAlgorithm::Md5), "Cerber"),
            Signature::labeled(digest_of(SAMPLE, HashAlgorithm::Sha256), "Cerber"),
        ]);

        let result = Scanner::new().scan_bytes(SAMPLE, &store).unwrap();
        let algs: Vec<_> = result.matches().iter().map(|s| s.algorithm()).collect();
        assert_eq!(algs, vec![HashAlgorithm::Md5, HashAlgorithm::Sha256]);
    }

    #[test]
    fn test_read_failure_is_not_clean() {
        let store = SignatureStore::with_builtin().unwrap();
        let result = Scanner::new().scan(FlakyReader { served: 0 }, &store);
        assert!(matches!(result, Err(Error::StreamRead { .. })));
    }

    #[test]
    fn test_eicar_file_detected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(EICAR_STRING.as_bytes()).unwrap();

        let store = SignatureStore::with_builtin().unwrap();
        let result = Scanner::new().scan_file(file.path(), &store).unwrap();

        assert_eq!(result.matches().len(), 2);
        assert!(result
            .matches()
            .iter()
            .all(|s| s.display_name() == "EICAR-Test-File"));
        assert_eq!(result.bytes_scanned(), EICAR_STRING.len() as u64);
    }

    #[test]
    fn test_scan_does_not_mutate_store() {
        let store = SignatureStore::with_builtin().unwrap();
        let before = store.len();
        let _ = Scanner::new().scan_bytes(SAMPLE, &store).unwrap();
        assert_eq!(store.len(), before);
    }
}
