//! In-memory signature store, partitioned by hash algorithm.

use crate::core::error::{Error, Result};
use crate::detection::algorithm::HashAlgorithm;
use crate::detection::builtin::builtin_signatures;
use crate::detection::signature::{read_feed, Signature, SignatureEntry};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Set of known-bad signatures.
///
/// Built once and then only read; share it behind an `Arc` or a
/// [`SharedStore`] for concurrent scans.
#[derive(Debug, Clone, Default)]
pub struct SignatureStore {
    by_algorithm: BTreeMap<HashAlgorithm, HashMap<Vec<u8>, Vec<Signature>>>,
    len: usize,
}

impl SignatureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the built-in signatures.
    pub fn with_builtin() -> Result<Self> {
        let mut store = Self::new();
        let report = store.load(builtin_signatures()?);
        log::debug!("Loaded built-in signatures: {}", report);
        Ok(store)
    }

    /// Create a store from a signature feed file.
    pub fn from_feed_file(path: &Path) -> Result<Self> {
        let mut store = Self::new();
        store.load_feed_file(path)?;
        Ok(store)
    }

    /// Insert a signature. Returns `false` if an identical one was already present.
    pub fn insert(&mut self, sig: Signature) -> bool {
        let bucket = self
            .by_algorithm
            .entry(sig.algorithm())
            .or_default()
            .entry(sig.digest.as_bytes().to_vec())
            .or_default();

        if bucket.contains(&sig) {
            return false;
        }
        bucket.push(sig);
        self.len += 1;
        true
    }

    /// Insert all signatures; duplicates are skipped.
    pub fn load<I>(&mut self, signatures: I) -> LoadReport
    where
        I: IntoIterator<Item = Signature>,
    {
        let mut report = LoadReport::default();
        for sig in signatures {
            if self.insert(sig) {
                report.inserted += 1;
            } else {
                report.duplicates += 1;
            }
        }
        report
    }

    /// Validate and insert feed entries.
    ///
    /// Every entry is validated before any is inserted, so an invalid entry
    /// leaves the store unchanged.
    pub fn load_entries<'a, I>(&mut self, entries: I) -> Result<LoadReport>
    where
        I: IntoIterator<Item = &'a SignatureEntry>,
    {
        let signatures = entries
            .into_iter()
            .map(Signature::from_entry)
            .collect::<Result<Vec<_>>>()?;
        Ok(self.load(signatures))
    }

    /// Load a JSON or flat text feed file.
    pub fn load_feed_file(&mut self, path: &Path) -> Result<LoadReport> {
        if !path.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }
        let entries = read_feed(path)?;
        let report = self.load_entries(&entries)?;
        log::info!("Loaded signature feed {}: {}", path.display(), report);
        Ok(report)
    }

    /// Algorithms with at least one stored signature.
    pub fn required_algorithms(&self) -> BTreeSet<HashAlgorithm> {
        self.by_algorithm
            .iter()
            .filter(|(_, digests)| !digests.is_empty())
            .map(|(alg, _)| *alg)
            .collect()
    }

    /// All signatures with exactly this algorithm and digest.
    pub fn lookup(&self, algorithm: HashAlgorithm, digest: &[u8]) -> &[Signature] {
        self.by_algorithm
            .get(&algorithm)
            .and_then(|digests| digests.get(digest))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of stored signatures.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of signatures stored for one algorithm.
    pub fn count_for(&self, algorithm: HashAlgorithm) -> usize {
        self.by_algorithm
            .get(&algorithm)
            .map(|digests| digests.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Iterate over all signatures, grouped by algorithm.
    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.by_algorithm
            .values()
            .flat_map(|digests| digests.values().flatten())
    }
}

/// Outcome of loading signatures into a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Signatures newly inserted
    pub inserted: usize,
    /// Signatures already present
    pub duplicates: usize,
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} signature(s) inserted, {} duplicate(s) skipped",
            self.inserted, self.duplicates
        )
    }
}

/// Handle to the current store that can be replaced atomically.
///
/// Scans take a [`snapshot`](SharedStore::snapshot) and keep using it; a
/// reload builds a complete new store and [`publish`](SharedStore::publish)es it.
#[derive(Debug, Clone)]
pub struct SharedStore {
    current: Arc<RwLock<Arc<SignatureStore>>>,
}

impl SharedStore {
    pub fn new(store: SignatureStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    /// Get the currently published store.
    pub fn snapshot(&self) -> Result<Arc<SignatureStore>> {
        let guard = self
            .current
            .read()
            .map_err(|_| Error::lock_poisoned("signature store (snapshot)"))?;
        Ok(Arc::clone(&guard))
    }

    /// Replace the published store, returning the previous one.
    pub fn publish(&self, store: SignatureStore) -> Result<Arc<SignatureStore>> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| Error::lock_poisoned("signature store (publish)"))?;
        log::info!("Publishing signature store with {} signature(s)", store.len());
        Ok(std::mem::replace(&mut *guard, Arc::new(store)))
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new(SignatureStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::algorithm::Digest;
    use tempfile::tempdir;

    fn md5_sig(hex: &str, label: &str) -> Signature {
        Signature::labeled(Digest::from_hex(HashAlgorithm::Md5, hex).unwrap(), label)
    }

    #[test]
    fn test_empty_store() {
        let store = SignatureStore::new();
        assert!(store.is_empty());
        assert!(store.required_algorithms().is_empty());
        assert!(store.lookup(HashAlgorithm::Md5, &[0u8; 16]).is_empty());
    }

    #[test]
    fn test_load_is_idempotent() {
        let sig = md5_sig("db349b97c37d22f5ea1d1841e3c89eb4", "WannaCry");
        let mut store = SignatureStore::new();

        let first = store.load(vec![sig.clone()]);
        let algs = store.required_algorithms();
        let hits = store.lookup(HashAlgorithm::Md5, sig.digest.as_bytes()).to_vec();

        let second = store.load(vec![sig.clone(), sig.clone()]);
        assert_eq!(first, LoadReport { inserted: 1, duplicates: 0 });
        assert_eq!(second, LoadReport { inserted: 0, duplicates: 2 });
        assert_eq!(store.len(), 1);
        assert_eq!(store.required_algorithms(), algs);
        assert_eq!(store.lookup(HashAlgorithm::Md5, sig.digest.as_bytes()), hits.as_slice());
    }

    #[test]
    fn test_same_digest_under_several_labels() {
        let mut store = SignatureStore::new();
        store.load(vec![
            md5_sig("4b13069d80a4f2e378b8d2e9cf2d26e9", "Locky"),
            md5_sig("4b13069d80a4f2e378b8d2e9cf2d26e9", "Locky.A"),
        ]);

        let bytes = hex::decode("4b13069d80a4f2e378b8d2e9cf2d26e9").unwrap();
        let hits = store.lookup(HashAlgorithm::Md5, &bytes);
        assert_eq!(hits.len(), 2);
        assert_eq!(store.count_for(HashAlgorithm::Md5), 2);
    }

    #[test]
    fn test_no_cross_algorithm_match() {
        let mut store = SignatureStore::new();
        store.load(vec![md5_sig("db349b97c37d22f5ea1d1841e3c89eb4", "WannaCry")]);

        assert_eq!(
            store.required_algorithms(),
            [HashAlgorithm::Md5].into_iter().collect()
        );
        let bytes = hex::decode("db349b97c37d22f5ea1d1841e3c89eb4").unwrap();
        assert!(store.lookup(HashAlgorithm::Sha1, &bytes).is_empty());
        assert_eq!(store.lookup(HashAlgorithm::Md5, &bytes).len(), 1);
    }

    #[test]
    fn test_invalid_entry_leaves_store_unchanged() {
        let mut store = SignatureStore::new();
        let entries = vec![
            SignatureEntry::untagged("db349b97c37d22f5ea1d1841e3c89eb4", Some("WannaCry")),
            SignatureEntry::untagged("84c82835a5d21bbcf75a61706d8ab5", None),
        ];

        let err = store.load_entries(&entries).unwrap_err();
        assert!(matches!(err, Error::InvalidSignature { ref entry, .. } if entry.starts_with("84c82835")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_builtin_store() {
        let store = SignatureStore::with_builtin().unwrap();
        assert_eq!(
            store.required_algorithms(),
            [HashAlgorithm::Md5, HashAlgorithm::Sha1, HashAlgorithm::Sha256]
                .into_iter()
                .collect()
        );

        let bytes = hex::decode("db349b97c37d22f5ea1d1841e3c89eb4").unwrap();
        let hits = store.lookup(HashAlgorithm::Md5, &bytes);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label.as_deref(), Some("WannaCry"));
        assert_eq!(store.iter().count(), store.len());
    }

    #[test]
    fn test_load_text_feed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.txt");
        std::fs::write(
            &path,
            "# test feed\nsha1:97e25c9db16e398be7b45f15785eb153ee25d94a Locky\n95f71dfdbb06e8bbca73eec86f22479c # Sodinokibi\n",
        )
        .unwrap();

        let store = SignatureStore::from_feed_file(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.count_for(HashAlgorithm::Sha1), 1);
        assert_eq!(store.count_for(HashAlgorithm::Md5), 1);
    }

    #[test]
    fn test_missing_feed_file() {
        let result = SignatureStore::from_feed_file(Path::new("/nonexistent/feed.txt"));
        assert!(matches!(result, Err(Error::PathNotFound(_))));
    }

    #[test]
    fn test_shared_store_publish() {
        let shared = SharedStore::default();
        let before = shared.snapshot().unwrap();
        assert!(before.is_empty());

        let previous = shared.publish(SignatureStore::with_builtin().unwrap()).unwrap();
        assert!(previous.is_empty());

        // Old snapshot stays valid and unchanged
        assert!(before.is_empty());
        assert!(!shared.snapshot().unwrap().is_empty());
    }
}
