//! Signature types and signature feed formats.

use crate::core::error::{Error, Result};
use crate::detection::algorithm::{Digest, HashAlgorithm};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A known-bad digest, optionally labeled with a threat name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Digest that identifies the sample
    pub digest: Digest,
    /// Human-readable name (e.g., "WannaCry")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Signature {
    /// Create an unlabeled signature.
    pub fn new(digest: Digest) -> Self {
        Self {
            digest,
            label: None,
        }
    }

    /// Create a labeled signature.
    pub fn labeled(digest: Digest, label: impl Into<String>) -> Self {
        Self {
            digest,
            label: Some(label.into()),
        }
    }

    /// Build a signature from an untyped feed entry.
    ///
    /// An explicit algorithm tag wins; otherwise the algorithm is inferred
    /// from the decoded digest length.
    pub fn from_entry(entry: &SignatureEntry) -> Result<Self> {
        let algorithm = match entry.algorithm.as_deref() {
            Some(tag) => Some(HashAlgorithm::parse(tag).map_err(|_| {
                Error::invalid_signature(
                    entry.describe(),
                    format!("unsupported algorithm '{}'", tag.trim()),
                )
            })?),
            None => None,
        };

        let digest = match algorithm {
            Some(algorithm) => Digest::from_hex(algorithm, &entry.hash),
            None => Digest::infer_from_hex(&entry.hash),
        }
        .map_err(|e| match e {
            Error::InvalidSignature { reason, .. } => {
                Error::invalid_signature(entry.describe(), reason)
            }
            other => other,
        })?;

        Ok(Self {
            digest,
            label: entry.label.clone().filter(|l| !l.is_empty()),
        })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.digest.algorithm()
    }

    /// Label, or "unnamed" when absent.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or("unnamed")
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({})", label, self.digest),
            None => write!(f, "{}", self.digest),
        }
    }
}

/// An untyped signature record as it appears in a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// Hex-encoded digest
    pub hash: String,
    /// Algorithm tag as written (`md5`, `SHA-256`, ...); inferred from the
    /// digest length when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    /// Threat label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Line number in a text feed, for error reporting
    #[serde(skip)]
    pub line: Option<usize>,
}

impl SignatureEntry {
    /// Create an entry with no algorithm tag.
    pub fn untagged(hash: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            hash: hash.into(),
            algorithm: None,
            label: label.map(str::to_string),
            line: None,
        }
    }

    /// Create an entry with an explicit algorithm tag.
    pub fn tagged(algorithm: HashAlgorithm, hash: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            hash: hash.into(),
            algorithm: Some(algorithm.as_str().to_string()),
            label: label.map(str::to_string),
            line: None,
        }
    }

    /// Identify this entry in error messages.
    fn describe(&self) -> String {
        match self.line {
            Some(line) => format!("line {}: {}", line, self.hash.trim()),
            None => self.hash.trim().to_string(),
        }
    }

    /// Parse one line of a flat text feed.
    ///
    /// Format: `[algorithm:]hex [label]`, where text after a whitespace-led `#` counts as
    /// the label. Blank and comment lines yield `None`.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Self>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        // Only a `#` after whitespace starts a comment; `Family#2` is a label
        let comment_at = trimmed
            .char_indices()
            .find(|&(idx, c)| c == '#' && trimmed[..idx].ends_with(char::is_whitespace))
            .map(|(idx, _)| idx);
        let (body, comment) = match comment_at {
            Some(idx) => (trimmed[..idx].trim(), Some(trimmed[idx + 1..].trim())),
            None => (trimmed, None),
        };

        let mut parts = body.splitn(2, char::is_whitespace);
        let token = parts.next().unwrap_or_default();
        let trailing = parts.next().map(str::trim).filter(|s| !s.is_empty());

        let (algorithm, hash) = match token.split_once(':') {
            Some((alg, hash)) => {
                let algorithm = HashAlgorithm::parse(alg).map_err(|_| {
                    Error::invalid_signature(
                        format!("line {}: {}", line_no, token),
                        format!("unsupported algorithm '{}'", alg),
                    )
                })?;
                (Some(algorithm.as_str().to_string()), hash)
            }
            None => (None, token),
        };

        let label = trailing
            .or(comment)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Some(Self {
            hash: hash.to_string(),
            algorithm,
            label,
            line: Some(line_no),
        }))
    }
}

/// Parse a flat text feed, one signature per line.
pub fn parse_text_feed(contents: &str) -> Result<Vec<SignatureEntry>> {
    let mut entries = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if let Some(entry) = SignatureEntry::parse_line(line, idx + 1)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// JSON signature feed file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureFile {
    /// Feed version (e.g., "2025.01.15")
    pub version: String,
    /// Timestamp of last update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// List of signature entries
    pub signatures: Vec<SignatureEntry>,
}

impl SignatureFile {
    /// Create a new empty feed.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            updated_at: Some(chrono::Utc::now().to_rfc3339()),
            signatures: Vec::new(),
        }
    }

    /// Load a feed from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::SignatureLoad(format!("{}: {}", path.display(), e)))
    }

    /// Save the feed to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Add an entry.
    pub fn add(&mut self, entry: SignatureEntry) {
        self.signatures.push(entry);
    }
}

/// Read feed entries from a file: JSON for `.json`, flat text otherwise.
pub fn read_feed(path: &Path) -> Result<Vec<SignatureEntry>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        return Ok(SignatureFile::load(path)?.signatures);
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    parse_text_feed(&contents)
}
