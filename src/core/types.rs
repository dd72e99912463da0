//! Core type definitions used throughout ransom-sentry.

use crate::detection::algorithm::DigestSet;
use crate::detection::signature::Signature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of matching one input against the signature store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "matches", rename_all = "lowercase")]
pub enum Verdict {
    /// No stored signature matched
    Clean,
    /// One or more signatures matched; never empty
    Match(Vec<Signature>),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match(_))
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Clean => write!(f, "CLEAN"),
            Verdict::Match(sigs) => write!(f, "MATCH ({})", sigs.len()),
        }
    }
}

/// Result of scanning one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Clean or matched
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Digests computed for the input
    pub digests: DigestSet,
}

impl ScanResult {
    pub fn clean(digests: DigestSet) -> Self {
        Self {
            verdict: Verdict::Clean,
            digests,
        }
    }

    pub fn is_match(&self) -> bool {
        self.verdict.is_match()
    }

    /// Matching signatures; empty when clean.
    pub fn matches(&self) -> &[Signature] {
        match &self.verdict {
            Verdict::Clean => &[],
            Verdict::Match(sigs) => sigs,
        }
    }

    /// Number of bytes read from the input.
    pub fn bytes_scanned(&self) -> u64 {
        self.digests.bytes_read
    }
}

/// Current status of a batch scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Scan is currently running
    Running,
    /// Scan completed
    Completed,
    /// Scan was cancelled by user
    Cancelled,
}

/// A file whose content matched one or more signatures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Path to the scanned file
    pub path: PathBuf,
    /// Full scan result
    pub result: ScanResult,
}

/// A file that could not be scanned. Its status is unknown, not clean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    /// Path to the file
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// Summary of a batch scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Unique scan identifier
    pub scan_id: String,
    /// When the scan started
    pub start_time: DateTime<Utc>,
    /// When the scan ended
    pub end_time: Option<DateTime<Utc>>,
    /// Final status
    pub status: ScanStatus,
    /// Files scanned to completion (clean or matched)
    pub files_scanned: u64,
    /// Total bytes hashed
    pub bytes_scanned: u64,
    /// Number of signatures in the store used
    pub signatures_loaded: usize,
    /// Files that matched
    pub detections: Vec<FileReport>,
    /// Files that could not be scanned
    pub failures: Vec<FileFailure>,
    /// Files left unscanned because they exceed the size limit
    #[serde(default)]
    pub skipped: Vec<FileFailure>,
}

impl ScanSummary {
    /// Create a new scan summary.
    pub fn new(signatures_loaded: usize) -> Self {
        Self {
            scan_id: uuid::Uuid::new_v4().to_string(),
            start_time: Utc::now(),
            end_time: None,
            status: ScanStatus::Running,
            files_scanned: 0,
            bytes_scanned: 0,
            signatures_loaded,
            detections: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Calculate scan duration in milliseconds.
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }

    /// Mark the scan as completed.
    pub fn complete(&mut self) {
        self.end_time = Some(Utc::now());
        self.status = ScanStatus::Completed;
    }

    /// Mark the scan as cancelled.
    pub fn cancel(&mut self) {
        self.end_time = Some(Utc::now());
        self.status = ScanStatus::Cancelled;
    }

    /// True when every file was scanned and none matched.
    ///
    /// Skipped files count against this: an unscanned file is not clean.
    pub fn is_clean(&self) -> bool {
        self.status == ScanStatus::Completed
            && self.detections.is_empty()
            && self.failures.is_empty()
            && self.skipped.is_empty()
    }
}
