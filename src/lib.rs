//! ransom-sentry: hash-signature ransomware detection
//!
//! This crate matches file content against a set of known-bad digests. It
//! streams input through several hash algorithms in one pass, looks each
//! digest up in an algorithm-partitioned signature store, and reports every
//! signature that fired.

pub mod core;
pub mod detection;
pub mod scanner;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use crate::core::config::Config;
pub use crate::core::error::{Error, Result};
pub use crate::core::types::*;
pub use crate::detection::{HashAlgorithm, Scanner, Signature, SignatureStore};
