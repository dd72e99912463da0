//! Signature-based detection.
//!
//! This module provides:
//! - Hash algorithm identifiers and digests
//! - Signature values and feed formats (JSON, flat text)
//! - The algorithm-partitioned signature store
//! - The scanner that matches inputs against a store

pub mod algorithm;
pub mod builtin;
pub mod matcher;
pub mod signature;
pub mod store;

pub use algorithm::{Digest, DigestSet, HashAlgorithm};
pub use matcher::Scanner;
pub use signature::{Signature, SignatureEntry, SignatureFile};
pub use store::{LoadReport, SharedStore, SignatureStore};
