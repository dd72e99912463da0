//! Batch file scanning.
//!
//! Walks files and directories and hands each file to the signature scanner
//! on parallel workers, collecting matches and failures into a summary.

pub mod file;

pub use file::FileScanner;
