//! Utility functions and helpers.

pub mod cancel;
pub mod hash;
pub mod logging;

pub use cancel::CancellableReader;
pub use hash::HashEngine;
pub use logging::{init_logging, LogConfig};
