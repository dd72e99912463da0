//! Command-line interface definition.

use crate::utils::hash::MAX_CHUNK_SIZE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ransom-sentry: hash-signature ransomware detection
#[derive(Parser, Debug)]
#[command(name = "ransom-sentry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Use a specific configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine processing
    Json,
}

/// Options selecting which signatures to load.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SignatureSource {
    /// Additional signature feed (JSON or flat text); may be repeated
    #[arg(short, long = "signatures", value_name = "FILE")]
    pub signatures: Vec<PathBuf>,

    /// Do not load the built-in signatures
    #[arg(long)]
    pub no_builtin: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan files or directories for known ransomware
    Scan {
        /// Files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        source: SignatureSource,

        /// Read chunk size in bytes (1 to 16777216)
        #[arg(long, value_name = "BYTES", value_parser = parse_chunk_size)]
        chunk_size: Option<usize>,
    },

    /// Print the digests of a file
    Hash {
        /// File to hash
        file: PathBuf,

        /// Algorithm to compute (md5, sha1, sha256, sha512); may be repeated
        #[arg(short, long = "algorithm", value_name = "ALG")]
        algorithms: Vec<String>,
    },

    /// Inspect signature sources
    Signatures {
        #[command(subcommand)]
        action: SignatureAction,
    },

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show application information
    Info,
}

/// Signature subcommands.
#[derive(Subcommand, Debug)]
pub enum SignatureAction {
    /// List loaded signatures
    List {
        #[command(flatten)]
        source: SignatureSource,
    },

    /// Validate a signature feed without loading it
    Check {
        /// Feed file to validate
        file: PathBuf,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the configuration file location
    Path,
}

fn parse_chunk_size(value: &str) -> Result<usize, String> {
    let bytes: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a byte count", value))?;
    if (1..=MAX_CHUNK_SIZE).contains(&bytes) {
        Ok(bytes)
    } else {
        Err(format!("must be between 1 and {}", MAX_CHUNK_SIZE))
    }
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_command() {
        let cli = Cli::try_parse_from([
            "ransom-sentry",
            "scan",
            "upload.bin",
            "--signatures",
            "feed.txt",
            "--no-builtin",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Some(Commands::Scan { paths, source, chunk_size }) => {
                assert_eq!(paths, vec![PathBuf::from("upload.bin")]);
                assert_eq!(source.signatures, vec![PathBuf::from("feed.txt")]);
                assert!(source.no_builtin);
                assert_eq!(chunk_size, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_chunk_size_bounds() {
        let cli = Cli::try_parse_from(["ransom-sentry", "scan", "a.bin", "--chunk-size", "4096"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Scan { chunk_size: Some(4096), .. })
        ));

        for bad in ["0", "18446744073709551615", "16777217", "lots"] {
            assert!(
                Cli::try_parse_from(["ransom-sentry", "scan", "a.bin", "--chunk-size", bad]).is_err(),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_scan_requires_paths() {
        assert!(Cli::try_parse_from(["ransom-sentry", "scan"]).is_err());
    }

    #[test]
    fn test_hash_command() {
        let cli = Cli::try_parse_from(["ransom-sentry", "hash", "a.bin", "-a", "md5", "-a", "sha1"])
            .unwrap();
        match cli.command {
            Some(Commands::Hash { algorithms, .. }) => assert_eq!(algorithms, vec!["md5", "sha1"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
