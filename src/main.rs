//! ransom-sentry: hash-signature ransomware detection.
//!
//! This is the main entry point for the CLI application.

use ransom_sentry::core::config::Config;
use ransom_sentry::core::error::{Error, Result};
use ransom_sentry::core::types::{ScanStatus, ScanSummary};
use ransom_sentry::detection::signature::{read_feed, Signature};
use ransom_sentry::detection::{HashAlgorithm, SharedStore, SignatureStore};
use ransom_sentry::scanner::FileScanner;
use ransom_sentry::ui::cli::{
    Cli, Commands, ConfigAction, OutputFormat, SignatureAction, SignatureSource,
};
use ransom_sentry::utils::hash::HashEngine;
use ransom_sentry::utils::logging::{init_logging, LogConfig};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// At least one file could not be scanned; its status is unknown.
const EXIT_INDETERMINATE: u8 = 2;
/// At least one file matched a signature.
const EXIT_MATCH: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.suggestion() {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();

    let config = Config::resolve(cli.config.as_deref())?;
    config.validate()?;

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::from_config(&config)
    };
    init_logging(log_config);

    log::debug!("ransom-sentry v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Scan {
            paths,
            source,
            chunk_size,
        }) => run_scan(config, paths, &source, chunk_size, cli.format).await,
        Some(Commands::Hash { file, algorithms }) => {
            run_hash(&file, &algorithms, cli.format).map(|()| ExitCode::SUCCESS)
        }
        Some(Commands::Signatures { action }) => {
            run_signatures(action, &config, cli.format).map(|()| ExitCode::SUCCESS)
        }
        Some(Commands::Config { action }) => {
            run_config(action, &config).map(|()| ExitCode::SUCCESS)
        }
        Some(Commands::Info) => run_info(&config).map(|()| ExitCode::SUCCESS),
        None => {
            println!("ransom-sentry - Hash-Signature Ransomware Detection");
            println!();
            println!("Use --help for usage information");
            println!();
            println!("Quick start:");
            println!("  ransom-sentry scan <FILE>...            Scan files against known ransomware");
            println!("  ransom-sentry hash <FILE>               Print a file's digests");
            println!("  ransom-sentry signatures check <FEED>   Validate a signature feed");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Apply command-line signature options on top of the configuration.
fn store_config(config: &Config, source: &SignatureSource) -> Config {
    let mut config = config.clone();
    if source.no_builtin {
        config.signatures.use_builtin = false;
    }
    config.signatures.feeds.extend(source.signatures.iter().cloned());
    config
}

/// Run a scan.
async fn run_scan(
    config: Config,
    paths: Vec<PathBuf>,
    source: &SignatureSource,
    chunk_size: Option<usize>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let config = store_config(&config, source);

    let store = config.build_store()?;
    let mut scanner = FileScanner::new(Arc::new(config), SharedStore::new(store));
    if let Some(bytes) = chunk_size {
        scanner = scanner.with_chunk_size(bytes);
    }

    log::info!("Scanning {} path(s)...", paths.len());
    let summary = scanner.scan_paths(paths).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary),
    }

    let code = if !summary.detections.is_empty() {
        ExitCode::from(EXIT_MATCH)
    } else if !summary.is_clean() {
        ExitCode::from(EXIT_INDETERMINATE)
    } else {
        ExitCode::SUCCESS
    };
    Ok(code)
}

fn print_summary(summary: &ScanSummary) {
    for report in &summary.detections {
        let names: Vec<String> = report.result.matches().iter().map(Signature::to_string).collect();
        println!("WARNING  {}", report.path.display());
        for name in names {
            println!("         matched {}", name);
        }
    }
    for failure in summary.failures.iter().chain(&summary.skipped) {
        println!("UNKNOWN  {} ({})", failure.path.display(), failure.error);
    }

    println!();
    println!("=== Scan Complete ===");
    println!("Scan ID:         {}", summary.scan_id);
    println!("Status:          {:?}", summary.status);
    println!("Signatures:      {}", summary.signatures_loaded);
    println!("Files Scanned:   {}", summary.files_scanned);
    println!("Bytes Scanned:   {}", summary.bytes_scanned);
    println!("Matches:         {}", summary.detections.len());
    println!("Not Scanned:     {}", summary.failures.len());
    println!("Skipped (size):  {}", summary.skipped.len());
    if let Some(duration) = summary.duration_ms() {
        println!("Duration:        {} ms", duration);
    }

    if summary.status == ScanStatus::Cancelled {
        println!("Result:          INCOMPLETE - scan was cancelled");
    } else if !summary.detections.is_empty() {
        println!("Result:          WARNING - known ransomware found");
    } else if !summary.failures.is_empty() || !summary.skipped.is_empty() {
        println!("Result:          INDETERMINATE - some files could not be scanned");
    } else {
        println!("Result:          CLEAN");
    }
}

/// Print digests of a file.
fn run_hash(file: &Path, algorithms: &[String], format: OutputFormat) -> Result<()> {
    let algs: BTreeSet<HashAlgorithm> = if algorithms.is_empty() {
        HashAlgorithm::ALL.into_iter().collect()
    } else {
        algorithms
            .iter()
            .map(|a| HashAlgorithm::parse(a))
            .collect::<Result<_>>()?
    };

    let digests = HashEngine::new().hash_file(file, &algs)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&digests)?),
        OutputFormat::Text => {
            for digest in digests.iter() {
                println!("{:<8} {}", digest.algorithm().as_str(), digest.to_hex());
            }
        }
    }
    Ok(())
}

/// Handle signature commands.
fn run_signatures(action: SignatureAction, config: &Config, format: OutputFormat) -> Result<()> {
    match action {
        SignatureAction::List { source } => {
            let store = store_config(config, &source).build_store()?;
            match format {
                OutputFormat::Json => {
                    let sigs: Vec<&Signature> = store.iter().collect();
                    println!("{}", serde_json::to_string_pretty(&sigs)?);
                }
                OutputFormat::Text => {
                    for sig in store.iter() {
                        println!("{:<8} {} {}", sig.algorithm().as_str(), sig.digest.to_hex(), sig.display_name());
                    }
                    println!();
                    println!("{} signature(s)", store.len());
                }
            }
        }
        SignatureAction::Check { file } => {
            if !file.exists() {
                return Err(Error::PathNotFound(file));
            }
            let entries = read_feed(&file)?;
            let mut store = SignatureStore::new();
            let report = store.load_entries(&entries)?;
            println!("{}: OK", file.display());
            println!("  {}", report);
            for alg in store.required_algorithms() {
                println!("  {:<8} {}", alg.as_str(), store.count_for(alg));
            }
        }
    }
    Ok(())
}

/// Handle configuration commands.
fn run_config(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigAction::Reset { yes } => {
            if !yes {
                println!("Re-run with --yes to overwrite {}", Config::default_config_path().display());
                return Ok(());
            }
            log::info!("Resetting configuration to defaults...");
            Config::default().save(&Config::default_config_path())?;
            println!("Configuration reset to defaults.");
        }
        ConfigAction::Path => {
            println!("{}", Config::default_config_path().display());
        }
    }
    Ok(())
}

/// Show application information.
fn run_info(config: &Config) -> Result<()> {
    println!("ransom-sentry - Hash-Signature Ransomware Detection");
    println!();
    println!("Version:          {}", env!("CARGO_PKG_VERSION"));
    println!("Config Path:      {}", Config::default_config_path().display());
    println!("Data Directory:   {}", Config::data_dir().display());
    println!();
    println!("Signature Settings:");
    println!("  Built-in:       {}", config.signatures.use_builtin);
    println!("  Feeds:          {}", config.signatures.feeds.len());
    println!();
    println!("Scan Settings:");
    println!("  Chunk Size:     {} KB", config.scan.chunk_size_kb);
    println!("  Max File Size:  {} MB", config.scan.skip_large_files_mb);
    println!("  Threads:        {}", config.scan.scan_threads);
    println!(
        "  Algorithms:     {}",
        HashAlgorithm::ALL
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
