//! File system scanner implementation.

use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::types::{FileFailure, FileReport, ScanResult, ScanSummary};
use crate::detection::matcher::Scanner;
use crate::detection::store::{SharedStore, SignatureStore};
use crate::utils::cancel::CancellableReader;
use crate::utils::hash::HashEngine;
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use walkdir::WalkDir;

/// Message from a worker task.
#[derive(Debug)]
enum WorkerMessage {
    /// File was read to the end and matched against the store
    Scanned { path: PathBuf, result: ScanResult },
    /// File could not be scanned
    Failed { path: PathBuf, error: Error },
}

/// Scans files and directory trees against a shared signature store.
pub struct FileScanner {
    config: Arc<Config>,
    store: SharedStore,
    scanner: Scanner,
    cancelled: Arc<AtomicBool>,
}

impl FileScanner {
    /// Create a new file scanner.
    pub fn new(config: Arc<Config>, store: SharedStore) -> Self {
        let scanner = Scanner::with_engine(HashEngine::with_chunk_size(config.scan.chunk_size()));
        Self {
            config,
            store,
            scanner,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the configured read chunk size, in bytes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.scanner = Scanner::with_engine(HashEngine::with_chunk_size(chunk_size));
        self
    }

    /// Cancel the current scan. In-flight reads fail at their next chunk.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if the scan has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Get the shared signature store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Reset scan state for a new scan.
    fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Check if a path should be excluded from scanning.
    pub fn should_exclude(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext_lower = ext.to_string_lossy().to_lowercase();
                self.config.scan.exclude_extensions.contains(&ext_lower)
            }
            None => false,
        }
    }

    /// Check if a file exceeds size limits.
    fn exceeds_size_limit(&self, size: u64) -> bool {
        let size_mb = size / (1024 * 1024);
        size_mb > self.config.scan.skip_large_files_mb
    }

    /// Record a file left unscanned by the size limit.
    fn skipped_for_size(&self, path: &Path, size: u64) -> FileFailure {
        log::warn!("Not scanned (over size limit): {}", path.display());
        FileFailure {
            path: path.to_path_buf(),
            error: format!(
                "{} bytes exceeds the {} MB limit",
                size, self.config.scan.skip_large_files_mb
            ),
        }
    }

    /// Scan a single file with the currently published store.
    pub fn scan_file(&self, path: &Path) -> Result<ScanResult> {
        let store = self.store.snapshot()?;
        Self::scan_one(&self.scanner, path, &store, &self.cancelled)
    }

    /// Scan files and directories on parallel workers.
    pub async fn scan_paths(&self, paths: Vec<PathBuf>) -> Result<ScanSummary> {
        self.reset();

        let store = self.store.snapshot()?;
        let mut summary = ScanSummary::new(store.len());

        let file_queue = Arc::new(Mutex::new(VecDeque::new()));
        for path in &paths {
            if self.is_cancelled() {
                break;
            }

            if path.is_file() {
                if let Ok(m) = path.metadata() {
                    if self.exceeds_size_limit(m.len()) {
                        summary.skipped.push(self.skipped_for_size(path, m.len()));
                        continue;
                    }
                }
                file_queue
                    .lock()
                    .map_err(|_| Error::lock_poisoned("file queue (add file)"))?
                    .push_back(path.clone());
            } else if path.is_dir() {
                self.collect_files(path, &file_queue, &mut summary)?;
            } else {
                summary.failures.push(FileFailure {
                    path: path.clone(),
                    error: Error::PathNotFound(path.clone()).to_string(),
                });
            }
        }

        let total_files = file_queue
            .lock()
            .map_err(|_| Error::lock_poisoned("file queue (count)"))?
            .len();
        log::info!(
            "Found {} file(s) to scan against {} signature(s)",
            total_files,
            store.len()
        );

        let (tx, mut rx) = mpsc::channel::<WorkerMessage>(1000);

        let num_workers = self.config.scan.scan_threads.clamp(1, 8);
        let mut handles = Vec::with_capacity(num_workers);

        for _ in 0..num_workers {
            let queue = Arc::clone(&file_queue);
            let store = Arc::clone(&store);
            let cancelled = Arc::clone(&self.cancelled);
            let scanner = self.scanner;
            let tx = tx.clone();

            handles.push(tokio::task::spawn_blocking(move || loop {
                let path = match queue.lock() {
                    Ok(mut q) => q.pop_front(),
                    Err(_) => {
                        log::error!("File queue lock poisoned in worker");
                        break;
                    }
                };

                let Some(path) = path else { break };

                if cancelled.load(Ordering::SeqCst) {
                    break;
                }

                let message = match Self::scan_one(&scanner, &path, &store, &cancelled) {
                    Ok(result) => WorkerMessage::Scanned { path, result },
                    Err(error) => WorkerMessage::Failed { path, error },
                };

                if tx.blocking_send(message).is_err() {
                    break;
                }
            }));
        }

        // Drop the sender so the channel closes when workers finish
        drop(tx);

        while let Some(message) = rx.recv().await {
            match message {
                WorkerMessage::Scanned { path, result } => {
                    summary.files_scanned += 1;
                    summary.bytes_scanned += result.bytes_scanned();
                    if result.is_match() {
                        log::warn!("Known-bad content: {}", path.display());
                        summary.detections.push(FileReport { path, result });
                    }
                }
                WorkerMessage::Failed { error, .. } if error.is_cancelled() => {}
                WorkerMessage::Failed { path, error } => {
                    log::debug!("Could not scan {}: {}", path.display(), error);
                    summary.failures.push(FileFailure {
                        path,
                        error: error.to_string(),
                    });
                }
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                log::error!("Scan worker failed: {}", e);
            }
        }

        if self.is_cancelled() {
            summary.cancel();
        } else {
            summary.complete();
        }

        log::info!(
            "Scan finished: {} file(s) scanned, {} match(es), {} failure(s), {} skipped",
            summary.files_scanned,
            summary.detections.len(),
            summary.failures.len(),
            summary.skipped.len()
        );

        Ok(summary)
    }

    /// Collect files from a directory into the queue.
    fn collect_files(
        &self,
        path: &Path,
        queue: &Arc<Mutex<VecDeque<PathBuf>>>,
        summary: &mut ScanSummary,
    ) -> Result<()> {
        let walker = WalkDir::new(path)
            .follow_links(self.config.scan.follow_symlinks)
            .into_iter();

        for entry in walker {
            if self.is_cancelled() {
                return Ok(());
            }

            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let failed_path = e.path().unwrap_or(path).to_path_buf();
                    summary.failures.push(FileFailure {
                        path: failed_path,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || self.should_exclude(entry.path()) {
                continue;
            }

            match entry.metadata() {
                Ok(m) if self.exceeds_size_limit(m.len()) => {
                    summary.skipped.push(self.skipped_for_size(entry.path(), m.len()));
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    summary.failures.push(FileFailure {
                        path: entry.path().to_path_buf(),
                        error: e.to_string(),
                    });
                    continue;
                }
            }

            queue
                .lock()
                .map_err(|_| Error::lock_poisoned("file queue (collect)"))?
                .push_back(entry.into_path());
        }

        Ok(())
    }

    /// Scan one file through a cancellable reader.
    fn scan_one(
        scanner: &Scanner,
        path: &Path,
        store: &SignatureStore,
        cancelled: &Arc<AtomicBool>,
    ) -> Result<ScanResult> {
        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        let reader = CancellableReader::new(file, Arc::clone(cancelled));
        scanner.scan(reader, store).map_err(|e| match e {
            Error::StreamRead { source } => Error::file_read(path, source),
            other => other,
        })
    }
}
