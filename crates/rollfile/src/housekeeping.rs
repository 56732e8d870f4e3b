//! Background worker for post-rotation compression and retention

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use rollfile_core::clock::Clock;
use rollfile_core::constants::COMPRESS_SUFFIX;
use rollfile_core::Result;
use tracing::{debug, warn};

use crate::compress;
use crate::config::Config;
use crate::retention;

/// Runs compression and retention off the write path.
///
/// One worker thread per writer, fed by an unbounded queue of just-renamed
/// backup paths. Dropping (or draining) the housekeeper closes the queue
/// and joins the thread, so every submitted job finishes before shutdown
/// completes.
pub(crate) struct Housekeeper {
    tx: Option<Sender<PathBuf>>,
    handle: Option<JoinHandle<()>>,
}

struct Worker {
    base: PathBuf,
    compress: bool,
    backup_count: u32,
    backup_age_hours: u32,
    clock: Arc<dyn Clock>,
}

impl Housekeeper {
    /// Spawn the worker thread for a writer with the given policy.
    pub(crate) fn spawn(config: &Config) -> Result<Self> {
        let worker = Worker {
            base: config.path.clone(),
            compress: config.compress,
            backup_count: config.backup_count,
            backup_age_hours: config.backup_age_hours,
            clock: Arc::clone(&config.clock),
        };

        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name("rollfile-housekeeping".to_string())
            .spawn(move || worker.run(rx))?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue housekeeping for a just-renamed backup.
    pub(crate) fn submit(&self, backup: PathBuf) {
        if let Some(tx) = &self.tx {
            // the worker holds the receiver until drain; a send only fails
            // after the worker panicked
            if tx.send(backup).is_err() {
                warn!("Housekeeping worker is gone; backup left unprocessed");
            }
        }
    }

    /// Finish all queued jobs and stop the worker.
    pub(crate) fn drain(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Housekeeping worker panicked");
            }
        }
    }
}

impl Drop for Housekeeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Worker {
    fn run(&self, rx: Receiver<PathBuf>) {
        while let Ok(backup) = rx.recv() {
            self.process(&backup);
        }
    }

    fn process(&self, backup: &Path) {
        if self.compress {
            self.compress_backup(backup);
        }

        if self.backup_count > 0 || self.backup_age_hours > 0 {
            let report = retention::enforce(
                &self.base,
                self.backup_count,
                self.backup_age_hours,
                self.clock.now(),
            );
            for (path, err) in &report.failures {
                warn!("Failed to delete old backup {}: {}", path.display(), err);
            }
            if report.total_removed() > 0 {
                debug!(
                    "Removed {} old backups of {}",
                    report.total_removed(),
                    self.base.display()
                );
            }
        }
    }

    /// Gzip one backup in place, removing the original on success. Failures
    /// leave the uncompressed backup behind for the next retention pass.
    fn compress_backup(&self, backup: &Path) {
        let mut archive = backup.as_os_str().to_os_string();
        archive.push(COMPRESS_SUFFIX);
        let archive = PathBuf::from(archive);

        match compress::compress_file(backup, &archive) {
            Ok(()) => {
                if let Err(e) = std::fs::remove_file(backup) {
                    warn!(
                        "Compressed {} but failed to remove the original: {}",
                        backup.display(),
                        e
                    );
                }
            }
            Err(e) => warn!("Failed to compress {}: {}", backup.display(), e),
        }
    }
}
