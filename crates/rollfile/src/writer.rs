//! Rotating file writer: lazy rotation checks, backup naming, housekeeping

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rollfile_core::{Error, Result, SyncCloseWrite};
use tracing::debug;

use crate::config::Config;
use crate::housekeeping::Housekeeper;
use crate::rotation::RotateTime;

/// Compact timestamp for size-rotation backup names. Whole-minute
/// resolution: rotations within the same minute are disambiguated by the
/// sequence counter alone.
const SIZE_STAMP_FORMAT: &str = "%m%d%H%M";

/// Appending byte sink that rotates the file underneath itself.
///
/// Rotation is evaluated lazily on each write: first the calendar deadline,
/// then the size threshold with would-exceed semantics, so a single write
/// is never split across two files. Closed backups are handed to a
/// housekeeping thread for compression and retention.
///
/// The writer can be driven two ways. Through `&self` (including
/// `io::Write for &RotateWriter`) every call serializes on an internal
/// mutex, so one instance can be shared across threads. Through `&mut self`
/// the exclusive borrow already proves single ownership and the lock is
/// bypassed.
pub struct RotateWriter {
    config: Config,
    inner: Mutex<Inner>,
}

struct Inner {
    /// Live handle. `None` between a failed reopen and the next write.
    file: Option<BufWriter<File>>,
    /// Bytes in the live file, counting what the open handle has accepted.
    written: u64,
    /// Epoch second of the next time rotation, when configured.
    rotate_at: Option<i64>,
    /// Size-rotation sequence. Resets on every time-boundary rotation.
    seq: u32,
    closed: bool,
    keeper: Option<Housekeeper>,
}

impl RotateWriter {
    /// Open the live file and start housekeeping if the policy needs it.
    pub fn new(config: Config) -> Result<Self> {
        if config.path.file_name().is_none() {
            return Err(Error::config(format!(
                "base path has no file name: {:?}",
                config.path
            )));
        }

        let (file, written) = open_live(&config.path)?;
        let rotate_at = config
            .rotate_time
            .map(|rt| rt.next_deadline(config.clock.now()));
        let keeper = if config.wants_housekeeping() {
            Some(Housekeeper::spawn(&config)?)
        } else {
            None
        };

        Ok(Self {
            config,
            inner: Mutex::new(Inner {
                file: Some(file),
                written,
                rotate_at,
                seq: 0,
                closed: false,
                keeper,
            }),
        })
    }

    /// Append `buf`, rotating first if the deadline or the size threshold
    /// requires it. The whole buffer lands in one file.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        Self::write_inner(&self.config, &mut self.inner.lock(), buf)
    }

    /// Force written bytes down to stable storage. Does not rotate.
    pub fn flush(&self) -> Result<()> {
        Self::flush_inner(&mut self.inner.lock())
    }

    /// Flush, release the live handle, and wait for queued housekeeping to
    /// finish. A second close is an `Ok` no-op; writes and flushes after
    /// close fail with [`Error::WriterClosed`].
    pub fn close(&self) -> Result<()> {
        Self::close_inner(&mut self.inner.lock())
    }

    /// Path of the live file.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Bytes currently accounted to the live file.
    pub fn current_size(&self) -> u64 {
        self.inner.lock().written
    }

    fn write_inner(config: &Config, inner: &mut Inner, buf: &[u8]) -> Result<usize> {
        if inner.closed {
            return Err(Error::WriterClosed);
        }

        let now = config.clock.now();

        // time boundary first, so the backup keeps its period name even
        // when the size threshold tripped in the same write
        if let (Some(rotate_time), Some(due)) = (config.rotate_time, inner.rotate_at) {
            if now.timestamp() >= due {
                // an empty live file is not backed up; the deadline and
                // sequence still advance
                if inner.written > 0 {
                    let backup = time_backup_path(&config.path, rotate_time, due);
                    Self::rotate(config, inner, backup)?;
                }
                inner.seq = 0;
                inner.rotate_at = Some(rotate_time.next_deadline(now));
            }
        }

        let len = buf.len() as u64;
        if config.max_size > 0 && inner.written > 0 && inner.written + len > config.max_size {
            inner.seq += 1;
            let backup = match &config.name_fn {
                Some(name_fn) => name_fn(&config.path, inner.seq),
                None => size_backup_path(&config.path, inner.seq, now),
            };
            Self::rotate(config, inner, backup)?;
        }

        let file = Self::live_file(config, inner)?;
        file.write_all(buf)?;
        inner.written += len;
        Ok(buf.len())
    }

    /// Close the live handle, rename it to `backup`, reopen fresh, and
    /// queue housekeeping. The handle is dropped before the rename so no
    /// open file gets renamed out from under its descriptor.
    fn rotate(config: &Config, inner: &mut Inner, backup: PathBuf) -> Result<()> {
        if let Some(mut file) = inner.file.take() {
            file.flush()?;
        }

        match fs::rename(&config.path, &backup) {
            Ok(()) => {
                debug!("Rotated {} to {}", config.path.display(), backup.display());
                if let Some(keeper) = &inner.keeper {
                    keeper.submit(backup);
                }
            }
            // live file vanished externally; nothing to back up
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        inner.written = 0;

        let (file, written) = open_live(&config.path)?;
        inner.file = Some(file);
        inner.written = written;
        Ok(())
    }

    /// The open live handle, reopening it when the last rotation failed
    /// mid-swap.
    fn live_file<'a>(config: &Config, inner: &'a mut Inner) -> Result<&'a mut BufWriter<File>> {
        match inner.file {
            Some(ref mut file) => Ok(file),
            None => {
                let (file, written) = open_live(&config.path)?;
                inner.written = written;
                Ok(inner.file.insert(file))
            }
        }
    }

    fn flush_inner(inner: &mut Inner) -> Result<()> {
        if inner.closed {
            return Err(Error::WriterClosed);
        }
        if let Some(file) = inner.file.as_mut() {
            file.flush()?;
            file.get_ref().sync_data()?;
        }
        Ok(())
    }

    fn close_inner(inner: &mut Inner) -> Result<()> {
        if inner.closed {
            return Ok(());
        }
        inner.closed = true;

        let flushed = match inner.file.take() {
            Some(mut file) => file
                .flush()
                .and_then(|_| file.get_ref().sync_data())
                .map_err(Error::from),
            None => Ok(()),
        };

        if let Some(keeper) = inner.keeper.take() {
            keeper.drain();
        }
        flushed
    }
}

impl Drop for RotateWriter {
    fn drop(&mut self) {
        let _ = Self::close_inner(self.inner.get_mut());
    }
}

impl io::Write for RotateWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Self::write_inner(&self.config, self.inner.get_mut(), buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Self::flush_inner(self.inner.get_mut()).map_err(io::Error::from)
    }
}

impl io::Write for &RotateWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotateWriter::write_inner(&self.config, &mut self.inner.lock(), buf)
            .map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        RotateWriter::flush_inner(&mut self.inner.lock()).map_err(io::Error::from)
    }
}

impl SyncCloseWrite for RotateWriter {
    fn sync(&mut self) -> Result<()> {
        Self::flush_inner(self.inner.get_mut())
    }

    fn close(&mut self) -> Result<()> {
        Self::close_inner(self.inner.get_mut())
    }
}

impl SyncCloseWrite for &RotateWriter {
    fn sync(&mut self) -> Result<()> {
        RotateWriter::flush_inner(&mut self.inner.lock())
    }

    fn close(&mut self) -> Result<()> {
        RotateWriter::close_inner(&mut self.inner.lock())
    }
}

/// Open the live file for append, creating parents as needed, and report
/// how many bytes it already holds.
fn open_live(path: &Path) -> Result<(BufWriter<File>, u64)> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let written = file.metadata()?.len();
    Ok((BufWriter::new(file), written))
}

/// Backup path for a time rotation: `<base>.<periodSuffix>`, stamped with
/// the start of the period that just ended.
fn time_backup_path(base: &Path, rotate_time: RotateTime, deadline: i64) -> PathBuf {
    append_suffix(
        base,
        &rotate_time.period_suffix(rotate_time.period_start(deadline)),
    )
}

/// Backup path for a size rotation: `<base>.<MMDDhhmm>_<seq>`.
fn size_backup_path(base: &Path, seq: u32, now: DateTime<Utc>) -> PathBuf {
    append_suffix(base, &format!("{}_{:04}", now.format(SIZE_STAMP_FORMAT), seq))
}

fn append_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
