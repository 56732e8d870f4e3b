//! Writer configuration: thresholds, retention limits, naming, clock

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rollfile_core::clock::{Clock, SystemClock};
use rollfile_core::constants::{DEFAULT_BACKUP_COUNT, DEFAULT_MAX_SIZE_MB, ONE_MEGABYTE};
use rollfile_core::Result;

use crate::rotation::RotateTime;
use crate::writer::RotateWriter;

/// Maps (base path, rotation sequence) to the backup path of a
/// size-triggered rotation.
pub type NameFn = Arc<dyn Fn(&Path, u32) -> PathBuf + Send + Sync>;

/// Rotation, retention and naming policy for a [`RotateWriter`].
///
/// The live file rotates when either configured threshold trips. With size
/// and time rotation both disabled the writer degrades to a plain
/// append-only file.
#[derive(Clone)]
pub struct Config {
    /// Path of the live file.
    pub path: PathBuf,
    /// Max live file size in bytes. Zero disables size rotation.
    pub max_size: u64,
    /// Calendar rotation interval. `None` disables time rotation.
    pub rotate_time: Option<RotateTime>,
    /// Max number of backups to keep. Zero keeps all.
    pub backup_count: u32,
    /// Max backup age in hours. Zero keeps backups forever.
    pub backup_age_hours: u32,
    /// Gzip backups after rotation.
    pub compress: bool,
    /// Custom backup namer for size rotations. `None` uses the built-in
    /// `<base>.<MMDDhhmm>_<seq>` convention.
    pub name_fn: Option<NameFn>,
    /// Time source for rotation deadlines and backup names.
    pub clock: Arc<dyn Clock>,
}

impl Config {
    /// Configuration with the documented defaults: 20MB size threshold,
    /// hourly rotation, 20 backups kept, no age limit, no compression.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            max_size: DEFAULT_MAX_SIZE_MB * ONE_MEGABYTE,
            rotate_time: Some(RotateTime::EVERY_HOUR),
            backup_count: DEFAULT_BACKUP_COUNT,
            backup_age_hours: 0,
            compress: false,
            name_fn: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Specifies the size threshold in bytes. Zero disables size rotation.
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    /// Specifies the size threshold in megabytes.
    pub fn with_max_size_mb(mut self, megabytes: u64) -> Self {
        self.max_size = megabytes * ONE_MEGABYTE;
        self
    }

    /// Specifies the calendar rotation interval.
    pub fn with_rotate_time(mut self, rotate_time: RotateTime) -> Self {
        self.rotate_time = Some(rotate_time);
        self
    }

    /// Turns time-based rotation off.
    pub fn without_rotate_time(mut self) -> Self {
        self.rotate_time = None;
        self
    }

    /// Specifies how many backups to keep. Zero keeps all.
    pub fn with_backup_count(mut self, count: u32) -> Self {
        self.backup_count = count;
        self
    }

    /// Specifies the max backup age in hours. Zero keeps backups forever.
    pub fn with_backup_age_hours(mut self, hours: u32) -> Self {
        self.backup_age_hours = hours;
        self
    }

    /// Enables or disables gzip compression of backups.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Specifies a custom backup namer for size-triggered rotations.
    pub fn with_name_fn<F>(mut self, name_fn: F) -> Self
    where
        F: Fn(&Path, u32) -> PathBuf + Send + Sync + 'static,
    {
        self.name_fn = Some(Arc::new(name_fn));
        self
    }

    /// Specifies the clock driving rotation deadlines.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Open the writer. Fails fast if the parent directory cannot be
    /// created or the live file cannot be opened for append.
    pub fn create(self) -> Result<RotateWriter> {
        RotateWriter::new(self)
    }

    pub(crate) fn wants_housekeeping(&self) -> bool {
        self.compress || self.backup_count > 0 || self.backup_age_hours > 0
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("max_size", &self.max_size)
            .field("rotate_time", &self.rotate_time)
            .field("backup_count", &self.backup_count)
            .field("backup_age_hours", &self.backup_age_hours)
            .field("compress", &self.compress)
            .field("custom_name_fn", &self.name_fn.is_some())
            .finish_non_exhaustive()
    }
}
