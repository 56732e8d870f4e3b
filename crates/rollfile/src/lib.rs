//! Rollfile - Size and time based log file rotation with retention
//!
//! A writer that targets one live log file and rotates it out to timestamped
//! backups, either when the file would outgrow a size limit or when a clock
//! interval elapses. Old backups are pruned by count and age, optionally
//! gzip-compressed, all on a background thread so the write path stays hot.
//!
//! ## Usage
//!
//! ```no_run
//! use rollfile::{Config, RotateTime};
//! use std::io::Write;
//!
//! # fn main() -> rollfile::Result<()> {
//! let mut writer = Config::new("/var/log/app.log")
//!     .with_max_size_mb(50)
//!     .with_rotate_time(RotateTime::EVERY_DAY)
//!     .with_backup_count(7)
//!     .with_compress(true)
//!     .create()?;
//!
//! writeln!(writer, "service started")?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

pub mod compress;
pub mod config;
mod housekeeping;
pub mod retention;
pub mod rotation;
pub mod writer;

pub use config::{Config, NameFn};
pub use retention::RetentionReport;
pub use rotation::RotateTime;
pub use writer::RotateWriter;

pub use rollfile_core::{Clock, Error, ManualClock, Result, SyncCloseWrite, SystemClock};
