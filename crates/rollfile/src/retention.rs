//! Retention scanning: prune old backups by count and age

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};

/// Outcome of one retention pass.
#[derive(Debug, Default)]
pub struct RetentionReport {
    /// Paths actually deleted, oldest first.
    pub removed: Vec<PathBuf>,
    /// How many deletions the count limit forced.
    pub removed_by_count: usize,
    /// How many deletions the age limit forced.
    pub removed_by_age: usize,
    /// Files that matched a rule but could not be deleted.
    pub failures: Vec<(PathBuf, io::Error)>,
}

impl RetentionReport {
    /// Total number of files deleted.
    pub fn total_removed(&self) -> usize {
        self.removed.len()
    }
}

/// Delete backups of `base` exceeding the count or age limit.
///
/// Backups are the files in `base`'s directory whose names extend
/// `"{name}."`, ordered oldest mtime first; the live file itself never
/// matches. A nonzero `max_count` keeps the `max_count` newest; a nonzero
/// `max_age_hours` drops every file strictly older than `now − max_age`.
/// The two rules are independent and cumulative; a file claimed by both is
/// attributed to the count rule. Scan problems (missing directory,
/// unreadable entries) mean "no matches". Per-file delete failures are
/// collected in the report and do not stop the pass; a file already gone
/// counts as removed.
pub fn enforce(
    base: &Path,
    max_count: u32,
    max_age_hours: u32,
    now: DateTime<Utc>,
) -> RetentionReport {
    let mut report = RetentionReport::default();
    if max_count == 0 && max_age_hours == 0 {
        return report;
    }

    let mut backups = scan_backups(base);
    backups.sort_by_key(|(_, mtime)| *mtime);

    let excess = if max_count > 0 {
        backups.len().saturating_sub(max_count as usize)
    } else {
        0
    };
    let cutoff = if max_age_hours > 0 {
        Some(SystemTime::from(now - Duration::hours(max_age_hours as i64)))
    } else {
        None
    };

    for (idx, (path, mtime)) in backups.into_iter().enumerate() {
        let by_count = idx < excess;
        let by_age = cutoff.is_some_and(|cutoff| mtime < cutoff);
        if !by_count && !by_age {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {}
            // already gone still satisfies the limit
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                report.failures.push((path, e));
                continue;
            }
        }
        if by_count {
            report.removed_by_count += 1;
        } else {
            report.removed_by_age += 1;
        }
        report.removed.push(path);
    }

    report
}

/// Backup files of `base` with their mtimes, in directory order. Any scan
/// error yields an empty list.
fn scan_backups(base: &Path) -> Vec<(PathBuf, SystemTime)> {
    let Some(name) = base.file_name() else {
        return Vec::new();
    };
    let prefix = format!("{}.", name.to_string_lossy());
    let dir = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut backups = Vec::new();
    for entry in entries.flatten() {
        let entry_name = entry.file_name();
        let Some(entry_name) = entry_name.to_str() else {
            continue;
        };
        if !entry_name.starts_with(&prefix) || entry_name.len() == prefix.len() {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let Ok(mtime) = meta.modified() else {
            continue;
        };
        backups.push((entry.path(), mtime));
    }
    backups
}
