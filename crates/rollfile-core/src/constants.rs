//! Constants and default values for rollfile

/// Bytes per megabyte, the unit of the configuration size surface
pub const ONE_MEGABYTE: u64 = 1024 * 1024;

/// Default max live file size in megabytes (20MB)
pub const DEFAULT_MAX_SIZE_MB: u64 = 20;

/// Default number of backup files to keep
pub const DEFAULT_BACKUP_COUNT: u32 = 20;

/// Suffix appended to compressed backup files
pub const COMPRESS_SUFFIX: &str = ".gz";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_size() {
        assert_eq!(DEFAULT_MAX_SIZE_MB * ONE_MEGABYTE, 20 * 1024 * 1024);
    }

    #[test]
    fn test_compress_suffix() {
        assert!(COMPRESS_SUFFIX.starts_with('.'));
    }
}
