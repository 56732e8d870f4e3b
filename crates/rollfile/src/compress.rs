//! Gzip compression for rotated backups

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use flate2::{Compression, GzBuilder};
use rollfile_core::Result;

/// Compress `src` into a gzip archive at `dst`.
///
/// The archive records the source's file name and mtime in the gzip header.
/// Output is staged next to `dst` and renamed into place only once fully
/// written, so a crash mid-compression never leaves a truncated archive
/// under the final name. The source file is left in place; the caller
/// decides when to remove it.
pub fn compress_file(src: &Path, dst: &Path) -> Result<()> {
    let staging = staging_path(dst);
    if let Err(e) = write_archive(src, &staging) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    if let Err(e) = fs::rename(&staging, dst) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }
    Ok(())
}

fn write_archive(src: &Path, staging: &Path) -> Result<()> {
    let mut input = File::open(src)?;
    let meta = input.metadata()?;
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    let name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let out = File::create(staging)?;
    let mut encoder = GzBuilder::new()
        .filename(name)
        .mtime(mtime)
        .write(out, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;
    Ok(())
}

fn staging_path(dst: &Path) -> PathBuf {
    let mut path = OsString::from(dst.as_os_str());
    path.push(".tmp");
    PathBuf::from(path)
}
