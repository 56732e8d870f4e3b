//! Sink contract shared with logging dispatchers

use std::fs::File;
use std::io;

use crate::error::Result;

/// A byte sink that can flush to stable storage and close.
///
/// This is the whole surface a logging dispatcher needs from a file-backed
/// sink: append bytes, force them to disk, release the handle. `sync` must
/// be safe to call repeatedly; after `close` the sink rejects further
/// writes without panicking.
pub trait SyncCloseWrite: io::Write + Send {
    /// Flush buffered data to stable storage.
    fn sync(&mut self) -> Result<()>;

    /// Flush, then release the underlying handle.
    fn close(&mut self) -> Result<()>;
}

impl SyncCloseWrite for File {
    fn sync(&mut self) -> Result<()> {
        self.sync_data()?;
        Ok(())
    }

    /// A file releases its descriptor on drop; close covers the flush half
    /// of the contract.
    fn close(&mut self) -> Result<()> {
        self.sync_data()?;
        Ok(())
    }
}
