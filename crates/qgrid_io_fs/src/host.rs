//! File access boundary of the writer.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

/// Filesystem capability used by [`crate::ChunkedWriter`].
pub trait FileHost {
    /// Open file handle.
    type Handle;

    /// Create or truncate `path` and write `bytes` in one call.
    fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Create or truncate `path` for slice writes.
    fn open(&self, path: &Path) -> io::Result<Self::Handle>;

    /// Write `bytes` at byte `offset`.
    fn write_at(&self, handle: &mut Self::Handle, offset: u64, bytes: &[u8]) -> io::Result<()>;

    /// Flush and release the handle.
    fn close(&self, handle: Self::Handle) -> io::Result<()>;
}

/// [`FileHost`] over `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileHost;

impl FileHost for StdFileHost {
    type Handle = File;

    fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        std::fs::write(path, bytes)
    }

    fn open(&self, path: &Path) -> io::Result<File> {
        File::create(path)
    }

    fn write_at(&self, handle: &mut File, offset: u64, bytes: &[u8]) -> io::Result<()> {
        handle.seek(SeekFrom::Start(offset))?;
        handle.write_all(bytes)
    }

    fn close(&self, mut handle: File) -> io::Result<()> {
        handle.flush()
    }
}
