use bytes::Bytes;

use crate::error::FsResult;
use crate::types::{FileInfo, FsStats, Handle, OpenFlags};

/// Primitive filesystem operations the interpreter is built on.
///
/// Paths are absolute, `/`-separated and already resolved by the caller.
/// Recursive operations live in `msh-core` and use nothing but these
/// primitives.
pub trait Filesystem {
    fn stat(&self, path: &str) -> FsResult<FileInfo>;

    /// Entry names of a directory. Never yields `.` or `..`.
    fn list_dir(&self, path: &str) -> FsResult<Vec<String>>;

    fn statfs(&self, path: &str) -> FsResult<FsStats>;

    fn open(&mut self, path: &str, flags: OpenFlags) -> FsResult<Handle>;

    fn read(&mut self, handle: &Handle, offset: u64, size: usize) -> FsResult<Bytes>;

    fn write(&mut self, handle: &Handle, offset: u64, data: &[u8]) -> FsResult<usize>;

    fn close(&mut self, handle: Handle) -> FsResult<()>;

    fn remove_file(&mut self, path: &str) -> FsResult<()>;

    /// Removes an empty directory.
    fn remove_dir(&mut self, path: &str) -> FsResult<()>;

    fn mkdir(&mut self, path: &str) -> FsResult<()>;

    fn rename(&mut self, from: &str, to: &str) -> FsResult<()>;
}

impl<F: Filesystem + ?Sized> Filesystem for Box<F> {
    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        (**self).stat(path)
    }

    fn list_dir(&self, path: &str) -> FsResult<Vec<String>> {
        (**self).list_dir(path)
    }

    fn statfs(&self, path: &str) -> FsResult<FsStats> {
        (**self).statfs(path)
    }

    fn open(&mut self, path: &str, flags: OpenFlags) -> FsResult<Handle> {
        (**self).open(path, flags)
    }

    fn read(&mut self, handle: &Handle, offset: u64, size: usize) -> FsResult<Bytes> {
        (**self).read(handle, offset, size)
    }

    fn write(&mut self, handle: &Handle, offset: u64, data: &[u8]) -> FsResult<usize> {
        (**self).write(handle, offset, data)
    }

    fn close(&mut self, handle: Handle) -> FsResult<()> {
        (**self).close(handle)
    }

    fn remove_file(&mut self, path: &str) -> FsResult<()> {
        (**self).remove_file(path)
    }

    fn remove_dir(&mut self, path: &str) -> FsResult<()> {
        (**self).remove_dir(path)
    }

    fn mkdir(&mut self, path: &str) -> FsResult<()> {
        (**self).mkdir(path)
    }

    fn rename(&mut self, from: &str, to: &str) -> FsResult<()> {
        (**self).rename(from, to)
    }
}
