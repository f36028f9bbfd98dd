//! Recursive filesystem operations built on the [`Filesystem`] primitives.
//!
//! Traversals use an explicit stack instead of call recursion and visit
//! entries in listing order. File contents are moved in fixed-size chunks so
//! memory use does not grow with file size.

use msh_sdk::{Filesystem, FsError, FsResult, Handle, OpenFlags};
use tracing::{debug, warn};

/// Chunk size for file copies and buffered reads.
pub const COPY_CHUNK_SIZE: usize = 512;

const TEMP_SUFFIX: &str = ".msh-tmp";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopySummary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Joins a directory path and an entry name with exactly one separator.
#[must_use]
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Last segment of a path, `None` for the root.
#[must_use]
pub fn basename(path: &str) -> Option<&str> {
    path.rsplit('/').find(|segment| !segment.is_empty())
}

/// True if `path` is `ancestor` itself or lies somewhere below it.
#[must_use]
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return path.starts_with('/');
    }
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

enum RemoveStep {
    Visit(String),
    RemoveDir(String),
}

/// Removes `path` and everything below it, returning the number of entries
/// removed. Stops at the first failure; entries already removed stay removed.
pub fn remove_recursive<F: Filesystem + ?Sized>(fs: &mut F, path: &str) -> FsResult<usize> {
    let mut removed = 0;
    let mut stack = vec![RemoveStep::Visit(path.to_string())];

    while let Some(step) = stack.pop() {
        match step {
            RemoveStep::Visit(current) => {
                let info = fs.stat(&current)?;
                if info.is_dir() {
                    let children = fs.list_dir(&current)?;
                    stack.push(RemoveStep::RemoveDir(current.clone()));
                    stack.extend(
                        children
                            .iter()
                            .rev()
                            .map(|name| RemoveStep::Visit(join_path(&current, name))),
                    );
                } else {
                    fs.remove_file(&current)?;
                    removed += 1;
                }
            }
            RemoveStep::RemoveDir(current) => {
                fs.remove_dir(&current)?;
                removed += 1;
            }
        }
    }

    debug!(path, removed, "recursive remove finished");
    Ok(removed)
}

/// Copies `src` to `dest`. Directories are copied with their whole subtree;
/// an existing destination directory is reused. Stops at the first failure.
pub fn copy_recursive<F: Filesystem + ?Sized>(
    fs: &mut F,
    src: &str,
    dest: &str,
) -> FsResult<CopySummary> {
    let src_info = fs.stat(src)?;
    if src_info.is_dir() && is_within(dest, src) {
        return Err(FsError::invalid_argument(format!(
            "cannot copy {src} into itself"
        )));
    }

    let mut summary = CopySummary::default();
    let mut stack = vec![(src.to_string(), dest.to_string())];

    while let Some((from, to)) = stack.pop() {
        let info = fs.stat(&from)?;
        if info.is_dir() {
            match fs.mkdir(&to) {
                Ok(()) => {}
                Err(e) if e.is_already_exists() => {}
                Err(e) => return Err(e),
            }
            summary.directories += 1;

            let children = fs.list_dir(&from)?;
            stack.extend(
                children
                    .iter()
                    .rev()
                    .map(|name| (join_path(&from, name), join_path(&to, name))),
            );
        } else {
            summary.bytes += copy_file(fs, &from, &to)?;
            summary.files += 1;
        }
    }

    debug!(src, dest, ?summary, "recursive copy finished");
    Ok(summary)
}

/// Streams one file to `dest` in [`COPY_CHUNK_SIZE`] chunks, replacing any
/// existing content. Returns the number of bytes copied.
pub fn copy_file<F: Filesystem + ?Sized>(fs: &mut F, src: &str, dest: &str) -> FsResult<u64> {
    // Opening the destination would truncate the source.
    if src == dest {
        return Err(FsError::invalid_argument(format!(
            "{src} and {dest} are the same file"
        )));
    }
    let reader = fs.open(src, OpenFlags::read())?;
    let writer = match fs.open(dest, OpenFlags::create_truncate()) {
        Ok(handle) => handle,
        Err(e) => {
            let _ = fs.close(reader);
            return Err(e);
        }
    };

    let copied = pump(fs, &reader, &writer);
    let closed_reader = fs.close(reader);
    let closed_writer = fs.close(writer);

    let copied = copied?;
    closed_reader?;
    closed_writer?;
    Ok(copied)
}

fn pump<F: Filesystem + ?Sized>(fs: &mut F, reader: &Handle, writer: &Handle) -> FsResult<u64> {
    let mut offset = 0u64;
    loop {
        let chunk = fs.read(reader, offset, COPY_CHUNK_SIZE)?;
        if chunk.is_empty() {
            return Ok(offset);
        }
        let written = fs.write(writer, offset, &chunk)?;
        if written == 0 {
            return Err(FsError::internal("short write"));
        }
        offset += written as u64;
    }
}

/// Total size of `path` and everything below it, directories counting their
/// own reported entry size. Best effort: entries that vanish mid-scan count
/// as zero and other errors are logged and skipped.
pub fn disk_usage<F: Filesystem + ?Sized>(fs: &F, path: &str) -> u64 {
    let mut total = 0u64;
    let mut stack = vec![path.to_string()];

    while let Some(current) = stack.pop() {
        let info = match fs.stat(&current) {
            Ok(info) => info,
            Err(e) if e.is_not_found() => continue,
            Err(e) => {
                warn!(path = %current, error = %e, "skipping entry during size scan");
                continue;
            }
        };
        total += info.size;

        if info.is_dir() {
            match fs.list_dir(&current) {
                Ok(children) => stack.extend(
                    children
                        .iter()
                        .rev()
                        .map(|name| join_path(&current, name)),
                ),
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!(path = %current, error = %e, "cannot list directory during size scan");
                }
            }
        }
    }

    total
}

/// Effective target of a copy or move: if `dest` is an existing directory the
/// source's basename is appended, otherwise `dest` is the new name.
pub fn resolve_destination<F: Filesystem + ?Sized>(
    fs: &F,
    src: &str,
    dest: &str,
) -> FsResult<String> {
    let name = basename(src)
        .ok_or_else(|| FsError::invalid_argument("cannot copy or move the root directory"))?;

    match fs.stat(dest) {
        Ok(info) if info.is_dir() => Ok(join_path(dest, name)),
        _ => Ok(dest.to_string()),
    }
}

/// Renames `src` using the same destination rules as a copy. Returns the
/// final path.
pub fn move_entry<F: Filesystem + ?Sized>(fs: &mut F, src: &str, dest: &str) -> FsResult<String> {
    let target = resolve_destination(fs, src, dest)?;
    fs.rename(src, &target)?;
    Ok(target)
}

pub fn read_to_string<F: Filesystem + ?Sized>(fs: &mut F, path: &str) -> FsResult<String> {
    let handle = fs.open(path, OpenFlags::read())?;
    let mut data = Vec::new();
    let result = loop {
        match fs.read(&handle, data.len() as u64, COPY_CHUNK_SIZE) {
            Ok(chunk) if chunk.is_empty() => break Ok(()),
            Ok(chunk) => data.extend_from_slice(&chunk),
            Err(e) => break Err(e),
        }
    };
    let closed = fs.close(handle);
    result?;
    closed?;

    String::from_utf8(data).map_err(|_| FsError::invalid_argument(format!("{path}: not valid UTF-8")))
}

/// Replaces the content of `path` without ever leaving it half written: the
/// data goes to a sibling temporary file which is then renamed over the
/// target.
pub fn write_file_atomic<F: Filesystem + ?Sized>(
    fs: &mut F,
    path: &str,
    data: &[u8],
) -> FsResult<()> {
    let temp = format!("{path}{TEMP_SUFFIX}");
    let result = write_chunks(fs, &temp, data).and_then(|()| fs.rename(&temp, path));
    if result.is_err() {
        let _ = fs.remove_file(&temp);
    }
    result
}

fn write_chunks<F: Filesystem + ?Sized>(fs: &mut F, path: &str, data: &[u8]) -> FsResult<()> {
    let handle = fs.open(path, OpenFlags::create_truncate())?;
    let mut offset = 0u64;
    let mut result = Ok(());
    for chunk in data.chunks(COPY_CHUNK_SIZE) {
        if let Err(e) = fs.write(&handle, offset, chunk) {
            result = Err(e);
            break;
        }
        offset += chunk.len() as u64;
    }
    let closed = fs.close(handle);
    result?;
    closed
}

/// Reads a file line by line through a handle, holding at most one chunk and
/// one partial line in memory.
///
/// The reader does not borrow the filesystem so that callers can keep using
/// it between lines; pass the same filesystem to every call and finish with
/// [`LineReader::close`].
#[derive(Debug)]
pub struct LineReader {
    handle: Handle,
    offset: u64,
    pending: Vec<u8>,
    exhausted: bool,
}

impl LineReader {
    pub fn open<F: Filesystem + ?Sized>(fs: &mut F, path: &str) -> FsResult<Self> {
        let handle = fs.open(path, OpenFlags::read())?;
        Ok(Self {
            handle,
            offset: 0,
            pending: Vec::new(),
            exhausted: false,
        })
    }

    /// Next line without its terminator (`\n` or `\r\n`), `None` at end of file.
    pub fn next_line<F: Filesystem + ?Sized>(&mut self, fs: &mut F) -> FsResult<Option<String>> {
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            if self.exhausted {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.pending);
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            let chunk = fs.read(&self.handle, self.offset, COPY_CHUNK_SIZE)?;
            if chunk.is_empty() {
                self.exhausted = true;
            } else {
                self.offset += chunk.len() as u64;
                self.pending.extend_from_slice(&chunk);
            }
        }
    }

    pub fn close<F: Filesystem + ?Sized>(self, fs: &mut F) -> FsResult<()> {
        fs.close(self.handle)
    }
}
