use bytes::Bytes;
use msh_sdk::{FileInfo, FileType, Filesystem, FsError, FsResult, FsStats, Handle, OpenFlags};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

#[derive(Debug)]
struct LocalHandle {
    file: File,
    flags: OpenFlags,
}

/// Filesystem backed by a host directory that stands in for the device's
/// flash root. Device paths never escape that directory.
pub struct LocalFs {
    root: PathBuf,
    handles: HashMap<u64, LocalHandle>,
    next_handle: u64,
}

impl LocalFs {
    pub fn new(root: impl AsRef<Path>) -> FsResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            return Err(FsError::not_found(root.display().to_string()));
        }
        if !root.is_dir() {
            return Err(FsError::not_directory(root.display().to_string()));
        }

        // Normalize symlinks to make `starts_with` comparisons reliable (e.g., /var vs /private/var on macOS).
        let root = root
            .canonicalize()
            .map_err(|e| FsError::internal(format!("Failed to canonicalize root: {e}")))?;

        Ok(Self {
            root,
            handles: HashMap::new(),
            next_handle: 1,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a device path onto the host. `..` segments are folded lexically
    /// and may not climb above the root.
    fn resolve_path(&self, path: &str) -> FsResult<PathBuf> {
        let mut resolved = self.root.clone();
        let mut depth = 0usize;
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(segment) => {
                    resolved.push(segment);
                    depth += 1;
                }
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(FsError::permission_denied("path escapes root"));
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        if let Ok(canonical) = resolved.canonicalize() {
            if !canonical.starts_with(&self.root) {
                return Err(FsError::permission_denied("path escapes root"));
            }
        }

        Ok(resolved)
    }

    fn metadata_to_file_info(path: &str, meta: &fs::Metadata) -> FileInfo {
        let file_type = if meta.is_dir() {
            FileType::Directory
        } else {
            FileType::Regular
        };

        FileInfo {
            path: path.to_string(),
            size: meta.len(),
            file_type,
        }
    }

    fn handle_mut(&mut self, handle: &Handle) -> FsResult<&mut LocalHandle> {
        self.handles
            .get_mut(&handle.id())
            .ok_or_else(|| FsError::invalid_handle(handle.id()))
    }
}

impl Filesystem for LocalFs {
    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let full_path = self.resolve_path(path)?;
        let meta = fs::metadata(&full_path).map_err(|e| map_io_error(&e, path))?;
        Ok(Self::metadata_to_file_info(path, &meta))
    }

    fn list_dir(&self, path: &str) -> FsResult<Vec<String>> {
        let full_path = self.resolve_path(path)?;
        let entries = fs::read_dir(&full_path).map_err(|e| map_io_error(&e, path))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| map_io_error(&e, path))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    #[allow(unsafe_code)]
    fn statfs(&self, path: &str) -> FsResult<FsStats> {
        #[cfg(unix)]
        {
            use std::mem::MaybeUninit;
            use std::os::unix::ffi::OsStrExt;

            let full_path = self.resolve_path(path)?;
            let path_cstr = std::ffi::CString::new(full_path.as_os_str().as_bytes())
                .map_err(|e| FsError::internal(e.to_string()))?;

            let mut stat: MaybeUninit<libc::statvfs> = MaybeUninit::uninit();
            let result = unsafe { libc::statvfs(path_cstr.as_ptr(), stat.as_mut_ptr()) };

            if result != 0 {
                return Err(FsError::internal("statvfs failed"));
            }

            let stat = unsafe { stat.assume_init() };
            Ok(FsStats {
                total_bytes: (stat.f_blocks as u64) * (stat.f_frsize as u64),
                free_bytes: (stat.f_bavail as u64) * (stat.f_frsize as u64),
                block_size: stat.f_bsize as u32,
            })
        }

        #[cfg(not(unix))]
        {
            let _ = self.resolve_path(path)?;
            Ok(FsStats {
                total_bytes: 0,
                free_bytes: 0,
                block_size: 4096,
            })
        }
    }

    fn open(&mut self, path: &str, flags: OpenFlags) -> FsResult<Handle> {
        let full_path = self.resolve_path(path)?;
        if full_path.is_dir() {
            return Err(FsError::is_directory(path));
        }

        let file = OpenOptions::new()
            .read(flags.read)
            .write(flags.write && !flags.append)
            .append(flags.append)
            .create(flags.create)
            .truncate(flags.truncate)
            .open(&full_path)
            .map_err(|e| map_io_error(&e, path))?;

        let handle_id = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(handle_id, LocalHandle { file, flags });
        Ok(Handle::new(handle_id))
    }

    fn read(&mut self, handle: &Handle, offset: u64, size: usize) -> FsResult<Bytes> {
        let local_handle = self.handle_mut(handle)?;
        if !local_handle.flags.read {
            return Err(FsError::permission_denied("file not opened for reading"));
        }

        local_handle
            .file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| FsError::internal(e.to_string()))?;

        let mut buf = vec![0u8; size];
        let n = local_handle
            .file
            .read(&mut buf)
            .map_err(|e| FsError::internal(e.to_string()))?;
        buf.truncate(n);

        Ok(Bytes::from(buf))
    }

    fn write(&mut self, handle: &Handle, offset: u64, data: &[u8]) -> FsResult<usize> {
        let local_handle = self.handle_mut(handle)?;
        if !local_handle.flags.write {
            return Err(FsError::permission_denied("file not opened for writing"));
        }

        if !local_handle.flags.append {
            local_handle
                .file
                .seek(SeekFrom::Start(offset))
                .map_err(|e| FsError::internal(e.to_string()))?;
        }

        local_handle
            .file
            .write_all(data)
            .map_err(|e| FsError::internal(e.to_string()))?;

        Ok(data.len())
    }

    fn close(&mut self, handle: Handle) -> FsResult<()> {
        let local_handle = self
            .handles
            .remove(&handle.id())
            .ok_or_else(|| FsError::invalid_handle(handle.id()))?;

        if local_handle.flags.write {
            local_handle
                .file
                .sync_all()
                .map_err(|e| FsError::internal(e.to_string()))?;
        }

        Ok(())
    }

    fn remove_file(&mut self, path: &str) -> FsResult<()> {
        let full_path = self.resolve_path(path)?;
        if full_path.is_dir() {
            return Err(FsError::is_directory(path));
        }
        fs::remove_file(&full_path).map_err(|e| map_io_error(&e, path))
    }

    fn remove_dir(&mut self, path: &str) -> FsResult<()> {
        let full_path = self.resolve_path(path)?;
        if full_path == self.root {
            return Err(FsError::permission_denied("cannot remove root"));
        }
        let meta = fs::metadata(&full_path).map_err(|e| map_io_error(&e, path))?;
        if !meta.is_dir() {
            return Err(FsError::not_directory(path));
        }
        // `ErrorKind::DirectoryNotEmpty` is not stable on the MSRV, check first.
        let mut entries = fs::read_dir(&full_path).map_err(|e| map_io_error(&e, path))?;
        if entries.next().is_some() {
            return Err(FsError::directory_not_empty(path));
        }
        fs::remove_dir(&full_path).map_err(|e| map_io_error(&e, path))
    }

    fn mkdir(&mut self, path: &str) -> FsResult<()> {
        let full_path = self.resolve_path(path)?;
        fs::create_dir(&full_path).map_err(|e| map_io_error(&e, path))
    }

    fn rename(&mut self, from: &str, to: &str) -> FsResult<()> {
        let from_path = self.resolve_path(from)?;
        let to_path = self.resolve_path(to)?;
        if from_path == self.root {
            return Err(FsError::permission_denied("cannot rename root"));
        }
        if to_path.starts_with(&from_path) && to_path != from_path {
            return Err(FsError::invalid_argument(format!(
                "cannot move {from} into itself"
            )));
        }
        if to_path.is_dir() {
            return Err(FsError::already_exists(to));
        }
        fs::rename(&from_path, &to_path).map_err(|e| map_io_error(&e, from))
    }
}

fn map_io_error(err: &std::io::Error, path: &str) -> FsError {
    match err.kind() {
        std::io::ErrorKind::NotFound => FsError::not_found(path),
        std::io::ErrorKind::PermissionDenied => FsError::permission_denied(path),
        std::io::ErrorKind::AlreadyExists => FsError::already_exists(path),
        _ => FsError::internal(format!("{path}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalFs) {
        let temp = TempDir::new().unwrap();
        let fs = LocalFs::new(temp.path()).unwrap();
        (temp, fs)
    }

    fn write_file(fs: &mut LocalFs, path: &str, data: &[u8]) {
        let handle = fs.open(path, OpenFlags::create_truncate()).unwrap();
        fs.write(&handle, 0, data).unwrap();
        fs.close(handle).unwrap();
    }

    #[test]
    fn create_and_read_file() {
        let (_temp, mut fs) = setup();

        write_file(&mut fs, "/test.txt", b"hello world");

        let handle = fs.open("/test.txt", OpenFlags::read()).unwrap();
        let data = fs.read(&handle, 0, 1024).unwrap();
        assert_eq!(&data[..], b"hello world");
        let tail = fs.read(&handle, 6, 1024).unwrap();
        assert_eq!(&tail[..], b"world");
        fs.close(handle).unwrap();
    }

    #[test]
    fn create_directory() {
        let (temp, mut fs) = setup();

        fs.mkdir("/mydir").unwrap();

        let info = fs.stat("/mydir").unwrap();
        assert!(info.is_dir());
        assert!(temp.path().join("mydir").is_dir());
        assert!(fs.mkdir("/mydir").unwrap_err().is_already_exists());
    }

    #[test]
    fn list_dir_is_sorted_names() {
        let (_temp, mut fs) = setup();

        fs.mkdir("/dir").unwrap();
        write_file(&mut fs, "/dir/b.txt", b"");
        write_file(&mut fs, "/dir/a.txt", b"");
        fs.mkdir("/dir/c").unwrap();

        assert_eq!(fs.list_dir("/dir").unwrap(), vec!["a.txt", "b.txt", "c"]);
    }

    #[test]
    fn append_mode() {
        let (_temp, mut fs) = setup();
        write_file(&mut fs, "/log.txt", b"one\n");

        let handle = fs.open("/log.txt", OpenFlags::append()).unwrap();
        fs.write(&handle, 0, b"two\n").unwrap();
        fs.close(handle).unwrap();

        assert_eq!(fs.stat("/log.txt").unwrap().size, 8);
    }

    #[test]
    fn remove_file_and_dir() {
        let (_temp, mut fs) = setup();

        fs.mkdir("/dir").unwrap();
        write_file(&mut fs, "/dir/test.txt", b"x");

        assert!(fs.remove_dir("/dir").unwrap_err().is_directory_not_empty());
        fs.remove_file("/dir/test.txt").unwrap();
        fs.remove_dir("/dir").unwrap();
        assert!(fs.stat("/dir").unwrap_err().is_not_found());
    }

    #[test]
    fn rename_file() {
        let (_temp, mut fs) = setup();

        write_file(&mut fs, "/old.txt", b"content");
        fs.rename("/old.txt", "/new.txt").unwrap();

        assert!(fs.stat("/old.txt").is_err());
        let info = fs.stat("/new.txt").unwrap();
        assert_eq!(info.size, 7);
    }

    #[test]
    fn statfs_works() {
        let (_temp, fs) = setup();

        let stats = fs.statfs("/").unwrap();
        assert!(stats.total_bytes > 0);
        assert!(stats.block_size > 0);
    }

    #[test]
    fn path_escape_blocked() {
        let (_temp, fs) = setup();

        let result = fs.stat("/../../../etc/passwd");
        assert!(matches!(result, Err(FsError::PermissionDenied(_))));
    }

    #[test]
    fn parent_segments_inside_root_are_allowed() {
        let (_temp, mut fs) = setup();
        fs.mkdir("/a").unwrap();
        write_file(&mut fs, "/f.txt", b"abc");

        assert_eq!(fs.stat("/a/../f.txt").unwrap().size, 3);
    }
}
