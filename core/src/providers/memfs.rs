use bytes::Bytes;
use msh_sdk::{FileInfo, FileType, Filesystem, FsError, FsResult, FsStats, Handle, OpenFlags};
use std::collections::{BTreeMap, HashMap};

const DEFAULT_CAPACITY: u64 = 2 * 1024 * 1024;
const BLOCK_SIZE: u32 = 512;

#[derive(Debug, Clone)]
enum MemEntry {
    File(Vec<u8>),
    Dir,
}

impl MemEntry {
    fn file_type(&self) -> FileType {
        match self {
            Self::File(_) => FileType::Regular,
            Self::Dir => FileType::Directory,
        }
    }
}

#[derive(Debug)]
struct OpenHandle {
    path: String,
    flags: OpenFlags,
}

/// Volatile in-memory filesystem.
///
/// Entries are keyed by normalized absolute path, so listings come back in
/// sorted order. The root directory always exists.
pub struct MemoryFs {
    entries: BTreeMap<String, MemEntry>,
    handles: HashMap<u64, OpenHandle>,
    next_handle: u64,
    directory_size: u64,
    capacity: u64,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    #[must_use]
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("/".to_string(), MemEntry::Dir);
        Self {
            entries,
            handles: HashMap::new(),
            next_handle: 1,
            directory_size: 0,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Size reported by `stat` for directories. Flash filesystems such as
    /// FAT report a non-zero entry size; the default is 0.
    #[must_use]
    pub fn with_directory_size(mut self, size: u64) -> Self {
        self.directory_size = size;
        self
    }

    /// Total bytes reported by `statfs`.
    #[must_use]
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Number of handles not yet closed.
    #[must_use]
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    fn normalize_path(path: &str) -> String {
        let path = if path.is_empty() { "/" } else { path };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        if path.len() > 1 && path.ends_with('/') {
            path.trim_end_matches('/').to_string()
        } else {
            path
        }
    }

    fn parent_path(path: &str) -> Option<String> {
        if path == "/" {
            return None;
        }
        match path.rsplit_once('/') {
            Some(("", _)) | None => Some("/".to_string()),
            Some((parent, _)) => Some(parent.to_string()),
        }
    }

    fn child_prefix(path: &str) -> String {
        if path == "/" {
            "/".to_string()
        } else {
            format!("{path}/")
        }
    }

    fn require_parent_dir(&self, path: &str) -> FsResult<()> {
        let parent = Self::parent_path(path)
            .ok_or_else(|| FsError::invalid_argument("root has no parent"))?;
        match self.entries.get(&parent) {
            Some(MemEntry::Dir) => Ok(()),
            Some(MemEntry::File(_)) => Err(FsError::not_directory(parent)),
            None => Err(FsError::not_found(parent)),
        }
    }

    fn has_children(&self, path: &str) -> bool {
        let prefix = Self::child_prefix(path);
        self.entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .any(|(key, _)| key != path)
    }

    fn used_bytes(&self) -> u64 {
        self.entries
            .values()
            .map(|entry| match entry {
                MemEntry::File(content) => content.len() as u64,
                MemEntry::Dir => 0,
            })
            .sum()
    }

    fn handle(&self, handle: &Handle) -> FsResult<&OpenHandle> {
        self.handles
            .get(&handle.id())
            .ok_or_else(|| FsError::invalid_handle(handle.id()))
    }
}

impl Filesystem for MemoryFs {
    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let path = Self::normalize_path(path);
        let entry = self
            .entries
            .get(&path)
            .ok_or_else(|| FsError::not_found(&path))?;
        let size = match entry {
            MemEntry::File(content) => content.len() as u64,
            MemEntry::Dir => self.directory_size,
        };
        Ok(FileInfo {
            path,
            size,
            file_type: entry.file_type(),
        })
    }

    fn list_dir(&self, path: &str) -> FsResult<Vec<String>> {
        let path = Self::normalize_path(path);
        match self.entries.get(&path) {
            Some(MemEntry::Dir) => {}
            Some(MemEntry::File(_)) => return Err(FsError::not_directory(&path)),
            None => return Err(FsError::not_found(&path)),
        }

        let prefix = Self::child_prefix(&path);
        Ok(self
            .entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| {
                let remainder = &key[prefix.len()..];
                (!remainder.is_empty() && !remainder.contains('/')).then(|| remainder.to_string())
            })
            .collect())
    }

    fn statfs(&self, _path: &str) -> FsResult<FsStats> {
        Ok(FsStats {
            total_bytes: self.capacity,
            free_bytes: self.capacity.saturating_sub(self.used_bytes()),
            block_size: BLOCK_SIZE,
        })
    }

    fn open(&mut self, path: &str, flags: OpenFlags) -> FsResult<Handle> {
        let path = Self::normalize_path(path);

        match self.entries.get_mut(&path) {
            Some(MemEntry::Dir) => return Err(FsError::is_directory(&path)),
            Some(MemEntry::File(content)) => {
                if flags.truncate {
                    content.clear();
                }
            }
            None if flags.create => {
                self.require_parent_dir(&path)?;
                self.entries.insert(path.clone(), MemEntry::File(Vec::new()));
            }
            None => return Err(FsError::not_found(&path)),
        }

        let handle_id = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(handle_id, OpenHandle { path, flags });
        Ok(Handle::new(handle_id))
    }

    fn read(&mut self, handle: &Handle, offset: u64, size: usize) -> FsResult<Bytes> {
        let open_handle = self.handle(handle)?;
        if !open_handle.flags.read {
            return Err(FsError::permission_denied("file not opened for reading"));
        }

        match self.entries.get(&open_handle.path) {
            Some(MemEntry::File(content)) => {
                let start = usize::try_from(offset)
                    .unwrap_or(usize::MAX)
                    .min(content.len());
                let end = start.saturating_add(size).min(content.len());
                Ok(Bytes::copy_from_slice(&content[start..end]))
            }
            Some(MemEntry::Dir) => Err(FsError::is_directory(&open_handle.path)),
            None => Err(FsError::not_found(&open_handle.path)),
        }
    }

    fn write(&mut self, handle: &Handle, offset: u64, data: &[u8]) -> FsResult<usize> {
        let open_handle = self.handle(handle)?;
        if !open_handle.flags.write {
            return Err(FsError::permission_denied("file not opened for writing"));
        }
        let append = open_handle.flags.append;
        let path = open_handle.path.clone();

        let used = self.used_bytes();
        match self.entries.get_mut(&path) {
            Some(MemEntry::File(content)) => {
                let start = if append {
                    content.len()
                } else {
                    usize::try_from(offset)
                        .map_err(|_| FsError::invalid_argument("offset out of range"))?
                };
                let end = start + data.len();
                let growth = end.saturating_sub(content.len()) as u64;
                if used + growth > self.capacity {
                    return Err(FsError::internal(format!("no space left on device: {path}")));
                }
                if content.len() < end {
                    content.resize(end, 0);
                }
                content[start..end].copy_from_slice(data);
                Ok(data.len())
            }
            Some(MemEntry::Dir) => Err(FsError::is_directory(&path)),
            None => Err(FsError::not_found(&path)),
        }
    }

    fn close(&mut self, handle: Handle) -> FsResult<()> {
        self.handles
            .remove(&handle.id())
            .map(|_| ())
            .ok_or_else(|| FsError::invalid_handle(handle.id()))
    }

    fn remove_file(&mut self, path: &str) -> FsResult<()> {
        let path = Self::normalize_path(path);
        match self.entries.get(&path) {
            Some(MemEntry::File(_)) => {
                self.entries.remove(&path);
                Ok(())
            }
            Some(MemEntry::Dir) => Err(FsError::is_directory(&path)),
            None => Err(FsError::not_found(&path)),
        }
    }

    fn remove_dir(&mut self, path: &str) -> FsResult<()> {
        let path = Self::normalize_path(path);
        if path == "/" {
            return Err(FsError::permission_denied("cannot remove root"));
        }
        match self.entries.get(&path) {
            Some(MemEntry::Dir) => {}
            Some(MemEntry::File(_)) => return Err(FsError::not_directory(&path)),
            None => return Err(FsError::not_found(&path)),
        }
        if self.has_children(&path) {
            return Err(FsError::directory_not_empty(&path));
        }
        self.entries.remove(&path);
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> FsResult<()> {
        let path = Self::normalize_path(path);
        if self.entries.contains_key(&path) {
            return Err(FsError::already_exists(&path));
        }
        self.require_parent_dir(&path)?;
        self.entries.insert(path, MemEntry::Dir);
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> FsResult<()> {
        let from = Self::normalize_path(from);
        let to = Self::normalize_path(to);

        if from == "/" {
            return Err(FsError::permission_denied("cannot rename root"));
        }
        let source_type = self
            .entries
            .get(&from)
            .map(MemEntry::file_type)
            .ok_or_else(|| FsError::not_found(&from))?;
        if from == to {
            return Ok(());
        }
        if to.starts_with(&Self::child_prefix(&from)) {
            return Err(FsError::invalid_argument(format!(
                "cannot move {from} into itself"
            )));
        }
        self.require_parent_dir(&to)?;

        match self.entries.get(&to) {
            Some(MemEntry::File(_)) if source_type == FileType::Regular => {
                self.entries.remove(&to);
            }
            Some(_) => return Err(FsError::already_exists(&to)),
            None => {}
        }

        let prefix = Self::child_prefix(&from);
        let moved: Vec<String> = self
            .entries
            .keys()
            .filter(|key| **key == from || key.starts_with(&prefix))
            .cloned()
            .collect();
        for key in moved {
            if let Some(entry) = self.entries.remove(&key) {
                let new_key = format!("{to}{}", &key[from.len()..]);
                self.entries.insert(new_key, entry);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(fs: &mut MemoryFs, path: &str, data: &[u8]) {
        let handle = fs.open(path, OpenFlags::create_truncate()).unwrap();
        fs.write(&handle, 0, data).unwrap();
        fs.close(handle).unwrap();
    }

    fn read_file(fs: &mut MemoryFs, path: &str) -> Vec<u8> {
        let handle = fs.open(path, OpenFlags::read()).unwrap();
        let data = fs.read(&handle, 0, 1024).unwrap();
        fs.close(handle).unwrap();
        data.to_vec()
    }

    #[test]
    fn create_and_read_file() {
        let mut fs = MemoryFs::new();
        write_file(&mut fs, "/test.txt", b"hello world");
        assert_eq!(read_file(&mut fs, "/test.txt"), b"hello world");
    }

    #[test]
    fn create_directory_and_list() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/mydir").unwrap();
        write_file(&mut fs, "/mydir/b.txt", b"b");
        write_file(&mut fs, "/mydir/a.txt", b"a");
        fs.mkdir("/mydir/sub").unwrap();
        write_file(&mut fs, "/mydir/sub/deep.txt", b"deep");

        let entries = fs.list_dir("/mydir").unwrap();
        assert_eq!(entries, vec!["a.txt", "b.txt", "sub"]);
        assert_eq!(fs.list_dir("/").unwrap(), vec!["mydir"]);
    }

    #[test]
    fn list_dir_on_file_is_not_directory() {
        let mut fs = MemoryFs::new();
        write_file(&mut fs, "/f", b"x");
        assert!(matches!(fs.list_dir("/f"), Err(FsError::NotDirectory(_))));
        assert!(matches!(fs.list_dir("/missing"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn stat_reports_sizes_and_kinds() {
        let mut fs = MemoryFs::new().with_directory_size(512);
        write_file(&mut fs, "/test.txt", b"hello");
        fs.mkdir("/dir").unwrap();

        let file = fs.stat("/test.txt").unwrap();
        assert_eq!(file.size, 5);
        assert_eq!(file.file_type, FileType::Regular);

        let dir = fs.stat("/dir/").unwrap();
        assert_eq!(dir.path, "/dir");
        assert_eq!(dir.size, 512);
        assert!(dir.is_dir());
    }

    #[test]
    fn create_requires_existing_parent() {
        let mut fs = MemoryFs::new();
        assert!(matches!(
            fs.open("/nope/file.txt", OpenFlags::create_truncate()),
            Err(FsError::NotFound(_))
        ));
        assert!(matches!(fs.mkdir("/a/b"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn mkdir_existing_is_already_exists() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/dir").unwrap();
        assert!(fs.mkdir("/dir").unwrap_err().is_already_exists());
    }

    #[test]
    fn truncate_on_open() {
        let mut fs = MemoryFs::new();
        write_file(&mut fs, "/test.txt", b"hello world");
        write_file(&mut fs, "/test.txt", b"bye");
        assert_eq!(read_file(&mut fs, "/test.txt"), b"bye");
    }

    #[test]
    fn append_mode() {
        let mut fs = MemoryFs::new();
        write_file(&mut fs, "/test.txt", b"hello");

        let handle = fs.open("/test.txt", OpenFlags::append()).unwrap();
        fs.write(&handle, 0, b" world").unwrap();
        fs.close(handle).unwrap();

        assert_eq!(read_file(&mut fs, "/test.txt"), b"hello world");
    }

    #[test]
    fn read_past_end_is_empty() {
        let mut fs = MemoryFs::new();
        write_file(&mut fs, "/test.txt", b"abc");
        let handle = fs.open("/test.txt", OpenFlags::read()).unwrap();
        assert!(fs.read(&handle, 10, 512).unwrap().is_empty());
        fs.close(handle).unwrap();
    }

    #[test]
    fn closed_handle_is_invalid() {
        let mut fs = MemoryFs::new();
        write_file(&mut fs, "/test.txt", b"abc");
        let handle = fs.open("/test.txt", OpenFlags::read()).unwrap();
        fs.close(handle).unwrap();
        assert!(matches!(
            fs.read(&handle, 0, 1),
            Err(FsError::InvalidHandle(_))
        ));
    }

    #[test]
    fn remove_empty_directory() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/mydir").unwrap();
        fs.remove_dir("/mydir").unwrap();
        assert!(fs.stat("/mydir").is_err());
    }

    #[test]
    fn cannot_remove_non_empty_directory() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/mydir").unwrap();
        write_file(&mut fs, "/mydir/file.txt", b"");

        let result = fs.remove_dir("/mydir");
        assert!(matches!(result, Err(FsError::DirectoryNotEmpty(_))));
    }

    #[test]
    fn remove_file_rejects_directories() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/mydir").unwrap();
        assert!(matches!(
            fs.remove_file("/mydir"),
            Err(FsError::IsDirectory(_))
        ));
        assert!(matches!(
            fs.remove_dir("/"),
            Err(FsError::PermissionDenied(_))
        ));
    }

    #[test]
    fn rename_moves_subtree() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/src").unwrap();
        fs.mkdir("/src/inner").unwrap();
        write_file(&mut fs, "/src/inner/f.txt", b"content");
        fs.mkdir("/dst").unwrap();

        fs.rename("/src", "/dst/moved").unwrap();

        assert!(fs.stat("/src").is_err());
        assert!(fs.stat("/dst/moved/inner").unwrap().is_dir());
        assert_eq!(read_file(&mut fs, "/dst/moved/inner/f.txt"), b"content");
    }

    #[test]
    fn rename_into_own_subtree_is_rejected() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/a").unwrap();
        fs.mkdir("/a/b").unwrap();
        assert!(matches!(
            fs.rename("/a", "/a/b/c"),
            Err(FsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rename_replaces_existing_file() {
        let mut fs = MemoryFs::new();
        write_file(&mut fs, "/old.txt", b"new content");
        write_file(&mut fs, "/target.txt", b"stale");
        fs.mkdir("/dir").unwrap();

        fs.rename("/old.txt", "/target.txt").unwrap();
        assert_eq!(read_file(&mut fs, "/target.txt"), b"new content");

        write_file(&mut fs, "/other.txt", b"x");
        assert!(fs.rename("/other.txt", "/dir").unwrap_err().is_already_exists());
    }

    #[test]
    fn statfs_reports_usage() {
        let mut fs = MemoryFs::new().with_capacity(1000);
        write_file(&mut fs, "/f", &[0u8; 100]);

        let stats = fs.statfs("/").unwrap();
        assert_eq!(stats.total_bytes, 1000);
        assert_eq!(stats.free_bytes, 900);
        assert_eq!(stats.used_bytes(), 100);
    }

    #[test]
    fn write_beyond_capacity_fails() {
        let mut fs = MemoryFs::new().with_capacity(10);
        let handle = fs.open("/f", OpenFlags::create_truncate()).unwrap();
        assert!(matches!(
            fs.write(&handle, 0, &[0u8; 11]),
            Err(FsError::Internal(_))
        ));
        fs.close(handle).unwrap();
    }
}
