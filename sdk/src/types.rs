#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Regular,
    Directory,
}

/// Result of a `stat`. Never cached: the filesystem is the only source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
    pub file_type: FileType,
}

impl FileInfo {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.file_type == FileType::Regular
    }

    /// Last path segment, or the path itself for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((_, name)) if !name.is_empty() => name,
            _ => &self.path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FsStats {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub block_size: u32,
}

impl FsStats {
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.free_bytes)
    }

    /// Integer percentage, matching what small targets can compute cheaply.
    #[must_use]
    pub fn usage_percent(&self) -> u64 {
        if self.total_bytes == 0 {
            return 0;
        }
        self.used_bytes() * 100 / self.total_bytes
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub truncate: bool,
    pub append: bool,
}

impl OpenFlags {
    #[must_use]
    pub fn read() -> Self {
        Self {
            read: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn append() -> Self {
        Self {
            write: true,
            create: true,
            append: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn create_truncate() -> Self {
        Self {
            write: true,
            create: true,
            truncate: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u64);

impl Handle {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Handle {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_info_type_checks() {
        let dir = FileInfo {
            path: "/data".into(),
            size: 0,
            file_type: FileType::Directory,
        };
        assert!(dir.is_dir());
        assert!(!dir.is_regular());

        let file = FileInfo {
            path: "/data/log.txt".into(),
            size: 1024,
            file_type: FileType::Regular,
        };
        assert!(file.is_regular());
        assert!(!file.is_dir());
    }

    #[test]
    fn file_info_name() {
        let info = FileInfo {
            path: "/data/log.txt".into(),
            size: 3,
            file_type: FileType::Regular,
        };
        assert_eq!(info.name(), "log.txt");

        let root = FileInfo {
            path: "/".into(),
            size: 0,
            file_type: FileType::Directory,
        };
        assert_eq!(root.name(), "/");
    }

    #[test]
    fn open_flags_constructors() {
        let read = OpenFlags::read();
        assert!(read.read && !read.write && !read.create);

        let write = OpenFlags::create_truncate();
        assert!(write.write && write.create && write.truncate && !write.append);

        let append = OpenFlags::append();
        assert!(append.write && append.create && append.append && !append.truncate);
    }

    #[test]
    fn fs_stats_usage() {
        let stats = FsStats {
            total_bytes: 1000,
            free_bytes: 250,
            block_size: 512,
        };
        assert_eq!(stats.used_bytes(), 750);
        assert_eq!(stats.usage_percent(), 75);

        let empty = FsStats {
            total_bytes: 0,
            free_bytes: 0,
            block_size: 512,
        };
        assert_eq!(empty.usage_percent(), 0);
    }
}
