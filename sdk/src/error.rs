use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not a directory: {0}")]
    NotDirectory(String),

    #[error("is a directory: {0}")]
    IsDirectory(String),

    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("invalid handle: {0}")]
    InvalidHandle(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FsError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    #[must_use]
    pub fn is_directory_not_empty(&self) -> bool {
        matches!(self, Self::DirectoryNotEmpty(_))
    }

    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    #[must_use]
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied(reason.into())
    }

    #[must_use]
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    #[must_use]
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    #[must_use]
    pub fn not_directory(path: impl Into<String>) -> Self {
        Self::NotDirectory(path.into())
    }

    #[must_use]
    pub fn is_directory(path: impl Into<String>) -> Self {
        Self::IsDirectory(path.into())
    }

    #[must_use]
    pub fn directory_not_empty(path: impl Into<String>) -> Self {
        Self::DirectoryNotEmpty(path.into())
    }

    #[must_use]
    pub fn invalid_handle(id: u64) -> Self {
        Self::InvalidHandle(id)
    }

    #[must_use]
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }
}

pub type FsResult<T> = Result<T, FsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_predicates() {
        assert!(FsError::not_found("/path").is_not_found());
        assert!(!FsError::already_exists("/path").is_not_found());

        assert!(FsError::already_exists("/path").is_already_exists());
        assert!(!FsError::not_found("/path").is_already_exists());

        assert!(FsError::directory_not_empty("/dir").is_directory_not_empty());
        assert!(!FsError::is_directory("/dir").is_directory_not_empty());
    }

    #[test]
    fn error_display() {
        let err = FsError::not_found("/test/file.txt");
        assert_eq!(err.to_string(), "not found: /test/file.txt");

        let err = FsError::directory_not_empty("/data");
        assert_eq!(err.to_string(), "directory not empty: /data");

        let err = FsError::invalid_handle(7);
        assert_eq!(err.to_string(), "invalid handle: 7");
    }
}
