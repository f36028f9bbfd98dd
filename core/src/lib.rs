#![allow(missing_docs)]

pub mod ops;
pub mod providers;

pub use msh_sdk;
pub use ops::{
    copy_file, copy_recursive, disk_usage, move_entry, read_to_string, remove_recursive,
    resolve_destination, write_file_atomic, CopySummary, LineReader, COPY_CHUNK_SIZE,
};
pub use providers::{LocalFs, MemoryFs};
