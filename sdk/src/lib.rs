//! msh SDK
//!
//! Capability contracts consumed by the msh interpreter. The interpreter only
//! ever talks to a [`Filesystem`] and a [`Console`]; everything device-specific
//! (flash storage, UART, line editing) lives behind these traits.

mod console;
mod error;
mod provider;
mod types;

pub use console::{Console, ReadLine};
pub use error::{FsError, FsResult};
pub use provider::Filesystem;
pub use types::{FileInfo, FileType, FsStats, Handle, OpenFlags};
