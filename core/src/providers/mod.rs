pub mod localfs;
pub mod memfs;

pub use localfs::LocalFs;
pub use memfs::MemoryFs;
