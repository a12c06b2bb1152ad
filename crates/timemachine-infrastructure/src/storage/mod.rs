//! Key-value storage backends and atomic file writes.

mod atomic_file;
mod file_store;
mod memory_store;

pub use atomic_file::AtomicFile;
pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;
