//! Storage layer: whole-page file I/O.
//!
//! The paged file is the only component that touches the filesystem.
//! Every operation is a complete 4096-byte page read, write, or append;
//! no partial-page state is ever observable between operations.

mod paged_file;

pub use paged_file::{IoStats, PagedFile, PagedFileImpl};
