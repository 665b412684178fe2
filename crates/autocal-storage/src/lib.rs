//! Result transcript sinks.
//!
//! - [`FileSink`] - plain-text transcript file, truncated at the start of
//!   each run and read back for the end-of-run echo
//! - [`MemorySink`] - in-memory transcript for tests and dry runs

mod file;
mod memory;

pub use file::FileSink;
pub use memory::MemorySink;
