//! Storage abstraction layer for Solace.
//!
//! Artifacts are opaque byte blobs addressed by exact name. The file backend
//! maps names onto files in a directory; the memory backend is used in tests.

pub mod file;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use file::*;
pub use memory::*;
pub use traits::*;
