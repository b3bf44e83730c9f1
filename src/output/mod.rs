//! Persistence of final scan responses.
//!
//! - [`FilesystemResultWriter`] - one `<name>.response.txt` file per target
//! - [`MemoryResultStore`] - in-memory store for testing

mod filesystem;
mod memory;
mod traits;

pub use filesystem::{FilesystemResultWriter, RESULT_SUFFIX};
pub use memory::MemoryResultStore;
pub use traits::{ArcResultStore, ResultStore};
