//! Trawl Jars
//!
//! Session state and the containers a browser keeps across navigations:
//! the history stack, named bookmarks and the request recorder. Each
//! container is a trait with an in-memory implementation; persistent
//! backends plug in behind the same traits.

mod bookmarks;
mod error;
mod history;
mod recorder;
mod state;

pub use bookmarks::{Bookmarks, MemoryBookmarks};
pub use error::JarError;
pub use history::{History, MemoryHistory};
pub use recorder::{MemoryRecorder, RecordedRequest, Recorder};
pub use state::{Page, State};

pub type Result<T> = std::result::Result<T, JarError>;
