//! Jar error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JarError {
    #[error("Bookmark '{0}' already exists")]
    BookmarkExists(String),

    #[error("Bookmark '{0}' not found")]
    BookmarkNotFound(String),
}
