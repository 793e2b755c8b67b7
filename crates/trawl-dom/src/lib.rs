//! Trawl Document Model
//!
//! Read-only queries over a fetched page. Query results are owned snapshots,
//! so they can outlive the parsed tree and cross threads.

mod assets;
mod document;
mod error;
mod form;

pub use assets::{Image, Link, Script, Stylesheet};
pub use document::{Document, Element};
pub use error::DomError;
pub use form::Form;

pub type Result<T> = std::result::Result<T, DomError>;
