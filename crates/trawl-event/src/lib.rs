//! Trawl Events
//!
//! Publish/subscribe core that decouples the navigation pipeline from policy.
//! Handlers are bound per event, run in registration order, and the first
//! handler to fail stops the dispatch and hands its error to the emitter.

mod args;
mod dispatcher;
mod error;
mod event;

pub use args::{EventArgs, SubmitArgs, Values};
pub use dispatcher::{Dispatcher, Handler};
pub use error::HandlerError;
pub use event::{Event, Sender};

pub type Result<T> = std::result::Result<T, HandlerError>;
