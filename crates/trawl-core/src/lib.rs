//! Trawl Core
//!
//! Stateful, event-driven navigation for a headless web client.
//! The `Browser` owns the session; observers attach through events.

mod browser;
mod config;
mod error;
mod phase;
mod refresh;

pub use browser::Browser;
pub use config::{default_user_agent, Attribute, Attributes, Config};
pub use error::BrowserError;
pub use phase::Phase;
pub use refresh::parse_refresh;

// Re-export the session building blocks
pub use trawl_dom::{Document, DomError, Element, Form, Image, Link, Script, Stylesheet};
pub use trawl_event::{
    Dispatcher, Event, EventArgs, Handler, HandlerError, Sender, SubmitArgs, Values,
};
pub use trawl_jar::{
    Bookmarks, History, JarError, MemoryBookmarks, MemoryHistory, MemoryRecorder, Page,
    RecordedRequest, Recorder, State,
};
pub use trawl_net::{
    HeaderMap, HttpTransport, Method, RedirectGate, Request, Response, StatusCode, Transport,
    TransportError, Url,
};

pub type Result<T> = std::result::Result<T, BrowserError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
