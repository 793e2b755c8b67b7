//! Trawl Networking
//!
//! The transport collaborator of the navigation engine:
//! - `Request` / `Response` describe one HTTP exchange and are cheap to clone
//!   so they can be recorded, replayed and reloaded
//! - `Transport` performs the exchange
//! - `RedirectGate` is consulted before every redirect hop

mod error;
mod message;
mod transport;

pub use error::TransportError;
pub use message::{Request, Response};
pub use transport::{HttpTransport, RedirectGate, Transport, MAX_REDIRECTS};

pub use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
pub use reqwest::{Method, StatusCode};
pub use url::Url;

pub type Result<T> = std::result::Result<T, TransportError>;
