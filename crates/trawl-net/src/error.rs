//! Transport error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Redirects are disabled, cannot follow '{location}'")]
    RedirectDisabled { location: String },

    #[error("Stopped after {0} redirects")]
    TooManyRedirects(usize),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}
