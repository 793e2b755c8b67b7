//! Browser error types

use thiserror::Error;
use trawl_dom::DomError;
use trawl_event::{Event, HandlerError};
use trawl_jar::JarError;
use trawl_net::TransportError;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Transport failure: {0}")]
    TransportFailure(#[source] TransportError),

    #[error("Redirects are disabled, cannot follow '{location}'")]
    RedirectDisabled { location: String },

    #[error("No page loaded")]
    PageNotLoaded,

    #[error("Element not found matching expr '{0}'")]
    ElementNotFound(String),

    #[error("Element matching '{expr}' has no '{attribute}' attribute")]
    AttributeNotFound { expr: String, attribute: String },

    #[error("Request vetoed: {0}")]
    PreRequestVetoed(#[source] HandlerError),

    #[error("Handler for '{event}' failed: {source}")]
    HandlerFailure {
        event: Event,
        #[source]
        source: HandlerError,
    },

    #[error("Invalid selector '{expr}': {reason}")]
    InvalidSelector { expr: String, reason: String },

    #[error("Document error: {0}")]
    Document(DomError),

    #[error("Jar error: {0}")]
    Jar(#[from] JarError),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl BrowserError {
    pub(crate) fn invalid_url(url: &str, source: url::ParseError) -> Self {
        BrowserError::InvalidUrl {
            url: url.to_string(),
            source,
        }
    }
}

impl From<TransportError> for BrowserError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::RedirectDisabled { location } => {
                BrowserError::RedirectDisabled { location }
            }
            TransportError::InvalidHeader(msg) => BrowserError::InvalidHeader(msg),
            other => BrowserError::TransportFailure(other),
        }
    }
}

impl From<DomError> for BrowserError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::InvalidSelector { expr, reason } => {
                BrowserError::InvalidSelector { expr, reason }
            }
            DomError::ElementNotFound(expr) => BrowserError::ElementNotFound(expr),
            other => BrowserError::Document(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_refusal_keeps_its_kind() {
        let err: BrowserError = TransportError::RedirectDisabled {
            location: "http://example.com/next".into(),
        }
        .into();
        assert!(matches!(err, BrowserError::RedirectDisabled { ref location } if location == "http://example.com/next"));

        let err: BrowserError = TransportError::TooManyRedirects(10).into();
        assert!(matches!(err, BrowserError::TransportFailure(_)));
    }

    #[test]
    fn test_dom_errors_map_to_browser_kinds() {
        let err: BrowserError = DomError::ElementNotFound("#x".into()).into();
        assert!(matches!(err, BrowserError::ElementNotFound(ref e) if e == "#x"));

        let err: BrowserError = DomError::FieldNotFound("q".into()).into();
        assert!(matches!(err, BrowserError::Document(_)));
    }
}
