//! Session state

use std::sync::Arc;

use trawl_dom::Document;
use trawl_net::{Request, Response};
use url::Url;

/// The outcome of one successful navigation.
///
/// Built once when the exchange completes and never edited afterwards; the
/// next navigation replaces it.
#[derive(Debug)]
pub struct State {
    request: Request,
    response: Response,
    document: Document,
}

impl State {
    pub fn new(request: Request, response: Response, document: Document) -> Self {
        Self {
            request,
            response,
            document,
        }
    }

    /// The request as it was sent, after handlers rewrote it.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Final URL of the page, after redirects.
    pub fn url(&self) -> &Url {
        &self.response.url
    }
}

/// What the browser is showing.
#[derive(Debug, Clone, Default)]
pub enum Page {
    /// Nothing has loaded yet. Sits at the bottom of every history.
    #[default]
    Blank,
    Loaded(Arc<State>),
}

impl Page {
    pub fn loaded(state: State) -> Self {
        Page::Loaded(Arc::new(state))
    }

    pub fn state(&self) -> Option<&Arc<State>> {
        match self {
            Page::Blank => None,
            Page::Loaded(state) => Some(state),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Page::Blank)
    }

    pub fn url(&self) -> Option<&Url> {
        self.state().map(|s| s.url())
    }
}
