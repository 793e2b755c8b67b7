//! Transport contract and the default reqwest-backed implementation.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::redirect::{Attempt, Policy};
use reqwest::Client;
use url::Url;

use crate::error::TransportError;
use crate::message::{Request, Response};
use crate::Result;

/// Upper bound on redirect hops for a single exchange.
pub const MAX_REDIRECTS: usize = 10;

/// Decides, per redirect hop, whether the transport may follow it.
///
/// The predicate is evaluated at the moment a hop is about to be followed,
/// so a gate backed by live settings sees changes made mid-exchange.
#[derive(Clone)]
pub struct RedirectGate(Arc<dyn Fn() -> bool + Send + Sync>);

impl RedirectGate {
    pub fn new(allow: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(allow))
    }

    pub fn always() -> Self {
        Self::new(|| true)
    }

    pub fn never() -> Self {
        Self::new(|| false)
    }

    pub fn allows(&self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for RedirectGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RedirectGate").finish()
    }
}

/// Performs one HTTP exchange on behalf of the browser.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and read the full response.
    ///
    /// Implementations must call `redirects.allows()` before following each
    /// redirect and fail with `TransportError::RedirectDisabled` when it
    /// returns false.
    async fn exchange(&self, request: &Request, redirects: RedirectGate) -> Result<Response>;

    /// Cookie header value the transport would send to `url`.
    fn site_cookies(&self, _url: &Url) -> Option<String> {
        None
    }
}

// Marker errors carried through reqwest's redirect policy so they can be
// recovered from the error source chain.
#[derive(Debug)]
struct RedirectRefused {
    location: String,
}

impl fmt::Display for RedirectRefused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "redirect to {} refused", self.location)
    }
}

impl StdError for RedirectRefused {}

#[derive(Debug)]
struct TooManyHops(usize);

impl fmt::Display for TooManyHops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exceeded {} redirects", self.0)
    }
}

impl StdError for TooManyHops {}

/// HTTP transport backed by `reqwest`, with a cookie store shared across
/// every exchange made through it.
pub struct HttpTransport {
    cookies: Arc<Jar>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            cookies: Arc::new(Jar::default()),
            timeout,
        }
    }

    // A client is built per exchange so the redirect policy can capture the
    // gate for this exchange; the cookie store outlives it.
    fn build_client(&self, redirects: RedirectGate) -> Result<Client> {
        let policy = Policy::custom(move |attempt: Attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                return attempt.error(TooManyHops(MAX_REDIRECTS));
            }
            if redirects.allows() {
                tracing::debug!(location = %attempt.url(), "Following redirect");
                attempt.follow()
            } else {
                let location = attempt.url().to_string();
                attempt.error(RedirectRefused { location })
            }
        });

        Ok(Client::builder()
            .redirect(policy)
            .cookie_provider(Arc::clone(&self.cookies))
            .timeout(self.timeout)
            .build()?)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(&self, request: &Request, redirects: RedirectGate) -> Result<Response> {
        let client = self.build_client(redirects)?;

        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let resp = builder.send().await.map_err(classify)?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let url = resp.url().clone();
        let body = resp.bytes().await?.to_vec();

        tracing::debug!(
            status = status.as_u16(),
            url = %url,
            bytes = body.len(),
            "Exchange complete"
        );

        Ok(Response {
            status,
            headers,
            url,
            body,
        })
    }

    fn site_cookies(&self, url: &Url) -> Option<String> {
        self.cookies
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }
}

/// Recover redirect refusals from reqwest's error chain.
fn classify(error: reqwest::Error) -> TransportError {
    if error.is_redirect() {
        let mut source = StdError::source(&error);
        while let Some(cause) = source {
            if let Some(refused) = cause.downcast_ref::<RedirectRefused>() {
                return TransportError::RedirectDisabled {
                    location: refused.location.clone(),
                };
            }
            if let Some(hops) = cause.downcast_ref::<TooManyHops>() {
                return TransportError::TooManyRedirects(hops.0);
            }
            source = cause.source();
        }
    }
    TransportError::Network(error)
}
