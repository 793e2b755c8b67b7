//! Scripted in-process transport shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use trawl_core::{Browser, Config, RedirectGate, Request, Response, StatusCode, Transport, Url};
use trawl_net::{TransportError, MAX_REDIRECTS};

#[derive(Debug, Clone)]
enum Route {
    Page { status: StatusCode, body: String },
    Redirect(String),
    Unreachable,
}

#[derive(Default)]
struct Script {
    routes: HashMap<String, Route>,
    sent: Vec<Request>,
}

/// Answers requests from a table of canned pages and redirects, and keeps
/// every request it was handed.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, body: &str) -> &Self {
        self.script.lock().routes.insert(
            url.to_string(),
            Route::Page {
                status: StatusCode::OK,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn redirect(&self, from: &str, to: &str) -> &Self {
        self.script
            .lock()
            .routes
            .insert(from.to_string(), Route::Redirect(to.to_string()));
        self
    }

    /// Every exchange for `url` fails before a response arrives.
    pub fn unreachable(&self, url: &str) -> &Self {
        self.script
            .lock()
            .routes
            .insert(url.to_string(), Route::Unreachable);
        self
    }

    pub fn sent(&self) -> Vec<Request> {
        self.script.lock().sent.clone()
    }

    pub fn sent_urls(&self) -> Vec<String> {
        self.script
            .lock()
            .sent
            .iter()
            .map(|r| r.url.to_string())
            .collect()
    }

    pub fn last(&self) -> Request {
        self.script
            .lock()
            .sent
            .last()
            .cloned()
            .expect("no request was sent")
    }

    fn route(&self, url: &Url) -> Option<Route> {
        let mut key = url.clone();
        key.set_fragment(None);
        self.script.lock().routes.get(key.as_str()).cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn exchange(
        &self,
        request: &Request,
        redirects: RedirectGate,
    ) -> trawl_net::Result<Response> {
        self.script.lock().sent.push(request.clone());

        let mut url = request.url.clone();
        let mut hops = 0;
        loop {
            match self.route(&url) {
                Some(Route::Page { status, body }) => return Ok(Response::new(status, url, body)),
                Some(Route::Redirect(location)) => {
                    if !redirects.allows() {
                        return Err(TransportError::RedirectDisabled { location });
                    }
                    hops += 1;
                    if hops > MAX_REDIRECTS {
                        return Err(TransportError::TooManyRedirects(MAX_REDIRECTS));
                    }
                    url = url.join(&location).expect("bad redirect target");
                }
                Some(Route::Unreachable) => {
                    let err = reqwest::Client::new()
                        .get("http://")
                        .build()
                        .expect_err("an empty host never builds");
                    return Err(TransportError::Network(err));
                }
                None => {
                    return Ok(Response::new(
                        StatusCode::NOT_FOUND,
                        url,
                        "<html><head><title>Not Found</title></head></html>",
                    ))
                }
            }
        }
    }
}

pub fn html(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

pub fn browser(transport: &ScriptedTransport) -> Browser {
    let config = Config {
        user_agent: "trawl-test/1.0".to_string(),
        ..Config::default()
    };
    Browser::with_transport(config, transport.clone())
}
