//! Navigation pipeline
//!
//! A `Browser` is one browsing session: the current page, its history, the
//! policy applied to outgoing requests, and the dispatcher observers hook
//! into. Every navigation runs the same pipeline:
//!
//! build request -> `PreRequest` -> transport -> commit page and history ->
//! `PostRequest` -> meta refresh.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::RwLock;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;

use trawl_dom::{Element, Form, Image, Link, Script, Stylesheet};
use trawl_event::{Dispatcher, Event, EventArgs, Sender, SubmitArgs, Values};
use trawl_jar::{
    Bookmarks, History, MemoryBookmarks, MemoryHistory, MemoryRecorder, Page, RecordedRequest,
    Recorder, State,
};
use trawl_net::header::{AUTHORIZATION, CONTENT_TYPE, REFERER, USER_AGENT};
use trawl_net::{
    HeaderMap, HeaderName, HeaderValue, HttpTransport, Method, RedirectGate, Request,
    StatusCode, Transport,
};
use url::Url;

use crate::config::{Attribute, Attributes, Config};
use crate::error::BrowserError;
use crate::phase::Phase;
use crate::refresh::{parse_refresh, RefreshTimer, Ticket};
use crate::Result;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

/// Body and content type of an outgoing POST.
struct Payload {
    body: Vec<u8>,
    content_type: String,
}

/// A headless browsing session.
///
/// Cloning is cheap and every clone drives the same session. Navigations
/// are serialized: a second call waits until the first has committed or
/// failed. Dropping the last clone cancels a pending meta refresh.
#[derive(Clone)]
pub struct Browser {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    page: RwLock<Page>,
    history: RwLock<Box<dyn History>>,
    bookmarks: RwLock<Box<dyn Bookmarks>>,
    recorder: Arc<RwLock<Box<dyn Recorder>>>,
    headers: RwLock<HeaderMap>,
    user_agent: RwLock<String>,
    attributes: Arc<RwLock<Attributes>>,
    credentials: RwLock<Option<Credentials>>,
    phase: RwLock<Phase>,
    /// Held for the whole of a navigation
    gate: Mutex<()>,
    refresh: RefreshTimer,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.refresh.cancel() {
            tracing::debug!("Session dropped with a pending meta refresh");
        }
    }
}

impl Browser {
    /// Browser backed by the reqwest transport.
    pub fn new(config: Config) -> Self {
        let transport = HttpTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }

    /// Browser backed by a caller-supplied transport.
    pub fn with_transport(config: Config, transport: impl Transport + 'static) -> Self {
        let history: Box<dyn History> = match config.history_limit {
            Some(limit) => Box::new(MemoryHistory::with_limit(limit)),
            None => Box::new(MemoryHistory::new()),
        };
        let recorder: Box<dyn Recorder> = match config.recorder_capacity {
            Some(capacity) => Box::new(MemoryRecorder::with_capacity(capacity)),
            None => Box::new(MemoryRecorder::new()),
        };

        let recorder = Arc::new(RwLock::new(recorder));
        let dispatcher = Dispatcher::new();

        // Whatever recorder is installed sees every completed request.
        let sink = Arc::clone(&recorder);
        dispatcher.bind(Event::PostRequest, move |_, _, args| {
            if let Some(request) = args.request() {
                sink.write().record(request);
            }
            Ok(())
        });

        let browser = Self {
            inner: Arc::new(Inner {
                transport: Arc::new(transport),
                dispatcher,
                page: RwLock::new(Page::Blank),
                history: RwLock::new(history),
                bookmarks: RwLock::new(Box::new(MemoryBookmarks::new())),
                recorder,
                headers: RwLock::new(HeaderMap::new()),
                user_agent: RwLock::new(config.user_agent),
                attributes: Arc::new(RwLock::new(config.attributes)),
                credentials: RwLock::new(None),
                phase: RwLock::new(Phase::Idle),
                gate: Mutex::new(()),
                refresh: RefreshTimer::new(),
            }),
        };

        tracing::info!("Browser initialized");
        browser
    }

    // === Navigation ===

    /// GET `url`.
    pub async fn open(&self, url: &str) -> Result<()> {
        let url = parse_url(url)?;
        self.fetch(Method::GET, url, None, None).await
    }

    /// GET `url` with its query replaced by `values`.
    pub async fn open_form(&self, url: &str, values: &Values) -> Result<()> {
        let mut url = parse_url(url)?;
        set_query(&mut url, values);
        self.fetch(Method::GET, url, None, None).await
    }

    /// GET the URL saved under `name`.
    pub async fn open_bookmark(&self, name: &str) -> Result<()> {
        let url = self.inner.bookmarks.read().read(name)?;
        self.fetch(Method::GET, url, None, None).await
    }

    /// POST `body` to `url`.
    pub async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let url = parse_url(url)?;
        let payload = Payload {
            body: body.into(),
            content_type: content_type.to_string(),
        };
        self.fetch(Method::POST, url, None, Some(payload)).await
    }

    /// POST `values` form-encoded to `url`.
    pub async fn post_form(&self, url: &str, values: &Values) -> Result<()> {
        self.post(url, FORM_URLENCODED, values.encode()).await
    }

    /// Follow the link matched by `expr`.
    ///
    /// The first match must be an `<a>` with an `href`.
    pub async fn click(&self, expr: &str) -> Result<()> {
        let state = self.state()?;
        let element = state
            .document()
            .select_first(expr)?
            .filter(|el| el.is("a"))
            .ok_or_else(|| BrowserError::ElementNotFound(expr.to_string()))?;
        let href = element
            .attr("href")
            .ok_or_else(|| BrowserError::AttributeNotFound {
                expr: expr.to_string(),
                attribute: "href".to_string(),
            })?;
        let target = resolve(state.url(), href)?;

        // Observers may not stop a click.
        if let Err(err) =
            self.inner.dispatcher
                .dispatch(Event::Click, Sender::Browser, &mut EventArgs::Url(&target))
        {
            tracing::warn!(url = %target, error = %err, "Click handler failed");
        }

        let referer = state.url().clone();
        self.fetch(Method::GET, target, Some(referer), None).await
    }

    /// Submit `form` from the current page.
    ///
    /// `Submit` handlers see the values, method and action before anything is
    /// sent and may edit them or veto the submission.
    pub async fn submit(&self, form: &Form) -> Result<()> {
        let state = self.state()?;
        let action = if form.action().is_empty() {
            state.url().clone()
        } else {
            resolve(state.url(), form.action())?
        };

        let mut args = SubmitArgs {
            values: form.values().clone(),
            method: form.method().clone(),
            action,
        };
        self.inner.dispatcher
            .dispatch(Event::Submit, Sender::Form, &mut EventArgs::Submit(&mut args))
            .map_err(|source| {
                let err = BrowserError::HandlerFailure {
                    event: Event::Submit,
                    source,
                };
                tracing::error!(error = %err, "Form submission stopped");
                err
            })?;

        tracing::info!(method = %args.method, action = %args.action, fields = args.values.len(), "Submitting form");

        let referer = state.url().clone();
        if args.method == Method::POST {
            let payload = Payload {
                body: args.values.encode().into_bytes(),
                content_type: FORM_URLENCODED.to_string(),
            };
            self.fetch(Method::POST, args.action, Some(referer), Some(payload))
                .await
        } else {
            let mut url = args.action;
            set_query(&mut url, &args.values);
            self.fetch(Method::GET, url, Some(referer), None).await
        }
    }

    /// Re-issue the request that produced the current page.
    pub async fn reload(&self) -> Result<()> {
        let _gate = self.inner.gate.lock().await;
        self.reload_locked().await
    }

    /// Make the previous page current again, without any exchange.
    ///
    /// Waits for an in-flight navigation to finish first. Returns false when
    /// there is nothing to go back to.
    pub async fn back(&self) -> bool {
        let _gate = self.inner.gate.lock().await;
        self.inner.refresh.cancel();

        let mut page = self.inner.page.write();
        let popped = self.inner.history.write().pop();
        match popped {
            Some(previous) => {
                tracing::debug!(url = ?previous.url().map(Url::as_str), "Went back");
                *page = previous;
                true
            }
            None => false,
        }
    }

    // === Recording ===

    pub fn start_recording(&self) -> Result<()> {
        self.inner.recorder.write().start();
        tracing::info!("Recording started");
        self.emit_recorder_event(Event::RecordStart)
    }

    pub fn stop_recording(&self) -> Result<()> {
        self.inner.recorder.write().stop();
        tracing::info!("Recording stopped");
        self.emit_recorder_event(Event::RecordStop)
    }

    pub fn is_recording(&self) -> bool {
        self.inner.recorder.read().is_recording()
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.inner.recorder.read().entries()
    }

    /// Re-issue every recorded request, in order, through the full pipeline.
    ///
    /// `RecordReplay` handlers see each request first and may rewrite or
    /// veto it. Stops at the first failure; earlier replays stay applied.
    pub async fn replay(&self) -> Result<()> {
        let entries = self.inner.recorder.read().entries();
        tracing::info!(requests = entries.len(), "Replaying recording");

        for entry in entries {
            let _gate = self.inner.gate.lock().await;
            self.transition(Phase::Building);

            let mut request = entry.request;
            let replayed = self.inner.dispatcher.dispatch(
                Event::RecordReplay,
                Sender::Recorder,
                &mut EventArgs::Request(&mut request),
            );
            if let Err(source) = replayed {
                self.transition(Phase::Failed);
                self.transition(Phase::Idle);
                let err = BrowserError::HandlerFailure {
                    event: Event::RecordReplay,
                    source,
                };
                tracing::error!(sequence = entry.sequence, error = %err, "Replay stopped");
                return Err(err);
            }

            tracing::debug!(sequence = entry.sequence, method = %request.method, url = %request.url, "Replaying request");
            self.send(request).await?;
        }
        Ok(())
    }

    fn emit_recorder_event(&self, event: Event) -> Result<()> {
        self.inner.dispatcher
            .dispatch(event, Sender::Recorder, &mut EventArgs::None)
            .map_err(|source| BrowserError::HandlerFailure { event, source })
    }

    // === Pipeline ===

    async fn fetch(
        &self,
        method: Method,
        url: Url,
        referer: Option<Url>,
        payload: Option<Payload>,
    ) -> Result<()> {
        let _gate = self.inner.gate.lock().await;
        self.transition(Phase::Building);

        let request = match self.build_request(method, url, referer.as_ref(), payload) {
            Ok(request) => request,
            Err(err) => {
                self.transition(Phase::Failed);
                self.transition(Phase::Idle);
                tracing::error!(error = %err, "Could not build request");
                return Err(err);
            }
        };
        self.send(request).await
    }

    async fn reload_locked(&self) -> Result<()> {
        let request = match &*self.inner.page.read() {
            Page::Loaded(state) => state.request().clone(),
            Page::Blank => {
                tracing::error!("Cannot reload, no page loaded");
                return Err(BrowserError::PageNotLoaded);
            }
        };

        tracing::debug!(url = %request.url, "Reloading page");
        self.transition(Phase::Building);
        self.send(request).await
    }

    fn build_request(
        &self,
        method: Method,
        url: Url,
        referer: Option<&Url>,
        payload: Option<Payload>,
    ) -> Result<Request> {
        let mut request = Request::new(method, url);
        request.headers = self.inner.headers.read().clone();

        let user_agent = self.inner.user_agent.read().clone();
        tracing::debug!(user_agent = %user_agent, "Setting User-Agent header");
        request.headers.insert(USER_AGENT, header_value(&user_agent)?);

        if self.inner.attributes.read().send_referer {
            if let Some(referer) = referer {
                tracing::debug!(referer = %referer, "Setting Referer header");
                request.headers.insert(REFERER, header_value(referer.as_str())?);
            }
        }

        if let Some(credentials) = self.inner.credentials.read().as_ref() {
            let token = STANDARD.encode(format!("{}:{}", credentials.username, credentials.password));
            tracing::debug!(username = %credentials.username, "Setting Authorization header");
            request
                .headers
                .insert(AUTHORIZATION, header_value(&format!("Basic {}", token))?);
        }

        if let Some(payload) = payload {
            request
                .headers
                .insert(CONTENT_TYPE, header_value(&payload.content_type)?);
            request.body = Some(payload.body);
        }

        Ok(request)
    }

    /// Run a built request through the pipeline. The gate must be held.
    async fn send(&self, request: Request) -> Result<()> {
        let result = self.exchange(request).await;
        self.transition(Phase::Idle);
        result
    }

    async fn exchange(&self, mut request: Request) -> Result<()> {
        if let Err(source) = self.inner.dispatcher.dispatch(
            Event::PreRequest,
            Sender::Browser,
            &mut EventArgs::Request(&mut request),
        ) {
            self.transition(Phase::Failed);
            tracing::error!(url = %request.url, error = %source, "Request vetoed");
            return Err(BrowserError::PreRequestVetoed(source));
        }

        self.inner.refresh.cancel();
        self.transition(Phase::AwaitingExchange);

        let attributes = Arc::clone(&self.inner.attributes);
        let redirects = RedirectGate::new(move || attributes.read().follow_redirects);

        tracing::info!(method = %request.method, url = %request.url, "Sending request");
        let response = match self.inner.transport.exchange(&request, redirects).await {
            Ok(response) => response,
            Err(err) => {
                self.transition(Phase::Failed);
                let err = BrowserError::from(err);
                tracing::error!(url = %request.url, error = %err, "Request failed");
                return Err(err);
            }
        };
        tracing::info!(status = response.status.as_u16(), url = %response.url, "Received response");

        let document = trawl_dom::Document::parse(&response);
        let state = Arc::new(State::new(request, response, document));
        {
            let mut page = self.inner.page.write();
            let previous = std::mem::replace(&mut *page, Page::Loaded(Arc::clone(&state)));
            self.inner.history.write().push(previous);
        }
        self.transition(Phase::Committed);

        let notified = self
            .inner
            .dispatcher
            .dispatch(
                Event::PostRequest,
                Sender::Browser,
                &mut EventArgs::Exchange {
                    request: state.request(),
                    response: state.response(),
                },
            )
            .map_err(|source| BrowserError::HandlerFailure {
                event: Event::PostRequest,
                source,
            });
        if let Err(err) = &notified {
            tracing::error!(url = %state.url(), error = %err, "Post-request handler failed");
        }

        self.schedule_refresh(&state);
        notified
    }

    fn schedule_refresh(&self, state: &State) {
        if !self.inner.attributes.read().handle_meta_refresh {
            return;
        }
        let Some(content) = state.document().meta_refresh() else {
            return;
        };
        let Some(delay) = parse_refresh(&content) else {
            tracing::debug!(content = %content, "Ignoring unparsable meta refresh");
            return;
        };

        // The timer must not keep the session alive on its own.
        let session = Arc::downgrade(&self.inner);
        self.inner.refresh.arm(delay, move |ticket| {
            Box::pin(async move {
                if let Some(inner) = session.upgrade() {
                    Browser { inner }.refresh_expired(ticket).await;
                }
            })
        });
    }

    async fn refresh_expired(&self, ticket: Ticket) {
        let _gate = self.inner.gate.lock().await;
        // A navigation that got the gate first has already replaced this timer.
        if !self.inner.refresh.disarm(&ticket) {
            return;
        }
        if let Err(err) = self.reload_locked().await {
            tracing::error!(error = %err, "Meta refresh reload failed");
        }
    }

    fn transition(&self, to: Phase) {
        let mut phase = self.inner.phase.write();
        if !phase.can_transition_to(to) {
            tracing::warn!(from = %*phase, to = %to, "Unexpected pipeline transition");
        }
        *phase = to;
    }

    // === Current page ===

    /// The current page, or `PageNotLoaded` before the first navigation.
    pub fn state(&self) -> Result<Arc<State>> {
        self.inner.page
            .read()
            .state()
            .cloned()
            .ok_or(BrowserError::PageNotLoaded)
    }

    pub fn phase(&self) -> Phase {
        *self.inner.phase.read()
    }

    /// Final URL of the current page.
    pub fn url(&self) -> Result<Url> {
        Ok(self.state()?.url().clone())
    }

    pub fn status_code(&self) -> Result<StatusCode> {
        Ok(self.state()?.response().status)
    }

    pub fn title(&self) -> Result<String> {
        Ok(self.state()?.document().title())
    }

    /// Inner HTML of the page body.
    pub fn body(&self) -> Result<String> {
        Ok(self.state()?.document().body())
    }

    pub fn response_headers(&self) -> Result<HeaderMap> {
        Ok(self.state()?.response().headers.clone())
    }

    pub fn find(&self, expr: &str) -> Result<Vec<Element>> {
        Ok(self.state()?.document().select(expr)?)
    }

    pub fn form(&self, expr: &str) -> Result<Form> {
        Ok(self.state()?.document().form(expr)?)
    }

    pub fn forms(&self) -> Result<Vec<Form>> {
        Ok(self.state()?.document().forms())
    }

    pub fn links(&self) -> Result<Vec<Link>> {
        Ok(self.state()?.document().links())
    }

    pub fn images(&self) -> Result<Vec<Image>> {
        Ok(self.state()?.document().images())
    }

    pub fn stylesheets(&self) -> Result<Vec<Stylesheet>> {
        Ok(self.state()?.document().stylesheets())
    }

    pub fn scripts(&self) -> Result<Vec<Script>> {
        Ok(self.state()?.document().scripts())
    }

    /// Cookie header the transport holds for the current site.
    pub fn site_cookies(&self) -> Result<Option<String>> {
        let url = self.url()?;
        Ok(self.inner.transport.site_cookies(&url))
    }

    /// Resolve a possibly relative reference against the current page.
    pub fn resolve_url(&self, reference: &str) -> Result<Url> {
        resolve(&self.url()?, reference)
    }

    /// Write the page source to `writer`, returning the bytes written.
    pub fn download<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let state = self.state()?;
        let html = state.document().html();
        tracing::info!(url = %state.url(), bytes = html.len(), "Downloading page");
        writer.write_all(html.as_bytes())?;
        Ok(html.len() as u64)
    }

    pub fn history_len(&self) -> usize {
        self.inner.history.read().len()
    }

    // === Bookmarks ===

    /// Save the current page URL under `name`.
    pub fn bookmark(&self, name: &str) -> Result<()> {
        let url = self.url()?;
        tracing::debug!(name, url = %url, "Bookmarking page");
        Ok(self.inner.bookmarks.write().save(name, url)?)
    }

    pub fn bookmarks(&self) -> Vec<(String, Url)> {
        self.inner.bookmarks.read().all()
    }

    // === Settings ===

    /// Bind a handler to `event`. Handlers run in binding order.
    pub fn on<F>(&self, event: Event, handler: F)
    where
        F: Fn(Event, Sender, &mut EventArgs<'_>) -> trawl_event::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.inner.dispatcher.bind(event, handler);
    }

    pub fn user_agent(&self) -> String {
        self.inner.user_agent.read().clone()
    }

    pub fn set_user_agent(&self, user_agent: impl Into<String>) {
        *self.inner.user_agent.write() = user_agent.into();
    }

    pub fn attribute(&self, attribute: Attribute) -> bool {
        self.inner.attributes.read().get(attribute)
    }

    pub fn attributes(&self) -> Attributes {
        *self.inner.attributes.read()
    }

    pub fn set_attribute(&self, attribute: Attribute, value: bool) {
        self.inner.attributes.write().set(attribute, value);
    }

    pub fn set_attributes(&self, attributes: Attributes) {
        *self.inner.attributes.write() = attributes;
    }

    /// Send Basic credentials with every request.
    pub fn set_authorization(&self, username: impl Into<String>, password: impl Into<String>) {
        let username = username.into();
        let credentials = (!username.is_empty()).then(|| Credentials {
            username,
            password: password.into(),
        });
        *self.inner.credentials.write() = credentials;
    }

    pub fn clear_authorization(&self) {
        *self.inner.credentials.write() = None;
    }

    /// Replace the extra headers sent with every request.
    pub fn set_headers(&self, headers: HeaderMap) {
        *self.inner.headers.write() = headers;
    }

    /// Add an extra header sent with every request.
    pub fn add_request_header(&self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| BrowserError::InvalidHeader(format!("{}: {}", name, e)))?;
        let value = header_value(value)?;
        self.inner.headers.write().append(name, value);
        Ok(())
    }

    pub fn set_history_jar(&self, history: impl History + 'static) {
        *self.inner.history.write() = Box::new(history);
    }

    pub fn set_bookmarks_jar(&self, bookmarks: impl Bookmarks + 'static) {
        *self.inner.bookmarks.write() = Box::new(bookmarks);
    }

    /// Install a recorder. It starts receiving completed requests at once.
    pub fn set_recorder_jar(&self, recorder: impl Recorder + 'static) {
        *self.inner.recorder.write() = Box::new(recorder);
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("url", &self.inner.page.read().url().map(Url::as_str))
            .field("phase", &self.phase())
            .field("history", &self.history_len())
            .finish()
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| {
        tracing::error!(url = raw, error = %e, "Invalid URL");
        BrowserError::invalid_url(raw, e)
    })
}

fn resolve(base: &Url, reference: &str) -> Result<Url> {
    base.join(reference.trim())
        .map_err(|e| BrowserError::invalid_url(reference, e))
}

fn set_query(url: &mut Url, values: &Values) {
    let encoded = values.encode();
    url.set_query((!encoded.is_empty()).then_some(encoded.as_str()));
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| BrowserError::InvalidHeader(format!("{:?}: {}", value, e)))
}
