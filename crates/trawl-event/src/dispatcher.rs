//! Event dispatcher

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::args::EventArgs;
use crate::event::{Event, Sender};
use crate::Result;

/// Something that reacts to a dispatched event.
///
/// Returning an error stops the dispatch; remaining handlers are skipped and
/// the error is returned to whoever emitted the event.
pub trait Handler: Send + Sync {
    fn handle_event(&self, event: Event, sender: Sender, args: &mut EventArgs<'_>) -> Result<()>;
}

impl<F> Handler for F
where
    F: Fn(Event, Sender, &mut EventArgs<'_>) -> Result<()> + Send + Sync,
{
    fn handle_event(&self, event: Event, sender: Sender, args: &mut EventArgs<'_>) -> Result<()> {
        self(event, sender, args)
    }
}

/// Ordered, short-circuiting publish/subscribe.
#[derive(Default)]
pub struct Dispatcher {
    handlers: RwLock<HashMap<Event, Vec<Arc<dyn Handler>>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a closure to an event. Handlers run in the order they were bound.
    pub fn bind<F>(&self, event: Event, handler: F)
    where
        F: Fn(Event, Sender, &mut EventArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.bind_handler(event, Arc::new(handler));
    }

    /// Bind a shared handler object to an event.
    pub fn bind_handler(&self, event: Event, handler: Arc<dyn Handler>) {
        self.handlers.write().entry(event).or_default().push(handler);
    }

    /// Call every handler bound to `event`, in order, until one fails.
    ///
    /// The handler list is copied before the first call, so handlers may bind
    /// new handlers or dispatch again without deadlocking. Handlers bound
    /// during a dispatch only see later dispatches.
    pub fn dispatch(&self, event: Event, sender: Sender, args: &mut EventArgs<'_>) -> Result<()> {
        let handlers = self.handlers.read().get(&event).cloned().unwrap_or_default();

        tracing::trace!(%event, ?sender, handlers = handlers.len(), "Dispatching event");

        for handler in handlers {
            if let Err(err) = handler.handle_event(event, sender, args) {
                tracing::debug!(%event, error = %err, "Event handler failed, dispatch stopped");
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn handler_count(&self, event: Event) -> usize {
        self.handlers.read().get(&event).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read();
        let mut counts: Vec<_> = handlers.iter().map(|(e, h)| (*e, h.len())).collect();
        counts.sort_by_key(|(e, _)| e.as_str());
        f.debug_struct("Dispatcher").field("handlers", &counts).finish()
    }
}
