//! Meta-refresh timer

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Parse the `content` of a refresh tag as a delay in seconds.
///
/// Only a bare non-negative number is accepted (`"2"`, `"0.5"`). Anything
/// else, including the `"5; url=..."` form, yields `None`.
pub fn parse_refresh(content: &str) -> Option<Duration> {
    let secs: f64 = content.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// Handed to the expiry callback so it can confirm it is still the armed
/// timer once it holds the navigation gate.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    id: u64,
    token: CancellationToken,
}

#[derive(Debug)]
struct Pending {
    id: u64,
    token: CancellationToken,
}

/// Single-shot delayed task. Arming replaces whatever was pending.
#[derive(Debug, Default)]
pub(crate) struct RefreshTimer {
    pending: Mutex<Option<Pending>>,
    next_id: AtomicU64,
}

impl RefreshTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_expiry` after `delay` unless cancelled first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(&self, delay: Duration, on_expiry: F)
    where
        F: FnOnce(Ticket) -> BoxFuture<'static, ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let previous = self.pending.lock().replace(Pending {
            id,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            previous.token.cancel();
        }

        tracing::debug!(timer = id, delay_ms = delay.as_millis() as u64, "Meta refresh armed");

        tokio::spawn(async move {
            let ticket = Ticket {
                id,
                token: token.clone(),
            };
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!(timer = id, "Meta refresh cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    on_expiry(ticket).await;
                }
            }
        });
    }

    /// Cancel the pending timer, if any.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(pending) => {
                pending.token.cancel();
                tracing::debug!(timer = pending.id, "Meta refresh cancelled");
                true
            }
            None => false,
        }
    }

    /// Claim the expiry for `ticket`. Returns false when the timer was
    /// cancelled or replaced after it fired.
    pub fn disarm(&self, ticket: &Ticket) -> bool {
        let mut pending = self.pending.lock();
        match pending.as_ref() {
            Some(current) if current.id == ticket.id && !ticket.token.is_cancelled() => {
                *pending = None;
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.pending.lock().is_some()
    }
}
