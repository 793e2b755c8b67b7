//! History stack

use std::collections::VecDeque;

use crate::state::Page;

/// Pages the browser has navigated away from, most recent last.
///
/// The oldest entry is the floor: `pop` never removes it.
pub trait History: Send + Sync {
    fn push(&mut self, page: Page);

    /// Remove and return the most recent page, or `None` at the floor.
    fn pop(&mut self) -> Option<Page>;

    fn top(&self) -> Option<&Page>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);
}

/// In-memory history, optionally capped.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    pages: VecDeque<Page>,
    limit: Option<usize>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` entries. When full, the oldest entry above the
    /// floor is dropped. Limits below 2 are raised to 2.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pages: VecDeque::new(),
            limit: Some(limit.max(2)),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl History for MemoryHistory {
    fn push(&mut self, page: Page) {
        self.pages.push_back(page);
        if let Some(limit) = self.limit {
            while self.pages.len() > limit {
                self.pages.remove(1);
                tracing::debug!(limit, "History full, dropped oldest entry");
            }
        }
    }

    fn pop(&mut self) -> Option<Page> {
        if self.pages.len() <= 1 {
            return None;
        }
        self.pages.pop_back()
    }

    fn top(&self) -> Option<&Page> {
        self.pages.back()
    }

    fn len(&self) -> usize {
        self.pages.len()
    }

    fn clear(&mut self) {
        self.pages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;
    use trawl_dom::Document;
    use trawl_net::{Request, Response, StatusCode};
    use url::Url;

    fn page(path: &str) -> Page {
        let url = Url::parse("http://example.com/").unwrap().join(path).unwrap();
        let response = Response::new(StatusCode::OK, url.clone(), "");
        let document = Document::parse(&response);
        Page::loaded(State::new(Request::get(url), response, document))
    }

    fn path_of(page: &Page) -> Option<String> {
        page.url().map(|u| u.path().to_string())
    }

    #[test]
    fn test_pop_stops_at_floor() {
        let mut history = MemoryHistory::new();
        assert!(history.is_empty());
        assert!(history.pop().is_none());

        history.push(Page::Blank);
        history.push(page("/a"));
        history.push(page("/b"));
        assert_eq!(history.len(), 3);
        assert_eq!(history.top().and_then(path_of).as_deref(), Some("/b"));

        assert_eq!(history.pop().as_ref().and_then(path_of).as_deref(), Some("/b"));
        assert_eq!(history.pop().as_ref().and_then(path_of).as_deref(), Some("/a"));
        assert!(history.pop().is_none());
        assert!(history.pop().is_none());
        assert_eq!(history.len(), 1);
        assert!(history.top().unwrap().is_blank());
    }

    #[test]
    fn test_limit_keeps_floor() {
        let mut history = MemoryHistory::with_limit(3);
        history.push(Page::Blank);
        for path in ["/a", "/b", "/c", "/d"] {
            history.push(page(path));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.pop().as_ref().and_then(path_of).as_deref(), Some("/d"));
        assert_eq!(history.pop().as_ref().and_then(path_of).as_deref(), Some("/c"));
        assert!(history.pop().is_none());
        assert!(history.top().unwrap().is_blank());
    }

    #[test]
    fn test_clear() {
        let mut history = MemoryHistory::with_limit(0);
        assert_eq!(history.limit(), Some(2));
        history.push(Page::Blank);
        history.push(page("/a"));
        history.clear();
        assert!(history.is_empty());
    }
}
