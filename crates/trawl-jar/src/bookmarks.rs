//! Named bookmarks

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::JarError;
use crate::Result;

pub trait Bookmarks: Send + Sync {
    /// Store `url` under `name`. Fails if the name is taken.
    fn save(&mut self, name: &str, url: Url) -> Result<()>;

    fn read(&self, name: &str) -> Result<Url>;

    fn remove(&mut self, name: &str) -> bool;

    fn has(&self, name: &str) -> bool;

    /// Every bookmark, ordered by name.
    fn all(&self) -> Vec<(String, Url)>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryBookmarks {
    entries: BTreeMap<String, Url>,
}

impl MemoryBookmarks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Bookmarks for MemoryBookmarks {
    fn save(&mut self, name: &str, url: Url) -> Result<()> {
        if self.entries.contains_key(name) {
            return Err(JarError::BookmarkExists(name.to_string()));
        }
        tracing::debug!(name, url = %url, "Bookmark saved");
        self.entries.insert(name.to_string(), url);
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Url> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| JarError::BookmarkNotFound(name.to_string()))
    }

    fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn all(&self) -> Vec<(String, Url)> {
        self.entries
            .iter()
            .map(|(name, url)| (name.clone(), url.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmarks() {
        let mut bookmarks = MemoryBookmarks::new();
        let rust = Url::parse("https://rust-lang.org/").unwrap();

        bookmarks.save("rust", rust.clone()).unwrap();
        assert!(bookmarks.has("rust"));
        assert_eq!(bookmarks.read("rust").unwrap(), rust);

        let err = bookmarks.save("rust", rust.clone()).unwrap_err();
        assert_eq!(err, JarError::BookmarkExists("rust".into()));

        assert!(bookmarks.remove("rust"));
        assert!(!bookmarks.remove("rust"));
        assert_eq!(
            bookmarks.read("rust").unwrap_err(),
            JarError::BookmarkNotFound("rust".into())
        );
    }

    #[test]
    fn test_bookmarks_serialize_as_map() {
        let mut bookmarks = MemoryBookmarks::new();
        bookmarks
            .save("b", Url::parse("http://b.test/").unwrap())
            .unwrap();
        bookmarks
            .save("a", Url::parse("http://a.test/").unwrap())
            .unwrap();

        let json = serde_json::to_string(&bookmarks).unwrap();
        assert_eq!(json, r#"{"a":"http://a.test/","b":"http://b.test/"}"#);

        let restored: MemoryBookmarks = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.all(), bookmarks.all());
    }
}
