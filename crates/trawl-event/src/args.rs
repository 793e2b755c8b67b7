//! Event payloads

use trawl_net::{Method, Request, Response};
use url::form_urlencoded;
use url::Url;

/// Payload handed to handlers alongside the event.
///
/// Each event has one payload shape; see the variant docs on `Event`.
#[derive(Debug)]
pub enum EventArgs<'a> {
    None,
    Request(&'a mut Request),
    Exchange {
        request: &'a Request,
        response: &'a Response,
    },
    Url(&'a Url),
    Submit(&'a mut SubmitArgs),
}

impl EventArgs<'_> {
    pub fn request(&self) -> Option<&Request> {
        match self {
            EventArgs::Request(request) => Some(&**request),
            EventArgs::Exchange { request, .. } => Some(*request),
            _ => None,
        }
    }

    pub fn request_mut(&mut self) -> Option<&mut Request> {
        match self {
            EventArgs::Request(request) => Some(&mut **request),
            _ => None,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            EventArgs::Exchange { response, .. } => Some(*response),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            EventArgs::Url(url) => Some(*url),
            _ => None,
        }
    }

    pub fn submit(&self) -> Option<&SubmitArgs> {
        match self {
            EventArgs::Submit(args) => Some(&**args),
            _ => None,
        }
    }

    pub fn submit_mut(&mut self) -> Option<&mut SubmitArgs> {
        match self {
            EventArgs::Submit(args) => Some(&mut **args),
            _ => None,
        }
    }
}

/// A form submission about to be sent.
#[derive(Debug, Clone)]
pub struct SubmitArgs {
    pub values: Values,
    /// `GET` or `POST`
    pub method: Method,
    /// Absolute action URL
    pub action: Url,
}

/// Ordered multi-map of form values. Names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    pairs: Vec<(String, String)>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, keeping any existing ones for the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Replace every value for `name` with a single one.
    ///
    /// The new value takes the position of the first existing entry, or is
    /// appended when the name is new.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter().position(|(n, _)| *n == name) {
            Some(first) => {
                self.pairs[first].1 = value;
                let mut index = 0;
                self.pairs.retain(|(n, _)| {
                    let keep = index <= first || *n != name;
                    index += 1;
                    keep
                });
            }
            None => self.pairs.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn remove(&mut self, name: &str) {
        self.pairs.retain(|(n, _)| n != name);
    }

    pub fn has(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// `application/x-www-form-urlencoded` form, in insertion order.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Values
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_keep_duplicates_in_order() {
        let mut values = Values::new();
        values.add("tag", "rust");
        values.add("q", "browser");
        values.add("tag", "http");

        assert_eq!(values.get("tag"), Some("rust"));
        assert_eq!(values.get_all("tag"), vec!["rust", "http"]);
        assert_eq!(values.encode(), "tag=rust&q=browser&tag=http");
    }

    #[test]
    fn test_set_collapses_to_first_position() {
        let mut values: Values = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        values.set("a", "x");

        assert_eq!(values.iter().collect::<Vec<_>>(), vec![("a", "x"), ("b", "2")]);

        values.set("c", "4");
        assert_eq!(values.len(), 3);
        assert!(values.has("c"));
    }

    #[test]
    fn test_encode_escapes_reserved_characters() {
        let values: Values = [("q", "a b&c"), ("x", "é")].into_iter().collect();
        assert_eq!(values.encode(), "q=a+b%26c&x=%C3%A9");
    }

    #[test]
    fn test_args_accessors() {
        let url = Url::parse("http://example.com/").unwrap();
        let mut request = Request::get(url.clone());

        let mut args = EventArgs::Request(&mut request);
        assert!(args.request().is_some());
        assert!(args.response().is_none());
        args.request_mut().unwrap().url.set_path("/rewritten");
        assert_eq!(request.url.path(), "/rewritten");

        let args = EventArgs::Url(&url);
        assert_eq!(args.url(), Some(&url));
        assert!(args.request().is_none());
    }
}
