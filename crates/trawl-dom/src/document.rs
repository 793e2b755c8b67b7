//! Parsed page and element snapshots

use std::fmt;
use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use trawl_net::Response;
use url::Url;

use crate::assets::{self, Image, Link, Script, Stylesheet};
use crate::error::DomError;
use crate::form::Form;
use crate::Result;

/// The HTML of a fetched page plus the URL it was served from.
///
/// `scraper::Html` is not `Send`, so the tree is rebuilt per query and only
/// owned snapshots leave this type.
#[derive(Clone)]
pub struct Document {
    url: Url,
    source: Arc<str>,
}

impl Document {
    pub fn parse(response: &Response) -> Self {
        Self::from_html(response.url.clone(), response.text())
    }

    pub fn from_html(url: Url, html: impl AsRef<str>) -> Self {
        Self {
            url,
            source: Arc::from(html.as_ref()),
        }
    }

    /// URL relative references in this page resolve against.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.source
    }

    fn tree(&self) -> Html {
        Html::parse_document(&self.source)
    }

    /// Every element matching `expr`, in document order.
    pub fn select(&self, expr: &str) -> Result<Vec<Element>> {
        let selector = parse_selector(expr)?;
        let tree = self.tree();
        let elements = tree.select(&selector).map(Element::from_ref).collect();
        Ok(elements)
    }

    pub fn select_first(&self, expr: &str) -> Result<Option<Element>> {
        let selector = parse_selector(expr)?;
        let tree = self.tree();
        let element = tree.select(&selector).next().map(Element::from_ref);
        Ok(element)
    }

    pub fn title(&self) -> String {
        self.select_first("title")
            .ok()
            .flatten()
            .map(|el| el.text().trim().to_string())
            .unwrap_or_default()
    }

    /// Inner HTML of `<body>`.
    pub fn body(&self) -> String {
        self.select_first("body")
            .ok()
            .flatten()
            .map(|el| el.inner_html().to_string())
            .unwrap_or_default()
    }

    /// `content` of the first `<meta http-equiv="refresh">`, if any.
    pub fn meta_refresh(&self) -> Option<String> {
        let elements = self.select("meta[http-equiv]").ok()?;
        elements
            .into_iter()
            .find(|el| {
                el.attr("http-equiv")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
            })
            .and_then(|el| el.attr("content").map(str::to_string))
    }

    /// Resolve a possibly relative reference against the page URL.
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        self.url.join(reference.trim()).ok()
    }

    /// The form matched by `expr`.
    pub fn form(&self, expr: &str) -> Result<Form> {
        let selector = parse_selector(expr)?;
        let tree = self.tree();
        let el = tree
            .select(&selector)
            .next()
            .ok_or_else(|| DomError::ElementNotFound(expr.to_string()))?;

        if el.value().name() != "form" {
            return Err(DomError::UnexpectedElement {
                expr: expr.to_string(),
                expected: "form",
                found: el.value().name().to_string(),
            });
        }
        Ok(Form::from_ref(el))
    }

    /// One entry per `<form>`, in document order.
    pub fn forms(&self) -> Vec<Form> {
        let Ok(selector) = Selector::parse("form") else {
            return Vec::new();
        };
        let tree = self.tree();
        let forms = tree.select(&selector).map(Form::from_ref).collect();
        forms
    }

    pub fn links(&self) -> Vec<Link> {
        assets::links(&self.tree(), &self.url)
    }

    pub fn images(&self) -> Vec<Image> {
        assets::images(&self.tree(), &self.url)
    }

    pub fn stylesheets(&self) -> Vec<Stylesheet> {
        assets::stylesheets(&self.tree(), &self.url)
    }

    pub fn scripts(&self) -> Vec<Script> {
        assets::scripts(&self.tree(), &self.url)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url.as_str())
            .field("bytes", &self.source.len())
            .finish()
    }
}

pub(crate) fn parse_selector(expr: &str) -> Result<Selector> {
    Selector::parse(expr).map_err(|e| DomError::InvalidSelector {
        expr: expr.to_string(),
        reason: e.to_string(),
    })
}

/// Owned snapshot of an element taken at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    inner_html: String,
}

impl Element {
    pub(crate) fn from_ref(el: ElementRef<'_>) -> Self {
        Self {
            name: el.value().name().to_string(),
            attrs: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: el.text().collect(),
            inner_html: el.inner_html(),
        }
    }

    /// Lowercase tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn attr_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attr(name).unwrap_or(default)
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title> Trawl Test </title>
  <meta http-equiv="Refresh" content="2">
</head>
<body>
  <a id="next" href="/next">Next</a>
  <a id="bare">No href</a>
  <p class="note">Hello</p>
</body>
</html>"#;

    fn page() -> Document {
        Document::from_html(Url::parse("http://example.com/dir/page").unwrap(), PAGE)
    }

    #[test]
    fn test_title_and_body() {
        let doc = page();
        assert_eq!(doc.title(), "Trawl Test");
        assert!(doc.body().contains(r#"<p class="note">Hello</p>"#));
    }

    #[test]
    fn test_select_returns_snapshots() {
        let doc = page();
        let anchors = doc.select("a").unwrap();
        assert_eq!(anchors.len(), 2);
        assert!(anchors[0].is("a"));
        assert_eq!(anchors[0].attr("href"), Some("/next"));
        assert_eq!(anchors[0].text(), "Next");
        assert_eq!(anchors[1].attr("href"), None);
        assert_eq!(anchors[1].attr_or("href", "#"), "#");
    }

    #[test]
    fn test_invalid_selector() {
        let err = page().select("a[").unwrap_err();
        assert!(matches!(err, DomError::InvalidSelector { .. }));
    }

    #[test]
    fn test_meta_refresh_is_case_insensitive() {
        assert_eq!(page().meta_refresh().as_deref(), Some("2"));

        let plain = Document::from_html(page().url().clone(), "<html><body></body></html>");
        assert_eq!(plain.meta_refresh(), None);
    }

    #[test]
    fn test_resolve_relative_reference() {
        let doc = page();
        assert_eq!(doc.resolve("other").unwrap().as_str(), "http://example.com/dir/other");
        assert_eq!(doc.resolve("/root").unwrap().as_str(), "http://example.com/root");
    }

    #[test]
    fn test_form_requires_form_element() {
        let doc = page();
        assert!(matches!(
            doc.form("#nothing").unwrap_err(),
            DomError::ElementNotFound(_)
        ));
        assert!(matches!(
            doc.form("#next").unwrap_err(),
            DomError::UnexpectedElement { expected: "form", .. }
        ));
    }
}
