//! Page resources: links, images, stylesheets and scripts

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: Url,
    pub id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: Url,
    pub id: Option<String>,
    pub alt: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stylesheet {
    pub url: Url,
    pub id: Option<String>,
    /// Defaults to `all`
    pub media: String,
    /// Defaults to `text/css`
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub url: Url,
    pub id: Option<String>,
    /// Defaults to `text/javascript`
    pub kind: String,
}

/// Elements matching `expr` whose `attr` resolves to an absolute URL.
///
/// References that cannot be resolved are skipped.
fn resolved<'a>(
    tree: &'a Html,
    base: &'a Url,
    expr: &str,
    attr: &'a str,
) -> Vec<(ElementRef<'a>, Url)> {
    let Ok(selector) = Selector::parse(expr) else {
        return Vec::new();
    };
    let found = tree
        .select(&selector)
        .filter_map(|el| {
            let raw = el.value().attr(attr)?;
            let url = base.join(raw.trim()).ok()?;
            Some((el, url))
        })
        .collect();
    found
}

fn id_of(el: &ElementRef<'_>) -> Option<String> {
    el.value().id().map(str::to_string)
}

fn attr_or(el: &ElementRef<'_>, name: &str, default: &str) -> String {
    el.value()
        .attr(name)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

pub(crate) fn links(tree: &Html, base: &Url) -> Vec<Link> {
    resolved(tree, base, "a[href]", "href")
        .into_iter()
        .map(|(el, url)| Link {
            url,
            id: id_of(&el),
            text: el.text().collect::<String>().trim().to_string(),
        })
        .collect()
}

pub(crate) fn images(tree: &Html, base: &Url) -> Vec<Image> {
    resolved(tree, base, "img[src]", "src")
        .into_iter()
        .map(|(el, url)| Image {
            url,
            id: id_of(&el),
            alt: attr_or(&el, "alt", ""),
            title: attr_or(&el, "title", ""),
        })
        .collect()
}

pub(crate) fn stylesheets(tree: &Html, base: &Url) -> Vec<Stylesheet> {
    resolved(tree, base, "link[href]", "href")
        .into_iter()
        .filter(|(el, _)| {
            el.value()
                .attr("rel")
                .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")))
        })
        .map(|(el, url)| Stylesheet {
            url,
            id: id_of(&el),
            media: attr_or(&el, "media", "all"),
            kind: attr_or(&el, "type", "text/css"),
        })
        .collect()
}

pub(crate) fn scripts(tree: &Html, base: &Url) -> Vec<Script> {
    resolved(tree, base, "script[src]", "src")
        .into_iter()
        .map(|(el, url)| Script {
            url,
            id: id_of(&el),
            kind: attr_or(&el, "type", "text/javascript"),
        })
        .collect()
}
