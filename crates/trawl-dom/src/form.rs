//! HTML forms

use scraper::{ElementRef, Selector};
use trawl_event::Values;
use trawl_net::Method;

use crate::error::DomError;
use crate::Result;

/// Input types that never contribute a value on their own.
const SKIPPED_INPUTS: &[&str] = &["submit", "button", "image", "reset", "file"];

/// A form and the values it would submit.
///
/// `action` is kept as written in the page; the browser resolves it against
/// the page URL at submit time. An empty action targets the page itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    action: String,
    method: Method,
    fields: Values,
}

impl Form {
    pub fn new(action: impl Into<String>, method: Method) -> Self {
        Self {
            action: action.into(),
            method,
            fields: Values::new(),
        }
    }

    pub(crate) fn from_ref(form: ElementRef<'_>) -> Self {
        let action = form.value().attr("action").unwrap_or_default().trim();
        let method = match form.value().attr("method") {
            Some(m) if m.trim().eq_ignore_ascii_case("post") => Method::POST,
            _ => Method::GET,
        };

        let mut out = Self::new(action, method);
        if let Ok(selector) = Selector::parse("input[name], textarea[name], select[name]") {
            for field in form.select(&selector) {
                out.collect_field(field);
            }
        }
        out
    }

    fn collect_field(&mut self, field: ElementRef<'_>) {
        let el = field.value();
        let Some(name) = el.attr("name").filter(|n| !n.is_empty()) else {
            return;
        };

        match el.name() {
            "input" => {
                let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
                if SKIPPED_INPUTS.contains(&kind.as_str()) {
                    return;
                }
                if kind == "checkbox" || kind == "radio" {
                    if el.attr("checked").is_some() {
                        self.fields.add(name, el.attr("value").unwrap_or("on"));
                    }
                    return;
                }
                self.fields.add(name, el.attr("value").unwrap_or_default());
            }
            "textarea" => {
                let text: String = field.text().collect();
                self.fields.add(name, text);
            }
            "select" => {
                if let Some(value) = selected_option(field) {
                    self.fields.add(name, value);
                }
            }
            _ => {}
        }
    }

    /// Overwrite the value of an existing field.
    pub fn input(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        if !self.fields.has(name) {
            return Err(DomError::FieldNotFound(name.to_string()));
        }
        self.fields.set(name, value);
        Ok(())
    }

    /// Append a value, creating the field if needed.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.add(name, value);
    }

    pub fn remove(&mut self, name: &str) {
        self.fields.remove(name);
    }

    pub fn values(&self) -> &Values {
        &self.fields
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}

/// Value of the selected `<option>`, falling back to the first one.
fn selected_option(select: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("option").ok()?;
    let mut options = select.select(&selector);
    let first = options.next()?;
    let chosen = std::iter::once(first)
        .chain(options)
        .find(|o| o.value().attr("selected").is_some())
        .unwrap_or(first);

    Some(match chosen.value().attr("value") {
        Some(value) => value.to_string(),
        None => chosen.text().collect::<String>().trim().to_string(),
    })
}
