//! Browser configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Result;

/// Switches the navigation pipeline consults on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Send the current page as `Referer` on link and form navigation
    SendReferer,
    /// Reload pages carrying `<meta http-equiv="refresh">` after the delay
    HandleMetaRefresh,
    /// Follow redirects; when off, a redirect fails the navigation
    FollowRedirects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub send_referer: bool,
    pub handle_meta_refresh: bool,
    pub follow_redirects: bool,
}

impl Attributes {
    pub fn get(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::SendReferer => self.send_referer,
            Attribute::HandleMetaRefresh => self.handle_meta_refresh,
            Attribute::FollowRedirects => self.follow_redirects,
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: bool) {
        match attribute {
            Attribute::SendReferer => self.send_referer = value,
            Attribute::HandleMetaRefresh => self.handle_meta_refresh = value,
            Attribute::FollowRedirects => self.follow_redirects = value,
        }
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            send_referer: true,
            handle_meta_refresh: true,
            follow_redirects: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Value of the `User-Agent` header
    pub user_agent: String,
    /// Initial attribute values
    pub attributes: Attributes,
    /// Per-exchange timeout for the HTTP transport, in seconds
    pub timeout_secs: u64,
    /// Maximum history depth; unbounded when unset
    pub history_limit: Option<usize>,
    /// Maximum recorded requests; unbounded when unset
    pub recorder_capacity: Option<usize>,
}

impl Config {
    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            attributes: Attributes::default(),
            timeout_secs: 30,
            history_limit: None,
            recorder_capacity: None,
        }
    }
}

/// `trawl/<version> (<os>; <arch>)`
pub fn default_user_agent() -> String {
    format!(
        "trawl/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
