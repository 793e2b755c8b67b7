//! Lifecycle points a handler can bind to

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// Before a request is sent. Payload: `EventArgs::Request`, which handlers
    /// may rewrite. A failure vetoes the request.
    PreRequest,
    /// After a response was committed as the current page.
    /// Payload: `EventArgs::Exchange`.
    PostRequest,
    /// A link was clicked. Payload: `EventArgs::Url` with the resolved target.
    Click,
    /// A form is about to be submitted. Payload: `EventArgs::Submit`.
    Submit,
    /// The recorder started recording. No payload.
    RecordStart,
    /// The recorder stopped recording. No payload.
    RecordStop,
    /// A recorded request is about to be replayed. Payload: `EventArgs::Request`.
    RecordReplay,
}

impl Event {
    pub const ALL: [Event; 7] = [
        Event::PreRequest,
        Event::PostRequest,
        Event::Click,
        Event::Submit,
        Event::RecordStart,
        Event::RecordStop,
        Event::RecordReplay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::PreRequest => "pre_request",
            Event::PostRequest => "post_request",
            Event::Click => "click",
            Event::Submit => "submit",
            Event::RecordStart => "record_start",
            Event::RecordStop => "record_stop",
            Event::RecordReplay => "record_replay",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The component that emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Browser,
    Recorder,
    Form,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_distinct() {
        let mut names: Vec<_> = Event::ALL.iter().map(|e| e.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Event::ALL.len());
    }

    #[test]
    fn test_display_matches_serde_name() {
        for event in Event::ALL {
            let json = serde_json::to_string(&event).unwrap();
            assert_eq!(json, format!("\"{}\"", event));
        }
    }
}
