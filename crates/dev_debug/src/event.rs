use std::{panic::Location, path::Path};

use serde::Serialize;

use crate::{
    config::Context,
    defaults::{DEFAULT_MARKER, UNKNOWN},
    normalize::NormalizedNode,
    stack::RawFrame,
};

/// One stack level above the call that produced an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallFrame {
    #[serde(rename = "file")]
    pub source_path: String,
    #[serde(rename = "line")]
    pub line_number: u32,
    #[serde(rename = "function")]
    pub function_name: String,
}

impl From<RawFrame> for CallFrame {
    fn from(frame: RawFrame) -> Self {
        Self {
            source_path: frame.file.unwrap_or_else(|| UNKNOWN.to_string()),
            line_number: frame.line.unwrap_or(0),
            function_name: frame.function.unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub language: String,
    pub value: NormalizedNode,
}

/// A single report sent to the collector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugEvent {
    pub id: String,
    #[serde(rename = "time")]
    pub timestamp: String,
    pub source_name: String,
    pub line_number: u32,
    pub label: String,
    #[serde(rename = "pathToSource")]
    pub source_path: String,
    pub caller_function: Option<String>,
    pub backtrace: Vec<CallFrame>,
    pub payload: Payload,
}

/// Assembles [`DebugEvent`]s from a normalized value and the captured stack.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    marker: String,
    backtrace_limit: Option<usize>,
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl EventBuilder {
    /// `marker` is the default for both the label and the payload language.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            backtrace_limit: None,
        }
    }

    pub fn backtrace_limit(mut self, limit: Option<usize>) -> Self {
        self.backtrace_limit = limit;
        self
    }

    /// `frames` is innermost first with `frames[0]` the immediate caller.
    /// `location`, when known, is the precise call site and takes precedence
    /// over the first frame's file and line.
    pub fn build(
        &self,
        value: NormalizedNode,
        context: &Context,
        location: Option<&Location<'_>>,
        frames: Vec<RawFrame>,
    ) -> DebugEvent {
        let mut frames = frames.into_iter();
        let caller = frames.next().unwrap_or_default();

        let source_path = location
            .map(|location| location.file().to_string())
            .or(caller.file)
            .unwrap_or_else(|| UNKNOWN.to_string());
        let line_number = location
            .map(Location::line)
            .or(caller.line)
            .unwrap_or(0);
        let backtrace = frames
            .take(self.backtrace_limit.unwrap_or(usize::MAX))
            .map(CallFrame::from)
            .collect();

        let language = context
            .language_override()
            .unwrap_or(&self.marker)
            .to_string();
        let label = context.label_override().unwrap_or(&self.marker).to_string();

        DebugEvent {
            id: new_event_id(),
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            source_name: source_name(&source_path),
            line_number,
            label,
            source_path,
            caller_function: caller.function,
            backtrace,
            payload: Payload { language, value },
        }
    }
}

fn new_event_id() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}

fn source_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
