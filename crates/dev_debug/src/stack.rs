use std::{fmt, thread};

use backtrace::Backtrace;
use tracing::debug;

// Symbol prefixes of frames that belong to the capture machinery itself.
const INTERNAL_PREFIXES: &[&str] = &["backtrace::", "dev_debug::"];

/// One resolved stack frame, before placeholder defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub function: Option<String>,
}

impl RawFrame {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
            function: Some(function.into()),
        }
    }

    fn is_internal(&self) -> bool {
        self.function.as_deref().is_some_and(|name| {
            let name = name.trim_start_matches('<');
            INTERNAL_PREFIXES
                .iter()
                .any(|prefix| name.starts_with(prefix))
        })
    }
}

/// Source of the call stack attached to each event.
pub trait StackCapture: Send + Sync + fmt::Debug {
    /// Frames innermost first. The first frame is the code that called into
    /// the client; the client's own frames are not included.
    fn capture(&self) -> Vec<RawFrame>;

    /// Called once when an enabled client is built, before any capture.
    fn prepare(&self) {}
}

/// Walks the live stack with the `backtrace` crate and resolves symbols.
///
/// The first resolution in a process loads debug info, which can take
/// hundreds of milliseconds. `prepare` does that on a background thread; the
/// loaded data is shared process-wide, so later captures on the host's
/// threads only walk and look up.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceCapture;

impl StackCapture for BacktraceCapture {
    fn prepare(&self) {
        let warm_up = thread::Builder::new()
            .name("dev-debug-symbols".to_string())
            .spawn(|| drop(Backtrace::new()));
        if let Err(err) = warm_up {
            debug!("symbol warm-up not started: {err}");
        }
    }

    fn capture(&self) -> Vec<RawFrame> {
        let backtrace = Backtrace::new();
        let mut frames = Vec::new();
        for frame in backtrace.frames() {
            let symbols = frame.symbols();
            if symbols.is_empty() {
                frames.push(RawFrame::default());
                continue;
            }
            // Inlined calls resolve to several symbols for one physical frame.
            for symbol in symbols {
                frames.push(RawFrame {
                    file: symbol
                        .filename()
                        .map(|path| path.to_string_lossy().into_owned()),
                    line: symbol.lineno(),
                    function: symbol.name().map(|name| format!("{name:#}")),
                });
            }
        }
        strip_internal(frames)
    }
}

/// Drops everything up to and including the leading run of internal frames.
pub(crate) fn strip_internal(frames: Vec<RawFrame>) -> Vec<RawFrame> {
    let Some(first) = frames.iter().position(RawFrame::is_internal) else {
        return frames;
    };
    let caller = frames[first..]
        .iter()
        .position(|frame| !frame.is_internal())
        .map_or(frames.len(), |offset| first + offset);
    frames.into_iter().skip(caller).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(function: &str) -> RawFrame {
        RawFrame {
            function: Some(function.to_string()),
            ..RawFrame::default()
        }
    }

    #[test]
    fn strips_capture_and_client_frames() {
        let frames = vec![
            RawFrame::default(),
            named("backtrace::backtrace::trace"),
            named("backtrace::capture::Backtrace::new"),
            named("<dev_debug::stack::BacktraceCapture as dev_debug::stack::StackCapture>::capture"),
            named("dev_debug::client::DebugClient::send"),
            named("my_app::handler"),
            named("my_app::main"),
        ];

        let stripped = strip_internal(frames);
        let names: Vec<_> = stripped
            .iter()
            .map(|frame| frame.function.as_deref().unwrap())
            .collect();
        assert_eq!(names, ["my_app::handler", "my_app::main"]);
    }

    #[test]
    fn frames_without_internal_markers_are_kept() {
        let frames = vec![named("my_app::handler"), RawFrame::default()];
        assert_eq!(strip_internal(frames.clone()), frames);
    }

    #[test]
    fn live_capture_does_not_panic() {
        BacktraceCapture.prepare();
        let _ = BacktraceCapture.capture();
    }
}
