//! Streaming callback contracts and cumulative text helpers.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use sprovider::{CumulativeText, FnStreamCallbacks, StreamCallbacks};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = FnStreamCallbacks::new().with_chunk({
//!     let seen = Arc::clone(&seen);
//!     move |text| seen.lock().expect("seen lock").push(text.to_string())
//! });
//!
//! let mut text = CumulativeText::new();
//! sink.on_chunk(text.push("Ab"));
//! sink.on_chunk(text.push("cd"));
//! assert_eq!(*seen.lock().expect("seen lock"), vec!["Ab", "Abcd"]);
//! ```

use std::fmt::{Debug, Formatter};

use crate::ProviderError;

/// Receiver of one generation call's progress.
///
/// Invariants for adapters driving a sink:
/// - `on_chunk` always carries the cumulative text produced so far, never a delta.
/// - Chunks are delivered in transport order.
/// - At most one of `on_complete` / `on_error` is invoked, after every chunk.
pub trait StreamCallbacks: Send + Sync {
    fn on_chunk(&self, _text: &str) {}

    fn on_complete(&self, _full_text: &str) {}

    fn on_error(&self, _error: &ProviderError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStreamCallbacks;

impl StreamCallbacks for NoopStreamCallbacks {}

type ChunkFn = Box<dyn Fn(&str) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&ProviderError) + Send + Sync>;

/// Closure-backed callbacks; any unset slot is a no-op.
#[derive(Default)]
pub struct FnStreamCallbacks {
    chunk: Option<ChunkFn>,
    complete: Option<ChunkFn>,
    error: Option<ErrorFn>,
}

impl FnStreamCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.chunk = Some(Box::new(f));
        self
    }

    pub fn with_complete(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    pub fn with_error(mut self, f: impl Fn(&ProviderError) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl Debug for FnStreamCallbacks {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStreamCallbacks")
            .field("chunk", &self.chunk.is_some())
            .field("complete", &self.complete.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl StreamCallbacks for FnStreamCallbacks {
    fn on_chunk(&self, text: &str) {
        if let Some(f) = &self.chunk {
            f(text);
        }
    }

    fn on_complete(&self, full_text: &str) {
        if let Some(f) = &self.complete {
            f(full_text);
        }
    }

    fn on_error(&self, error: &ProviderError) {
        if let Some(f) = &self.error {
            f(error);
        }
    }
}

/// Accumulates streamed fragments so adapters can report cumulative text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CumulativeText {
    text: String,
}

impl CumulativeText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &str) -> &str {
        self.text.push_str(fragment);
        &self.text
    }

    /// Replaces the whole text, for decoders that re-derive it each time.
    pub fn replace(&mut self, text: impl Into<String>) -> &str {
        self.text = text.into();
        &self.text
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn cumulative_text_reports_running_total() {
        let mut text = CumulativeText::new();
        assert!(text.is_empty());

        assert_eq!(text.push("Ab"), "Ab");
        assert_eq!(text.push("cd"), "Abcd");
        assert_eq!(text.push("ef"), "Abcdef");
        assert_eq!(text.replace("x"), "x");
        assert_eq!(text.into_string(), "x");
    }

    #[test]
    fn fn_callbacks_dispatch_to_configured_slots_only() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = FnStreamCallbacks::new()
            .with_complete({
                let events = Arc::clone(&events);
                move |text| events.lock().expect("events lock").push(format!("done:{text}"))
            })
            .with_error({
                let events = Arc::clone(&events);
                move |error| {
                    events
                        .lock()
                        .expect("events lock")
                        .push(format!("error:{:?}", error.kind))
                }
            });

        sink.on_chunk("ignored");
        sink.on_complete("report");
        sink.on_error(&ProviderError::timeout("late"));

        assert_eq!(
            *events.lock().expect("events lock"),
            vec!["done:report".to_string(), "error:Timeout".to_string()]
        );
    }
}
