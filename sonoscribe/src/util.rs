//! Small convenience constructors for common types.

use scall::CallStatus;

use crate::{FnStreamCallbacks, ProviderError, ProviderId, StatusSnapshot};

/// Lenient provider id parsing for settings screens and CLI flags.
pub fn parse_provider_id(value: &str) -> Option<ProviderId> {
    value.parse().ok()
}

/// Callbacks that only forward the cumulative text; errors are dropped.
pub fn on_text<F>(f: F) -> FnStreamCallbacks
where
    F: Fn(&str) + Send + Sync + 'static,
{
    FnStreamCallbacks::new().with_chunk(f)
}

/// Callbacks forwarding the cumulative text, the final text and errors.
pub fn streaming_callbacks<C, D, E>(on_chunk: C, on_complete: D, on_error: E) -> FnStreamCallbacks
where
    C: Fn(&str) + Send + Sync + 'static,
    D: Fn(&str) + Send + Sync + 'static,
    E: Fn(&ProviderError) + Send + Sync + 'static,
{
    FnStreamCallbacks::new()
        .with_chunk(on_chunk)
        .with_complete(on_complete)
        .with_error(on_error)
}

/// True while a call is loading or streaming; drives spinners and disabled buttons.
pub fn is_busy(snapshot: &StatusSnapshot) -> bool {
    matches!(snapshot.state, CallStatus::Loading | CallStatus::Streaming)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::{ProviderId, StatusBroadcaster, StreamCallbacks};

    use super::{is_busy, on_text, parse_provider_id, streaming_callbacks};

    #[test]
    fn parse_provider_id_supports_aliases() {
        assert_eq!(parse_provider_id("openai"), Some(ProviderId::OpenAi));
        assert_eq!(parse_provider_id(" Google "), Some(ProviderId::Gemini));
        assert_eq!(parse_provider_id("anthropic"), Some(ProviderId::Claude));
        assert_eq!(parse_provider_id("unknown"), None);
    }

    #[test]
    fn callback_helpers_forward_text() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callbacks = on_text(move |text| sink.lock().expect("seen lock").push(text.to_string()));
        callbacks.on_chunk("Liver");
        callbacks.on_complete("Liver normal");
        assert_eq!(*seen.lock().expect("seen lock"), vec!["Liver".to_string()]);

        let done = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&done);
        let callbacks = streaming_callbacks(
            |_| {},
            move |text| *sink.lock().expect("done lock") = Some(text.to_string()),
            |_| {},
        );
        callbacks.on_complete("Final");
        assert_eq!(done.lock().expect("done lock").as_deref(), Some("Final"));
    }

    #[test]
    fn busy_tracks_loading_and_streaming() {
        let status = StatusBroadcaster::new();
        assert!(!is_busy(&status.snapshot()));

        status.call_accepted(1);
        assert!(is_busy(&status.snapshot()));
        status.chunk_received(1);
        assert!(is_busy(&status.snapshot()));
        status.call_completed(0);
        assert!(!is_busy(&status.snapshot()));
    }
}
