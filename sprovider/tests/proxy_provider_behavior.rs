#![cfg(feature = "provider-proxy")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream;
use sprovider::adapters::proxy::{
    BodyFormat, ProxyByteStream, ProxyProvider, ProxyRequest, ProxyResponse, ProxyTransport,
};
use sprovider::{
    CancellationToken, GenerationRequest, ProviderError, ProviderErrorKind, ProviderFuture,
    ProviderId, StreamCallbacks, TextProvider,
};

#[derive(Debug)]
struct ScriptedTransport {
    configured: bool,
    format: BodyFormat,
    chunks: Vec<Result<Vec<u8>, ProviderError>>,
    open_error: Option<ProviderError>,
    probe_ok: bool,
    requests: Mutex<Vec<ProxyRequest>>,
}

impl ScriptedTransport {
    fn new(format: BodyFormat, chunks: &[&str]) -> Self {
        Self {
            configured: true,
            format,
            chunks: chunks
                .iter()
                .map(|chunk| Ok(chunk.as_bytes().to_vec()))
                .collect(),
            open_error: None,
            probe_ok: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: ProviderError) -> Self {
        Self {
            open_error: Some(error),
            ..Self::new(BodyFormat::PlainText, &[])
        }
    }
}

impl ProxyTransport for ScriptedTransport {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn open_stream<'a>(
        &'a self,
        request: ProxyRequest,
    ) -> ProviderFuture<'a, Result<ProxyResponse, ProviderError>> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            if let Some(error) = &self.open_error {
                return Err(error.clone());
            }
            let body: ProxyByteStream = Box::pin(stream::iter(self.chunks.clone()));
            Ok(ProxyResponse::new(self.format, body))
        })
    }

    fn probe<'a>(&'a self, request: ProxyRequest) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            if self.probe_ok {
                Ok(())
            } else {
                Err(ProviderError::unavailable("proxy down"))
            }
        })
    }
}

/// Transport whose body never ends, for cancellation tests.
#[derive(Debug)]
struct HangingTransport;

impl ProxyTransport for HangingTransport {
    fn is_configured(&self) -> bool {
        true
    }

    fn open_stream<'a>(
        &'a self,
        _request: ProxyRequest,
    ) -> ProviderFuture<'a, Result<ProxyResponse, ProviderError>> {
        Box::pin(async move {
            let first = stream::iter(vec![Ok(b"partial ".to_vec())]);
            let body: ProxyByteStream =
                Box::pin(futures_util::StreamExt::chain(first, stream::pending()));
            Ok(ProxyResponse::new(BodyFormat::PlainText, body))
        })
    }

    fn probe<'a>(&'a self, _request: ProxyRequest) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Default)]
struct Recorder {
    chunks: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
    errors: Mutex<Vec<ProviderError>>,
}

impl StreamCallbacks for Recorder {
    fn on_chunk(&self, text: &str) {
        self.chunks.lock().expect("chunks lock").push(text.to_string());
    }

    fn on_complete(&self, full_text: &str) {
        self.completed
            .lock()
            .expect("completed lock")
            .push(full_text.to_string());
    }

    fn on_error(&self, error: &ProviderError) {
        self.errors.lock().expect("errors lock").push(error.clone());
    }
}

#[tokio::test]
async fn event_stream_deltas_become_cumulative_chunks() {
    let transport = Arc::new(ScriptedTransport::new(
        BodyFormat::EventStream,
        &[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Ab\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"cd\"}}]}\n\ndata: {\"choices\"",
            ":[{\"delta\":{\"content\":\"ef\"}}]}\n\ndata: [DONE]\n\n",
        ],
    ));
    let provider = ProxyProvider::new(ProviderId::OpenAi, transport.clone());
    let recorder = Recorder::default();

    let text = provider
        .stream_generate(
            GenerationRequest::new("prompt", ""),
            &recorder,
            CancellationToken::new(),
        )
        .await
        .expect("stream should succeed");

    assert_eq!(text, "Abcdef");
    assert_eq!(
        *recorder.chunks.lock().expect("chunks lock"),
        vec!["Ab", "Abcd", "Abcdef"]
    );
    assert_eq!(*recorder.completed.lock().expect("completed lock"), vec!["Abcdef"]);
    assert!(recorder.errors.lock().expect("errors lock").is_empty());

    let requests = transport.requests.lock().expect("requests lock");
    assert_eq!(requests[0].model, "gpt-4");
}

#[tokio::test]
async fn raw_event_stream_text_keeps_the_spaces_between_words() {
    let transport = Arc::new(ScriptedTransport::new(
        BodyFormat::EventStream,
        &[
            "data: Rim\n\ndata:  direito\n",
            "\ndata:  normal.\n\ndata: [DONE]\n\n",
        ],
    ));
    let provider = ProxyProvider::new(ProviderId::OpenAi, transport);
    let recorder = Recorder::default();

    let text = provider
        .stream_generate(
            GenerationRequest::new("prompt", ""),
            &recorder,
            CancellationToken::new(),
        )
        .await
        .expect("stream should succeed");

    assert_eq!(text, "Rim direito normal.");
    assert_eq!(
        *recorder.chunks.lock().expect("chunks lock"),
        vec!["Rim", "Rim direito", "Rim direito normal."]
    );
    assert_eq!(
        *recorder.completed.lock().expect("completed lock"),
        vec!["Rim direito normal."]
    );
}

#[tokio::test]
async fn trailing_whitespace_is_trimmed_from_final_text_only() {
    let transport = Arc::new(ScriptedTransport::new(
        BodyFormat::PlainText,
        &["Sem alteracoes", ".\n\n"],
    ));
    let provider = ProxyProvider::new(ProviderId::Claude, transport);
    let recorder = Recorder::default();

    let text = provider
        .stream_generate(
            GenerationRequest::new("prompt", ""),
            &recorder,
            CancellationToken::new(),
        )
        .await
        .expect("stream should succeed");

    assert_eq!(text, "Sem alteracoes.");
    assert_eq!(
        recorder.chunks.lock().expect("chunks lock").last().map(String::as_str),
        Some("Sem alteracoes.\n\n")
    );
}

#[tokio::test]
async fn structured_mode_streams_only_the_named_field() {
    let transport = Arc::new(ScriptedTransport::new(
        BodyFormat::PlainText,
        &["{\"report\": \"Rim", " normal\", \"notes\": \"x\"}"],
    ));
    let provider =
        ProxyProvider::new(ProviderId::Gemini, transport.clone()).with_structured_field("report");
    let recorder = Recorder::default();

    let text = provider
        .stream_generate(
            GenerationRequest::new("prompt", ""),
            &recorder,
            CancellationToken::new(),
        )
        .await
        .expect("stream should succeed");

    assert_eq!(text, "Rim normal");
    assert_eq!(
        *recorder.chunks.lock().expect("chunks lock"),
        vec!["Rim", "Rim normal"]
    );
    assert!(transport.requests.lock().expect("requests lock")[0].json_response);
}

#[tokio::test]
async fn transport_errors_are_reported_once_through_on_error() {
    let transport = Arc::new(ScriptedTransport::failing(ProviderError::rate_limited(
        "slow down",
    )));
    let provider = ProxyProvider::new(ProviderId::OpenAi, transport);
    let recorder = Recorder::default();

    let error = provider
        .stream_generate(
            GenerationRequest::new("prompt", ""),
            &recorder,
            CancellationToken::new(),
        )
        .await
        .expect_err("stream should fail");

    assert_eq!(error.kind, ProviderErrorKind::RateLimited);
    assert_eq!(recorder.errors.lock().expect("errors lock").len(), 1);
    assert!(recorder.completed.lock().expect("completed lock").is_empty());
}

#[tokio::test]
async fn mid_stream_body_errors_stop_the_call() {
    let mut transport = ScriptedTransport::new(BodyFormat::PlainText, &["Ab"]);
    transport
        .chunks
        .push(Err(ProviderError::transport("connection reset")));
    let provider = ProxyProvider::new(ProviderId::OpenAi, Arc::new(transport));
    let recorder = Recorder::default();

    let error = provider
        .stream_generate(
            GenerationRequest::new("prompt", ""),
            &recorder,
            CancellationToken::new(),
        )
        .await
        .expect_err("stream should fail");

    assert!(error.is_transport());
    assert_eq!(*recorder.chunks.lock().expect("chunks lock"), vec!["Ab"]);
    assert_eq!(recorder.errors.lock().expect("errors lock").len(), 1);
}

#[tokio::test]
async fn cancellation_silences_the_call() {
    let provider = ProxyProvider::new(ProviderId::OpenAi, Arc::new(HangingTransport));
    let recorder = Arc::new(Recorder::default());
    let cancel = CancellationToken::new();

    let task = {
        let recorder = Arc::clone(&recorder);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            provider
                .stream_generate(GenerationRequest::new("prompt", ""), recorder.as_ref(), cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();
    let error = task
        .await
        .expect("task should join")
        .expect_err("cancelled call");

    assert_eq!(error.kind, ProviderErrorKind::Cancelled);
    assert_eq!(*recorder.chunks.lock().expect("chunks lock"), vec!["partial "]);
    assert!(recorder.completed.lock().expect("completed lock").is_empty());
    assert!(recorder.errors.lock().expect("errors lock").is_empty());
}

#[tokio::test]
async fn unconfigured_or_invalid_calls_fail_before_any_request() {
    let mut transport = ScriptedTransport::new(BodyFormat::PlainText, &["x"]);
    transport.configured = false;
    let transport = Arc::new(transport);
    let provider = ProxyProvider::new(ProviderId::Gemini, transport.clone());
    let recorder = Recorder::default();

    assert!(!provider.is_configured());
    let error = provider
        .stream_generate(
            GenerationRequest::new("prompt", ""),
            &recorder,
            CancellationToken::new(),
        )
        .await
        .expect_err("unconfigured provider");
    assert_eq!(error.kind, ProviderErrorKind::Configuration);
    assert!(transport.requests.lock().expect("requests lock").is_empty());
    assert!(!provider.test_connection().await);

    let configured = ProxyProvider::new(
        ProviderId::Gemini,
        Arc::new(ScriptedTransport::new(BodyFormat::PlainText, &["x"])),
    );
    let error = configured
        .stream_generate(
            GenerationRequest::new("   ", ""),
            &recorder,
            CancellationToken::new(),
        )
        .await
        .expect_err("empty prompt");
    assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
}

#[tokio::test]
async fn test_connection_sends_a_small_probe() {
    let transport = Arc::new(ScriptedTransport::new(BodyFormat::PlainText, &[]));
    let provider = ProxyProvider::new(ProviderId::Claude, transport.clone());

    assert!(provider.test_connection().await);
    let requests = transport.requests.lock().expect("requests lock");
    assert_eq!(requests[0].max_tokens, Some(10));
    assert!(!requests[0].stream);

    let mut down = ScriptedTransport::new(BodyFormat::PlainText, &[]);
    down.probe_ok = false;
    let provider = ProxyProvider::new(ProviderId::Claude, Arc::new(down));
    assert!(!provider.test_connection().await);
}
