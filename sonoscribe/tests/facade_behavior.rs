use std::sync::{Arc, Mutex};
use std::time::Duration;

use sonoscribe::prelude::*;
use sonoscribe::{
    CancellationToken, CumulativeText, GenerationRequest, ProviderFuture, TextProvider,
};

fn payload() -> ClinicalPayload {
    ClinicalPayload::new("Renal")
        .with_finding(
            ss_finding!("kidney-right", "cyst", "Simple cyst", severity = "Bosniak I")
                .with_instance(ss_instance!("c1", "diameter" => "14 mm")),
        )
        .with_normal_structure("bladder")
}

struct WordProvider;

impl TextProvider for WordProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn stream_generate<'a>(
        &'a self,
        request: GenerationRequest,
        callbacks: &'a dyn StreamCallbacks,
        cancel: CancellationToken,
    ) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let words = if request.prompt.contains("diameter: 14 mm") {
                "Simple right renal cyst. "
            } else {
                "Unexpected prompt. "
            };

            let mut text = CumulativeText::new();
            for word in words.split_inclusive(' ') {
                if cancel.is_cancelled() {
                    return Err(ProviderError::cancelled("cancelled"));
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                callbacks.on_chunk(text.push(word));
            }
            Ok(text.into_string().trim_end().to_string())
        })
    }

    fn test_connection<'a>(&'a self) -> ProviderFuture<'a, bool> {
        Box::pin(async { true })
    }
}

#[tokio::test(start_paused = true)]
async fn facade_runtime_drives_custom_providers_end_to_end() {
    let runtime = build_runtime(ScribeConfig::default()).expect("runtime should build");
    let orchestrator = ReportOrchestrator::builder()
        .runtime(runtime.calls.clone())
        .provider(WordProvider)
        .build()
        .expect("orchestrator should build");

    let chunks = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::new(Mutex::new(None));
    let callbacks = streaming_callbacks(
        {
            let chunks = Arc::clone(&chunks);
            move |text| chunks.lock().expect("chunks lock").push(text.to_string())
        },
        {
            let done = Arc::clone(&done);
            move |text| *done.lock().expect("done lock") = Some(text.to_string())
        },
        |_| {},
    );

    let key = orchestrator
        .generate_full_report(payload(), Arc::new(callbacks))
        .expect("generation should be scheduled");
    assert!(key.as_str().starts_with("report-openai-"));
    assert!(!is_busy(&orchestrator.status()));

    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(
        *chunks.lock().expect("chunks lock"),
        vec![
            "Simple ".to_string(),
            "Simple right ".to_string(),
            "Simple right renal ".to_string(),
            "Simple right renal cyst. ".to_string(),
        ]
    );
    assert_eq!(
        done.lock().expect("done lock").as_deref(),
        Some("Simple right renal cyst.")
    );
    assert_eq!(orchestrator.status().state, CallStatus::Idle);
}

#[tokio::test]
async fn unreachable_configuration_surfaces_as_a_configuration_error() {
    let mut config = ScribeConfig::default();
    config.endpoints[0].url = "not-a-url".to_string();
    let runtime = build_runtime(config).expect("runtime should build");
    let orchestrator = runtime.orchestrator().expect("orchestrator should build");
    assert_eq!(orchestrator.provider(), ProviderId::Gemini);

    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let callbacks =
        FnStreamCallbacks::new().with_error(move |error| sink.lock().expect("errors lock").push(error.kind));

    let error = orchestrator
        .generate_impression(payload(), Arc::new(callbacks))
        .expect_err("gemini endpoint is unusable");

    assert_eq!(error.kind, ProviderErrorKind::Configuration);
    assert_eq!(
        *errors.lock().expect("errors lock"),
        vec![ProviderErrorKind::Configuration]
    );
    assert_eq!(orchestrator.status().state, CallStatus::Error);
    assert!(!orchestrator.test_connection().await);

    orchestrator
        .set_provider(ProviderId::Claude)
        .expect("claude is registered");
    assert!(orchestrator.is_configured());
}

#[test]
fn environment_lookup_feeds_the_runtime() {
    let config = ScribeConfig::from_lookup(|key| match key {
        "SONOSCRIBE_PROVIDER" => Some("anthropic".to_string()),
        "SONOSCRIBE_DEBOUNCE_MS" => Some("100".to_string()),
        _ => None,
    })
    .expect("config should resolve");

    let runtime = build_runtime(config).expect("runtime should build");
    let orchestrator = runtime.orchestrator().expect("orchestrator should build");

    assert_eq!(orchestrator.provider(), ProviderId::Claude);
    assert_eq!(runtime.calls.settings().debounce, Duration::from_millis(100));
    assert_eq!(runtime.calls.status().snapshot().current_provider, ProviderId::Claude);
}
