use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use newsbrief::llm::{GroundingChunk, LlmProvider, LlmRequest, LlmResponse};
use newsbrief::pipeline::{
    FailureKind, NewsOutcome, NewsPipeline, Source, CONNECTION_FAILED_SUMMARY, SYSTEM_INSTRUCTION,
    TIMEOUT_SUMMARY, UNAVAILABLE_SUMMARY,
};
use tokio::sync::Mutex;
use tokio::time::Instant;

enum Behavior {
    Respond(LlmResponse),
    Fail(&'static str),
    Hang,
}

struct StubProvider {
    behavior: Behavior,
    calls: AtomicUsize,
    last_request: Mutex<Option<LlmRequest>>,
}

impl StubProvider {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for StubProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().await = Some(request);
        match &self.behavior {
            Behavior::Respond(response) => Ok(response.clone()),
            Behavior::Fail(message) => Err(anyhow::anyhow!(*message)),
            Behavior::Hang => std::future::pending::<Result<LlmResponse>>().await,
        }
    }
}

fn text_response(text: &str, chunks: Vec<GroundingChunk>) -> LlmResponse {
    LlmResponse {
        text: Some(text.to_string()),
        grounding_chunks: chunks,
        model: "stub".to_string(),
    }
}

fn pipeline(stub: &Arc<StubProvider>) -> NewsPipeline {
    NewsPipeline::new(stub.clone(), Duration::from_secs(60))
}

#[tokio::test]
async fn ai_topic_returns_summary_and_two_sources() {
    let stub = StubProvider::new(Behavior::Respond(text_response(
        "**AI News**\n- story one\n- story two",
        vec![
            GroundingChunk::web(Some("https://one.example"), Some("One")),
            GroundingChunk::web(Some("https://two.example"), Some("Two")),
        ],
    )));

    let result = pipeline(&stub).fetch_news("AI").await;

    assert!(result.summary.starts_with("**AI News**"));
    assert_eq!(result.sources.len(), 2);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);

    let request = stub.last_request.lock().await.clone().unwrap();
    assert!(request.web_search);
    assert_eq!(request.system_instruction.as_deref(), Some(SYSTEM_INSTRUCTION));
    assert!(request.prompt.contains("\"AI\""));
}

#[tokio::test]
async fn duplicate_sources_collapse_in_order() {
    let stub = StubProvider::new(Behavior::Respond(text_response(
        "news",
        vec![
            GroundingChunk::web(Some("a"), Some("T1")),
            GroundingChunk::web(Some("a"), Some("T2")),
            GroundingChunk::web(Some("b"), Some("T3")),
        ],
    )));

    let result = pipeline(&stub).fetch_news("topic").await;

    assert_eq!(
        result.sources,
        vec![
            Source { title: "T1".into(), uri: "a".into() },
            Source { title: "T3".into(), uri: "b".into() },
        ]
    );
}

#[tokio::test]
async fn whitespace_text_falls_back_to_unavailable() {
    let stub = StubProvider::new(Behavior::Respond(text_response("  \n\t ", Vec::new())));
    let result = pipeline(&stub).fetch_news("topic").await;
    assert_eq!(result.summary, UNAVAILABLE_SUMMARY);

    let stub = StubProvider::new(Behavior::Respond(LlmResponse::default()));
    let result = pipeline(&stub).fetch_news("topic").await;
    assert_eq!(result.summary, UNAVAILABLE_SUMMARY);
}

#[tokio::test]
async fn unknown_error_becomes_connection_message() {
    let stub = StubProvider::new(Behavior::Fail("dns error: no such host"));
    let outcome = pipeline(&stub).fetch_outcome("topic").await;
    assert_eq!(outcome, NewsOutcome::Failure(FailureKind::Unknown));

    let result = outcome.into_result();
    assert_eq!(result.summary, CONNECTION_FAILED_SUMMARY);
    assert!(result.sources.is_empty());
}

#[tokio::test]
async fn provider_reporting_timeout_marker_is_a_timeout() {
    let stub = StubProvider::new(Behavior::Fail("API_TIMEOUT"));
    let outcome = pipeline(&stub).fetch_outcome("topic").await;
    assert_eq!(outcome, NewsOutcome::Failure(FailureKind::Timeout));
}

#[tokio::test(start_paused = true)]
async fn hanging_service_times_out_at_sixty_seconds() {
    let stub = StubProvider::new(Behavior::Hang);
    let start = Instant::now();

    let result = pipeline(&stub).fetch_news("topic").await;

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(60));
    assert!(elapsed < Duration::from_secs(61));
    assert_eq!(result.summary, TIMEOUT_SUMMARY);
    assert!(result.sources.is_empty());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_queries_are_independent() {
    let stub = StubProvider::new(Behavior::Respond(text_response(
        "shared",
        vec![GroundingChunk::web(Some("u"), Some("t"))],
    )));
    let pipeline = Arc::new(pipeline(&stub));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.fetch_news(&format!("topic {i}")).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap();
        assert_eq!(result.summary, "shared");
        assert_eq!(result.sources.len(), 1);
    }
    assert_eq!(stub.calls.load(Ordering::SeqCst), 4);
}
