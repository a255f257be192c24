//! End-to-end generate / generate_stream tests against a wiremock endpoint.

use std::time::{Duration, Instant};

use bifrost::{
    Bifrost, BifrostError, Content, ContentGenerator, FinishReason, GenerationConfig,
    GenerationRequest, GlmContentGenerator, Part, StreamEvent, ThinkingConfig,
};
use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn generator(server: &MockServer) -> GlmContentGenerator {
    Bifrost::builder()
        .api_key("test-key")
        .model("glm-4.6")
        .endpoint(server.uri())
        .build()
        .expect("generator")
}

async fn mount_json(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn sent_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    serde_json::from_slice(&requests.last().unwrap().body).unwrap()
}

fn scenario_response() -> Value {
    json!({
        "id": "resp-42",
        "model": "glm-4.6",
        "request_id": "req-abc",
        "usage": {
            "prompt_tokens": 20,
            "completion_tokens": 8,
            "total_tokens": 28,
            "reasoning_tokens": 2
        },
        "choices": [{
            "index": 0,
            "finish_reason": "tool_calls",
            "message": {
                "role": "assistant",
                "reasoning_content": [{"type": "text", "text": "thinking"}],
                "content": [{"type": "text", "text": "Hello world"}],
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "do_work", "arguments": "{\"path\":\"foo\"}"}
                }]
            }
        }]
    })
}

// ============================================================================
// Non-streaming
// ============================================================================

#[tokio::test]
async fn generate_translates_full_exchange() {
    let server = MockServer::start().await;
    mount_json(&server, scenario_response()).await;

    let request = GenerationRequest::new("glm-4.6", vec![Content::user("do the work")]);
    let response = generator(&server)
        .generate(&request, "req-abc")
        .await
        .expect("generate");

    assert_eq!(
        response.parts(),
        &[
            Part::thought("thinking"),
            Part::text("Hello world"),
            Part::function_call("call_1", "do_work", json!({"path": "foo"})),
        ]
    );
    let usage = response.usage_metadata.unwrap();
    assert_eq!(usage.thoughts_token_count, 2);
    assert!(usage.total_token_count >= usage.prompt_token_count + usage.candidates_token_count);
    assert_eq!(response.request_id.as_deref(), Some("req-abc"));
    assert_eq!(response.model_version.as_deref(), Some("glm-4.6"));
}

#[tokio::test]
async fn request_carries_auth_headers_and_thinking() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(header("accept", "application/json"))
        .and(body_partial_json(json!({
            "request_id": "req-hdr",
            "thinking": {"type": "enabled", "clear_thinking": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(scenario_response()))
        .expect(1)
        .mount(&server)
        .await;

    let request = GenerationRequest::new("glm-4.6", vec![Content::user("hi")]);
    generator(&server)
        .generate(&request, "req-hdr")
        .await
        .expect("generate");

    let received = server.received_requests().await.unwrap();
    let user_agent = received[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(user_agent.starts_with("bifrost/"), "user agent: {user_agent}");
}

#[tokio::test]
async fn empty_model_uses_configured_default() {
    let server = MockServer::start().await;
    mount_json(&server, scenario_response()).await;

    let request = GenerationRequest::new("", vec![Content::user("hi")]);
    generator(&server).generate(&request, "r").await.unwrap();

    assert_eq!(sent_body(&server).await["model"], "glm-4.6");
}

#[tokio::test]
async fn adapter_and_host_thinking_switches() {
    let server = MockServer::start().await;
    mount_json(&server, scenario_response()).await;

    let disabled = Bifrost::builder()
        .api_key("k")
        .endpoint(server.uri())
        .disable_thinking(true)
        .clear_thinking(false)
        .build()
        .unwrap();
    let request = GenerationRequest::new("glm-4.6", vec![Content::user("hi")]);
    disabled.generate(&request, "r1").await.unwrap();
    assert_eq!(
        sent_body(&server).await["thinking"],
        json!({"type": "disabled", "clear_thinking": false})
    );

    let host_declines = request
        .clone()
        .config(GenerationConfig::default().thinking(ThinkingConfig::no_thoughts()));
    generator(&server).generate(&host_declines, "r2").await.unwrap();
    assert_eq!(
        sent_body(&server).await["thinking"],
        json!({"type": "disabled", "clear_thinking": true})
    );
}

#[tokio::test]
async fn per_call_base_url_wins() {
    let configured = MockServer::start().await;
    let per_call = MockServer::start().await;
    mount_json(&per_call, scenario_response()).await;

    let request = GenerationRequest::new("glm-4.6", vec![Content::user("hi")])
        .config(GenerationConfig::default().base_url(per_call.uri()));
    generator(&configured)
        .generate(&request, "r")
        .await
        .expect("per-call endpoint");

    assert!(configured.received_requests().await.unwrap().is_empty());
    assert_eq!(per_call.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_json_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"choices\": [oops"))
        .mount(&server)
        .await;

    let request = GenerationRequest::new("glm-4.6", vec![Content::user("hi")]);
    let err = generator(&server).generate(&request, "r").await.unwrap_err();
    assert!(matches!(err, BifrostError::Protocol(_)), "{err}");
}

#[tokio::test]
async fn generate_resolves_to_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(scenario_response())
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let request = GenerationRequest::new("glm-4.6", vec![Content::user("hi")])
        .config(GenerationConfig::default().abort_signal(token.clone()));

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let err = generator(&server).generate(&request, "r").await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn concurrent_calls_do_not_interfere() {
    let server = MockServer::start().await;
    for id in ["req-a", "req-b"] {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"request_id": id})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"finish_reason": "stop", "message": {"content": format!("answer for {id}")}}]
            })))
            .mount(&server)
            .await;
    }

    let generator = generator(&server);
    let request = GenerationRequest::new("glm-4.6", vec![Content::user("hi")]);
    let (a, b) = tokio::join!(
        generator.generate(&request, "req-a"),
        generator.generate(&request, "req-b")
    );

    assert_eq!(a.unwrap().text(), "answer for req-a");
    assert_eq!(b.unwrap().text(), "answer for req-b");
}

// ============================================================================
// Streaming
// ============================================================================

#[tokio::test]
async fn generate_stream_two_record_scenario() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"id\":\"s1\",\"model\":\"glm-4.6\",\"choices\":[{\"delta\":{\"content\":[{\"type\":\"text\",\"text\":\"Hi\"}]},\"finish_reason\":null}]}\n\n",
        "data: {\"id\":\"s1\",\"model\":\"glm-4.6\",\"choices\":[{\"delta\":{\"tool_calls\":[{\"id\":\"call\",\"function\":{\"name\":\"plan\",\"arguments\":\"{\\\"x\\\":1}\"}}]},\"finish_reason\":\"stop\"}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("accept", "text/event-stream"))
        .and(body_partial_json(json!({"stream": true, "request_id": "req-s"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let request = GenerationRequest::new("glm-4.6", vec![Content::user("plan it")]);
    let events: Vec<StreamEvent> = generator(&server)
        .generate_stream(&request, "req-s")
        .await
        .expect("stream")
        .map(|event| event.expect("no stream errors"))
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].parts(), &[Part::text("Hi")]);
    assert_eq!(
        events[1].parts(),
        &[Part::function_call("call", "plan", json!({"x": 1}))]
    );
    assert!(matches!(
        events[2],
        StreamEvent::Finished {
            finish_reason: FinishReason::Stop,
            ..
        }
    ));
    let StreamEvent::Delta(first) = &events[0] else {
        panic!("expected delta");
    };
    assert_eq!(first.request_id.as_deref(), Some("req-s"));
}

#[tokio::test]
async fn stream_connection_can_be_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: {\"choices\":[]}\n\n", "text/event-stream")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    token.cancel();
    let request = GenerationRequest::new("glm-4.6", vec![Content::user("hi")])
        .config(GenerationConfig::default().abort_signal(token));

    let result = generator(&server).generate_stream(&request, "r").await;
    assert!(matches!(result, Err(BifrostError::Cancelled)));
}
