//! [`GlmContentGenerator`]: the [`ContentGenerator`] façade over the vendor.

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::StreamExt;
use metrics::{counter, histogram};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::client::{EndpointClient, Endpoints};
use crate::convert::{StreamAssembler, from_chat_response, to_chat_request};
use crate::stream::{EventStream, decode_chunks, event_stream};
use crate::telemetry::{REQUEST_DURATION_SECONDS, TOKENS_TOTAL};
use crate::thinking::ThinkingPolicy;
use crate::traits::ContentGenerator;
use crate::types::{GenerationRequest, GenerationResponse, StreamEvent, UsageMetadata};
use crate::wire::ChatCompletionRequest;
use crate::{BifrostError, Result};

/// Content generator backed by a GLM chat-completions endpoint.
///
/// Holds only immutable configuration; every call builds its own request,
/// endpoint pair and stream state.
#[derive(Debug, Clone)]
pub struct GlmContentGenerator {
    client: EndpointClient,
    model: String,
    thinking: ThinkingPolicy,
}

impl GlmContentGenerator {
    pub(crate) fn new(client: EndpointClient, model: String, thinking: ThinkingPolicy) -> Self {
        Self {
            client,
            model,
            thinking,
        }
    }

    /// Default model for requests that leave `model` empty
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoints used when a call carries no per-call override
    pub fn endpoints(&self) -> &Endpoints {
        self.client.endpoints()
    }

    pub fn thinking_policy(&self) -> ThinkingPolicy {
        self.thinking
    }

    fn prepare(
        &self,
        request: &GenerationRequest,
        request_id: &str,
        stream: bool,
    ) -> Result<(ChatCompletionRequest, Endpoints)> {
        let mut body = to_chat_request(request, request_id, &self.thinking, stream)?;
        if body.model.trim().is_empty() {
            body.model = self.model.clone();
        }
        let per_call = request
            .config
            .http_options
            .as_ref()
            .and_then(|options| options.base_url.as_deref());
        let endpoints = self.client.endpoints_for(per_call)?;
        Ok((body, endpoints))
    }
}

#[async_trait]
impl ContentGenerator for GlmContentGenerator {
    #[instrument(
        name = "bifrost.generate",
        skip_all,
        fields(model = %request.model, request_id = %request_id)
    )]
    async fn generate(
        &self,
        request: &GenerationRequest,
        request_id: &str,
    ) -> Result<GenerationResponse> {
        let start = Instant::now();
        let (body, endpoints) = self.prepare(request, request_id, false)?;

        let call = async {
            let response = self.client.send_json(&body, &endpoints).await?;
            from_chat_response(response, request_id)
        };
        let result = until_cancelled(request.config.abort_signal.as_ref(), call).await;

        histogram!(REQUEST_DURATION_SECONDS, "operation" => "generate")
            .record(start.elapsed().as_secs_f64());
        if let Some(usage) = result.as_ref().ok().and_then(|r| r.usage_metadata) {
            record_usage(&usage);
        }
        result
    }

    #[instrument(
        name = "bifrost.generate_stream",
        skip_all,
        fields(model = %request.model, request_id = %request_id)
    )]
    async fn generate_stream(
        &self,
        request: &GenerationRequest,
        request_id: &str,
    ) -> Result<EventStream> {
        let start = Instant::now();
        let (body, endpoints) = self.prepare(request, request_id, true)?;
        let abort = request.config.abort_signal.clone();

        let bytes = until_cancelled(
            abort.as_ref(),
            self.client.send_stream(&body, &endpoints),
        )
        .await;

        histogram!(REQUEST_DURATION_SECONDS, "operation" => "generate_stream")
            .record(start.elapsed().as_secs_f64());

        let events = event_stream(
            decode_chunks(bytes?),
            StreamAssembler::new(request_id),
            abort,
        )
        .inspect(|item| {
            if let Ok(StreamEvent::Finished {
                usage_metadata: Some(usage),
                ..
            }) = item
            {
                record_usage(usage);
            }
        });
        Ok(Box::pin(events))
    }
}

/// Race `fut` against the caller's abort signal, if any.
async fn until_cancelled<T>(
    signal: Option<&CancellationToken>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match signal {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(BifrostError::Cancelled),
            result = fut => result,
        },
        None => fut.await,
    }
}

fn record_usage(usage: &UsageMetadata) {
    counter!(TOKENS_TOTAL, "direction" => "prompt")
        .increment(u64::from(usage.prompt_token_count));
    counter!(TOKENS_TOTAL, "direction" => "candidates")
        .increment(u64::from(usage.candidates_token_count));
    counter!(TOKENS_TOTAL, "direction" => "thoughts")
        .increment(u64::from(usage.thoughts_token_count));
}
