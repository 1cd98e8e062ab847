use async_trait::async_trait;
use futures_util::{StreamExt as _, future, stream};
use parley_core::{
    Metadata,
    chat_completion::{
        ChatCompletion, ChatCompletionRequest, ChatCompletionResponse, ChatCompletionStream,
        Usage, aggregate_stream, errors::LanguageModelError, notify_new_tokens,
    },
};
use serde_json::json;

use super::{
    Cohere, CohereError,
    types::{ChatResponse, StreamedChatEvent, TokenCount},
};

#[async_trait]
impl ChatCompletion for Cohere {
    #[tracing::instrument(skip_all, err)]
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LanguageModelError> {
        if self.default_options.streaming {
            return aggregate_stream(self.complete_stream(request).await).await;
        }

        let chat_request = self.chat_request(request)?;

        tracing::debug!(
            model = self.model_label(),
            messages = serde_json::to_string_pretty(&chat_request).unwrap_or_default(),
            "[ChatCompletion] Request to cohere"
        );

        let response = self.client.chat(&chat_request).await?;

        tracing::debug!(
            response = serde_json::to_string_pretty(&response).unwrap_or_default(),
            "[ChatCompletion] Response from cohere"
        );

        let completion = response_to_completion(response)?;

        #[cfg(feature = "metrics")]
        if let Some(usage) = &completion.usage {
            parley_core::metrics::emit_usage(
                self.model_label(),
                usage.prompt_tokens.into(),
                usage.completion_tokens.into(),
                usage.total_tokens.into(),
            );
        }

        Ok(completion)
    }

    #[tracing::instrument(skip_all)]
    async fn complete_stream(&self, request: &ChatCompletionRequest) -> ChatCompletionStream {
        let chat_request = match self.chat_request(request) {
            Ok(chat_request) => chat_request,
            Err(e) => return single_error(e),
        };

        tracing::debug!(
            model = self.model_label(),
            messages = serde_json::to_string_pretty(&chat_request).unwrap_or_default(),
            "[ChatCompletion] Streaming request to cohere"
        );

        let events = match self.client.chat_stream(&chat_request).await {
            Ok(events) => events,
            Err(e) => return single_error(e),
        };

        let mut accumulated = ChatCompletionResponse::default();
        let chunks = events.filter_map(move |event| {
            let chunk = match event {
                Ok(StreamedChatEvent::TextGeneration { text }) => {
                    accumulated.append_message_delta(Some(&text));
                    Some(Ok(accumulated.clone()))
                }
                Ok(event) => {
                    tracing::trace!(?event, "[ChatCompletion] Skipping cohere stream event");
                    None
                }
                Err(e) => Some(Err(LanguageModelError::from(e))),
            };

            future::ready(chunk)
        });

        notify_new_tokens(chunks.boxed(), request.on_new_token())
    }
}

fn single_error(error: CohereError) -> ChatCompletionStream {
    stream::iter(vec![Err(LanguageModelError::from(error))]).boxed()
}

/// Retrieval details are only attached when the response was grounded on documents
fn response_to_completion(
    response: ChatResponse,
) -> Result<ChatCompletionResponse, LanguageModelError> {
    let usage = response.token_count.as_ref().map(usage_from_token_count);

    let generation_info = response.documents.is_some().then(|| {
        Metadata::from([
            ("documents", json!(response.documents)),
            ("citations", json!(response.citations)),
            ("search_results", json!(response.search_results)),
            ("search_queries", json!(response.search_queries)),
            ("token_count", json!(response.token_count)),
        ])
    });

    Ok(ChatCompletionResponse::builder()
        .message(response.text)
        .maybe_generation_info(generation_info)
        .maybe_usage(usage)
        .build()?)
}

fn usage_from_token_count(token_count: &TokenCount) -> Usage {
    let prompt_tokens = token_count.prompt_tokens.unwrap_or_default();
    let completion_tokens = token_count.response_tokens.unwrap_or_default();

    Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens: token_count
            .total_tokens
            .unwrap_or(prompt_tokens.saturating_add(completion_tokens)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use futures_util::{StreamExt as _, TryStreamExt as _};
    use parley_core::{Document, chat_completion::ChatMessage};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    use super::*;
    use crate::cohere::{Client, CohereConfig};

    fn cohere(server: &MockServer) -> Cohere {
        Cohere::builder()
            .client(Client::with_config(
                CohereConfig::default()
                    .with_api_base(server.uri())
                    .with_api_key("test-key"),
            ))
            .default_prompt_model("command-r")
            .build()
            .unwrap()
    }

    fn conversation() -> ChatCompletionRequest {
        ChatCompletionRequest::builder()
            .messages(vec![
                ChatMessage::new_user("hi"),
                ChatMessage::new_assistant("hello"),
                ChatMessage::new_user("how are you"),
            ])
            .build()
            .unwrap()
    }

    fn ndjson(texts: &[&str]) -> String {
        let mut events = vec![json!({"event_type": "stream-start", "generation_id": "gen"})];
        events.extend(
            texts
                .iter()
                .map(|text| json!({"event_type": "text-generation", "text": text})),
        );
        events.push(json!({
            "event_type": "stream-end",
            "finish_reason": "COMPLETE",
            "response": {"text": texts.concat()}
        }));

        events
            .iter()
            .map(|event| format!("{event}\n"))
            .collect::<String>()
    }

    async fn mount_stream(server: &MockServer, texts: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(ndjson(texts), "application/stream+json"),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_usage_total_from_parts() {
        let usage = usage_from_token_count(&TokenCount {
            prompt_tokens: Some(3),
            response_tokens: Some(4),
            ..Default::default()
        });
        assert_eq!(usage.total_tokens, 7);

        let usage = usage_from_token_count(&TokenCount {
            prompt_tokens: Some(u32::MAX),
            response_tokens: Some(1),
            ..Default::default()
        });
        assert_eq!(usage.total_tokens, u32::MAX);
    }

    #[test_log::test(tokio::test)]
    async fn test_complete_without_documents() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({
                "message": "how are you",
                "chat_history": [
                    {"role": "User", "message": "hi"},
                    {"role": "Chatbot", "message": "hello"}
                ],
                "model": "command-r",
                "temperature": 0.75,
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "I am fine",
                "generation_id": "gen",
                "token_count": {"prompt_tokens": 10, "response_tokens": 3, "total_tokens": 13}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = cohere(&server).complete(&conversation()).await.unwrap();

        assert_eq!(response.message(), Some("I am fine"));
        assert!(response.generation_info().is_none());
        assert_eq!(
            response.usage,
            Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 3,
                total_tokens: 13
            })
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_complete_with_documents_attaches_generation_info() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({
                "documents": [{"snippet": "Parley is a chat adapter", "id": "doc-0"}],
                "prompt_truncation": "AUTO"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "A chat adapter",
                "documents": [{"id": "doc-0", "snippet": "Parley is a chat adapter"}],
                "citations": [{"start": 2, "end": 14, "document_ids": ["doc-0"]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatCompletionRequest::builder()
            .messages(vec![ChatMessage::new_user("What is parley?")])
            .documents(vec![Document::from("Parley is a chat adapter")])
            .build()
            .unwrap();

        let response = cohere(&server).complete(&request).await.unwrap();
        let generation_info = response.generation_info().unwrap();

        assert_eq!(
            generation_info.keys().collect::<Vec<_>>(),
            vec![
                "citations",
                "documents",
                "search_queries",
                "search_results",
                "token_count"
            ]
        );
        assert_eq!(
            generation_info.get("citations"),
            Some(&json!([{"start": 2, "end": 14, "document_ids": ["doc-0"]}]))
        );
        assert_eq!(generation_info.get("search_results"), Some(&Value::Null));
        assert!(response.usage.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_complete_stream_yields_deltas() {
        let server = MockServer::start().await;
        mount_stream(&server, &["a", "b", "c"]).await;

        let chunks = cohere(&server)
            .complete_stream(&conversation())
            .await
            .try_collect::<Vec<_>>()
            .await
            .unwrap();

        assert_eq!(
            chunks
                .iter()
                .map(|chunk| chunk.message_chunk().unwrap())
                .collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(chunks[2].message(), Some("abc"));
        assert!(chunks.iter().all(|chunk| chunk.id == chunks[0].id));
    }

    #[test_log::test(tokio::test)]
    async fn test_complete_stream_calls_token_hook() {
        let server = MockServer::start().await;
        mount_stream(&server, &["a", "b", "c"]).await;

        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let captured = seen.clone();

        let request = ChatCompletionRequest::builder()
            .messages(vec![ChatMessage::new_user("say abc")])
            .on_new_token(move |token, _chunk| {
                captured.lock().unwrap().push(token.to_string());
                Box::pin(async { Ok(()) })
            })
            .build()
            .unwrap();

        let response = aggregate_stream(cohere(&server).complete_stream(&request).await)
            .await
            .unwrap();

        assert_eq!(response.message(), Some("abc"));
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_streaming_option_aggregates() {
        let server = MockServer::start().await;
        mount_stream(&server, &["Hel", "lo", "!"]).await;

        let mut cohere = cohere(&server);
        cohere.default_options.streaming = true;

        let response = cohere.complete(&conversation()).await.unwrap();

        assert_eq!(response.message(), Some("Hello!"));
        assert!(response.delta.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_request_parameters_take_precedence() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({
                "model": "command-r-plus",
                "temperature": 0.0,
                "max_tokens": 20
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatCompletionRequest::builder()
            .messages(vec![ChatMessage::new_user("hi")])
            .parameter("model", "command-r-plus")
            .parameter("temperature", 0.0)
            .parameter("max_tokens", 20)
            .build()
            .unwrap();

        let response = cohere(&server).complete(&request).await.unwrap();
        assert_eq!(response.message(), Some("ok"));
    }

    #[test_log::test(tokio::test)]
    async fn test_api_errors_are_kept_as_source() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "invalid api token"})),
            )
            .mount(&server)
            .await;

        let err = cohere(&server).complete(&conversation()).await.unwrap_err();

        assert!(matches!(err, LanguageModelError::PermanentError(_)));
        assert!(matches!(
            err.inner().downcast_ref::<CohereError>(),
            Some(CohereError::Api { message, .. }) if message == "invalid api token"
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_unrecognized_message_fails_before_any_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let request = ChatCompletionRequest::builder()
            .messages(vec![
                ChatMessage::new_tool_output("call_1", "42"),
                ChatMessage::new_user("and?"),
            ])
            .build()
            .unwrap();

        let err = cohere(&server).complete(&request).await.unwrap_err();
        assert!(matches!(err, LanguageModelError::PermanentError(_)));

        let mut chunks = cohere(&server).complete_stream(&request).await;
        assert!(chunks.next().await.unwrap().is_err());
        assert!(chunks.next().await.is_none());
    }
}
