//! A thin async client for the Cohere chat and tokenize endpoints
//!
//! Only transport and authentication live here. Mapping from and to generic chat types happens
//! in the `request` and `chat_completion` modules.
use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use futures_util::{Stream, StreamExt as _, TryStreamExt as _};
use pin_project::pin_project;
use serde_json::json;

use super::{
    CohereError,
    config::CohereConfig,
    types::{ChatRequest, ChatResponse, StreamedChatEvent, TokenizeResponse},
};

pub type ChatEventStream =
    Pin<Box<dyn Stream<Item = Result<StreamedChatEvent, CohereError>> + Send>>;

#[derive(Debug, Clone, Default)]
pub struct Client {
    http: reqwest::Client,
    config: CohereConfig,
}

impl Client {
    pub fn with_config(config: CohereConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Use a preconfigured `reqwest::Client`, i.e. with custom timeouts or a proxy
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn config(&self) -> &CohereConfig {
        &self.config
    }

    /// Sends a chat request and waits for the full response
    ///
    /// # Errors
    ///
    /// Errors if the request fails, the api returns an error status or the response cannot be
    /// decoded
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, CohereError> {
        let mut payload = request.to_payload()?;
        payload.insert("stream".into(), json!(false));

        let response = self.post("/chat", &payload).await?;
        let body = response.bytes().await?;

        Ok(serde_json::from_slice(&body)?)
    }

    /// Sends a chat request in streaming mode
    ///
    /// Resolves once the response headers are in. Events are decoded lazily as the body
    /// arrives; the stream ends when the body does.
    ///
    /// # Errors
    ///
    /// Errors if the request fails or the api returns an error status. Decoding errors surface
    /// as items of the stream.
    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<ChatEventStream, CohereError> {
        let mut payload = request.to_payload()?;
        payload.insert("stream".into(), json!(true));

        let response = self.post("/chat", &payload).await?;

        Ok(NdjsonLines::new(response.bytes_stream())
            .and_then(|line| async move {
                serde_json::from_str::<StreamedChatEvent>(&line).map_err(CohereError::from)
            })
            .boxed())
    }

    /// Splits text into tokens the way `model` does, or the default model if none is given
    ///
    /// # Errors
    ///
    /// Errors if the request fails or the response cannot be decoded
    pub async fn tokenize(
        &self,
        text: &str,
        model: Option<&str>,
    ) -> Result<TokenizeResponse, CohereError> {
        let mut payload = serde_json::Map::new();
        payload.insert("text".into(), json!(text));
        if let Some(model) = model {
            payload.insert("model".into(), json!(model));
        }

        let response = self.post("/tokenize", &payload).await?;
        let body = response.bytes().await?;

        Ok(serde_json::from_slice(&body)?)
    }

    async fn post(
        &self,
        path: &str,
        payload: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<reqwest::Response, CohereError> {
        let response = self
            .http
            .post(self.config.url(path))
            .headers(self.config.headers()?)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("message")?.as_str().map(ToString::to_string))
            .unwrap_or(body);

        Err(CohereError::Api { status, message })
    }
}

/// Splits a byte stream into trimmed, non-empty lines
///
/// Bytes are buffered until a newline arrives, so chunks may split lines (and utf8 characters)
/// anywhere. A trailing line without newline is yielded when the inner stream ends.
#[pin_project]
pub struct NdjsonLines<S> {
    #[pin]
    inner: S,
    buffer: Vec<u8>,
    finished: bool,
}

impl<S> NdjsonLines<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            finished: false,
        }
    }
}

impl<S, B, E> Stream for NdjsonLines<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<CohereError>,
{
    type Item = Result<String, CohereError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(pos) = this.buffer.iter().position(|byte| *byte == b'\n') {
                let line = this.buffer.drain(..=pos).collect::<Vec<_>>();
                let line = String::from_utf8_lossy(&line);
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }
                return Poll::Ready(Some(Ok(line.to_string())));
            }

            if *this.finished {
                let rest = std::mem::take(this.buffer);
                let rest = String::from_utf8_lossy(&rest).trim().to_string();

                return Poll::Ready((!rest.is_empty()).then_some(Ok(rest)));
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => this.buffer.extend_from_slice(bytes.as_ref()),
                Some(Err(e)) => return Poll::Ready(Some(Err(e.into()))),
                None => *this.finished = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use pretty_assertions::assert_eq;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    use super::*;

    fn client(server: &MockServer) -> Client {
        Client::with_config(
            CohereConfig::default()
                .with_api_base(server.uri())
                .with_api_key("test-key"),
        )
    }

    #[test_log::test(tokio::test)]
    async fn test_ndjson_lines_across_chunk_boundaries() {
        let chunks: Vec<Result<&[u8], CohereError>> = vec![
            Ok(b"{\"a\":".as_slice()),
            Ok(b"1}\n\n{\"b\":2}\n{\"c\"".as_slice()),
            Ok(b":3}".as_slice()),
        ];

        let lines = NdjsonLines::new(stream::iter(chunks))
            .try_collect::<Vec<_>>()
            .await
            .unwrap();

        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"b":2}"#, r#"{"c":3}"#]);
    }

    #[test_log::test(tokio::test)]
    async fn test_ndjson_lines_split_utf8() {
        let crab = "🦀\n".as_bytes();
        let chunks: Vec<Result<&[u8], CohereError>> = vec![Ok(&crab[..2]), Ok(&crab[2..])];

        let lines = NdjsonLines::new(stream::iter(chunks))
            .try_collect::<Vec<_>>()
            .await
            .unwrap();

        assert_eq!(lines, vec!["🦀"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_chat_sends_payload_and_auth() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({"message": "hi", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hello"})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest {
            message: "hi".into(),
            ..Default::default()
        };
        let response = client(&server).chat(&request).await.unwrap();

        assert_eq!(response.text, "hello");
    }

    #[test_log::test(tokio::test)]
    async fn test_api_errors_carry_status_and_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(json!({"message": "rate limited"})),
            )
            .mount(&server)
            .await;

        let request = ChatRequest {
            message: "hi".into(),
            ..Default::default()
        };
        let err = client(&server).chat(&request).await.unwrap_err();

        let CohereError::Api { status, message } = err else {
            panic!("expected an api error, got {err:?}");
        };
        assert_eq!(status, reqwest::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(message, "rate limited");
    }

    #[test_log::test(tokio::test)]
    async fn test_chat_stream_decodes_events() {
        let server = MockServer::start().await;

        let body = [
            json!({"event_type": "stream-start", "generation_id": "g"}),
            json!({"event_type": "text-generation", "text": "Hel"}),
            json!({"event_type": "text-generation", "text": "lo"}),
            json!({"event_type": "stream-end", "finish_reason": "COMPLETE"}),
        ]
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");

        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let request = ChatRequest {
            message: "hi".into(),
            ..Default::default()
        };
        let events = client(&server)
            .chat_stream(&request)
            .await
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap();

        assert_eq!(events.len(), 4);
        assert_eq!(
            events[1],
            StreamedChatEvent::TextGeneration { text: "Hel".into() }
        );
        assert!(matches!(events[3], StreamedChatEvent::StreamEnd { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_tokenize() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tokenize"))
            .and(body_partial_json(json!({"text": "tokenize me", "model": "command"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tokens": [10002, 2261, 2012],
                "token_strings": ["token", "ize", " me"]
            })))
            .mount(&server)
            .await;

        let response = client(&server)
            .tokenize("tokenize me", Some("command"))
            .await
            .unwrap();

        assert_eq!(response.tokens.len(), 3);
        assert_eq!(response.token_strings[1], "ize");
    }
}
