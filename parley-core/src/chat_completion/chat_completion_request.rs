use derive_builder::Builder;

use crate::document::Document;

use super::{chat_message::ChatMessage, hooks::OnNewTokenFn};

/// A chat completion request represents a conversation that can be send to any LLM.
///
/// The last message is the current turn, everything before it is history. Messages are kept as
/// given; providers decide which kinds they can express.
///
/// `parameters` are passed through to the provider as-is and take precedence over anything the
/// provider computes itself.
#[derive(Builder, Clone)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
pub struct ChatCompletionRequest {
    messages: Vec<ChatMessage>,

    /// Stop sequences. Accepted for interface compatibility, providers may ignore them.
    #[builder(default)]
    stop: Vec<String>,

    /// Retrieval documents to ground the completion on
    #[builder(default)]
    documents: Option<Vec<Document>>,

    /// Free-form provider parameters, i.e. `temperature`
    #[builder(default, setter(custom))]
    parameters: serde_json::Map<String, serde_json::Value>,

    #[builder(default, setter(custom))]
    on_new_token: Option<Box<dyn OnNewTokenFn>>,
}

impl std::fmt::Debug for ChatCompletionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionRequest")
            .field("messages", &self.messages)
            .field("stop", &self.stop)
            .field("documents", &self.documents)
            .field("parameters", &self.parameters)
            .field("on_new_token", &self.on_new_token.is_some())
            .finish()
    }
}

impl ChatCompletionRequest {
    pub fn builder() -> ChatCompletionRequestBuilder {
        ChatCompletionRequestBuilder::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn stop(&self) -> &[String] {
        &self.stop
    }

    pub fn documents(&self) -> Option<&[Document]> {
        self.documents.as_deref()
    }

    pub fn parameters(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.parameters
    }

    /// The hook to call for every streamed chunk, if any
    pub fn on_new_token(&self) -> Option<Box<dyn OnNewTokenFn>> {
        self.on_new_token.clone()
    }
}

impl ChatCompletionRequestBuilder {
    /// Adds a single passthrough parameter
    pub fn parameter(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> &mut Self {
        self.parameters
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replaces all passthrough parameters
    pub fn parameters(
        &mut self,
        parameters: serde_json::Map<String, serde_json::Value>,
    ) -> &mut Self {
        self.parameters = Some(parameters);
        self
    }

    /// Sets a hook that is called for every streamed chunk
    pub fn on_new_token(&mut self, hook: impl OnNewTokenFn + 'static) -> &mut Self {
        self.on_new_token = Some(Some(Box::new(hook)));
        self
    }

    fn validate(&self) -> Result<(), String> {
        match &self.messages {
            Some(messages) if messages.is_empty() => {
                Err("a chat completion request needs at least one message".to_string())
            }
            _ => Ok(()),
        }
    }
}
