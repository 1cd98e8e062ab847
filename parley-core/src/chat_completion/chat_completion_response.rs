use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metadata::Metadata;

/// A generic response from chat completions
///
/// When streaming, the delta holds the text of the current chunk and `message` the text
/// accumulated so far.
#[derive(Clone, Builder, Debug, Serialize, Deserialize, PartialEq)]
#[builder(setter(strip_option, into), build_fn(error = anyhow::Error))]
pub struct ChatCompletionResponse {
    /// An identifier for the response
    ///
    /// Useful when streaming to make sure chunks can be mapped to the right response
    #[builder(private, default = Uuid::new_v4())]
    pub id: Uuid,

    #[builder(default)]
    pub message: Option<String>,

    /// Provider specific information about the generation, i.e. citations
    #[builder(default)]
    pub generation_info: Option<Metadata>,

    #[builder(default)]
    pub usage: Option<Usage>,

    /// Streaming response
    #[builder(default)]
    pub delta: Option<ChatCompletionResponseDelta>,
}

impl Default for ChatCompletionResponse {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            message: None,
            generation_info: None,
            usage: None,
            delta: None,
        }
    }
}

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionResponseDelta {
    pub message_chunk: Option<String>,
}

impl ChatCompletionResponse {
    pub fn builder() -> ChatCompletionResponseBuilder {
        ChatCompletionResponseBuilder::default()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The text of the current streaming chunk, if this is one
    pub fn message_chunk(&self) -> Option<&str> {
        self.delta
            .as_ref()
            .and_then(|delta| delta.message_chunk.as_deref())
    }

    pub fn generation_info(&self) -> Option<&Metadata> {
        self.generation_info.as_ref()
    }

    /// Adds a streaming chunk to the message and also the delta
    pub fn append_message_delta(&mut self, message_delta: Option<&str>) -> &mut Self {
        let Some(message_delta) = message_delta else {
            return self;
        };

        self.delta = Some(ChatCompletionResponseDelta {
            message_chunk: Some(message_delta.to_string()),
        });

        if let Some(message) = self.message.as_mut() {
            message.push_str(message_delta);
        } else {
            self.message = Some(message_delta.to_string());
        }
        self
    }
}

impl ChatCompletionResponseBuilder {
    pub fn maybe_message<T: Into<Option<String>>>(&mut self, message: T) -> &mut Self {
        self.message = Some(message.into());
        self
    }

    pub fn maybe_generation_info<T: Into<Option<Metadata>>>(
        &mut self,
        generation_info: T,
    ) -> &mut Self {
        self.generation_info = Some(generation_info.into());
        self
    }

    pub fn maybe_usage<T: Into<Option<Usage>>>(&mut self, usage: T) -> &mut Self {
        self.usage = Some(usage.into());
        self
    }
}
