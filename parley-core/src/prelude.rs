pub use anyhow::{Context as _, Result};
pub use async_trait::async_trait;
pub use futures_util::{StreamExt as _, TryStreamExt as _};

pub use crate::chat_completion::{
    ChatCompletion, ChatCompletionRequest, ChatCompletionResponse, ChatCompletionStream,
    ChatMessage, CountTokens, aggregate_stream, errors::LanguageModelError,
};
pub use crate::{Document, Metadata};
