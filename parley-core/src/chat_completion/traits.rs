use async_trait::async_trait;
use dyn_clone::DynClone;
use futures_util::{StreamExt as _, stream};

use super::{
    chat_completion_request::ChatCompletionRequest,
    chat_completion_response::ChatCompletionResponse, errors::LanguageModelError,
    stream::ChatCompletionStream,
};

#[async_trait]
pub trait ChatCompletion: Send + Sync + DynClone {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LanguageModelError>;

    /// Streams the completion chunk by chunk
    ///
    /// Providers without streaming support yield the full completion as a single chunk.
    async fn complete_stream(&self, request: &ChatCompletionRequest) -> ChatCompletionStream {
        let response = self.complete(request).await.map(|mut response| {
            let message = response.message.take();
            response.append_message_delta(message.as_deref());
            response
        });

        stream::iter(vec![response]).boxed()
    }
}

#[async_trait]
impl ChatCompletion for Box<dyn ChatCompletion> {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LanguageModelError> {
        (**self).complete(request).await
    }

    async fn complete_stream(&self, request: &ChatCompletionRequest) -> ChatCompletionStream {
        (**self).complete_stream(request).await
    }
}

#[async_trait]
impl ChatCompletion for &dyn ChatCompletion {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LanguageModelError> {
        (**self).complete(request).await
    }

    async fn complete_stream(&self, request: &ChatCompletionRequest) -> ChatCompletionStream {
        (**self).complete_stream(request).await
    }
}

#[async_trait]
impl<T> ChatCompletion for &T
where
    T: ChatCompletion + Clone + 'static,
{
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LanguageModelError> {
        (**self).complete(request).await
    }

    async fn complete_stream(&self, request: &ChatCompletionRequest) -> ChatCompletionStream {
        (**self).complete_stream(request).await
    }
}

impl<LLM> From<&LLM> for Box<dyn ChatCompletion>
where
    LLM: ChatCompletion + Clone + 'static,
{
    fn from(llm: &LLM) -> Self {
        Box::new(llm.clone()) as Box<dyn ChatCompletion>
    }
}

dyn_clone::clone_trait_object!(ChatCompletion);

/// Counts tokens the way a specific model tokenizes text
#[async_trait]
pub trait CountTokens: Send + Sync {
    async fn count_tokens(&self, text: &str) -> Result<usize, LanguageModelError>;
}
