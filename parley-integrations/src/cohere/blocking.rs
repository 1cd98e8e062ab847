//! Synchronous access to [`Cohere`] for callers without an async runtime
use std::sync::Arc;

use futures_util::StreamExt as _;
use parley_core::{
    ChatCompletion as _, CountTokens as _,
    chat_completion::{
        ChatCompletionRequest, ChatCompletionResponse, ChatCompletionStream,
        errors::LanguageModelError,
    },
};
use tokio::runtime::Runtime;

use super::{Cohere, CohereError};

/// Runs [`Cohere`] on a dedicated current-thread runtime
///
/// Every call blocks the calling thread until it completes. Do not use it from within an async
/// context; tokio panics when blocking inside a runtime.
#[derive(Debug, Clone)]
pub struct BlockingCohere {
    inner: Cohere,
    runtime: Arc<Runtime>,
}

impl BlockingCohere {
    /// # Errors
    ///
    /// Errors if the runtime cannot be started
    pub fn new(inner: Cohere) -> Result<Self, CohereError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    pub fn inner(&self) -> &Cohere {
        &self.inner
    }

    /// Completes a conversation, see [`parley_core::ChatCompletion::complete`]
    ///
    /// # Errors
    ///
    /// Errors if the request cannot be mapped or the api call fails
    pub fn generate(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LanguageModelError> {
        self.runtime.block_on(self.inner.complete(request))
    }

    /// Streams a completion; each call to `next` blocks until the next chunk arrives
    pub fn stream(&self, request: &ChatCompletionRequest) -> BlockingChatStream {
        let stream = self.runtime.block_on(self.inner.complete_stream(request));

        BlockingChatStream {
            stream,
            runtime: Arc::clone(&self.runtime),
        }
    }

    /// # Errors
    ///
    /// Errors if the tokenize call fails
    pub fn num_tokens(&self, text: &str) -> Result<usize, LanguageModelError> {
        self.runtime.block_on(self.inner.count_tokens(text))
    }
}

/// Iterator over the chunks of a streamed completion
///
/// Ends when the api closes the stream. It cannot be restarted.
pub struct BlockingChatStream {
    stream: ChatCompletionStream,
    runtime: Arc<Runtime>,
}

impl std::fmt::Debug for BlockingChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingChatStream").finish_non_exhaustive()
    }
}

impl Iterator for BlockingChatStream {
    type Item = Result<ChatCompletionResponse, LanguageModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}
