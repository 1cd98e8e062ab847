use std::pin::Pin;

use futures_util::{Stream, StreamExt as _};

use super::{ChatCompletionResponse, errors::LanguageModelError, hooks::OnNewTokenFn};

/// A stream of chat completion chunks
pub type ChatCompletionStream =
    Pin<Box<dyn Stream<Item = Result<ChatCompletionResponse, LanguageModelError>> + Send>>;

/// Calls the hook with the text of every chunk that passes through the stream
///
/// Hook errors are logged and do not end the stream.
pub fn notify_new_tokens(
    stream: ChatCompletionStream,
    hook: Option<Box<dyn OnNewTokenFn>>,
) -> ChatCompletionStream {
    let Some(hook) = hook else {
        return stream;
    };

    stream
        .then(move |item| {
            let hook = hook.clone();
            async move {
                if let Ok(chunk) = &item
                    && let Some(token) = chunk.message_chunk()
                    && let Err(err) = hook(token, chunk).await
                {
                    tracing::warn!(error = ?err, "[ChatCompletion] on_new_token hook failed");
                }
                item
            }
        })
        .boxed()
}

/// Folds a stream of chunks into a single response
///
/// The message is the concatenation of all chunk deltas. Usage and generation info are taken
/// from the last chunk that carries them. The first error ends the fold.
///
/// # Errors
///
/// Returns the first error produced by the stream
pub async fn aggregate_stream(
    mut stream: ChatCompletionStream,
) -> Result<ChatCompletionResponse, LanguageModelError> {
    let mut aggregated = ChatCompletionResponse::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;

        if let Some(text) = chunk.message_chunk() {
            aggregated
                .message
                .get_or_insert_with(String::new)
                .push_str(text);
        }

        if chunk.usage.is_some() {
            aggregated.usage = chunk.usage;
        }

        if chunk.generation_info.is_some() {
            aggregated.generation_info = chunk.generation_info;
        }
    }

    Ok(aggregated)
}
