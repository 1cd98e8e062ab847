use std::{future::Future, pin::Pin};

use anyhow::Result;
use dyn_clone::DynClone;

use super::ChatCompletionResponse;

/// Called for every streamed chunk with the new text and the chunk itself
///
/// Hooks are notifications. An error returned by a hook is logged and otherwise ignored.
///
/// # Example
///
/// ```
/// # use parley_core::chat_completion::{ChatCompletionRequest, ChatMessage};
/// ChatCompletionRequest::builder()
///     .messages(vec![ChatMessage::new_user("Hello")])
///     .on_new_token(|token, _chunk| {
///         print!("{token}");
///         Box::pin(async { Ok(()) })
///     })
///     .build()
///     .unwrap();
/// ```
pub trait OnNewTokenFn:
    for<'a> Fn(
        &'a str,
        &'a ChatCompletionResponse,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>
    + Send
    + Sync
    + DynClone
{
}

dyn_clone::clone_trait_object!(OnNewTokenFn);

impl<F> OnNewTokenFn for F where
    F: for<'a> Fn(
            &'a str,
            &'a ChatCompletionResponse,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>
        + Send
        + Sync
        + DynClone
{
}
