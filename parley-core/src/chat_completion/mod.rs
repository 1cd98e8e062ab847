//! This module enables the implementation of chat completion on LLM providers
//!
//! The main trait to implement is `ChatCompletion`, which takes a `ChatCompletionRequest` and
//! returns a `ChatCompletionResponse`, or a `ChatCompletionStream` of chunks when streaming.
//!
//! A chat completion request is comprised of a list of `ChatMessage` to complete, optionally with
//! retrieval documents and provider parameters.
mod chat_completion_request;
mod chat_completion_response;
mod chat_message;
pub mod errors;
mod hooks;
mod stream;

// Re-exported in the root per convention
pub mod traits;

pub use chat_completion_request::*;
pub use chat_completion_response::*;
pub use chat_message::*;
pub use hooks::*;
pub use stream::*;
pub use traits::*;
