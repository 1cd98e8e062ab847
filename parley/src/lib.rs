//! # Parley
//!
//! Parley puts Cohere's chat api behind a generic chat completion interface. Conversations are
//! built from role-tagged [`chat_completion::ChatMessage`]s, optionally grounded on retrieval
//! [`Document`]s, and completed in one go or streamed chunk by chunk.
//!
//! - Async completion and streaming via [`ChatCompletion`]
//! - Blocking completion and streaming for callers without a runtime
//! - Token counting via [`CountTokens`]
//! - `tracing` for logging, optional `metrics` for token usage
//!
//! ## Example
//!
//! ```no_run
//! # use parley::prelude::*;
//! # use parley::integrations::cohere::Cohere;
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let cohere = Cohere::builder().default_prompt_model("command-r").build()?;
//!
//! let request = ChatCompletionRequest::builder()
//!     .messages(vec![
//!         ChatMessage::new_system("You answer in one sentence"),
//!         ChatMessage::new_user("What is retrieval augmented generation?"),
//!     ])
//!     .build()?;
//!
//! let response = cohere.complete(&request).await?;
//! println!("{}", response.message().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
#![doc = document_features::document_features!()]

#[doc(inline)]
pub use parley_core::{ChatCompletion, CountTokens, Document, Metadata};

#[doc(inline)]
pub use async_trait::async_trait;

/// Generic chat completion types, errors and streaming helpers
pub mod chat_completion {
    #[doc(inline)]
    pub use parley_core::chat_completion::*;
}

/// Integrations with language model providers
pub mod integrations {
    #[doc(inline)]
    pub use parley_integrations::*;
}

/// Commonly used types and traits
pub mod prelude {
    #[doc(inline)]
    pub use parley_core::prelude::*;
}
