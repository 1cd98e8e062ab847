use parley_core::chat_completion::{ChatMessageKind, errors::LanguageModelError};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CohereError {
    #[error("unrecognized message kind for cohere chat: {0}")]
    UnrecognizedMessage(ChatMessageKind),

    #[error("cohere chat needs at least one message")]
    EmptyHistory,

    #[error("cohere api returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("failed to decode cohere payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid cohere api key header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to start blocking runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl CohereError {
    /// Cohere reports prompts that do not fit the model with a 400 and a message about tokens
    fn is_context_length_exceeded(&self) -> bool {
        match self {
            CohereError::Api { status, message } => {
                *status == StatusCode::BAD_REQUEST && message.contains("too many tokens")
            }
            _ => false,
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            CohereError::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            CohereError::Http(e) => match e.status() {
                Some(status) => status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
                None => !e.is_decode() && !e.is_builder(),
            },
            _ => false,
        }
    }
}

impl From<CohereError> for LanguageModelError {
    fn from(e: CohereError) -> Self {
        if e.is_context_length_exceeded() {
            LanguageModelError::context_length_exceeded(e)
        } else if e.is_transient() {
            tracing::warn!(error = %e, "Cohere transient error");
            LanguageModelError::transient(e)
        } else {
            tracing::error!(error = %e, "Cohere error");
            LanguageModelError::permanent(e)
        }
    }
}
