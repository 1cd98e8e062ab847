use thiserror::Error;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by language model providers
///
/// The variants only label the failure. The provider error is kept as the source, so callers can
/// downcast to inspect the vendor's own error.
#[derive(Error, Debug)]
pub enum LanguageModelError {
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(BoxedError),
    #[error("Permanent error: {0}")]
    PermanentError(BoxedError),
    #[error("Transient error: {0}")]
    TransientError(BoxedError),
}

impl LanguageModelError {
    pub fn permanent(e: impl Into<BoxedError>) -> Self {
        LanguageModelError::PermanentError(e.into())
    }

    pub fn transient(e: impl Into<BoxedError>) -> Self {
        LanguageModelError::TransientError(e.into())
    }

    pub fn context_length_exceeded(e: impl Into<BoxedError>) -> Self {
        LanguageModelError::ContextLengthExceeded(e.into())
    }

    /// The underlying error reported by the provider
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            LanguageModelError::ContextLengthExceeded(e)
            | LanguageModelError::PermanentError(e)
            | LanguageModelError::TransientError(e) => e.as_ref(),
        }
    }
}

impl From<anyhow::Error> for LanguageModelError {
    fn from(e: anyhow::Error) -> Self {
        LanguageModelError::PermanentError(e.into())
    }
}
