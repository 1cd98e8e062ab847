use async_trait::async_trait;
use parley_core::{CountTokens, chat_completion::errors::LanguageModelError};

use super::Cohere;

#[async_trait]
impl CountTokens for Cohere {
    /// Counts tokens with Cohere's tokenizer for the configured model
    #[tracing::instrument(skip_all, err)]
    async fn count_tokens(&self, text: &str) -> Result<usize, LanguageModelError> {
        let response = self
            .client
            .tokenize(text, self.default_options.prompt_model.as_deref())
            .await?;

        Ok(response.tokens.len())
    }
}
