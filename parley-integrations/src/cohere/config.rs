use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;

use super::CohereError;

const COHERE_API_BASE: &str = "https://api.cohere.ai/v1";
const CLIENT_NAME: &str = "parley";

/// Connection settings for the Cohere api
///
/// By default the api key is read from the `COHERE_API_KEY` environment variable.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CohereConfig {
    api_base: String,
    api_key: SecretString,
}

impl Default for CohereConfig {
    fn default() -> Self {
        Self {
            api_base: COHERE_API_BASE.to_string(),
            api_key: std::env::var("COHERE_API_KEY")
                .unwrap_or_else(|_| String::new())
                .into(),
        }
    }
}

impl CohereConfig {
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key: String = api_key.into();
        self.api_key = api_key.into();
        self
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    /// Headers sent with every request
    ///
    /// # Errors
    ///
    /// Errors if the api key cannot be used as a header value
    pub fn headers(&self) -> Result<HeaderMap, CohereError> {
        let mut headers = HeaderMap::new();

        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))?;
        authorization.set_sensitive(true);

        headers.insert(AUTHORIZATION, authorization);
        headers.insert("X-Client-Name", HeaderValue::from_static(CLIENT_NAME));

        Ok(headers)
    }
}
