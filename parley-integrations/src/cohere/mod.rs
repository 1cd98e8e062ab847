//! This module provides integration with Cohere's chat api.
//!
//! It includes the `Cohere` struct for managing the api client and default options, implementing
//! [`parley_core::ChatCompletion`] and [`parley_core::CountTokens`]. For callers without an async
//! runtime, [`BlockingCohere`] offers the same operations synchronously.
//!
//! The module is conditionally compiled based on the "cohere" feature flag.
use std::sync::Arc;

use derive_builder::Builder;
use parley_core::{Metadata, chat_completion::ChatCompletionRequest};
use serde_json::{Map, Value, json};

mod blocking;
mod chat_completion;
mod client;
mod config;
mod errors;
mod request;
mod tokenize;
mod types;

pub use blocking::{BlockingChatStream, BlockingCohere};
pub use client::{ChatEventStream, Client, NdjsonLines};
pub use config::CohereConfig;
pub use errors::CohereError;
pub use request::{build_chat_request, chat_role};
pub use types::*;

const LLM_TYPE: &str = "cohere-chat";
const DEFAULT_TEMPERATURE: f64 = 0.75;

/// The `Cohere` struct encapsulates a Cohere client and the default options used for every
/// request.
///
/// By default it will look for a `COHERE_API_KEY` environment variable. Without a prompt model,
/// Cohere picks its own default model.
///
/// Retrieval documents on a request take precedence over connectors; a request never sends both.
///
/// # Example
///
/// ```no_run
/// # use parley_integrations::cohere::Cohere;
/// let cohere = Cohere::builder()
///     .default_prompt_model("command-r")
///     .connectors(["web-search"])
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Builder, Clone)]
#[builder(setter(into, strip_option))]
pub struct Cohere {
    /// The Cohere client, wrapped in an `Arc` so clones share connections
    #[builder(default = "default_client()", setter(custom))]
    client: Arc<Client>,
    /// Default options for every request
    #[builder(default)]
    default_options: Options,
}

impl Default for Cohere {
    fn default() -> Self {
        Self {
            client: default_client(),
            default_options: Options::default(),
        }
    }
}

#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option))]
pub struct Options {
    /// The model to chat with, Cohere's default if not set
    #[builder(default)]
    pub prompt_model: Option<String>,

    #[builder(default = "Some(DEFAULT_TEMPERATURE)")]
    pub temperature: Option<f64>,

    /// Retrieval sources to use when a request has no documents
    #[builder(default)]
    pub connectors: Option<Vec<Connector>>,

    /// Generate by streaming and aggregating the chunks
    #[builder(default)]
    pub streaming: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            prompt_model: None,
            temperature: Some(DEFAULT_TEMPERATURE),
            connectors: None,
            streaming: false,
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }
}

impl Cohere {
    pub fn builder() -> CohereBuilder {
        CohereBuilder::default()
    }

    /// Sets a default prompt model to use when chatting
    pub fn with_default_prompt_model(&mut self, model: impl Into<String>) -> &mut Self {
        self.default_options.prompt_model = Some(model.into());
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn default_options(&self) -> &Options {
        &self.default_options
    }

    pub fn llm_type(&self) -> &'static str {
        LLM_TYPE
    }

    /// Parameters that identify this model configuration, i.e. for caching or tracing
    pub fn identifying_params(&self) -> Metadata {
        Metadata::from([
            ("model", json!(self.default_options.prompt_model)),
            ("temperature", json!(self.default_options.temperature)),
        ])
    }

    /// Parameters sent with every request unless the request overrides them
    pub fn default_parameters(&self) -> Map<String, Value> {
        let mut parameters = Map::new();

        if let Some(model) = &self.default_options.prompt_model {
            parameters.insert("model".into(), json!(model));
        }

        if let Some(temperature) = self.default_options.temperature {
            parameters.insert("temperature".into(), json!(temperature));
        }

        parameters
    }

    /// Builds the Cohere request for a generic chat completion request
    ///
    /// Request parameters override the defaults. A `connectors` parameter replaces the default
    /// connectors, `null` disables them.
    pub(crate) fn chat_request(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatRequest, CohereError> {
        if !request.stop().is_empty() {
            tracing::debug!(stop = ?request.stop(), "Cohere chat does not support stop sequences");
        }

        let mut parameters = self.default_parameters();
        parameters.extend(request.parameters().clone());

        let connectors = match parameters.remove("connectors") {
            Some(Value::Null) => None,
            Some(connectors) => Some(serde_json::from_value::<Vec<Connector>>(connectors)?),
            None => self.default_options.connectors.clone(),
        };

        build_chat_request(
            request.messages(),
            request.documents(),
            connectors.as_deref(),
            parameters,
        )
    }

    pub(crate) fn model_label(&self) -> &str {
        self.default_options
            .prompt_model
            .as_deref()
            .unwrap_or("cohere-default")
    }
}

impl CohereBuilder {
    /// Sets the client, i.e. one pointing at a different api base
    pub fn client(&mut self, client: Client) -> &mut Self {
        self.client = Some(Arc::new(client));
        self
    }

    pub fn default_prompt_model(&mut self, model: impl Into<String>) -> &mut Self {
        self.options_mut().prompt_model = Some(model.into());
        self
    }

    pub fn default_temperature(&mut self, temperature: f64) -> &mut Self {
        self.options_mut().temperature = Some(temperature);
        self
    }

    pub fn connectors<C: Into<Connector>>(
        &mut self,
        connectors: impl IntoIterator<Item = C>,
    ) -> &mut Self {
        self.options_mut().connectors = Some(connectors.into_iter().map(Into::into).collect());
        self
    }

    /// Generate by streaming, aggregating the chunks into a single response
    pub fn streaming(&mut self, streaming: bool) -> &mut Self {
        self.options_mut().streaming = streaming;
        self
    }

    fn options_mut(&mut self) -> &mut Options {
        self.default_options.get_or_insert_with(Options::default)
    }
}

fn default_client() -> Arc<Client> {
    Arc::new(Client::default())
}
