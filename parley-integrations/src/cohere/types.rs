//! Request and response payloads of the Cohere chat and tokenize endpoints
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::CohereError;

/// Roles as Cohere names them in the chat history
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum ChatRole {
    User,
    Chatbot,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub role: ChatRole,
    pub message: String,
}

/// A retrieval document as the chat endpoint expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDocument {
    pub snippet: String,
    pub id: String,
}

/// A retrieval source managed by Cohere, i.e. `web-search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_on_failure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

impl Connector {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_access_token: None,
            continue_on_failure: None,
            options: None,
        }
    }
}

impl From<&str> for Connector {
    fn from(id: &str) -> Self {
        Connector::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PromptTruncation {
    /// Lets Cohere drop history and documents to make the prompt fit
    Auto,
    Off,
}

/// A fully assembled chat request
///
/// Serializes to the payload of `POST /chat`. Unset optionals are left out and `parameters` are
/// written last, overriding any computed field with the same name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatRequest {
    pub message: String,
    pub chat_history: Vec<ChatHistoryEntry>,
    pub documents: Option<Vec<RequestDocument>>,
    pub connectors: Option<Vec<Connector>>,
    pub prompt_truncation: Option<PromptTruncation>,
    pub parameters: Map<String, Value>,
}

impl ChatRequest {
    /// The JSON object sent to the chat endpoint
    ///
    /// # Errors
    ///
    /// Errors if any of the fields fail to serialize
    pub fn to_payload(&self) -> Result<Map<String, Value>, CohereError> {
        let mut payload = Map::new();

        payload.insert("message".into(), Value::String(self.message.clone()));
        payload.insert(
            "chat_history".into(),
            serde_json::to_value(&self.chat_history)?,
        );

        if let Some(documents) = &self.documents {
            payload.insert("documents".into(), serde_json::to_value(documents)?);
        }

        if let Some(connectors) = &self.connectors {
            payload.insert("connectors".into(), serde_json::to_value(connectors)?);
        }

        if let Some(prompt_truncation) = &self.prompt_truncation {
            payload.insert(
                "prompt_truncation".into(),
                serde_json::to_value(prompt_truncation)?,
            );
        }

        payload.extend(self.parameters.clone());

        Ok(payload)
    }
}

impl Serialize for ChatRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_payload()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billed_tokens: Option<u32>,
}

/// Response of a non-streaming chat call
///
/// Retrieval fields are only present when the request used documents or connectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_results: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_queries: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<TokenCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// A single event of a streaming chat call
///
/// The stream is newline delimited JSON, one event per line, tagged by `event_type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event_type", rename_all = "kebab-case")]
pub enum StreamedChatEvent {
    StreamStart {
        #[serde(default)]
        generation_id: Option<String>,
    },
    SearchQueriesGeneration {
        #[serde(default)]
        search_queries: Vec<Value>,
    },
    SearchResults {
        #[serde(default)]
        search_results: Vec<Value>,
        #[serde(default)]
        documents: Vec<Value>,
    },
    TextGeneration {
        text: String,
    },
    CitationGeneration {
        #[serde(default)]
        citations: Vec<Value>,
    },
    StreamEnd {
        #[serde(default)]
        finish_reason: Option<String>,
        #[serde(default)]
        response: Option<Value>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenizeResponse {
    pub tokens: Vec<i64>,
    #[serde(default)]
    pub token_strings: Vec<String>,
}
