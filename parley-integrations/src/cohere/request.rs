//! Maps generic chat messages and documents onto a Cohere chat request
use std::borrow::Borrow;

use itertools::Itertools as _;
use parley_core::{Document, chat_completion::ChatMessage};
use serde_json::{Map, Value};

use super::{
    CohereError,
    types::{
        ChatHistoryEntry, ChatRequest, ChatRole, Connector, PromptTruncation, RequestDocument,
    },
};

/// The Cohere role of a message
///
/// # Errors
///
/// Tool outputs and summaries have no Cohere counterpart
pub fn chat_role(message: &ChatMessage) -> Result<ChatRole, CohereError> {
    match message {
        ChatMessage::User(_) | ChatMessage::Chat { .. } => Ok(ChatRole::User),
        ChatMessage::Assistant(_) => Ok(ChatRole::Chatbot),
        ChatMessage::System(_) => Ok(ChatRole::System),
        ChatMessage::ToolOutput { .. } | ChatMessage::Summary(_) => {
            Err(CohereError::UnrecognizedMessage(message.kind()))
        }
    }
}

/// Assembles a chat request from a conversation
///
/// The last message is the current turn, everything before it becomes the chat history.
/// Documents and connectors are exclusive; when documents are given, connectors are dropped.
/// Either of them enables automatic prompt truncation. `parameters` are sent as-is and win over
/// computed fields.
///
/// # Errors
///
/// Errors if there are no messages or a history message has no Cohere role
pub fn build_chat_request<M: Borrow<ChatMessage>>(
    messages: &[M],
    documents: Option<&[Document]>,
    connectors: Option<&[Connector]>,
    parameters: Map<String, Value>,
) -> Result<ChatRequest, CohereError> {
    let Some((current, history)) = messages.split_last() else {
        return Err(CohereError::EmptyHistory);
    };

    let chat_history = history
        .iter()
        .map(|message| {
            let message = message.borrow();
            Ok(ChatHistoryEntry {
                role: chat_role(message)?,
                message: message.content().to_string(),
            })
        })
        .collect::<Result<Vec<_>, CohereError>>()?;

    let documents = documents.map(|documents| {
        documents
            .iter()
            .enumerate()
            .map(|(index, document)| RequestDocument {
                snippet: document.content().to_string(),
                id: document.id().unwrap_or_else(|| format!("doc-{index}")),
            })
            .collect_vec()
    });

    let connectors = if documents.is_some() {
        None
    } else {
        connectors.map(<[Connector]>::to_vec)
    };

    let prompt_truncation =
        (documents.is_some() || connectors.is_some()).then_some(PromptTruncation::Auto);

    Ok(ChatRequest {
        message: current.borrow().content().to_string(),
        chat_history,
        documents,
        connectors,
        prompt_truncation,
        parameters,
    })
}
