use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

const DEBUG_PREVIEW_CHARS: usize = 100;

/// A retrieval document used to ground a chat completion
///
/// Providers that support retrieval augmented generation send documents along with the chat. An
/// `id` in the metadata is used as the document identifier when present.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    metadata: Option<Metadata>,
    content: String,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("metadata", &self.metadata)
            .field("content", &preview(&self.content, DEBUG_PREVIEW_CHARS))
            .finish()
    }
}

impl<T: AsRef<str>> From<T> for Document {
    fn from(value: T) -> Self {
        Document::new(value.as_ref(), None)
    }
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Option<Metadata>) -> Self {
        Self {
            metadata,
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// The explicit identifier of the document, if any
    ///
    /// Reads `id` from the metadata. Empty strings, zero and nulls count as absent, other numbers
    /// are rendered as strings.
    pub fn id(&self) -> Option<String> {
        match self.metadata.as_ref()?.get("id")? {
            serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
            serde_json::Value::Number(id) if id.as_f64().is_some_and(|n| n.abs() > 0.0) => {
                Some(id.to_string())
            }
            _ => None,
        }
    }
}

/// The first `max_chars` characters of `content`, with the full length appended when cut
fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}... ({} chars)", &content[..end], content.chars().count()),
        None => content.to_string(),
    }
}
