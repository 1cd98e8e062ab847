use serde::{Deserialize, Serialize};

/// A single message in a conversation.
///
/// The set of kinds is closed. Providers decide which kinds they can express and reject the rest.
#[derive(
    Clone,
    strum_macros::EnumIs,
    strum_macros::EnumDiscriminants,
    PartialEq,
    Debug,
    Serialize,
    Deserialize,
)]
#[strum_discriminants(name(ChatMessageKind), derive(strum_macros::Display, Hash))]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant(String),

    /// A message with a free-form role label, i.e. from a framework that does not use the fixed
    /// roles above. Providers treat it as user input.
    Chat { role: String, content: String },

    /// Output of a tool invocation, tied to the tool call that produced it
    ToolOutput {
        tool_call_id: String,
        content: String,
    },

    // A summary of the chat. If encountered all previous messages are ignored, except the system
    // prompt
    Summary(String),
}

impl std::fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatMessage::System(s) => write!(f, "System: \"{s}\""),
            ChatMessage::User(s) => write!(f, "User: \"{s}\""),
            ChatMessage::Assistant(s) => write!(f, "Assistant: \"{s}\""),
            ChatMessage::Chat { role, content } => write!(f, "{role}: \"{content}\""),
            ChatMessage::ToolOutput {
                tool_call_id,
                content,
            } => write!(f, "ToolOutput: \"{tool_call_id}\": \"{content}\""),
            ChatMessage::Summary(s) => write!(f, "Summary: \"{s}\""),
        }
    }
}

impl ChatMessage {
    pub fn new_system(message: impl Into<String>) -> Self {
        ChatMessage::System(message.into())
    }

    pub fn new_user(message: impl Into<String>) -> Self {
        ChatMessage::User(message.into())
    }

    pub fn new_assistant(message: impl Into<String>) -> Self {
        ChatMessage::Assistant(message.into())
    }

    pub fn new_chat(role: impl Into<String>, message: impl Into<String>) -> Self {
        ChatMessage::Chat {
            role: role.into(),
            content: message.into(),
        }
    }

    pub fn new_tool_output(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        ChatMessage::ToolOutput {
            tool_call_id: tool_call_id.into(),
            content: output.into(),
        }
    }

    pub fn new_summary(message: impl Into<String>) -> Self {
        ChatMessage::Summary(message.into())
    }

    /// The kind of message, without its content
    pub fn kind(&self) -> ChatMessageKind {
        self.into()
    }

    /// The text content of the message
    pub fn content(&self) -> &str {
        self.as_ref()
    }
}

/// Returns the text content of the message as a string slice.
impl AsRef<str> for ChatMessage {
    fn as_ref(&self) -> &str {
        match self {
            ChatMessage::System(s)
            | ChatMessage::User(s)
            | ChatMessage::Assistant(s)
            | ChatMessage::Summary(s) => s,
            ChatMessage::Chat { content, .. } | ChatMessage::ToolOutput { content, .. } => content,
        }
    }
}
