use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        })
    }
}

/// One `{role, content}` message as sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One incremental fragment of the completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationChunk {
    /// Text added by this increment. Often empty (role-only or final events).
    pub text: String,
    /// Set on the event that closes the choice (`"stop"`, `"length"`, ...).
    pub finish_reason: Option<String>,
}

impl GenerationChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Wire shape of one `chat.completion.chunk` event.
#[derive(Debug, Deserialize)]
pub(crate) struct StreamEvent {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub error: Option<StreamErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChoice {
    #[serde(default)]
    pub delta: Option<StreamDelta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl StreamEvent {
    pub(crate) fn into_chunk(self) -> GenerationChunk {
        let Some(choice) = self.choices.into_iter().next() else {
            return GenerationChunk::default();
        };
        GenerationChunk {
            text: choice.delta.and_then(|d| d.content).unwrap_or_default(),
            finish_reason: choice.finish_reason,
        }
    }
}
