use serde::{Deserialize, Serialize};

/// Kind of realtime message multiplexed on a document topic
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    Edit,
    Join,
    Leave,
    /// Relayed by the server but never produced or consumed here
    Cursor,
    Unknown(String),
}

impl From<String> for MessageKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "EDIT" => MessageKind::Edit,
            "JOIN" => MessageKind::Join,
            "LEAVE" => MessageKind::Leave,
            "CURSOR" => MessageKind::Cursor,
            _ => MessageKind::Unknown(value),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Edit => "EDIT".to_string(),
            MessageKind::Join => "JOIN".to_string(),
            MessageKind::Leave => "LEAVE".to_string(),
            MessageKind::Cursor => "CURSOR".to_string(),
            MessageKind::Unknown(other) => other,
        }
    }
}

/// Body of every message sent to or received from a document topic
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EditMessage {
    pub sender: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub content: Option<String>,
}

impl EditMessage {
    pub fn edit(sender: &str, content: &str) -> Self {
        Self {
            sender: sender.to_string(),
            kind: MessageKind::Edit,
            content: Some(content.to_string()),
        }
    }

    /// The server fills in the member list, we send it empty
    pub fn join(sender: &str) -> Self {
        Self {
            sender: sender.to_string(),
            kind: MessageKind::Join,
            content: Some(String::new()),
        }
    }

    pub fn leave(sender: &str) -> Self {
        Self {
            sender: sender.to_string(),
            kind: MessageKind::Leave,
            content: Some(String::new()),
        }
    }

    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}
