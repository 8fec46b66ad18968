use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable snapshot of a document, owned by the server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    pub id: i64,
    #[serde(default)]
    pub document_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub author_username: String,
    #[serde(default)]
    pub content: String,
}

impl VersionSnapshot {
    /// Timestamp as shown in the history panel
    pub fn display_time(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
