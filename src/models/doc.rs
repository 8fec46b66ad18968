use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entry of the dashboard document list
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    pub owner_username: String,
    #[serde(default)]
    pub collaborators: BTreeSet<String>,
}

impl DocumentSummary {
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner_username == username
    }
}

/// Full document as loaded by the editor
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDetail {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    pub owner_username: String,
    #[serde(default)]
    pub collaborators: BTreeSet<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateDocRequest {
    pub title: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub collaborator_username: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}
