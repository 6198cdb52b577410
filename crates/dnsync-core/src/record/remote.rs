//! Provider wire representation of a record

use serde::{Deserialize, Serialize};

/// A record as stored by the remote service
///
/// `name` is zone-relative and `ttl` is in whole seconds. Only the optional
/// fields relevant to `rtype` are populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub domain: String,
    #[serde(rename = "type")]
    pub rtype: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prio: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl RemoteRecord {
    /// Copy of this record addressed to `id`
    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }

    /// Copy of this record with no id, as sent on creation
    pub fn without_id(&self) -> Self {
        self.with_id(String::new())
    }
}

/// Result payload of the enumerate-records call
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListRecordsResponse {
    #[serde(default)]
    pub records: Vec<RemoteRecord>,
}
