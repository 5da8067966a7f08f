//! Wire formats of the NDEx v2 REST API

use serde::{Deserialize, Serialize};

/// Network summary as returned by `/network/{id}/summary` and searches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummaryDto {
    /// Network UUID
    #[serde(default)]
    pub external_id: Option<String>,

    /// Network name
    #[serde(default)]
    pub name: Option<String>,

    /// Network description
    #[serde(default)]
    pub description: Option<String>,

    /// Last modification, epoch milliseconds
    #[serde(default)]
    pub modification_time: Option<u64>,

    /// Canonical network URL
    #[serde(default)]
    pub uri: Option<String>,

    /// Read-only flag
    #[serde(default)]
    pub is_read_only: bool,

    /// Non-zero when a read-only snapshot is pinned
    #[serde(default)]
    pub read_only_commit_id: i64,

    /// Owning account
    #[serde(default)]
    pub owner: Option<String>,
}

/// Body of `POST /search/network`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequestDto {
    /// Free-text query
    pub search_string: String,

    /// Restrict to networks of this account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,

    /// Minimum permission of the caller on each network
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,

    /// Count group memberships towards `permission`
    pub include_groups: bool,
}

/// Response of `POST /search/network`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultDto {
    /// Total hits, including those beyond this page
    #[serde(default)]
    pub num_found: u64,

    /// This page of hits
    #[serde(default)]
    pub networks: Vec<NetworkSummaryDto>,
}

/// A provenance name/value pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDto {
    /// Property name
    pub name: String,

    /// Property value; the server may send null
    #[serde(default)]
    pub value: Option<String>,
}

/// A provenance event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceEventDto {
    /// Event type, e.g. "Copy" or "Program Upload"
    pub event_type: String,

    /// Start, epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_time: Option<u64>,

    /// End, epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_time: Option<u64>,

    /// Consumed entities
    #[serde(default)]
    pub inputs: Vec<ProvenanceEntityDto>,

    /// Event properties
    #[serde(default)]
    pub properties: Vec<PropertyDto>,
}

/// A provenance entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceEntityDto {
    /// Locator of the entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Event that produced the entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_event: Option<Box<ProvenanceEventDto>>,

    /// Entity properties, in recorded order
    #[serde(default)]
    pub properties: Vec<PropertyDto>,
}

impl ProvenanceEntityDto {
    /// Whether the server sent an entity with nothing in it
    pub fn is_empty(&self) -> bool {
        self.uri.is_none() && self.creation_event.is_none() && self.properties.is_empty()
    }
}

/// Body of `PUT /network/{id}/systemproperty`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPropertyDto {
    /// New read-only flag
    pub read_only: bool,
}
