//! Entity directory client
//!
//! `GET {rest_url}/entities` returns every entity the presence gateway knows.
//! Entities carrying `measuredValues` are trackable devices; the anchor list
//! lives in `attributes.nodes` of one designated entity.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::logic::features::{AnchorSet, CodecError};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory unreachable: {0}")]
    Network(String),

    #[error("directory returned status {0}")]
    Server(u16),

    #[error("directory response malformed: {0}")]
    Parse(String),

    #[error("anchor entity '{0}' missing or has no node list")]
    MissingAnchorEntity(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// One directory entry. Unknown fields are kept for passthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_values: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DirectoryEntity {
    /// Non-empty `measuredValues`
    pub fn is_trackable(&self) -> bool {
        self.measured_values.as_ref().is_some_and(|m| !m.is_empty())
    }
}

pub fn trackable_ids(entities: &[DirectoryEntity]) -> Vec<String> {
    entities
        .iter()
        .filter(|e| e.is_trackable())
        .map(|e| e.id.clone())
        .collect()
}

/// Build the anchor set from `attributes.nodes` of `anchor_entity_id`
pub fn anchors_from(
    entities: &[DirectoryEntity],
    anchor_entity_id: &str,
) -> Result<AnchorSet, DirectoryError> {
    let missing = || DirectoryError::MissingAnchorEntity(anchor_entity_id.to_string());

    let nodes = entities
        .iter()
        .find(|e| e.id == anchor_entity_id)
        .and_then(|e| e.attributes.as_ref())
        .and_then(|attrs| attrs.get("nodes"))
        .and_then(Value::as_array)
        .ok_or_else(missing)?;

    let names = nodes
        .iter()
        .map(|node| node.as_str().ok_or_else(missing))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnchorSet::from_names(names)?)
}

pub struct DirectoryClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl DirectoryClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DirectoryError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DirectoryError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub async fn fetch_entities(&self) -> Result<Vec<DirectoryEntity>, DirectoryError> {
        let url = format!("{}/entities", self.base_url);
        log::debug!("Fetching entities from {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| DirectoryError::Network(e.to_string()))?;

        if response.status().is_success() {
            let entities: Vec<DirectoryEntity> = response
                .json()
                .await
                .map_err(|e| DirectoryError::Parse(e.to_string()))?;
            log::info!("Directory returned {} entities", entities.len());
            Ok(entities)
        } else {
            Err(DirectoryError::Server(response.status().as_u16()))
        }
    }
}
