//! NDEx Registry Implementation
//!
//! Talks to an NDEx v2 server over its REST API with HTTP basic
//! authentication.
//!
//! # Features
//!
//! - Blocking HTTP, one round trip per registry call
//! - Retry with exponential backoff for reads that hit transport errors or
//!   server errors
//! - Writes are sent once, so a retried create can never duplicate a network
//!
//! # Examples
//!
//! ```no_run
//! use netsync_client::NdexRegistry;
//! use netsync_domain::{Permission, Registry};
//!
//! let registry = NdexRegistry::new("https://www.ndexbio.org/v2", "curator", "secret").unwrap();
//! let owned = registry.list_candidates("curator", Permission::Admin, 100, 0).unwrap();
//! println!("{} networks", owned.len());
//! ```

use crate::conversions::{id_from_location, lineage_from_wire, lineage_to_wire, summary_from_wire};
use crate::wire::{NetworkSummaryDto, ProvenanceEntityDto, SearchRequestDto, SearchResultDto, SystemPropertyDto};
use crate::ClientError;
use netsync_domain::{
    LineageEntity, Permission, RecordContent, RecordId, RecordSummary, Registry,
};
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::StatusCode;
use std::time::Duration;

/// Default timeout for registry requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts for reads
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Multipart field carrying network content on create and update
const CONTENT_FIELD: &str = "CXNetworkStream";

/// Registry backed by an NDEx v2 server
pub struct NdexRegistry {
    base_url: String,
    username: String,
    password: String,
    client: Client,
    max_retries: u32,
}

impl NdexRegistry {
    /// Connect to the server at `base_url` (e.g., "https://www.ndexbio.org/v2")
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_timeout(
            base_url,
            username,
            password,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Connect with a custom request timeout
    pub fn with_timeout(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        url::Url::parse(base_url)
            .map_err(|e| ClientError::Other(format!("invalid server URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Other(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the maximum number of attempts for reads
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }

    /// Send a read, retrying transport failures and server errors
    fn read(&self, path: &str, request: impl Fn() -> RequestBuilder) -> Result<Response, ClientError> {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.authorized(request()).send() {
                Ok(response) if response.status().is_server_error() => {
                    last_error = Some(rejection(response));
                }
                Ok(response) => return check(path, response),
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(ClientError::Communication(format!(
                        "Request to {} failed: {}",
                        path, e
                    )));
                }
                Err(e) => return Err(e.into()),
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tracing::debug!("Retrying {} in {:?}", path, delay);
                std::thread::sleep(delay);
            }
        }

        Err(last_error
            .unwrap_or_else(|| ClientError::Communication("Max retries exceeded".to_string())))
    }

    /// Send a write exactly once
    fn write(&self, path: &str, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.authorized(request).send()?;
        check(path, response)
    }

    fn search(
        &self,
        body: &SearchRequestDto,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RecordSummary>, ClientError> {
        let path = "/search/network";
        let page = search_page(limit, offset);
        let url = self.endpoint(path);

        let result: SearchResultDto = self
            .read(path, || {
                self.client
                    .post(&url)
                    .query(&[("start", page), ("size", limit)])
                    .json(body)
            })?
            .json()?;

        tracing::debug!(
            "Search matched {} networks, {} returned",
            result.num_found,
            result.networks.len()
        );

        Ok(summaries_from_wire(result.networks))
    }

    fn content_form(content: RecordContent) -> Result<multipart::Form, ClientError> {
        let part = multipart::Part::bytes(content.payload)
            .file_name("network.cx")
            .mime_str("application/octet-stream")?;
        Ok(multipart::Form::new().part(CONTENT_FIELD, part))
    }
}

/// Convert search hits, dropping any that lack an id or modification time
fn summaries_from_wire(networks: Vec<NetworkSummaryDto>) -> Vec<RecordSummary> {
    networks
        .into_iter()
        .filter_map(|dto| match summary_from_wire(dto) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!("Skipping search result that cannot be read: {}", e);
                None
            }
        })
        .collect()
}

/// Page index for an offset; the server pages in units of `limit`
fn search_page(limit: usize, offset: usize) -> usize {
    offset / limit.max(1)
}

fn check(path: &str, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == StatusCode::NOT_FOUND {
        Err(ClientError::NotFound(path.to_string()))
    } else {
        Err(rejection(response))
    }
}

fn rejection(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .unwrap_or_else(|_| "Unknown error".to_string());
    ClientError::Rejected { status, message }
}

impl Registry for NdexRegistry {
    type Error = ClientError;

    fn base_uri(&self) -> String {
        self.base_url.clone()
    }

    fn list_candidates(
        &self,
        owner: &str,
        permission: Permission,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RecordSummary>, ClientError> {
        let body = SearchRequestDto {
            search_string: String::new(),
            account_name: Some(owner.to_string()),
            permission: Some(permission.as_str().to_string()),
            include_groups: true,
        };
        self.search(&body, limit, offset)
    }

    fn search_records(
        &self,
        query: &str,
        owner: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RecordSummary>, ClientError> {
        let body = SearchRequestDto {
            search_string: query.to_string(),
            account_name: owner.map(str::to_string),
            permission: None,
            include_groups: false,
        };
        self.search(&body, limit, 0)
    }

    fn get_summary(&self, id: &RecordId) -> Result<RecordSummary, ClientError> {
        let path = format!("/network/{}/summary", id);
        let url = self.endpoint(&path);
        let dto: NetworkSummaryDto = self.read(&path, || self.client.get(&url))?.json()?;
        Ok(summary_from_wire(dto)?)
    }

    fn get_provenance(&self, id: &RecordId) -> Result<Option<LineageEntity>, ClientError> {
        let path = format!("/network/{}/provenance", id);
        let url = self.endpoint(&path);
        let body = self.read(&path, || self.client.get(&url))?.text()?;

        let body = body.trim();
        if body.is_empty() || body == "null" {
            return Ok(None);
        }

        let dto: ProvenanceEntityDto = serde_json::from_str(body)?;
        if dto.is_empty() {
            return Ok(None);
        }
        Ok(Some(lineage_from_wire(dto)))
    }

    fn set_provenance(&self, id: &RecordId, lineage: &LineageEntity) -> Result<(), ClientError> {
        let path = format!("/network/{}/provenance", id);
        let request = self.client.put(self.endpoint(&path)).json(&lineage_to_wire(lineage));
        self.write(&path, request)?;
        Ok(())
    }

    fn get_content(&self, id: &RecordId) -> Result<RecordContent, ClientError> {
        let path = format!("/network/{}", id);
        let url = self.endpoint(&path);
        let bytes = self.read(&path, || self.client.get(&url))?.bytes()?;
        Ok(RecordContent::new(bytes.to_vec()))
    }

    fn create_content(&self, content: RecordContent) -> Result<RecordSummary, ClientError> {
        let path = "/network";
        let form = Self::content_form(content)?;
        let location = self
            .write(path, self.client.post(self.endpoint(path)).multipart(form))?
            .text()?;

        let id = id_from_location(&location)?;
        tracing::debug!("Server created network {}", id);
        self.get_summary(&id)
    }

    fn update_content(&self, content: RecordContent) -> Result<RecordSummary, ClientError> {
        let id = content
            .target_id
            .clone()
            .ok_or_else(|| ClientError::Other("update requires a target id".to_string()))?;
        let path = format!("/network/{}", id);
        let form = Self::content_form(content)?;

        self.write(&path, self.client.put(self.endpoint(&path)).multipart(form))?;
        self.get_summary(&id)
    }

    fn set_read_only(&self, id: &RecordId, read_only: bool) -> Result<(), ClientError> {
        let path = format!("/network/{}/systemproperty", id);
        let request = self
            .client
            .put(self.endpoint(&path))
            .json(&SystemPropertyDto { read_only });
        self.write(&path, request)?;
        Ok(())
    }
}
