//! Netsync Registry Clients
//!
//! Implementations of the `Registry` trait from `netsync-domain`.
//!
//! # Registries
//!
//! - `NdexRegistry`: blocking HTTP client for NDEx v2 servers
//! - `MemoryRegistry`: deterministic in-memory registry for testing and dry
//!   rehearsals
//!
//! # Examples
//!
//! ```
//! use netsync_client::MemoryRegistry;
//! use netsync_domain::{RecordContent, Registry};
//!
//! let registry = MemoryRegistry::new("http://registry.example.org");
//! let created = registry.create_content(RecordContent::new(b"{}".to_vec())).unwrap();
//!
//! assert_eq!(registry.get_content(&created.id).unwrap().payload, b"{}");
//! ```

#![warn(missing_docs)]

pub mod conversions;
pub mod memory;
pub mod ndex;
pub mod wire;

use thiserror::Error;

pub use conversions::ConversionError;
pub use memory::{MemoryRegistry, Operation, WriteOp};
pub use ndex::NdexRegistry;

/// Errors that can occur talking to a registry
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// The record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server answered with something unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The server refused the request
    #[error("Rejected (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Server message
        message: String,
    },

    /// Generic error
    #[error("Client error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            ClientError::Rejected {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            ClientError::Communication(e.to_string())
        }
    }
}

impl From<ConversionError> for ClientError {
    fn from(e: ConversionError) -> Self {
        ClientError::InvalidResponse(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::InvalidResponse(format!("JSON parsing error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = ClientError::Rejected {
            status: 403,
            message: "read-only".to_string(),
        };
        assert_eq!(e.to_string(), "Rejected (HTTP 403): read-only");
        assert_eq!(ClientError::NotFound("n1".to_string()).to_string(), "Not found: n1");
    }

    #[test]
    fn test_conversion_error_is_invalid_response() {
        let e: ClientError = ConversionError::MissingField("externalId").into();
        assert!(matches!(e, ClientError::InvalidResponse(_)));
    }
}
