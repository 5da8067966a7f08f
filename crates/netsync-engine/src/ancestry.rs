//! Ancestry extraction
//!
//! Recovers the identifier of the record a lineage entity was copied from.
//! Registries record that locator as a free-form property, conventionally at
//! position 2, so this is the one format-dependent step in the engine.
//! Failure is a normal outcome and callers treat it as "unrelated".

use crate::config::AncestryLookup;
use netsync_domain::lineage::RETRIEVED_FROM_PROPERTY;
use netsync_domain::{LineageEntity, RecordId};
use thiserror::Error;
use url::Url;

/// Property position holding the retrieved-from locator by convention
pub const DEFAULT_ANCESTRY_INDEX: usize = 2;

/// Why an ancestor identifier could not be recovered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AncestryUnknown {
    /// The property list is too short or lacks the key
    #[error("retrieved-from property missing")]
    MissingProperty,

    /// The property value is not an absolute URL
    #[error("malformed locator '{locator}': {reason}")]
    MalformedLocator {
        /// Offending value
        locator: String,
        /// Parser message
        reason: String,
    },

    /// The locator has no usable final path segment
    #[error("locator '{0}' has no path segment")]
    NoPathSegment(String),
}

/// Strategy for reading an ancestor identifier out of a lineage entity
pub trait AncestryExtractor: Send + Sync {
    /// Recover the identifier of the record `entity` was derived from
    fn extract(&self, entity: &LineageEntity) -> Result<RecordId, AncestryUnknown>;
}

/// Reads the locator at a fixed property position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalLookup {
    index: usize,
}

impl PositionalLookup {
    /// Read from property `index`
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

impl Default for PositionalLookup {
    fn default() -> Self {
        Self::new(DEFAULT_ANCESTRY_INDEX)
    }
}

impl AncestryExtractor for PositionalLookup {
    fn extract(&self, entity: &LineageEntity) -> Result<RecordId, AncestryUnknown> {
        let property = entity
            .properties
            .get(self.index)
            .ok_or(AncestryUnknown::MissingProperty)?;
        record_id_from_locator(&property.value)
    }
}

/// Reads the locator from the first property with a given key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedLookup {
    key: String,
}

impl KeyedLookup {
    /// Read from the property named `key`
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for KeyedLookup {
    fn default() -> Self {
        Self::new(RETRIEVED_FROM_PROPERTY)
    }
}

impl AncestryExtractor for KeyedLookup {
    fn extract(&self, entity: &LineageEntity) -> Result<RecordId, AncestryUnknown> {
        let value = entity
            .property(&self.key)
            .ok_or(AncestryUnknown::MissingProperty)?;
        record_id_from_locator(value)
    }
}

impl AncestryLookup {
    /// Build the extractor this setting names
    pub fn extractor(&self) -> Box<dyn AncestryExtractor> {
        match self {
            AncestryLookup::Positional => Box::new(PositionalLookup::default()),
            AncestryLookup::Keyed => Box::new(KeyedLookup::default()),
        }
    }
}

/// Take the final non-empty path segment of an absolute locator as a record id
///
/// # Examples
///
/// ```
/// use netsync_engine::ancestry::record_id_from_locator;
///
/// let id = record_id_from_locator("http://www.ndexbio.org/v2/network/abc-123-def").unwrap();
/// assert_eq!(id.as_str(), "abc-123-def");
///
/// assert!(record_id_from_locator("http://www.ndexbio.org").is_err());
/// ```
pub fn record_id_from_locator(locator: &str) -> Result<RecordId, AncestryUnknown> {
    let url = Url::parse(locator.trim()).map_err(|e| AncestryUnknown::MalformedLocator {
        locator: locator.to_string(),
        reason: e.to_string(),
    })?;

    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(RecordId::new)
        .ok_or_else(|| AncestryUnknown::NoPathSegment(locator.to_string()))
}
