//! Lineage tracking
//!
//! A record's provenance is a chain: each [`LineageEntity`] either has an
//! unknown origin ([`Origin::Root`]) or was produced by a [`LineageEvent`]
//! whose inputs are the entities it consumed. Events may list several
//! inputs, but only the first one is ever followed when walking history.

use crate::record::{RecordSummary, Timestamp};

/// Property name carrying the record title
pub const TITLE_PROPERTY: &str = "dc:title";

/// Property name carrying the record description
pub const DESCRIPTION_PROPERTY: &str = "dc:description";

/// Property name carrying the locator a copy was retrieved from
pub const RETRIEVED_FROM_PROPERTY: &str = "pav:retrievedFrom";

/// Wire name of the copy event kind
pub const COPY_EVENT: &str = "Copy";

/// A single key/value pair attached to a lineage entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property key (e.g., "dc:title")
    pub name: String,

    /// Property value
    pub value: String,
}

impl Property {
    /// Create a property
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Kind of a lineage event
///
/// The vocabulary is open; only `Copy` is meaningful to synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Record state duplicated from exactly one other record
    Copy,

    /// Any other event kind, kept verbatim
    Other(String),
}

impl EventKind {
    /// Parse an event kind; "copy" matches regardless of case
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case(COPY_EVENT) {
            EventKind::Copy
        } else {
            EventKind::Other(s.to_string())
        }
    }

    /// Wire name of the event kind
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Copy => COPY_EVENT,
            EventKind::Other(kind) => kind,
        }
    }

    /// Whether this is the privileged copy kind
    pub fn is_copy(&self) -> bool {
        matches!(self, EventKind::Copy)
    }
}

/// How a lineage entity came to exist
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    /// History root with unknown origin
    Root,

    /// Produced by a recorded event
    Derived(Box<LineageEvent>),
}

/// Event that produced a record state. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct LineageEvent {
    /// Event kind
    pub kind: EventKind,

    /// When the event started, if recorded
    pub started_at: Option<Timestamp>,

    /// When the event completed, if recorded
    pub ended_at: Option<Timestamp>,

    /// Entities consumed by the event, in recorded order
    pub inputs: Vec<LineageEntity>,

    /// Free-form event properties
    pub properties: Vec<Property>,
}

impl LineageEvent {
    /// Create an event with no inputs or properties
    pub fn new(kind: EventKind, ended_at: Option<Timestamp>) -> Self {
        Self {
            kind,
            started_at: None,
            ended_at,
            inputs: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Append an input entity
    pub fn with_input(mut self, input: LineageEntity) -> Self {
        self.inputs.push(input);
        self
    }

    /// The single parent followed when walking history (`inputs[0]`)
    pub fn parent(&self) -> Option<&LineageEntity> {
        self.inputs.first()
    }
}

/// A node in a record's provenance history
#[derive(Debug, Clone, PartialEq)]
pub struct LineageEntity {
    /// Locator of the record state this entity describes
    pub uri: Option<String>,

    /// Ordered properties; position 2 conventionally holds the
    /// retrieved-from locator of a copy
    pub properties: Vec<Property>,

    /// How this entity was produced
    pub origin: Origin,
}

impl LineageEntity {
    /// Create a root entity with unknown origin
    pub fn root(uri: Option<String>) -> Self {
        Self {
            uri,
            properties: Vec::new(),
            origin: Origin::Root,
        }
    }

    /// Create an entity produced by `event`
    pub fn derived(uri: Option<String>, event: LineageEvent) -> Self {
        Self {
            uri,
            properties: Vec::new(),
            origin: Origin::Derived(Box::new(event)),
        }
    }

    /// Minimal stand-in for a record that has no recorded lineage
    pub fn minimal(summary: &RecordSummary) -> Self {
        let mut entity = Self::root(summary.uri.clone());
        if let Some(name) = &summary.name {
            entity.properties.push(Property::new(TITLE_PROPERTY, name.clone()));
        }
        entity
    }

    /// Append a property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    /// The creation event, if the origin is known
    pub fn creation_event(&self) -> Option<&LineageEvent> {
        match &self.origin {
            Origin::Root => None,
            Origin::Derived(event) => Some(event),
        }
    }

    /// Value of the first property named `name`
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}
