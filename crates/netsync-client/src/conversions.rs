//! Type conversions between wire and domain types

use crate::wire::{NetworkSummaryDto, PropertyDto, ProvenanceEntityDto, ProvenanceEventDto};
use netsync_domain::{
    EventKind, LineageEntity, LineageEvent, Origin, Property, RecordId, RecordSummary, Timestamp,
};

/// Error type for conversion failures
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field present but unusable
    #[error("Invalid {field}: {value}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Offending value
        value: String,
    },
}

/// Convert a wire network summary to a domain summary
pub fn summary_from_wire(dto: NetworkSummaryDto) -> Result<RecordSummary, ConversionError> {
    let id = dto
        .external_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ConversionError::MissingField("externalId"))?;
    let modified = dto
        .modification_time
        .ok_or(ConversionError::MissingField("modificationTime"))?;

    Ok(RecordSummary {
        id: RecordId::new(id),
        name: dto.name,
        description: dto.description,
        modification_time: Timestamp::from_millis(modified),
        uri: dto.uri,
        read_only: dto.is_read_only || dto.read_only_commit_id > 0,
    })
}

/// Convert wire provenance to a lineage entity
pub fn lineage_from_wire(dto: ProvenanceEntityDto) -> LineageEntity {
    let origin = match dto.creation_event {
        Some(event) => Origin::Derived(Box::new(event_from_wire(*event))),
        None => Origin::Root,
    };

    LineageEntity {
        uri: dto.uri,
        properties: dto.properties.into_iter().map(property_from_wire).collect(),
        origin,
    }
}

fn event_from_wire(dto: ProvenanceEventDto) -> LineageEvent {
    LineageEvent {
        kind: EventKind::parse(&dto.event_type),
        started_at: dto.started_at_time.map(Timestamp::from_millis),
        ended_at: dto.ended_at_time.map(Timestamp::from_millis),
        inputs: dto.inputs.into_iter().map(lineage_from_wire).collect(),
        properties: dto.properties.into_iter().map(property_from_wire).collect(),
    }
}

fn property_from_wire(dto: PropertyDto) -> Property {
    Property::new(dto.name, dto.value.unwrap_or_default())
}

/// Convert a lineage entity to wire provenance
pub fn lineage_to_wire(entity: &LineageEntity) -> ProvenanceEntityDto {
    ProvenanceEntityDto {
        uri: entity.uri.clone(),
        creation_event: entity
            .creation_event()
            .map(|event| Box::new(event_to_wire(event))),
        properties: entity.properties.iter().map(property_to_wire).collect(),
    }
}

fn event_to_wire(event: &LineageEvent) -> ProvenanceEventDto {
    ProvenanceEventDto {
        event_type: event.kind.as_str().to_string(),
        started_at_time: event.started_at.map(|t| t.as_millis()),
        ended_at_time: event.ended_at.map(|t| t.as_millis()),
        inputs: event.inputs.iter().map(lineage_to_wire).collect(),
        properties: event.properties.iter().map(property_to_wire).collect(),
    }
}

fn property_to_wire(property: &Property) -> PropertyDto {
    PropertyDto {
        name: property.name.clone(),
        value: Some(property.value.clone()),
    }
}

/// Extract the record id from the locator a create call answers with
pub fn id_from_location(location: &str) -> Result<RecordId, ConversionError> {
    let invalid = || ConversionError::InvalidField {
        field: "location",
        value: location.to_string(),
    };

    let url = url::Url::parse(location.trim().trim_matches('"')).map_err(|_| invalid())?;
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(RecordId::new)
        .ok_or_else(invalid)
}
