//! Load-boundary checks
//!
//! A dataset that fails here is rejected as a whole; nothing downstream sees
//! partial state.

use std::collections::HashSet;

use contracts::{RaceDataset, ReplayError};

/// Validate a raw dataset before repair
///
/// Rules:
/// - at least one entity
/// - entity ids are non-blank and unique
/// - every sample timestamp is finite
///
/// Entities without samples are accepted; they aggregate to defaults.
pub fn validate_dataset(dataset: &RaceDataset) -> Result<(), ReplayError> {
    if dataset.entities.is_empty() {
        return Err(ReplayError::EmptyDataset);
    }

    let mut seen = HashSet::with_capacity(dataset.entities.len());
    for (idx, entity) in dataset.entities.iter().enumerate() {
        if entity.id.is_blank() {
            return Err(ReplayError::malformed_entity(
                format!("entities[{idx}]"),
                "entity id cannot be blank",
            ));
        }
        if !seen.insert(entity.id.as_str()) {
            return Err(ReplayError::DuplicateEntity {
                entity_id: entity.id.to_string(),
            });
        }
        if let Some(pos) = entity.samples.iter().position(|s| !s.t.is_finite()) {
            return Err(ReplayError::malformed_entity(
                entity.id.as_str(),
                format!("samples[{pos}].t is not a finite timestamp"),
            ));
        }
    }
    Ok(())
}
