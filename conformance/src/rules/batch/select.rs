//! Entity candidate selection for the batch change-set probe.
//!
//! Pure filtering over already-parsed metadata: no I/O. The first entity
//! type (in document order) that is structurally usable *and* whose entity
//! set confirms insert, update, delete, and batch support wins.

use odata_edm::{EntityType, ServiceMetadata};

/// Capability summary for one entity set, resolved from annotations.
///
/// Absent annotations resolve to `false`: the probe only runs against sets
/// whose support is explicitly confirmed.
#[derive(Debug, Clone, Copy)]
pub struct SetSupport {
    /// Insert support confirmed.
    pub insertable: bool,
    /// Update support confirmed.
    pub updatable: bool,
    /// Delete support confirmed.
    pub deletable: bool,
    /// Container-level batch support confirmed.
    pub batch: bool,
}

impl SetSupport {
    /// Resolves the support summary for `set_name` from the metadata's
    /// capability annotations.
    #[must_use]
    pub fn resolve(metadata: &ServiceMetadata, set_name: &str) -> Self {
        let restriction = metadata.capabilities.restriction(set_name);
        let confirmed = |field: fn(&odata_edm::CapabilityRestriction) -> Option<bool>| {
            restriction.and_then(field).unwrap_or(false)
        };
        Self {
            insertable: confirmed(|r| r.insertable),
            updatable: confirmed(|r| r.updatable),
            deletable: confirmed(|r| r.deletable),
            batch: metadata.capabilities.batch_supported(),
        }
    }

    /// Returns true if every consulted capability is confirmed.
    #[must_use]
    pub fn all_confirmed(self) -> bool {
        self.insertable && self.updatable && self.deletable && self.batch
    }
}

/// A selected probe target.
#[derive(Debug)]
pub struct Candidate<'a> {
    /// The entity type the probe will create and update.
    pub entity_type: &'a EntityType,
    /// Name of the entity set backing the type.
    pub set_name: String,
}

/// Result of candidate selection.
///
/// The two empty outcomes are deliberately distinct: "nothing is shaped
/// right for this probe" and "nothing confirms batch/CRUD support" produce
/// different diagnostics.
#[derive(Debug)]
pub enum Selection<'a> {
    /// A usable candidate was found.
    Selected(Candidate<'a>),
    /// No entity type passes the structural filters.
    NoQualifyingType,
    /// Structural candidates exist, but none confirms insert, update,
    /// delete, and batch support.
    NoBatchSupport,
}

/// Selects the first entity type that can back the batch change-set probe.
///
/// Structural filters, applied in order: a single key property whose type is
/// in `key_types`; not a media entity type; at least one normal property
/// whose type is in `normal_types`. Candidates passing those are then
/// filtered on confirmed insert+update+delete+batch support.
#[must_use]
pub fn select_candidate<'a>(
    metadata: &'a ServiceMetadata,
    key_types: &[&str],
    normal_types: &[&str],
) -> Selection<'a> {
    let structural: Vec<&EntityType> = metadata
        .entity_types
        .iter()
        .filter(|t| !t.has_stream)
        .filter(|t| matches!(t.key_types.as_slice(), [key] if key_types.contains(&key.as_str())))
        .filter(|t| {
            t.properties
                .iter()
                .any(|p| normal_types.contains(&p.type_name.as_str()))
        })
        .collect();

    if structural.is_empty() {
        return Selection::NoQualifyingType;
    }

    for entity_type in structural {
        let Some(set) = metadata.entity_set_for(&entity_type.name) else {
            continue;
        };
        if SetSupport::resolve(metadata, &set.name).all_confirmed() {
            return Selection::Selected(Candidate {
                entity_type,
                set_name: set.name.clone(),
            });
        }
    }

    Selection::NoBatchSupport
}
