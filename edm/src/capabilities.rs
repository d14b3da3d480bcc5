//! Capability restriction annotations (`Org.OData.Capabilities.V1`).
//!
//! The conformance rules only probe operations a service declares support
//! for. Restrictions are collected per entity set from `InsertRestrictions`,
//! `UpdateRestrictions`, and `DeleteRestrictions` annotation records;
//! `BatchSupported` is collected from the entity container. An absent
//! annotation is treated as "support not confirmed" — candidate selection
//! requires every consulted capability to be explicitly present.

use std::collections::HashMap;

/// Vocabulary term for insert restrictions on an entity set.
pub const TERM_INSERT_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.InsertRestrictions";
/// Vocabulary term for update restrictions on an entity set.
pub const TERM_UPDATE_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.UpdateRestrictions";
/// Vocabulary term for delete restrictions on an entity set.
pub const TERM_DELETE_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.DeleteRestrictions";
/// Vocabulary term for batch support on the entity container.
pub const TERM_BATCH_SUPPORTED: &str = "Org.OData.Capabilities.V1.BatchSupported";

/// Restriction summary for one entity set.
///
/// Each field mirrors the boolean member of the corresponding restriction
/// record (`Insertable`, `Updatable`, `Deletable`); `None` means the record
/// was not annotated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityRestriction {
    /// `InsertRestrictions/Insertable`, when annotated.
    pub insertable: Option<bool>,
    /// `UpdateRestrictions/Updatable`, when annotated.
    pub updatable: Option<bool>,
    /// `DeleteRestrictions/Deletable`, when annotated.
    pub deletable: Option<bool>,
}

/// Capability annotations for the whole service, keyed by entity-set name.
#[derive(Debug, Clone, Default)]
pub struct CapabilityIndex {
    restrictions: HashMap<String, CapabilityRestriction>,
    batch_supported: Option<bool>,
}

impl CapabilityIndex {
    /// Returns the restriction summary annotated on `set_name`, if any.
    #[must_use]
    pub fn restriction(&self, set_name: &str) -> Option<&CapabilityRestriction> {
        self.restrictions.get(set_name)
    }

    /// Returns true only if the container is explicitly annotated with
    /// `BatchSupported="true"`.
    #[must_use]
    pub fn batch_supported(&self) -> bool {
        self.batch_supported.unwrap_or(false)
    }

    /// Records the container-level batch support flag.
    pub fn set_batch_supported(&mut self, supported: bool) {
        self.batch_supported = Some(supported);
    }

    /// Returns the mutable restriction entry for `set_name`, creating a
    /// default entry on first use.
    pub fn restriction_mut(&mut self, set_name: &str) -> &mut CapabilityRestriction {
        self.restrictions.entry(set_name.to_owned()).or_default()
    }
}
