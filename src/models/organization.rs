//! Research organization model.

use serde::{Deserialize, Serialize};

/// Identifier of a research organization
pub type OrganizationId = u64;

/// A research organization (laboratory, team, department...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchOrganization {
    pub id: OrganizationId,

    /// Short name, e.g. "CIAD"
    pub acronym: String,

    /// Full name
    #[serde(default)]
    pub name: String,

    /// Parent organization, if any
    #[serde(default)]
    pub super_organization_id: Option<OrganizationId>,
}

impl ResearchOrganization {
    pub fn new(id: OrganizationId, acronym: impl Into<String>) -> Self {
        Self {
            id,
            acronym: acronym.into(),
            name: String::new(),
            super_organization_id: None,
        }
    }

    /// Attach this organization to a parent
    pub fn within(mut self, parent: OrganizationId) -> Self {
        self.super_organization_id = Some(parent);
        self
    }
}
