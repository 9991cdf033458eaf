//! Data collaborators feeding the indicator engine.
//!
//! The indicator engine never talks to a database directly. Everything it
//! needs (organizations, memberships, publications, venues) comes through the
//! [`LabDataSource`] trait, so the engine can run on top of a persistence
//! layer, a JSON export or a test fixture alike.
//!
//! [`InMemoryLabData`] is the bundled implementation: it indexes a
//! [`LabDataset`] document that can be loaded from or saved to a JSON file.
//!
//! ```rust
//! use lab_indicators::models::{MemberStatus, Membership, ResearchOrganization};
//! use lab_indicators::sources::{InMemoryLabData, LabDataSource, LabDataset};
//!
//! let mut dataset = LabDataset::default();
//! dataset.organizations.push(ResearchOrganization::new(1, "LAB"));
//! dataset.organizations.push(ResearchOrganization::new(2, "TEAM").within(1));
//! dataset.memberships.push(Membership::new(10, 2, MemberStatus::PhdStudent));
//!
//! let data = InMemoryLabData::new(dataset);
//! assert_eq!(data.organization_tree(1, true), vec![1, 2]);
//! assert_eq!(data.memberships_in(2).len(), 1);
//! ```

mod memory;

pub use memory::{InMemoryLabData, LabDataset};

use std::collections::{HashSet, VecDeque};

use crate::models::{
    Conference, ConferenceId, Journal, JournalId, Membership, OrganizationId, PersonId,
    Publication, ResearchOrganization,
};

/// Read access to the laboratory data needed by the indicators.
///
/// Implementations return owned values; a persistence-backed implementation
/// is free to query lazily.
pub trait LabDataSource: Send + Sync + std::fmt::Debug {
    /// Get an organization by its identifier
    fn organization(&self, id: OrganizationId) -> Option<ResearchOrganization>;

    /// Direct children of an organization
    fn sub_organizations(&self, id: OrganizationId) -> Vec<ResearchOrganization>;

    /// Memberships held in the given organization, whatever their period
    fn memberships_in(&self, organization_id: OrganizationId) -> Vec<Membership>;

    /// Memberships held by the given person, whatever the organization
    fn memberships_of(&self, person_id: PersonId) -> Vec<Membership>;

    /// Publications the given person is an author of
    fn publications_of(&self, person_id: PersonId) -> Vec<Publication>;

    /// Get a journal by its identifier
    fn journal(&self, id: JournalId) -> Option<Journal>;

    /// Get a conference by its identifier
    fn conference(&self, id: ConferenceId) -> Option<Conference>;

    /// The organization followed, when `include_sub_organizations` is set,
    /// by all its transitive sub-organizations (breadth first, no repeats)
    fn organization_tree(
        &self,
        id: OrganizationId,
        include_sub_organizations: bool,
    ) -> Vec<OrganizationId> {
        let mut tree = vec![id];
        if !include_sub_organizations {
            return tree;
        }
        let mut visited: HashSet<OrganizationId> = HashSet::from([id]);
        let mut queue: VecDeque<OrganizationId> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for child in self.sub_organizations(current) {
                if visited.insert(child.id) {
                    tree.push(child.id);
                    queue.push_back(child.id);
                }
            }
        }
        tree
    }
}

/// Errors that can occur when loading laboratory data
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid JSON document
    #[error("Parse error: {0}")]
    Parse(String),

    /// Inconsistent dataset
    #[error("Invalid dataset: {0}")]
    Invalid(String),

    /// Unknown entity
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for DataSourceError {
    fn from(err: serde_json::Error) -> Self {
        DataSourceError::Parse(format!("JSON: {}", err))
    }
}
