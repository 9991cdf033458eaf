//! In-memory data source backed by a JSON dataset.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::{DataSourceError, LabDataSource};
use crate::models::{
    Conference, ConferenceId, Journal, JournalId, Membership, OrganizationId, Person, PersonId,
    Publication, ResearchOrganization,
};

/// Serializable export of the laboratory data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabDataset {
    #[serde(default)]
    pub organizations: Vec<ResearchOrganization>,

    #[serde(default)]
    pub persons: Vec<Person>,

    #[serde(default)]
    pub memberships: Vec<Membership>,

    #[serde(default)]
    pub publications: Vec<Publication>,

    #[serde(default)]
    pub journals: Vec<Journal>,

    #[serde(default)]
    pub conferences: Vec<Conference>,
}

impl LabDataset {
    /// Load a dataset from a JSON file
    pub fn load(path: &Path) -> Result<Self, DataSourceError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a dataset from a JSON document
    pub fn from_json(content: &str) -> Result<Self, DataSourceError> {
        let dataset: LabDataset = serde_json::from_str(content)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Save the dataset to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), DataSourceError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject duplicated identifiers
    pub fn validate(&self) -> Result<(), DataSourceError> {
        ensure_unique("organization", self.organizations.iter().map(|o| o.id))?;
        ensure_unique("person", self.persons.iter().map(|p| p.id))?;
        ensure_unique("publication", self.publications.iter().map(|p| p.id))?;
        ensure_unique("journal", self.journals.iter().map(|j| j.id))?;
        ensure_unique("conference", self.conferences.iter().map(|c| c.id))?;
        Ok(())
    }
}

fn ensure_unique(kind: &str, ids: impl Iterator<Item = u64>) -> Result<(), DataSourceError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(DataSourceError::Invalid(format!(
                "duplicate {} identifier {}",
                kind, id
            )));
        }
    }
    Ok(())
}

/// [`LabDataSource`] over an indexed [`LabDataset`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryLabData {
    dataset: LabDataset,
    organizations: HashMap<OrganizationId, usize>,
    children: HashMap<OrganizationId, Vec<usize>>,
    publications_by_person: HashMap<PersonId, Vec<usize>>,
    journals: HashMap<JournalId, usize>,
    conferences: HashMap<ConferenceId, usize>,
}

impl InMemoryLabData {
    /// Index the given dataset
    pub fn new(dataset: LabDataset) -> Self {
        let mut organizations = HashMap::new();
        let mut children: HashMap<OrganizationId, Vec<usize>> = HashMap::new();
        for (index, organization) in dataset.organizations.iter().enumerate() {
            organizations.insert(organization.id, index);
            if let Some(parent) = organization.super_organization_id {
                children.entry(parent).or_default().push(index);
            }
        }

        let mut publications_by_person: HashMap<PersonId, Vec<usize>> = HashMap::new();
        for (index, publication) in dataset.publications.iter().enumerate() {
            let authors: HashSet<PersonId> = publication.authors.iter().copied().collect();
            for author in authors {
                publications_by_person.entry(author).or_default().push(index);
            }
        }

        let journals = dataset
            .journals
            .iter()
            .enumerate()
            .map(|(index, journal)| (journal.id, index))
            .collect();
        let conferences = dataset
            .conferences
            .iter()
            .enumerate()
            .map(|(index, conference)| (conference.id, index))
            .collect();

        tracing::debug!(
            organizations = dataset.organizations.len(),
            memberships = dataset.memberships.len(),
            publications = dataset.publications.len(),
            "Indexed laboratory dataset"
        );

        Self {
            dataset,
            organizations,
            children,
            publications_by_person,
            journals,
            conferences,
        }
    }

    /// Load and index a JSON dataset file
    pub fn load(path: &Path) -> Result<Self, DataSourceError> {
        Ok(Self::new(LabDataset::load(path)?))
    }

    /// The underlying dataset
    pub fn dataset(&self) -> &LabDataset {
        &self.dataset
    }

    /// Give back the underlying dataset
    pub fn into_dataset(self) -> LabDataset {
        self.dataset
    }

    /// Find an organization by numeric id or by acronym (case-insensitive)
    pub fn find_organization(&self, reference: &str) -> Result<ResearchOrganization, DataSourceError> {
        let reference = reference.trim();
        let found = match reference.parse::<OrganizationId>() {
            Ok(id) => self.organization(id),
            Err(_) => self
                .dataset
                .organizations
                .iter()
                .find(|o| o.acronym.eq_ignore_ascii_case(reference))
                .cloned(),
        };
        found.ok_or_else(|| DataSourceError::NotFound(format!("organization '{}'", reference)))
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.dataset.persons.iter().find(|p| p.id == id)
    }
}

impl LabDataSource for InMemoryLabData {
    fn organization(&self, id: OrganizationId) -> Option<ResearchOrganization> {
        self.organizations
            .get(&id)
            .map(|&index| self.dataset.organizations[index].clone())
    }

    fn sub_organizations(&self, id: OrganizationId) -> Vec<ResearchOrganization> {
        self.children
            .get(&id)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&index| self.dataset.organizations[index].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn memberships_in(&self, organization_id: OrganizationId) -> Vec<Membership> {
        self.dataset
            .memberships
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect()
    }

    fn memberships_of(&self, person_id: PersonId) -> Vec<Membership> {
        self.dataset
            .memberships
            .iter()
            .filter(|m| m.person_id == person_id)
            .cloned()
            .collect()
    }

    fn publications_of(&self, person_id: PersonId) -> Vec<Publication> {
        self.publications_by_person
            .get(&person_id)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&index| self.dataset.publications[index].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn journal(&self, id: JournalId) -> Option<Journal> {
        self.journals
            .get(&id)
            .map(|&index| self.dataset.journals[index].clone())
    }

    fn conference(&self, id: ConferenceId) -> Option<Conference> {
        self.conferences
            .get(&id)
            .map(|&index| self.dataset.conferences[index].clone())
    }
}
