//! Publication model.

use serde::{Deserialize, Serialize};

use super::{ConferenceId, JournalId, PersonId};

/// Identifier of a publication
pub type PublicationId = u64;

/// Type of publication and the venue it appeared in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublicationKind {
    JournalPaper { journal_id: JournalId },
    ConferencePaper { conference_id: ConferenceId },
    #[default]
    Other,
}

/// A publication authored by laboratory members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub id: PublicationId,
    pub title: String,

    /// Publication year
    pub year: i32,

    /// Authors, in order
    #[serde(default)]
    pub authors: Vec<PersonId>,

    #[serde(default)]
    pub kind: PublicationKind,
}

impl Publication {
    pub fn new(id: PublicationId, title: impl Into<String>, year: i32, kind: PublicationKind) -> Self {
        Self {
            id,
            title: title.into(),
            year,
            authors: Vec::new(),
            kind,
        }
    }

    /// Set the authors
    pub fn authored_by(mut self, authors: impl IntoIterator<Item = PersonId>) -> Self {
        self.authors = authors.into_iter().collect();
        self
    }

    pub fn journal_id(&self) -> Option<JournalId> {
        match self.kind {
            PublicationKind::JournalPaper { journal_id } => Some(journal_id),
            _ => None,
        }
    }

    pub fn conference_id(&self) -> Option<ConferenceId> {
        match self.kind {
            PublicationKind::ConferencePaper { conference_id } => Some(conference_id),
            _ => None,
        }
    }
}
