//! Core data models of the laboratory: organizations, members, venues and publications.

mod conference;
mod journal;
mod member;
mod organization;
mod publication;
mod ranking;

pub use conference::{Conference, ConferenceId};
pub use journal::{Journal, JournalId, JournalQualityAnnualIndicators};
pub use member::{MemberStatus, Membership, Person, PersonId};
pub use organization::{OrganizationId, ResearchOrganization};
pub use publication::{Publication, PublicationId, PublicationKind};
pub use ranking::{CoreRanking, ParseRankingError, QuartileRanking};
