//! Persons, member statuses and memberships in research organizations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::OrganizationId;

/// Identifier of a person
pub type PersonId = u64;

/// A person known by the laboratory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Status of a member within an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    EmeritusFullProfessor,
    FullProfessor,
    ResearchDirector,
    EmeritusAssociateProfessorHdr,
    EmeritusAssociateProfessor,
    AssociateProfessorHdr,
    AssociateProfessor,
    ContractualResearcherTeacherPhd,
    ContractualResearcherTeacher,
    ResearcherPhd,
    Researcher,
    Postdoc,
    ResearchEngineerPhd,
    ResearchEngineer,
    PhdStudent,
    EngineerPhd,
    Engineer,
    Admin,
    TeacherPhd,
    Teacher,
    MasterStudent,
    OtherStudent,
    AssociatedMemberPhd,
    AssociatedMember,
}

impl MemberStatus {
    /// Share of a full-time position usually dedicated to research
    pub fn usual_research_fte(self) -> f32 {
        use MemberStatus::*;
        match self {
            ResearchDirector | ResearcherPhd | Researcher | Postdoc | ResearchEngineerPhd
            | ResearchEngineer | PhdStudent | EngineerPhd | Engineer | MasterStudent
            | OtherStudent => 1.0,
            FullProfessor
            | AssociateProfessorHdr
            | AssociateProfessor
            | ContractualResearcherTeacherPhd
            | ContractualResearcherTeacher => 0.5,
            EmeritusFullProfessor
            | EmeritusAssociateProfessorHdr
            | EmeritusAssociateProfessor
            | Admin
            | TeacherPhd
            | Teacher
            | AssociatedMemberPhd
            | AssociatedMember => 0.0,
        }
    }

    /// Whether a member with this status may hold a permanent position
    pub fn is_permanent_position_allowed(self) -> bool {
        use MemberStatus::*;
        !matches!(
            self,
            EmeritusFullProfessor
                | Postdoc
                | PhdStudent
                | MasterStudent
                | OtherStudent
                | AssociatedMemberPhd
                | AssociatedMember
        )
    }

    /// Whether this status is a research position
    pub fn is_researcher(self) -> bool {
        use MemberStatus::*;
        matches!(
            self,
            EmeritusFullProfessor
                | FullProfessor
                | ResearchDirector
                | EmeritusAssociateProfessorHdr
                | EmeritusAssociateProfessor
                | AssociateProfessorHdr
                | AssociateProfessor
                | ContractualResearcherTeacherPhd
                | ContractualResearcherTeacher
                | ResearcherPhd
                | Researcher
                | Postdoc
                | PhdStudent
                | AssociatedMemberPhd
                | AssociatedMember
        )
    }

    /// Whether this status is an engineering position
    pub fn is_engineer(self) -> bool {
        use MemberStatus::*;
        matches!(
            self,
            ResearchEngineerPhd | ResearchEngineer | EngineerPhd | Engineer
        )
    }
}

/// Membership of a person in a research organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub person_id: PersonId,
    pub organization_id: OrganizationId,
    pub status: MemberStatus,

    /// Whether the position is permanent
    #[serde(default)]
    pub permanent_position: bool,

    /// First day of the membership (open if absent)
    #[serde(default)]
    pub since: Option<NaiveDate>,

    /// Last day of the membership (open if absent)
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl Membership {
    pub fn new(person_id: PersonId, organization_id: OrganizationId, status: MemberStatus) -> Self {
        Self {
            person_id,
            organization_id,
            status,
            permanent_position: false,
            since: None,
            to: None,
        }
    }

    /// Mark the position as permanent
    pub fn permanent(mut self) -> Self {
        self.permanent_position = true;
        self
    }

    /// Set the bounds of the membership
    pub fn between(mut self, since: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.since = since;
        self.to = to;
        self
    }

    pub fn is_active_at(&self, date: NaiveDate) -> bool {
        self.since.map_or(true, |since| since <= date) && self.to.map_or(true, |to| date <= to)
    }

    /// Whether the membership intersects `[start, end]`
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.since.map_or(true, |since| since <= end) && self.to.map_or(true, |to| start <= to)
    }

    pub fn is_active_in_year(&self, year: i32) -> bool {
        match (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) {
            (Some(start), Some(end)) => self.overlaps(start, end),
            _ => false,
        }
    }

    /// Permanent research position, the base of the laboratory's FTE
    pub fn is_permanent_researcher(&self) -> bool {
        self.permanent_position
            && self.status.is_researcher()
            && self.status.is_permanent_position_allowed()
    }
}
