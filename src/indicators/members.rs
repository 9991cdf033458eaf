//! Head counts of the current members.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::{Indicator, IndicatorCache, IndicatorError, IndicatorValue, ReferencePeriod};
use crate::models::{MemberStatus, Membership, PersonId, ResearchOrganization};
use crate::sources::LabDataSource;

/// Group of members counted by [`ActiveMemberCountIndicator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberCategory {
    PermanentResearcher,
    PhdStudent,
    Postdoc,
    Engineer,
    All,
}

impl MemberCategory {
    pub fn matches(self, membership: &Membership) -> bool {
        match self {
            MemberCategory::PermanentResearcher => membership.is_permanent_researcher(),
            MemberCategory::PhdStudent => membership.status == MemberStatus::PhdStudent,
            MemberCategory::Postdoc => membership.status == MemberStatus::Postdoc,
            MemberCategory::Engineer => membership.status.is_engineer(),
            MemberCategory::All => true,
        }
    }

    fn key(self) -> &'static str {
        match self {
            MemberCategory::PermanentResearcher => "active_permanent_researcher_count",
            MemberCategory::PhdStudent => "active_phd_student_count",
            MemberCategory::Postdoc => "active_postdoc_count",
            MemberCategory::Engineer => "active_engineer_count",
            MemberCategory::All => "active_member_count",
        }
    }

    fn label(self) -> &'static str {
        match self {
            MemberCategory::PermanentResearcher => "Permanent researchers",
            MemberCategory::PhdStudent => "PhD students",
            MemberCategory::Postdoc => "Postdocs",
            MemberCategory::Engineer => "Engineers",
            MemberCategory::All => "Members",
        }
    }
}

/// Number of distinct persons of a category with a membership active today
#[derive(Debug)]
pub struct ActiveMemberCountIndicator {
    source: Arc<dyn LabDataSource>,
    category: MemberCategory,
    include_sub_organizations: bool,
    period: ReferencePeriod,
    cache: IndicatorCache,
}

impl ActiveMemberCountIndicator {
    pub fn new(source: Arc<dyn LabDataSource>, category: MemberCategory, today: NaiveDate) -> Self {
        Self {
            source,
            category,
            include_sub_organizations: true,
            period: ReferencePeriod::instant(today),
            cache: IndicatorCache::new(),
        }
    }

    pub fn include_sub_organizations(mut self, include: bool) -> Self {
        self.include_sub_organizations = include;
        // The key and the values depend on the option
        self.cache = IndicatorCache::new();
        self
    }

    pub fn category(&self) -> MemberCategory {
        self.category
    }
}

impl Indicator for ActiveMemberCountIndicator {
    fn compute_key(&self) -> String {
        let mut key = self.category.key().to_string();
        if !self.include_sub_organizations {
            key.push_str("_local");
        }
        key
    }

    fn label(&self) -> String {
        format!("{} on {}", self.category.label(), self.period.end())
    }

    fn reference_period(&self) -> &ReferencePeriod {
        &self.period
    }

    fn cache(&self) -> &IndicatorCache {
        &self.cache
    }

    fn compute_value(&self, organization: &ResearchOrganization) -> Result<IndicatorValue, IndicatorError> {
        let today = self.period.end();
        let persons: HashSet<PersonId> = self
            .source
            .organization_tree(organization.id, self.include_sub_organizations)
            .into_iter()
            .flat_map(|id| self.source.memberships_in(id))
            .filter(|m| m.is_active_at(today) && self.category.matches(m))
            .map(|m| m.person_id)
            .collect();
        Ok(IndicatorValue::Integer(persons.len() as i64))
    }
}
