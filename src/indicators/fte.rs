//! Full-time equivalent of the permanent research staff.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{
    AnnualIndicator, Combiner, Indicator, IndicatorCache, IndicatorError, IndicatorValue,
    ReferencePeriod,
};
use crate::models::{Membership, PersonId, ResearchOrganization};
use crate::sources::LabDataSource;

/// Average yearly research FTE of the permanent researchers.
///
/// For each year, every permanent researcher with a membership active during
/// that year contributes the usual research FTE of its status. A person with
/// several memberships contributes once, with the highest FTE.
#[derive(Debug)]
pub struct PermanentResearcherFteIndicator {
    source: Arc<dyn LabDataSource>,
    include_sub_organizations: bool,
    period: ReferencePeriod,
    cache: IndicatorCache,
}

impl PermanentResearcherFteIndicator {
    pub fn new(
        source: Arc<dyn LabDataSource>,
        today: NaiveDate,
        year_count: u32,
    ) -> Result<Self, IndicatorError> {
        Ok(Self {
            source,
            include_sub_organizations: true,
            period: ReferencePeriod::trailing_years(today, year_count)?,
            cache: IndicatorCache::new(),
        })
    }

    pub fn include_sub_organizations(mut self, include: bool) -> Self {
        self.include_sub_organizations = include;
        // The key and the values depend on the option
        self.cache = IndicatorCache::new();
        self
    }

    fn permanent_memberships(&self, organization: &ResearchOrganization) -> Vec<Membership> {
        self.source
            .organization_tree(organization.id, self.include_sub_organizations)
            .into_iter()
            .flat_map(|id| self.source.memberships_in(id))
            .filter(Membership::is_permanent_researcher)
            .collect()
    }
}

impl Indicator for PermanentResearcherFteIndicator {
    fn compute_key(&self) -> String {
        if self.include_sub_organizations {
            "permanent_researcher_fte".to_string()
        } else {
            "permanent_researcher_fte_local".to_string()
        }
    }

    fn label(&self) -> String {
        format!(
            "Permanent researcher FTE ({}-{})",
            self.period.start_year(),
            self.period.end_year()
        )
    }

    fn reference_period(&self) -> &ReferencePeriod {
        &self.period
    }

    fn cache(&self) -> &IndicatorCache {
        &self.cache
    }

    fn compute_value(&self, organization: &ResearchOrganization) -> Result<IndicatorValue, IndicatorError> {
        Ok(IndicatorValue::Float(self.combined_value(organization)?))
    }
}

impl AnnualIndicator for PermanentResearcherFteIndicator {
    fn combiner(&self) -> Combiner {
        Combiner::Mean
    }

    fn values_per_year(&self, organization: &ResearchOrganization) -> Result<BTreeMap<i32, f64>, IndicatorError> {
        let memberships = self.permanent_memberships(organization);
        let values = self
            .period
            .years()
            .map(|year| {
                let mut per_person: HashMap<PersonId, f32> = HashMap::new();
                for membership in memberships.iter().filter(|m| m.is_active_in_year(year)) {
                    let fte = membership.status.usual_research_fte();
                    let current = per_person.entry(membership.person_id).or_insert(0.0);
                    *current = current.max(fte);
                }
                (year, per_person.values().map(|&fte| f64::from(fte)).sum())
            })
            .collect();
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemberStatus;
    use crate::sources::{InMemoryLabData, LabDataset};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn indicator() -> PermanentResearcherFteIndicator {
        let dataset = LabDataset {
            organizations: vec![
                ResearchOrganization::new(1, "LAB"),
                ResearchOrganization::new(2, "TEAM").within(1),
            ],
            memberships: vec![
                // 1.0 every year
                Membership::new(1, 1, MemberStatus::Researcher).permanent(),
                // 0.5, leaves mid 2022
                Membership::new(2, 2, MemberStatus::AssociateProfessor)
                    .permanent()
                    .between(None, Some(date(2022, 6, 30))),
                // Same person, promoted mid 2022: counted once per year
                Membership::new(2, 1, MemberStatus::ResearchDirector)
                    .permanent()
                    .between(Some(date(2022, 7, 1)), None),
                // Not permanent
                Membership::new(3, 1, MemberStatus::Researcher),
                // Permanent engineer, not a researcher
                Membership::new(4, 1, MemberStatus::Engineer).permanent(),
            ],
            ..LabDataset::default()
        };
        let source = Arc::new(InMemoryLabData::new(dataset));
        PermanentResearcherFteIndicator::new(source, date(2024, 3, 1), 3).unwrap()
    }

    #[test]
    fn test_values_per_year() {
        let indicator = indicator();
        let lab = ResearchOrganization::new(1, "LAB");
        let values = indicator.values_per_year(&lab).unwrap();
        assert_eq!(values, BTreeMap::from([(2021, 1.5), (2022, 2.0), (2023, 2.0)]));
    }

    #[test]
    fn test_mean_value() {
        let indicator = indicator();
        let lab = ResearchOrganization::new(1, "LAB");
        let value = indicator.numeric_value(&lab).unwrap().as_f64();
        assert!((value - 5.5 / 3.0).abs() < 1e-9);
        assert_eq!(indicator.key(), "permanent_researcher_fte");
    }

    #[test]
    fn test_without_sub_organizations() {
        let indicator = indicator();
        assert_eq!(indicator.key(), "permanent_researcher_fte");
        let indicator = indicator.include_sub_organizations(false);
        assert_eq!(indicator.key(), "permanent_researcher_fte_local");
        let lab = ResearchOrganization::new(1, "LAB");
        let values = indicator.values_per_year(&lab).unwrap();
        assert_eq!(values, BTreeMap::from([(2021, 1.0), (2022, 2.0), (2023, 2.0)]));
    }
}
