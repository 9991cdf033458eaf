//! Registry of the indicators available for an organization.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{
    ActiveMemberCountIndicator, AuthorRole, Indicator, IndicatorError, IndicatorValue,
    MemberCategory, PapersPerFteIndicator, PermanentResearcherFteIndicator,
    RankedPaperCountIndicator, RankingSystem, Venue,
};
use crate::config::IndicatorConfig;
use crate::models::ResearchOrganization;
use crate::sources::LabDataSource;

/// Indicators indexed by key
#[derive(Debug, Default)]
pub struct IndicatorRegistry {
    indicators: BTreeMap<String, Arc<dyn Indicator>>,
}

impl IndicatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the indicators usually displayed for a laboratory
    pub fn standard(
        source: Arc<dyn LabDataSource>,
        config: &IndicatorConfig,
        today: NaiveDate,
    ) -> Result<Self, IndicatorError> {
        let years = config.year_count;
        let with_subs = config.include_sub_organizations;
        let mut registry = Self::new();

        let paper_count = |venue, ranking| {
            RankedPaperCountIndicator::new(source.clone(), venue, ranking, today, years)
                .map(|indicator| indicator.include_sub_organizations(with_subs))
        };

        let scimago = Arc::new(paper_count(Venue::Journal, RankingSystem::Scimago)?);
        let ranked = Arc::new(paper_count(Venue::Journal, RankingSystem::Any)?);
        let fte = Arc::new(
            PermanentResearcherFteIndicator::new(source.clone(), today, years)?
                .include_sub_organizations(with_subs),
        );

        registry.register(scimago.clone());
        registry.register(ranked.clone());
        registry.register(Arc::new(paper_count(Venue::Journal, RankingSystem::WebOfScience)?));
        registry.register(Arc::new(paper_count(Venue::Conference, RankingSystem::Core)?));
        for role in [AuthorRole::PhdStudent, AuthorRole::Postdoc] {
            registry.register(Arc::new(
                paper_count(Venue::Journal, RankingSystem::Any)?.with_author_role(role),
            ));
        }
        registry.register(fte.clone());
        registry.register(Arc::new(PapersPerFteIndicator::new(scimago, fte.clone())?));
        registry.register(Arc::new(PapersPerFteIndicator::new(ranked, fte)?));

        for category in [
            MemberCategory::All,
            MemberCategory::PermanentResearcher,
            MemberCategory::PhdStudent,
            MemberCategory::Postdoc,
            MemberCategory::Engineer,
        ] {
            registry.register(Arc::new(
                ActiveMemberCountIndicator::new(source.clone(), category, today)
                    .include_sub_organizations(with_subs),
            ));
        }

        tracing::debug!(count = registry.len(), "Registered standard indicators");
        Ok(registry)
    }

    /// Add an indicator, replacing any indicator with the same key
    pub fn register(&mut self, indicator: Arc<dyn Indicator>) {
        let key = indicator.key().to_string();
        if self.indicators.insert(key.clone(), indicator).is_some() {
            tracing::warn!(indicator = %key, "Replacing registered indicator");
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Indicator>> {
        self.indicators.get(key).cloned()
    }

    /// Registered keys, in lexicographic order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.indicators.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Indicator>> {
        self.indicators.values()
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Value of a single indicator
    pub fn value(
        &self,
        key: &str,
        organization: &ResearchOrganization,
    ) -> Result<IndicatorValue, IndicatorError> {
        self.indicators
            .get(key)
            .ok_or_else(|| IndicatorError::UnknownIndicator(key.to_string()))?
            .numeric_value(organization)
    }

    /// Compute every indicator for the organization.
    ///
    /// A failing indicator does not prevent the others from being computed.
    pub fn compute_all(
        &self,
        organization: &ResearchOrganization,
    ) -> BTreeMap<String, Result<IndicatorValue, IndicatorError>> {
        self.indicators
            .iter()
            .map(|(key, indicator)| (key.clone(), indicator.numeric_value(organization)))
            .collect()
    }

    /// Forget the memoized values of every indicator
    pub fn clear_all(&self) {
        for indicator in self.indicators.values() {
            indicator.clear();
        }
    }
}
