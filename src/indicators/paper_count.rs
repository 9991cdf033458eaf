//! Counting of ranked papers published by an organization.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::{
    AnnualIndicator, Combiner, Indicator, IndicatorCache, IndicatorError, IndicatorValue,
    ReferencePeriod,
};
use crate::models::{
    MemberStatus, Membership, PersonId, Publication, PublicationId, PublicationKind,
    ResearchOrganization,
};
use crate::sources::LabDataSource;

/// Kind of venue a paper is published in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    Journal,
    Conference,
}

impl Venue {
    fn as_str(self) -> &'static str {
        match self {
            Venue::Journal => "journal",
            Venue::Conference => "conference",
        }
    }

    fn matches(self, kind: &PublicationKind) -> bool {
        matches!(
            (self, kind),
            (Venue::Journal, PublicationKind::JournalPaper { .. })
                | (Venue::Conference, PublicationKind::ConferencePaper { .. })
        )
    }
}

/// Ranking a paper must hold to be counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingSystem {
    Scimago,
    WebOfScience,
    Core,
    /// Any ranking available for the venue
    Any,
}

impl RankingSystem {
    fn key_part(self) -> &'static str {
        match self {
            RankingSystem::Scimago => "scimago",
            RankingSystem::WebOfScience => "wos",
            RankingSystem::Core => "core",
            RankingSystem::Any => "ranked",
        }
    }
}

impl fmt::Display for RankingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RankingSystem::Scimago => "Scimago",
            RankingSystem::WebOfScience => "WoS",
            RankingSystem::Core => "CORE",
            RankingSystem::Any => "any",
        };
        write!(f, "{}", name)
    }
}

/// Restriction on the status of at least one author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorRole {
    PhdStudent,
    Postdoc,
}

impl AuthorRole {
    fn key_part(self) -> &'static str {
        match self {
            AuthorRole::PhdStudent => "phd_student",
            AuthorRole::Postdoc => "postdoc",
        }
    }

    fn label(self) -> &'static str {
        match self {
            AuthorRole::PhdStudent => "PhD students",
            AuthorRole::Postdoc => "postdocs",
        }
    }

    pub fn matches(self, status: MemberStatus) -> bool {
        match self {
            AuthorRole::PhdStudent => status == MemberStatus::PhdStudent,
            AuthorRole::Postdoc => status == MemberStatus::Postdoc,
        }
    }
}

/// Number of ranked papers published by the members of an organization
/// over the last completed years.
///
/// A paper belongs to the organization when one of its authors holds a
/// membership in it (or in one of its sub-organizations when enabled) that
/// is active during the publication year. Each paper is counted once.
#[derive(Debug)]
pub struct RankedPaperCountIndicator {
    source: Arc<dyn LabDataSource>,
    venue: Venue,
    ranking: RankingSystem,
    author_role: Option<AuthorRole>,
    include_sub_organizations: bool,
    period: ReferencePeriod,
    cache: IndicatorCache,
}

impl RankedPaperCountIndicator {
    pub fn new(
        source: Arc<dyn LabDataSource>,
        venue: Venue,
        ranking: RankingSystem,
        today: NaiveDate,
        year_count: u32,
    ) -> Result<Self, IndicatorError> {
        Ok(Self {
            source,
            venue,
            ranking,
            author_role: None,
            include_sub_organizations: true,
            period: ReferencePeriod::trailing_years(today, year_count)?,
            cache: IndicatorCache::new(),
        })
    }

    /// Only count papers with at least one author holding this role
    pub fn with_author_role(mut self, role: AuthorRole) -> Self {
        self.author_role = Some(role);
        self.cache = IndicatorCache::new();
        self
    }

    /// Whether members of sub-organizations are considered
    pub fn include_sub_organizations(mut self, include: bool) -> Self {
        self.include_sub_organizations = include;
        // The key and the values depend on the option
        self.cache = IndicatorCache::new();
        self
    }

    pub fn venue(&self) -> Venue {
        self.venue
    }

    pub fn ranking(&self) -> RankingSystem {
        self.ranking
    }

    /// The papers counted for the organization, ordered by identifier
    pub fn papers(&self, organization: &ResearchOrganization) -> Vec<Publication> {
        let tree = self
            .source
            .organization_tree(organization.id, self.include_sub_organizations);

        let mut memberships: HashMap<PersonId, Vec<Membership>> = HashMap::new();
        for organization_id in tree {
            for membership in self.source.memberships_in(organization_id) {
                memberships
                    .entry(membership.person_id)
                    .or_default()
                    .push(membership);
            }
        }

        let mut papers: BTreeMap<PublicationId, Publication> = BTreeMap::new();
        for (person_id, person_memberships) in &memberships {
            for publication in self.source.publications_of(*person_id) {
                if papers.contains_key(&publication.id) || !self.venue.matches(&publication.kind) {
                    continue;
                }
                if person_memberships
                    .iter()
                    .any(|m| m.is_active_in_year(publication.year))
                {
                    papers.insert(publication.id, publication);
                }
            }
        }

        let papers = self
            .period
            .filter_by_year_window(papers.into_values().collect(), |p| p.year);

        papers
            .into_iter()
            .filter(|p| self.is_ranked(p))
            .filter(|p| self.has_author_role(p))
            .collect()
    }

    fn is_ranked(&self, publication: &Publication) -> bool {
        let year = publication.year;
        match publication.kind {
            PublicationKind::JournalPaper { journal_id } => {
                let Some(journal) = self.source.journal(journal_id) else {
                    tracing::debug!(journal_id, publication = publication.id, "Unknown journal");
                    return false;
                };
                match self.ranking {
                    RankingSystem::Scimago => journal.scimago_q_index_by_year(year).is_ranked(),
                    RankingSystem::WebOfScience => journal.wos_q_index_by_year(year).is_ranked(),
                    RankingSystem::Core | RankingSystem::Any => journal.is_ranked_for_year(year),
                }
            }
            PublicationKind::ConferencePaper { conference_id } => self
                .source
                .conference(conference_id)
                .is_some_and(|conference| conference.is_ranked_for_year(year)),
            PublicationKind::Other => false,
        }
    }

    fn has_author_role(&self, publication: &Publication) -> bool {
        let Some(role) = self.author_role else {
            return true;
        };
        let authors: HashSet<PersonId> = publication.authors.iter().copied().collect();
        authors.into_iter().any(|author| {
            self.source
                .memberships_of(author)
                .iter()
                .any(|m| role.matches(m.status) && m.is_active_in_year(publication.year))
        })
    }
}

impl Indicator for RankedPaperCountIndicator {
    fn compute_key(&self) -> String {
        let mut key = String::new();
        if let Some(role) = self.author_role {
            key.push_str(role.key_part());
            key.push('_');
        }
        key.push_str(self.ranking.key_part());
        key.push('_');
        key.push_str(self.venue.as_str());
        key.push_str("_paper_count");
        if !self.include_sub_organizations {
            key.push_str("_local");
        }
        key
    }

    fn label(&self) -> String {
        let ranking = match self.ranking {
            RankingSystem::Any => "Ranked".to_string(),
            other => format!("{}-ranked", other),
        };
        let mut label = format!(
            "{} {} papers ({}-{})",
            ranking,
            self.venue.as_str(),
            self.period.start_year(),
            self.period.end_year()
        );
        if let Some(role) = self.author_role {
            label.push_str(" with ");
            label.push_str(role.label());
        }
        label
    }

    fn reference_period(&self) -> &ReferencePeriod {
        &self.period
    }

    fn cache(&self) -> &IndicatorCache {
        &self.cache
    }

    fn compute_value(&self, organization: &ResearchOrganization) -> Result<IndicatorValue, IndicatorError> {
        let total = self.combined_value(organization)?;
        Ok(IndicatorValue::Integer(total.round() as i64))
    }
}

impl AnnualIndicator for RankedPaperCountIndicator {
    fn combiner(&self) -> Combiner {
        Combiner::Sum
    }

    fn values_per_year(&self, organization: &ResearchOrganization) -> Result<BTreeMap<i32, f64>, IndicatorError> {
        let mut values: BTreeMap<i32, f64> = self.period.years().map(|year| (year, 0.0)).collect();
        for paper in self.papers(organization) {
            *values.entry(paper.year).or_default() += 1.0;
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Conference, CoreRanking, Journal, QuartileRanking};
    use crate::sources::{InMemoryLabData, LabDataset};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn date(y: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, 1, 1)
    }

    fn dataset() -> LabDataset {
        let mut scimago = Journal::new(1, "Scimago only");
        scimago.set_scimago_q_index_by_year(2019, QuartileRanking::Q2);
        let mut wos = Journal::new(2, "WoS only");
        wos.set_wos_q_index_by_year(2022, QuartileRanking::Q1);
        let unranked = Journal::new(3, "Unranked");
        let mut conference = Conference::new(1, "Conf");
        conference.set_core_index_by_year(2020, CoreRanking::A);

        LabDataset {
            organizations: vec![
                ResearchOrganization::new(1, "LAB"),
                ResearchOrganization::new(2, "TEAM").within(1),
            ],
            persons: vec![],
            memberships: vec![
                Membership::new(10, 1, MemberStatus::AssociateProfessor).permanent(),
                Membership::new(11, 2, MemberStatus::PhdStudent).between(date(2021), None),
                Membership::new(12, 2, MemberStatus::Postdoc).between(None, date(2020)),
            ],
            publications: vec![
                Publication::new(100, "A", 2020, PublicationKind::JournalPaper { journal_id: 1 })
                    .authored_by([10, 11]),
                Publication::new(101, "B", 2022, PublicationKind::JournalPaper { journal_id: 2 })
                    .authored_by([11]),
                Publication::new(102, "C", 2023, PublicationKind::JournalPaper { journal_id: 3 })
                    .authored_by([10]),
                // Outside the window
                Publication::new(103, "D", 2018, PublicationKind::JournalPaper { journal_id: 1 })
                    .authored_by([10]),
                // Author no longer a member in 2023
                Publication::new(104, "E", 2023, PublicationKind::JournalPaper { journal_id: 1 })
                    .authored_by([12]),
                Publication::new(105, "F", 2021, PublicationKind::ConferencePaper { conference_id: 1 })
                    .authored_by([11, 10]),
                Publication::new(106, "G", 2021, PublicationKind::Other).authored_by([10]),
            ],
            journals: vec![scimago, wos, unranked],
            conferences: vec![conference],
        }
    }

    fn indicator(venue: Venue, ranking: RankingSystem) -> RankedPaperCountIndicator {
        let source = Arc::new(InMemoryLabData::new(dataset()));
        RankedPaperCountIndicator::new(source, venue, ranking, today(), 5).unwrap()
    }

    fn lab() -> ResearchOrganization {
        ResearchOrganization::new(1, "LAB")
    }

    fn ids(papers: Vec<Publication>) -> Vec<PublicationId> {
        papers.into_iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_keys() {
        assert_eq!(
            indicator(Venue::Journal, RankingSystem::Scimago).key(),
            "scimago_journal_paper_count"
        );
        assert_eq!(
            indicator(Venue::Conference, RankingSystem::Core).key(),
            "core_conference_paper_count"
        );
        let phd = indicator(Venue::Journal, RankingSystem::Any).with_author_role(AuthorRole::PhdStudent);
        assert_eq!(phd.key(), "phd_student_ranked_journal_paper_count");
        let local = indicator(Venue::Journal, RankingSystem::WebOfScience).include_sub_organizations(false);
        assert_eq!(local.key(), "wos_journal_paper_count_local");
    }

    #[test]
    fn test_options_after_key() {
        let wos = indicator(Venue::Journal, RankingSystem::WebOfScience);
        assert_eq!(wos.key(), "wos_journal_paper_count");
        let wos = wos.include_sub_organizations(false);
        assert_eq!(wos.key(), "wos_journal_paper_count_local");

        let phd = indicator(Venue::Journal, RankingSystem::Any);
        assert_eq!(phd.key(), "ranked_journal_paper_count");
        let phd = phd.with_author_role(AuthorRole::PhdStudent);
        assert_eq!(phd.key(), "phd_student_ranked_journal_paper_count");
    }

    #[test]
    fn test_scimago_papers() {
        let indicator = indicator(Venue::Journal, RankingSystem::Scimago);
        // Paper 100 is authored twice but counted once
        assert_eq!(ids(indicator.papers(&lab())), vec![100]);
        assert_eq!(
            indicator.numeric_value(&lab()).unwrap(),
            IndicatorValue::Integer(1)
        );
    }

    #[test]
    fn test_any_ranking() {
        let indicator = indicator(Venue::Journal, RankingSystem::Any);
        assert_eq!(ids(indicator.papers(&lab())), vec![100, 101]);

        let values = indicator.values_per_year(&lab()).unwrap();
        assert_eq!(values.len(), 5);
        assert_eq!(values[&2020], 1.0);
        assert_eq!(values[&2022], 1.0);
        assert_eq!(values[&2023], 0.0);
    }

    #[test]
    fn test_conference_papers() {
        let indicator = indicator(Venue::Conference, RankingSystem::Core);
        assert_eq!(ids(indicator.papers(&lab())), vec![105]);
    }

    #[test]
    fn test_sub_organizations_excluded() {
        let excluded = indicator(Venue::Journal, RankingSystem::WebOfScience).include_sub_organizations(false);
        assert!(excluded.papers(&lab()).is_empty());

        let included = indicator(Venue::Journal, RankingSystem::WebOfScience);
        assert_eq!(ids(included.papers(&lab())), vec![101]);
    }

    #[test]
    fn test_author_role() {
        let phd = indicator(Venue::Journal, RankingSystem::Any).with_author_role(AuthorRole::PhdStudent);
        // In 2020 the PhD membership had not started yet
        assert_eq!(ids(phd.papers(&lab())), vec![101]);

        let postdoc = indicator(Venue::Journal, RankingSystem::Any).with_author_role(AuthorRole::Postdoc);
        assert!(postdoc.papers(&lab()).is_empty());
    }

    #[test]
    fn test_memoized_until_cleared() {
        let indicator = indicator(Venue::Journal, RankingSystem::Any);
        assert_eq!(indicator.numeric_value(&lab()).unwrap(), IndicatorValue::Integer(2));
        assert_eq!(indicator.cache().len(), 1);
        indicator.clear();
        assert!(indicator.cache().is_empty());
    }

    #[test]
    fn test_label() {
        let indicator = indicator(Venue::Journal, RankingSystem::Scimago).with_author_role(AuthorRole::Postdoc);
        assert_eq!(
            indicator.label(),
            "Scimago-ranked journal papers (2019-2023) with postdocs"
        );
    }
}
