//! Integration tests for Lab Indicators
//!
//! These tests run the indicator engine and the ranking reconciliation on a
//! small laboratory dataset stored as JSON.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use lab_indicators::config::{load_config, IndicatorConfig};
use lab_indicators::indicators::{
    AnnualIndicator, IndicatorError, IndicatorRegistry, IndicatorSnapshot, IndicatorValue,
    PapersPerFteIndicator, PermanentResearcherFteIndicator, RankedPaperCountIndicator,
    RankingSystem, ReferencePeriod, Venue,
};
use lab_indicators::models::{
    Conference, CoreRanking, Journal, MemberStatus, Membership, Person, Publication,
    PublicationKind, QuartileRanking, ResearchOrganization,
};
use lab_indicators::ranking::{core_portal, scimago, wos, RankingUpdater};
use lab_indicators::sources::{InMemoryLabData, LabDataSource, LabDataset};
use lab_indicators::Indicator;
use std::sync::Arc;
use tempfile::tempdir;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 3, 1)
}

fn person(id: u64, first_name: &str, last_name: &str) -> Person {
    Person {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    }
}

fn journal_paper(id: u64, year: i32, journal_id: u64, authors: &[u64]) -> Publication {
    Publication::new(
        id,
        format!("Paper {}", id),
        year,
        PublicationKind::JournalPaper { journal_id },
    )
    .authored_by(authors.iter().copied())
}

/// A laboratory with one team:
///
/// - 1: full professor, permanent, in the laboratory
/// - 2: researcher, permanent, in the team
/// - 3: PhD student in the team since October 2021
/// - 4: postdoc in the laboratory until 2020
fn dataset() -> LabDataset {
    let mut dataset = LabDataset::default();
    dataset.organizations = vec![
        ResearchOrganization::new(1, "LAB"),
        ResearchOrganization::new(2, "TEAM").within(1),
    ];
    dataset.persons = vec![
        person(1, "Ada", "Lovelace"),
        person(2, "Alan", "Turing"),
        person(3, "Grace", "Hopper"),
        person(4, "Edsger", "Dijkstra"),
    ];
    dataset.memberships = vec![
        Membership::new(1, 1, MemberStatus::FullProfessor).permanent(),
        Membership::new(2, 2, MemberStatus::Researcher).permanent(),
        Membership::new(3, 2, MemberStatus::PhdStudent).between(Some(date(2021, 10, 1)), None),
        Membership::new(4, 1, MemberStatus::Postdoc)
            .between(Some(date(2019, 1, 1)), Some(date(2020, 12, 31))),
    ];

    let mut scimago_journal = Journal::new(10, "Journal of Robotics");
    scimago_journal.set_scimago_q_index_by_year(2018, QuartileRanking::Q1);

    let mut wos_journal = Journal::new(11, "Applied Intelligence");
    wos_journal.issn = Some("0924-669X".to_string());
    wos_journal.wos_category = Some("Computer Science, Artificial Intelligence".to_string());
    wos_journal.set_wos_q_index_by_year(2022, QuartileRanking::Q2);

    let mut unranked_journal = Journal::new(12, "Software Letters");
    unranked_journal.scimago_id = Some("300".to_string());
    unranked_journal.scimago_category = Some("Software".to_string());

    dataset.journals = vec![scimago_journal, wos_journal, unranked_journal];

    let mut conference = Conference::new(20, "International Conference on Agents");
    conference.acronym = Some("ICA".to_string());
    conference.set_core_index_by_year(2020, CoreRanking::A);
    dataset.conferences = vec![conference];

    dataset.publications = vec![
        journal_paper(100, 2022, 10, &[1, 3]),
        journal_paper(101, 2022, 11, &[2]),
        // Before the reference period
        journal_paper(102, 2020, 10, &[1]),
        journal_paper(103, 2023, 12, &[2]),
        Publication::new(
            104,
            "Paper 104",
            2023,
            PublicationKind::ConferencePaper { conference_id: 20 },
        )
        .authored_by([2, 3]),
        // The only author had left the laboratory
        journal_paper(105, 2021, 10, &[4]),
        // Two authors of the laboratory, counted once
        journal_paper(106, 2023, 10, &[1, 2]),
    ];
    dataset
}

fn indicator_config() -> IndicatorConfig {
    IndicatorConfig {
        year_count: 3,
        ..IndicatorConfig::default()
    }
}

fn load_from_disk(dataset: &LabDataset) -> Arc<InMemoryLabData> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lab.json");
    dataset.save(&path).unwrap();
    Arc::new(InMemoryLabData::load(&path).unwrap())
}

#[test]
fn test_standard_indicators_from_json_dataset() {
    let data = load_from_disk(&dataset());
    let lab = data.find_organization("lab").unwrap();
    let registry = IndicatorRegistry::standard(data.clone(), &indicator_config(), today()).unwrap();

    let value = |key: &str| registry.value(key, &lab).unwrap();

    assert_eq!(value("scimago_journal_paper_count"), IndicatorValue::Integer(2));
    assert_eq!(value("wos_journal_paper_count"), IndicatorValue::Integer(1));
    assert_eq!(value("ranked_journal_paper_count"), IndicatorValue::Integer(3));
    assert_eq!(value("core_conference_paper_count"), IndicatorValue::Integer(1));
    assert_eq!(
        value("phd_student_ranked_journal_paper_count"),
        IndicatorValue::Integer(1)
    );
    assert_eq!(
        value("postdoc_ranked_journal_paper_count"),
        IndicatorValue::Integer(0)
    );
    assert_eq!(value("permanent_researcher_fte"), IndicatorValue::Float(1.5));

    let per_fte = value("scimago_journal_paper_count_per_fte").as_f64();
    assert!((per_fte - 2.0 / 1.5 / 3.0).abs() < 1e-9);

    assert_eq!(value("active_member_count"), IndicatorValue::Integer(3));
    assert_eq!(value("active_permanent_researcher_count"), IndicatorValue::Integer(2));
    assert_eq!(value("active_phd_student_count"), IndicatorValue::Integer(1));
    assert_eq!(value("active_postdoc_count"), IndicatorValue::Integer(0));
    assert_eq!(value("active_engineer_count"), IndicatorValue::Integer(0));

    assert!(matches!(
        registry.value("h_index", &lab),
        Err(IndicatorError::UnknownIndicator(_))
    ));
}

#[test]
fn test_sub_organizations_excluded() {
    let data = load_from_disk(&dataset());
    let lab = data.find_organization("1").unwrap();
    let config = IndicatorConfig {
        include_sub_organizations: false,
        ..indicator_config()
    };
    let registry = IndicatorRegistry::standard(data, &config, today()).unwrap();

    // Only the professor remains: papers 100 and 106
    assert_eq!(
        registry.value("scimago_journal_paper_count_local", &lab).unwrap(),
        IndicatorValue::Integer(2)
    );
    assert_eq!(
        registry.value("permanent_researcher_fte_local", &lab).unwrap(),
        IndicatorValue::Float(0.5)
    );
}

#[test]
fn test_team_indicators() {
    let data = Arc::new(InMemoryLabData::new(dataset()));
    let team = data.find_organization("TEAM").unwrap();
    let registry = IndicatorRegistry::standard(data, &indicator_config(), today()).unwrap();

    // 101 and 106 by the researcher, 100 by the PhD student
    assert_eq!(
        registry.value("ranked_journal_paper_count", &team).unwrap(),
        IndicatorValue::Integer(3)
    );
    assert_eq!(
        registry.value("permanent_researcher_fte", &team).unwrap(),
        IndicatorValue::Float(1.0)
    );
}

#[test]
fn test_memoized_values_and_clear() {
    let data = Arc::new(InMemoryLabData::new(dataset()));
    let lab = data.find_organization("LAB").unwrap();
    let registry = IndicatorRegistry::standard(data, &indicator_config(), today()).unwrap();

    let results = registry.compute_all(&lab);
    assert_eq!(results.len(), registry.len());
    assert!(results.values().all(Result::is_ok));

    let indicator = registry.get("scimago_journal_paper_count").unwrap();
    assert_eq!(indicator.cache().len(), 1);
    registry.clear_all();
    assert!(indicator.cache().is_empty());
    assert_eq!(
        indicator.numeric_value(&lab).unwrap(),
        IndicatorValue::Integer(2)
    );
}

#[test]
fn test_zero_fte_is_an_error() {
    let mut dataset = dataset();
    dataset.memberships.retain(|m| !m.permanent_position);
    let data: Arc<dyn LabDataSource> = Arc::new(InMemoryLabData::new(dataset));
    let lab = data.organization(1).unwrap();

    let papers = Arc::new(
        RankedPaperCountIndicator::new(data.clone(), Venue::Journal, RankingSystem::Scimago, today(), 3)
            .unwrap(),
    );
    let fte = Arc::new(PermanentResearcherFteIndicator::new(data, today(), 3).unwrap());
    assert_eq!(fte.combined_value(&lab).unwrap(), 0.0);

    let ratio = PapersPerFteIndicator::new(papers, fte).unwrap();
    assert!(matches!(
        ratio.numeric_value(&lab),
        Err(IndicatorError::ZeroDenominator { .. })
    ));
    assert!(ratio.cache().is_empty());
}

#[test]
fn test_snapshot_saved_and_restored() {
    let data = Arc::new(InMemoryLabData::new(dataset()));
    let lab = data.find_organization("LAB").unwrap();
    let registry = IndicatorRegistry::standard(data, &indicator_config(), today()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

    let mut snapshot = IndicatorSnapshot::from_registry(&registry, &lab, now);
    snapshot.set_visible_keys("permanent_researcher_fte; scimago_journal_paper_count /unknown");
    assert_eq!(snapshot.last_update, Some(now));
    assert_eq!(
        snapshot.visible_keys(),
        "permanent_researcher_fte,scimago_journal_paper_count,unknown"
    );
    assert_eq!(
        snapshot.visible_values(),
        vec![
            ("permanent_researcher_fte", IndicatorValue::Float(1.5)),
            ("scimago_journal_paper_count", IndicatorValue::Integer(2)),
        ]
    );

    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, snapshot.to_json().unwrap()).unwrap();
    let restored = IndicatorSnapshot::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(restored, snapshot);
}

#[test]
fn test_reference_periods() {
    for year_count in 1..=10 {
        let period = ReferencePeriod::trailing_years(today(), year_count).unwrap();
        assert_eq!(period.end_year(), today().year() - 1);
        assert_eq!(period.end_year(), period.start_year() + year_count as i32 - 1);
        assert_eq!(period.start(), date(period.start_year(), 1, 1));
        assert_eq!(period.end(), date(period.end_year(), 12, 31));
    }
    assert!(ReferencePeriod::trailing_years(today(), 0).is_err());

    let instant = ReferencePeriod::instant(today());
    assert_eq!(instant.start(), instant.end());
}

#[test]
fn test_scimago_update_changes_indicators() {
    let table = "Rank;Sourceid;Title;SJR Best Quartile;Categories\n\
        1;300;Software Letters;Q2;\"Software (Q2); Computer Science Applications (Q3)\"\n";
    let ranking = scimago::read_journal_ranking(table.as_bytes(), true).unwrap();

    let mut dataset = dataset();
    let updater = RankingUpdater::new(2023);
    let updates = updater.scimago_updates(&dataset.journals, &ranking);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].selected(), Some(QuartileRanking::Q2));
    assert_eq!(updater.apply(&mut dataset.journals, &updates), 1);

    let data = Arc::new(InMemoryLabData::new(dataset));
    let lab = data.find_organization("LAB").unwrap();
    let registry = IndicatorRegistry::standard(data, &indicator_config(), today()).unwrap();
    // Paper 103 is now ranked
    assert_eq!(
        registry.value("scimago_journal_paper_count", &lab).unwrap(),
        IndicatorValue::Integer(3)
    );
}

#[test]
fn test_wos_update_records_impact_factor() {
    let table = "Journal name;ISSN;EISSN;Category & Journal Quartiles;IF 2023\n\
        APPL INTELL;0924-669X;1573-7497;COMPUTER SCIENCE, ARTIFICIAL INTELLIGENCE - SCIE(Q1);5,3\n";
    let ranking = wos::read_journal_ranking(table.as_bytes()).unwrap();

    let mut dataset = dataset();
    let updater = RankingUpdater::new(2023);
    let updates = updater.wos_updates(&dataset.journals, &ranking);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].previous, QuartileRanking::Q2);
    assert_eq!(updates[0].selected(), Some(QuartileRanking::Q1));

    assert_eq!(updater.apply(&mut dataset.journals, &updates), 1);
    let journal = &dataset.journals[1];
    assert_eq!(journal.wos_q_index_by_year(2023), QuartileRanking::Q1);
    assert_eq!(journal.wos_q_index_by_year(2022), QuartileRanking::Q2);
    assert!((journal.impact_factor_by_year(2023) - 5.3).abs() < 1e-6);
}

#[test]
fn test_core_update_changes_indicators() {
    let table = "\"1530\",\"International Conference on Agents\",\"ICA\",\"CORE2023\",\"National: France\",\"No\"\n\
        \"4\",\"International Conference on Robotics and Automation\",\"ICRA\",\"CORE2023\",\"A*\",\"Yes\"\n";
    let core = core_portal::read_conference_ranking(table.as_bytes()).unwrap();

    let mut dataset = dataset();
    let updater = RankingUpdater::new(2023);
    let updates = updater.core_updates(&dataset.conferences, &core);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].previous, CoreRanking::A);
    assert_eq!(updates[0].ranking, Some(CoreRanking::NR));
    assert_eq!(updater.apply_core(&mut dataset.conferences, &updates), 1);
    assert_eq!(dataset.conferences[0].core_id.as_deref(), Some("1530"));

    let data = load_from_disk(&dataset);
    let conference = data.conference(20).unwrap();
    assert_eq!(conference.core_id.as_deref(), Some("1530"));
    assert_eq!(conference.core_index_by_year(2022), CoreRanking::A);

    let lab = data.find_organization("LAB").unwrap();
    let registry = IndicatorRegistry::standard(data, &indicator_config(), today()).unwrap();
    // Paper 104 was published in 2023, when the conference lost its rank
    assert_eq!(
        registry.value("core_conference_paper_count", &lab).unwrap(),
        IndicatorValue::Integer(0)
    );
}

#[test]
fn test_configured_registry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lab-indicators.toml");
    std::fs::write(
        &path,
        "[indicators]\nyear_count = 2\ntoday = \"2024-03-01\"\n",
    )
    .unwrap();
    let config = load_config(Some(path.as_path())).unwrap();
    assert_eq!(config.indicators.reference_date(), today());

    let data = Arc::new(InMemoryLabData::new(dataset()));
    let lab = data.find_organization("LAB").unwrap();
    let registry = IndicatorRegistry::standard(
        data,
        &config.indicators,
        config.indicators.reference_date(),
    )
    .unwrap();

    let indicator = registry.get("scimago_journal_paper_count").unwrap();
    assert_eq!(indicator.reference_period().start_year(), 2022);
    assert_eq!(indicator.reference_period().end_year(), 2023);
    assert!(indicator.label().contains("2022-2023"));
    assert_eq!(indicator.numeric_value(&lab).unwrap(), IndicatorValue::Integer(2));
}
