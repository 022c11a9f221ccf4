//! End-to-end scenarios: configuration on disk -> watchlist -> risk record

use compliance_service::{QueryEntity, ReferenceIndex, ScreeningConfig, ScreeningStatus, WatchlistRecord, WatchlistScreener};
use proptest::prelude::*;
use risk_engine::{
    EngineConfig, KycSource, RiskConfig, RiskLevel, RiskScorer, ScreeningReport,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const MASTER_CSV: &str = "\
name,country,address,list_type,program,risk_level,source,notes
Islamic Revolutionary Guard Corps,Iran,,ENTITY_LIST,IRAN,High,BIS,
Bank Melli Iran,Iran,Ferdowsi Avenue Tehran,OFAC_SDN,IRAN,High,OFAC,
Korea Kwangson Banking Corp,North Korea,,OFAC_SDN,DPRK,High,OFAC,
";

const KYC_CSV: &str = "\
name,flag,severity
Acme Trading LLC,shell company indicators,high
";

fn write(dir: &Path, file: &str, contents: &str) {
    fs::write(dir.join(file), contents).unwrap();
}

fn engine_dir(extra_config: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "master.csv", MASTER_CSV);
    write(dir.path(), "kyc.csv", KYC_CSV);
    write(
        dir.path(),
        "engine.toml",
        &format!(
            "watchlist_path = \"master.csv\"\nkyc_flags_path = \"kyc.csv\"\n{}",
            extra_config
        ),
    );
    dir
}

fn scorer_from(dir: &TempDir) -> RiskScorer {
    let config = EngineConfig::from_toml_file(dir.path().join("engine.toml")).unwrap();
    RiskScorer::from_config(&config).unwrap()
}

#[test]
fn test_sanctioned_entity_is_high_risk() {
    let dir = engine_dir("");
    let scorer = scorer_from(&dir);
    let query = QueryEntity::new("islamic revolutionary guard corps").with_country("iran");

    let assessment = scorer.assess(&query).unwrap();
    assert_eq!(assessment.screening.status(), ScreeningStatus::PotentialMatch);
    assert!(assessment.risk.match_score >= 90.0);
    assert_eq!(assessment.risk.matched_list.as_deref(), Some("ENTITY_LIST"));
    assert_eq!(assessment.risk.risk_level, RiskLevel::High);
}

#[test]
fn test_unknown_entity_is_low_risk() {
    let dir = engine_dir("");
    let scorer = scorer_from(&dir);
    let query = QueryEntity::new("John Smith").with_country("USA");

    let assessment = scorer.assess(&query).unwrap();
    assert_eq!(assessment.screening.status(), ScreeningStatus::NoMatch);
    assert_eq!(assessment.risk.match_score, 0.0);
    assert_eq!(assessment.risk.geo_risk_score, 20);
    assert_eq!(assessment.risk.kyc_score, 0);
    assert_eq!(assessment.risk.risk_level, RiskLevel::Low);
}

#[test]
fn test_geographic_defaults() {
    let dir = engine_dir("");
    let scorer = scorer_from(&dir);

    assert_eq!(scorer.geo_risk(Some("brazil")), 20);
    assert_eq!(scorer.geo_risk(None), 0);
    let record = scorer.score_entity(&QueryEntity::new("Jane Doe")).unwrap();
    assert_eq!(record.geo_risk_score, 0);
    assert_eq!(record.final_score, 0.0);
}

#[test]
fn test_legacy_weighting_without_renormalization() {
    let dir = engine_dir("[screening]\nrenormalize_missing_fields = false\n");
    let scorer = scorer_from(&dir);
    let query = QueryEntity::new("islamic revolutionary guard corps").with_country("iran");

    let record = scorer.score_entity(&query).unwrap();
    assert_eq!(record.match_score, 90.0);
    assert_eq!(record.final_score, 75.0);
    assert_eq!(record.risk_level, RiskLevel::Medium);
}

#[test]
fn test_kyc_flags_from_disk() {
    let dir = engine_dir("[risk.kyc]\npolicy = \"severity_weighted\"\n");
    let scorer = scorer_from(&dir);

    let record = scorer
        .score_entity(&QueryEntity::new("ACME Trading LLC").with_country("UAE"))
        .unwrap();
    assert_eq!(record.kyc_score, 50);
    // 40 * 0.3 + 50 * 0.2
    assert_eq!(record.final_score, 22.0);
}

#[test]
fn test_missing_kyc_file_degrades_signal() {
    let dir = engine_dir("");
    fs::remove_file(dir.path().join("kyc.csv")).unwrap();
    let scorer = scorer_from(&dir);

    let record = scorer
        .score_entity(&QueryEntity::new("Bank Melli Iran").with_country("Iran"))
        .unwrap();
    assert_eq!(record.kyc_score, 0);
    assert_eq!(record.matched_list.as_deref(), Some("OFAC_SDN"));
    assert_eq!(record.degraded_signals.len(), 1);
}

#[test]
fn test_malformed_watchlist_is_fatal() {
    let dir = engine_dir("");
    write(dir.path(), "master.csv", "name,list_type\nBank Melli Iran,OFAC_SDN\n");

    let config = EngineConfig::from_toml_file(dir.path().join("engine.toml")).unwrap();
    assert!(RiskScorer::from_config(&config).is_err());
}

#[test]
fn test_empty_watchlist_never_matches() {
    let screener =
        WatchlistScreener::from_index(ReferenceIndex::empty(), ScreeningConfig::default()).unwrap();
    let scorer = RiskScorer::new(screener, RiskConfig::default(), KycSource::default()).unwrap();

    let assessment = scorer
        .assess(&QueryEntity::new("Bank Melli Iran").with_country("Iran"))
        .unwrap();
    assert!(!assessment.screening.is_match());
    assert_eq!(assessment.risk.match_score, 0.0);
    assert_eq!(assessment.risk.final_score, 30.0);
    assert_eq!(assessment.risk.risk_level, RiskLevel::Low);
}

#[test]
fn test_reload_while_screening() {
    let dir = engine_dir("");
    let scorer = scorer_from(&dir);
    let replacement = ReferenceIndex::from_records(vec![
        WatchlistRecord::new("Acme Trading LLC", "DPL").with_country("UAE"),
    ])
    .unwrap();
    let query = QueryEntity::new("Bank Melli Iran").with_country("Iran");

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..25 {
                    // Either the old or the new watchlist, never a mix
                    let record = scorer.score_entity(&query).unwrap();
                    match record.matched_list.as_deref() {
                        Some("OFAC_SDN") => assert_eq!(record.match_score, 100.0),
                        None => assert_eq!(record.match_score, 0.0),
                        other => panic!("unexpected match {:?}", other),
                    }
                }
            });
        }
        s.spawn(|| {
            scorer.watchlist().replace(replacement);
        });
    });

    assert_eq!(scorer.watchlist().current().len(), 1);
    assert!(scorer.score_entity(&query).unwrap().matched_list.is_none());
}

#[test]
fn test_reload_from_path() {
    let dir = engine_dir("");
    let scorer = scorer_from(&dir);
    write(
        dir.path(),
        "master_v2.csv",
        "name,country,address,list_type\nAcme Trading LLC,UAE,,DPL\n",
    );

    assert_eq!(scorer.reload_watchlist(dir.path().join("master_v2.csv")).unwrap(), 1);
    let record = scorer
        .score_entity(&QueryEntity::new("Acme Trading LLC").with_country("UAE"))
        .unwrap();
    assert_eq!(record.matched_list.as_deref(), Some("DPL"));
}

#[tokio::test]
async fn test_batch_scoring() {
    let dir = engine_dir("");
    let scorer = Arc::new(scorer_from(&dir));

    let results = scorer
        .score_batch(vec![
            QueryEntity::new("Korea Kwangson Banking Corp").with_country("North Korea"),
            QueryEntity::new("John Smith").with_country("USA"),
        ])
        .await;

    assert_eq!(results[0].as_ref().unwrap().matched_list.as_deref(), Some("OFAC_SDN"));
    assert_eq!(results[1].as_ref().unwrap().risk_level, RiskLevel::Low);
}

#[test]
fn test_report_payload() {
    let dir = engine_dir("");
    let scorer = scorer_from(&dir);
    let query = QueryEntity::new("Bank Melli Iran").with_country("Iran");

    let report = ScreeningReport::new(query.clone(), scorer.assess(&query).unwrap());
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(json["entity"]["name"], "Bank Melli Iran");
    assert_eq!(json["screening"]["status"], "Potential Match");
    assert_eq!(json["screening"]["matches"][0]["record"]["name"], "Bank Melli Iran");
    assert_eq!(json["risk"]["risk_level"], "HIGH");
}

fn scorer_with(records: Vec<WatchlistRecord>) -> RiskScorer {
    let screener = WatchlistScreener::from_index(
        ReferenceIndex::from_records(records).unwrap(),
        ScreeningConfig::default(),
    )
    .unwrap();
    RiskScorer::new(screener, RiskConfig::default(), KycSource::default()).unwrap()
}

proptest! {
    #[test]
    fn prop_final_score_within_bounds(
        names in prop::collection::vec("[A-Za-z]{1,8}( [A-Za-z]{1,8}){0,2}", 0..10),
        query_name in "[A-Za-z]{1,8}( [A-Za-z]{1,8}){0,2}",
        country in prop::option::of(prop_oneof![
            Just("iran".to_string()),
            Just("brazil".to_string()),
            "[a-z]{2,8}",
        ]),
    ) {
        let records = names.into_iter().map(|name| WatchlistRecord::new(name, "OFAC_SDN").with_country("Iran")).collect();
        let scorer = scorer_with(records);
        let query = QueryEntity { name: query_name, country, address: None };

        let record = scorer.score_entity(&query).unwrap();
        prop_assert!((0.0..=100.0).contains(&record.final_score));
        prop_assert!((0.0..=100.0).contains(&record.match_score));
        prop_assert_eq!(record.risk_level, RiskLevel::from_score(record.final_score));
    }
}
