//! Integration test: config load, service lifecycle, persistence, CLI-facing helpers.

use chrono::NaiveDate;
use hospital_risk::{
    config::{ModelConfig, ScorerConfig},
    events::{parse_events, RawEvent},
    features::enrich_batch,
    model::{ScoreSource, TrainedModel},
    report::{heuristic_scored, DatasetSummary},
    risk::{heuristic_scores, RiskEngine},
    service::RiskService,
    storage::SecureStore,
    synth::DatasetGenerator,
    ScoringError,
};
use std::path::Path;

fn training_events(n: usize) -> Vec<RawEvent> {
    generated_events(n, 7)
}

fn generated_events(n: usize, seed: u64) -> Vec<RawEvent> {
    let now = NaiveDate::from_ymd_opt(2025, 9, 30)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap();
    let rows = DatasetGenerator::new(Some(seed)).with_now(now).generate(n);
    let json = serde_json::to_string(&rows).unwrap();
    parse_events(&json).unwrap()
}

fn small_config() -> ScorerConfig {
    let mut c = ScorerConfig::default();
    c.model = ModelConfig {
        n_estimators: 50,
        ..ModelConfig::default()
    };
    c
}

fn scoring_batch() -> Vec<RawEvent> {
    let mut batch = vec![
        RawEvent::new("admin_001", "admin", "classified_data_access", "2025-09-20T02:00:00")
            .with_device("new")
            .with_session_period(500),
        RawEvent::new("nurse_041", "nurse", "view_patient_record", "2025-09-22T11:00:00")
            .with_device("desktop")
            .with_session_period(45),
        RawEvent::new("guest_090", "guest", "failed_login_attempt", "2025-09-21 23:10:00")
            .with_device("smartwatch")
            .with_ip("203.0.113.9"),
        RawEvent::new("doctor_020", "doctor", "access_patient_record", "2025-09-23T09:45:00")
            .with_session_period(30),
        RawEvent::new("employee_070", "employee", "page_view_home", "not a timestamp"),
        RawEvent::new("accountant_060", "accountant", "access_financial_report", "2025-09-24T16:00:00")
            .with_session_period(200),
        RawEvent::new("manager_005", "manager", "delete_user", "2025-09-25T07:30:00")
            .with_device("tablet")
            .with_session_period(2),
        RawEvent::new("contractor_040", "contractor", "export_records", "2025-09-26T20:00:00")
            .with_device("mobile"),
        RawEvent::new("nurse_033", "nurse", "user_login", "2025-09-27T05:00:00")
            .with_session_period(15),
        RawEvent::new("doctor_015", "doctor", "update_diagnosis", "2025-09-28T13:00:00Z")
            .with_session_period(90),
    ];
    batch[2].session_period = None;
    batch
}

#[test]
fn config_load_default() {
    let c = ScorerConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.model.n_estimators, 100);
    assert_eq!(c.model.contamination, 0.1);
    assert_eq!(c.risk.high_threshold, 0.70);
    assert_eq!(c.risk.medium_threshold, 0.40);
    assert!(!c.backend.enabled);
}

#[test]
fn config_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"model": {"n_estimators": 10}, "log": {"json": false}}"#).unwrap();
    let c = ScorerConfig::load(&path);
    assert_eq!(c.model.n_estimators, 10);
    assert_eq!(c.model.random_state, 42);
    assert!(!c.log.json);
    assert_eq!(c.log.level, "info");
}

#[test]
fn predict_before_fit_is_not_trained() {
    let service = RiskService::new(small_config());
    assert!(!service.is_trained());
    assert!(matches!(
        service.predict(&scoring_batch()),
        Err(ScoringError::NotTrained)
    ));
    assert!(matches!(
        service.score_batch(&scoring_batch()),
        Err(ScoringError::NotTrained)
    ));
}

#[test]
fn invalid_timestamp_row_is_dropped() {
    let service = RiskService::new(small_config());
    service.fit(&training_events(400)).unwrap();
    let batch = scoring_batch();
    assert_eq!(batch.len(), 10);

    let scores = service.predict(&batch).unwrap();
    assert_eq!(scores.len(), 9);
    assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));

    let scored = service.score_batch(&batch).unwrap();
    let indices: Vec<usize> = scored.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 5, 6, 7, 8, 9]);
}

#[test]
fn single_prediction_falls_back_to_heuristic() {
    let service = RiskService::new(small_config());
    service.fit(&training_events(300)).unwrap();

    let ev = scoring_batch().remove(0);
    let score = service.predict_single(&ev).unwrap().unwrap();
    let enriched = hospital_risk::features::enrich(&ev, 0).unwrap();
    assert_eq!(score, hospital_risk::risk::heuristic_score(&enriched));
    assert_eq!(service.classify(score), hospital_risk::RiskLevel::High);

    let bad = RawEvent::new("x", "guest", "user_login", "32/13/2025");
    assert_eq!(service.predict_single(&bad).unwrap(), None);
}

#[test]
fn failed_refit_keeps_previous_model() {
    let service = RiskService::new(small_config());
    service.fit(&training_events(200)).unwrap();
    let before = service.status();

    let garbage = vec![RawEvent::new("u", "nurse", "user_login", "never"); 5];
    assert!(matches!(service.fit(&garbage), Err(ScoringError::EmptyTrainingSet)));
    assert!(service.is_trained());
    assert_eq!(service.status().training_rows, before.training_rows);
}

#[test]
fn status_lists_fitted_encoders() {
    let service = RiskService::new(small_config());
    assert!(service.status().encoders.is_empty());
    service.fit(&training_events(100)).unwrap();
    let status = service.status();
    assert!(status.is_trained);
    assert_eq!(status.training_rows, Some(100));
    let forest = status.forest.as_ref().unwrap();
    assert_eq!(forest.n_trees, 50);
    assert_eq!(forest.n_features, 12);
    assert_eq!(forest.feature_columns.len(), forest.n_features);
    assert_eq!(forest.contamination, 0.1);
    for name in [
        "user_role",
        "ip_address",
        "device_type",
        "action",
        "is_business_hours",
        "is_sensitive_action",
        "is_failed_action",
        "session_length_category",
    ] {
        assert!(status.encoders.iter().any(|e| e == name), "missing {}", name);
    }
}

#[test]
fn missing_encoder_degrades_without_failing() {
    let mut model = TrainedModel::fit(&training_events(200), &small_config().model).unwrap();
    assert!(model.encoders_mut().remove("action").is_some());
    let batch = scoring_batch();
    let out = model.predict(&batch);
    assert_eq!(out.rows.len(), 9);
    assert!(out.rows.iter().all(|r| (0.0..=1.0).contains(&r.risk_score)));
}

#[test]
fn unseen_categories_share_the_unknown_code() {
    let mut model = TrainedModel::fit(&training_events(200), &small_config().model).unwrap();
    let before = model.encoders().get("device_type").unwrap().len();
    let batch = vec![
        RawEvent::new("a", "nurse", "user_login", "2025-09-22T10:00:00").with_device("smartwatch"),
        RawEvent::new("b", "nurse", "user_login", "2025-09-22T10:05:00").with_device("fridge"),
    ];
    model.predict(&batch);
    let enc = model.encoders().get("device_type").unwrap();
    // generated training data never contains a literal "unknown" device
    assert_eq!(enc.len(), before + 1);
    assert_eq!(enc.code("unknown"), Some(before as u32));
    assert_eq!(enc.code("smartwatch"), None);
    model.predict(&batch);
    assert_eq!(model.encoders().get("device_type").unwrap().len(), before + 1);
}

#[test]
fn storage_model_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = SecureStore::open(&dir.path().join("store.db"), b"test-secret").unwrap();

    let a = RiskService::new(small_config());
    assert!(matches!(a.save(&store), Err(ScoringError::NotTrained)));
    a.fit(&training_events(300)).unwrap();
    a.save(&store).unwrap();

    let b = RiskService::new(small_config());
    assert!(b.load(&store));
    assert!(b.is_trained());

    let batch = scoring_batch();
    let sa = a.predict(&batch).unwrap();
    let sb = b.predict(&batch).unwrap();
    assert_eq!(sa.len(), sb.len());
    for (x, y) in sa.iter().zip(&sb) {
        assert!((x - y).abs() < 1e-9);
    }
}

#[test]
fn corrupt_blob_leaves_service_untrained() {
    let dir = tempfile::tempdir().unwrap();
    let store = SecureStore::open(&dir.path().join("store.db"), b"test-secret").unwrap();
    let service = RiskService::new(small_config());
    assert!(!service.load(&store));

    store.save_model_state("{not a model").unwrap();
    assert!(!service.load(&store));
    assert!(!service.is_trained());

    let other = SecureStore::open(&dir.path().join("store.db"), b"wrong-secret").unwrap();
    assert!(!service.load(&other));
}

#[test]
fn storage_scored_roundtrip_and_prune() {
    let dir = tempfile::tempdir().unwrap();
    let store = SecureStore::open(&dir.path().join("store.db"), b"test-secret").unwrap();
    let engine = RiskEngine::default();
    let early = engine.score(0, "nurse_041".into(), "view_patient_record".into(), 0.35, 1_000);
    let late = engine.score(1, "admin_001".into(), "classified_data_access".into(), 0.95, 5_000);
    store.insert_scored(&early, r#"{"x":1}"#).unwrap();
    store.insert_scored(&late, r#"{"x":2}"#).unwrap();

    let (ts, score, level, payload) = store.get_scored(&late.id).unwrap().unwrap();
    assert_eq!(ts, 5_000);
    assert_eq!(score, 0.95);
    assert_eq!(level, "high");
    assert_eq!(payload, r#"{"x":2}"#);

    assert_eq!(store.prune_before(2_000).unwrap(), 1);
    assert_eq!(store.count_scored().unwrap(), 1);
    assert!(store.get_scored(&early.id).unwrap().is_none());
}

#[test]
fn summary_counts_rows_and_levels() {
    let batch = scoring_batch();
    let scored = heuristic_scored(&batch, &RiskEngine::default());
    let summary = DatasetSummary::build(&batch, &scored);
    assert_eq!(summary.total_rows, 10);
    assert_eq!(summary.scored_rows, 9);
    assert_eq!(summary.invalid_timestamps, 1);
    assert_eq!(summary.level_distribution.values().sum::<usize>(), 9);
    assert_eq!(summary.by_role["nurse"].count, 2);
    assert!(summary.top_hours.len() <= 5);
    assert!(summary.mean_score > 0.0);
}

#[test]
fn varied_batch_blends_model_and_heuristic() {
    let service = RiskService::new(ScorerConfig::default());
    service.fit(&generated_events(1_000, 7)).unwrap();

    let mut batch = generated_events(200, 8);
    batch.push(
        RawEvent::new("guest_999", "guest", "unauthorized_access_attempt", "2025-09-21T03:00:00")
            .with_device("fridge")
            .with_ip("198.51.100.77")
            .with_session_period(5_000),
    );
    let out = service.predict_detailed(&batch).unwrap();
    assert_eq!(out.source, ScoreSource::Blended);
    assert_eq!(out.rows.len(), batch.len());

    let min = out.rows.iter().map(|r| r.decision).fold(f64::INFINITY, f64::min);
    let max = out.rows.iter().map(|r| r.decision).fold(f64::NEG_INFINITY, f64::max);
    assert!(max - min >= 0.01);

    let flagged = out.rows.iter().filter(|r| r.outlier).count();
    assert!(flagged >= 1);
    for r in &out.rows {
        assert_eq!(r.outlier, r.decision < 0.0);
        let model = 1.0 - (r.decision - min) / (max - min);
        let blended = 0.7 * model + 0.3 * r.heuristic;
        let expected = if r.outlier { (blended * 1.3).min(0.95) } else { blended };
        assert!((r.risk_score - expected).abs() < 1e-12, "row {}", r.source_index);
        assert!((0.0..=1.0).contains(&r.risk_score));
    }
}

#[test]
fn identical_batch_uses_heuristic() {
    let service = RiskService::new(small_config());
    service.fit(&training_events(300)).unwrap();

    let ev = RawEvent::new("doctor_020", "doctor", "access_patient_record", "2025-09-23T09:45:00")
        .with_session_period(30);
    let batch = vec![ev.clone(), ev.clone(), ev];
    let out = service.predict_detailed(&batch).unwrap();
    assert_eq!(out.source, ScoreSource::Heuristic);
    assert_eq!(out.scores(), heuristic_scores(&enrich_batch(&batch)));
}

#[test]
fn reset_forgets_saved_model() {
    let dir = tempfile::tempdir().unwrap();
    let store = SecureStore::open(&dir.path().join("store.db"), b"test-secret").unwrap();
    let service = RiskService::new(small_config());
    service.fit(&training_events(100)).unwrap();
    service.save(&store).unwrap();

    service.reset(&store).unwrap();
    assert!(!service.is_trained());
    assert!(service.status().forest.is_none());
    assert!(store.load_model_state().unwrap().is_none());
    assert!(!RiskService::new(small_config()).load(&store));
}
