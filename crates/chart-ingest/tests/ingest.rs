use chart_ingest::{DataLimits, IngestError, load_table, profile_table};
use chart_model::{ErrorCategory, ErrorCode, PipelineError, SemanticType};

#[test]
fn csv_time_series_profiles_as_temporal_and_quantitative() {
    let data = "date,sales\n2024-01-01,100\n2024-01-02,120\n2024-01-03,90\n";
    let df = load_table(data, &DataLimits::default()).unwrap();
    let profile = profile_table(&df);

    assert_eq!(profile.rows, 3);
    assert_eq!(
        profile.column("date").unwrap().semantic_type,
        SemanticType::Temporal
    );
    assert_eq!(
        profile.column("sales").unwrap().semantic_type,
        SemanticType::Quantitative
    );
    assert!(!profile.sampled);
}

#[test]
fn json_records_load_through_the_same_path() {
    let data = r#"[{"region": "north", "sales": 10}, {"region": "south", "sales": 12}]"#;
    let df = load_table(data, &DataLimits::default()).unwrap();
    assert_eq!(df.shape(), (2, 2));
    let profile = profile_table(&df);
    assert_eq!(
        profile.column("region").unwrap().semantic_type,
        SemanticType::Nominal
    );
    assert_eq!(
        profile.column("sales").unwrap().semantic_type,
        SemanticType::Quantitative
    );
}

#[test]
fn ingest_errors_become_validation_errors_without_payload_text() {
    let secret = "account_4417,balance\n";
    let error: PipelineError = match load_table(secret, &DataLimits::default()) {
        Err(error) => error.into(),
        Ok(_) => panic!("header-only CSV must be rejected"),
    };
    assert_eq!(error.category, ErrorCategory::ValidationError);
    assert_eq!(error.code, ErrorCode::E400Validation);
    assert!(error.hint.is_some());
    assert!(!error.message.contains("account_4417"));
    assert_eq!(error.details[0].field.as_deref(), Some("data"));
}

#[test]
fn oversized_payload_maps_to_413() {
    let limits = DataLimits {
        max_bytes: 8,
        ..DataLimits::default()
    };
    let error = load_table("a,b\n1,2\n3,4\n", &limits).unwrap_err();
    assert!(matches!(error, IngestError::TooLarge { .. }));
    assert_eq!(PipelineError::from(error).code, ErrorCode::E413TooLarge);
}
