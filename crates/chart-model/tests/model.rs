//! Tests for chart-model types.

use chart_model::{
    AuxiliaryElement, Channel, ColumnDtype, ColumnProfile, DataProfile, MappingConfig,
    OperationPlan, OperationStep, Pattern, PhaseTimings, Phase, SemanticType, VisualizeRequest,
};
use proptest::prelude::*;

fn column(name: &str, semantic_type: SemanticType, unique_count: usize) -> ColumnProfile {
    ColumnProfile {
        name: name.to_string(),
        dtype: ColumnDtype::String,
        semantic_type,
        null_ratio: 0.0,
        unique_count,
        numeric_like: false,
        temporal_like: false,
    }
}

#[test]
fn mapping_serializes_as_flat_object() {
    let mapping = MappingConfig::new()
        .with(Channel::X, "date")
        .with(Channel::Y, "sales");
    let json = serde_json::to_string(&mapping).expect("serialize mapping");
    assert_eq!(json, r#"{"x":"date","y":"sales"}"#);
    assert!(!mapping.contains(Channel::Color));
    assert!(!mapping.has_shared_columns());
}

#[test]
fn mapping_detects_shared_columns() {
    let mapping = MappingConfig::new()
        .with(Channel::X, "region")
        .with(Channel::Color, "region");
    assert!(mapping.has_shared_columns());
}

#[test]
fn plan_deserializes_from_step_list() {
    let plan: OperationPlan = serde_json::from_str(
        r#"[{"operation": "sort", "params": {"by": ["date"]}}, {"operation": "limit"}]"#,
    )
    .expect("deserialize plan");
    assert_eq!(plan.len(), 2);
    assert_eq!(plan.steps[1], OperationStep::new("limit"));
}

#[test]
fn request_defaults_options_when_missing() {
    let request: VisualizeRequest =
        serde_json::from_str(r#"{"data": "a,b\n1,2", "intent": "compare"}"#)
            .expect("deserialize request");
    assert_eq!(request.options.width, 1200);
    assert!(request.operations.is_none());
}

#[test]
fn profile_reports_categorical_columns() {
    let profile = DataProfile {
        rows: 100,
        columns: vec![
            column("region", SemanticType::Nominal, 4),
            column("id", SemanticType::Nominal, 100),
        ],
        sampled: false,
        original_rows: None,
    };
    assert!(profile.has_categorical());
    assert!(!profile.has_temporal());
    assert_eq!(profile.type_counts(), vec![(SemanticType::Nominal, 2)]);
}

#[test]
fn timings_serialize_phase_names() {
    let mut timings = PhaseTimings::default();
    timings.record(Phase::PatternSelection, 12);
    timings.total_ms = 15;
    let json = serde_json::to_value(&timings).expect("serialize timings");
    assert_eq!(json["phases"]["pattern_selection"], 12);
}

proptest! {
    #[test]
    fn only_known_pattern_ids_parse(raw in "[A-Z][0-9]{2}") {
        let parsed = raw.parse::<Pattern>();
        let known = Pattern::ALL.iter().any(|pattern| pattern.id() == raw);
        prop_assert_eq!(parsed.is_ok(), known);
    }

    #[test]
    fn only_catalog_auxiliary_names_parse(raw in "[a-z_]{1,16}") {
        let parsed = raw.parse::<AuxiliaryElement>();
        let known = AuxiliaryElement::ALL.iter().any(|element| element.as_str() == raw);
        prop_assert_eq!(parsed.is_ok(), known);
    }
}
