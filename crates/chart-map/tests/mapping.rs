use chart_common::intent_terms;
use chart_ingest::{DataLimits, load_table, profile_table};
use chart_map::{Coercion, DataMapper, MappingError};
use chart_model::{Channel, ErrorCategory, MappingConfig, PipelineError};
use chart_standards::{TemplateCatalog, TemplateRegistry};
use polars::prelude::DataType;

fn catalog() -> TemplateCatalog {
    TemplateCatalog::builtin().unwrap()
}

#[test]
fn time_series_binds_date_and_sales_to_line() {
    let df = load_table(
        "date,sales\n2024-01-01,100\n2024-01-02,120\n2024-01-03,90\n",
        &DataLimits::default(),
    )
    .unwrap();
    let profile = profile_table(&df);
    let catalog = catalog();
    let line = catalog.template("line").unwrap();

    let mapped = DataMapper::new(line)
        .with_intent_terms(intent_terms("show sales trend"))
        .map(df, &profile)
        .unwrap();

    assert_eq!(mapped.mapping.get(Channel::X), Some("date"));
    assert_eq!(mapped.mapping.get(Channel::Y), Some("sales"));
    assert!(!mapped.mapping.contains(Channel::Color));
    assert_eq!(
        mapped.warnings,
        vec![
            "Optional channel 'color' left unbound: no compatible column".to_string(),
            "Optional channel 'stroke_dash' left unbound: no compatible column".to_string(),
        ]
    );
}

#[test]
fn json_date_strings_are_converted_for_time_axis() {
    let df = load_table(
        r#"[{"month": "2024-01", "visits": 10}, {"month": "2024-02", "visits": 14}, {"month": "2024-03", "visits": 9}]"#,
        &DataLimits::default(),
    )
    .unwrap();
    let profile = profile_table(&df);
    let catalog = catalog();
    let area = catalog.template("area").unwrap();

    let mapped = DataMapper::new(area).map(df, &profile).unwrap();
    assert_eq!(mapped.mapping.get(Channel::X), Some("month"));
    assert_eq!(mapped.coercions.get("month"), Some(&Coercion::ParseDate));
    assert_eq!(mapped.df.column("month").unwrap().dtype(), &DataType::Date);
}

#[test]
fn missing_x_is_a_mapping_error() {
    let df = load_table("label\nalpha\nbeta\n", &DataLimits::default()).unwrap();
    let profile = profile_table(&df);
    let catalog = catalog();
    let histogram = catalog.template("histogram").unwrap();

    let error = DataMapper::new(histogram).map(df, &profile).unwrap_err();
    assert!(matches!(error, MappingError::MissingRequired { .. }));

    let error: PipelineError = error.into();
    assert_eq!(error.category, ErrorCategory::MappingError);
    assert_eq!(error.hint.as_deref(), Some("Available columns: label"));
    assert_eq!(error.details[0].field.as_deref(), Some("x"));
}

#[test]
fn high_cardinality_series_cannot_color_lines() {
    let mut csv = String::from("day,series,value\n");
    for i in 0..30 {
        csv.push_str(&format!("2024-01-{:02},s{i},{i}\n", (i % 28) + 1));
    }
    let df = load_table(&csv, &DataLimits::default()).unwrap();
    let profile = profile_table(&df);
    let catalog = catalog();
    let multi_line = catalog.template("multi_line").unwrap();

    let error = DataMapper::new(multi_line).map(df, &profile).unwrap_err();
    match error {
        MappingError::MissingRequired { missing, .. } => {
            let channels: Vec<Channel> = missing.iter().map(|spec| spec.channel).collect();
            assert_eq!(channels, vec![Channel::Color]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn proposal_for_unknown_column_is_replaced() {
    let df = load_table(
        "region,sales\nnorth,10\nsouth,12\n",
        &DataLimits::default(),
    )
    .unwrap();
    let profile = profile_table(&df);
    let catalog = catalog();
    let bar = catalog.template("bar").unwrap();

    let proposal = MappingConfig::new()
        .with(Channel::X, "territory")
        .with(Channel::Y, "sales");
    let mapped = DataMapper::new(bar)
        .with_proposal(proposal)
        .map(df, &profile)
        .unwrap();
    assert_eq!(mapped.mapping.get(Channel::X), Some("region"));
    assert_eq!(mapped.mapping.get(Channel::Y), Some("sales"));
    assert_eq!(
        mapped.warnings[0],
        "Proposed column 'territory' for 'x' was rejected: column not found"
    );
}
