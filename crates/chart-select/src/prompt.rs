//! Prompt construction.
//!
//! Prompts describe the data by column names, types and null ratios only;
//! cell values never reach the classifier.

use std::fmt::Write;

use chart_model::{ColumnProfile, DataProfile, MAX_AUXILIARY, Pattern, TemplateSpec};

use crate::classifier::{ClassificationRequest, ClassifierTask};

/// Columns listed by name before the rest are summarised.
const LISTED_COLUMNS: usize = 10;

const PATTERN_SYSTEM: &str = "You classify data visualization requests into one of nine fixed \
patterns. Reply with a single JSON object and nothing else.";

const TEMPLATE_SYSTEM: &str = "You choose the chart template that best presents the data for an \
already chosen visualization pattern. Reply with a single JSON object and nothing else.";

const AUXILIARY_SYSTEM: &str = "You choose optional visual aids for a chart. Pick only aids that \
help answer the request, or none. Reply with a single JSON object and nothing else.";

const MAPPING_SYSTEM: &str = "You assign data columns to chart encoding channels. Use only the \
listed channels and columns. Reply with a single JSON object and nothing else.";

/// Summary of the table shape shared by every prompt.
pub fn data_summary(profile: &DataProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "- Rows: {}", profile.rows);
    let _ = writeln!(out, "- Columns: {}", profile.column_count());
    for (ty, count) in profile.type_counts() {
        let _ = writeln!(out, "- {} columns: {count}", capitalize(ty.as_str()));
    }
    if profile.has_temporal() {
        out.push_str("- Contains temporal data\n");
    }
    if profile.has_categorical() {
        out.push_str("- Contains categorical data\n");
    }
    let _ = writeln!(out, "Columns (first {LISTED_COLUMNS}):");
    for column in profile.columns.iter().take(LISTED_COLUMNS) {
        let _ = writeln!(out, "  - {}", describe_column(column));
    }
    if profile.column_count() > LISTED_COLUMNS {
        let _ = writeln!(
            out,
            "  ... and {} more columns",
            profile.column_count() - LISTED_COLUMNS
        );
    }
    out
}

fn describe_column(column: &ColumnProfile) -> String {
    let mut kind = column.semantic_type.as_str().to_string();
    if column.temporal_like {
        kind.push_str(", date-like text");
    } else if column.numeric_like {
        kind.push_str(", number-like text");
    }
    format!(
        "{}: {kind} (null: {:.1}%, distinct: {})",
        column.name,
        column.null_ratio * 100.0,
        column.unique_count
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn pattern_request(profile: &DataProfile, intent: &str) -> ClassificationRequest {
    let mut prompt = String::from("Choose the visualization pattern that best matches the request.\n\nPatterns:\n");
    for pattern in Pattern::ALL {
        let _ = writeln!(prompt, "- {}: {}", pattern.id(), pattern.description());
    }
    let ids: Vec<String> = Pattern::ALL.iter().map(|p| p.id().to_string()).collect();
    let _ = write!(
        prompt,
        "\nData:\n{}\nRequest: {}\n\nReply as JSON: {{\"pattern_id\": \"<one of {}>\", \"reasoning\": \"<one sentence>\", \"confidence\": <0 to 1>}}",
        data_summary(profile),
        intent.trim(),
        ids.join(", ")
    );
    ClassificationRequest::new(ClassifierTask::Pattern, PATTERN_SYSTEM, prompt, ids)
}

pub fn template_request(
    pattern: Pattern,
    candidates: &[&TemplateSpec],
    profile: &DataProfile,
    intent: &str,
) -> ClassificationRequest {
    let mut prompt = format!(
        "Pattern {}: {}\n\nTemplates:\n",
        pattern.id(),
        pattern.description()
    );
    for template in candidates {
        let _ = writeln!(
            prompt,
            "- {}: {}. {}",
            template.id, template.name, template.description
        );
    }
    let ids: Vec<String> = candidates.iter().map(|t| t.id.clone()).collect();
    let _ = write!(
        prompt,
        "\nData:\n{}\nRequest: {}\n\nReply as JSON: {{\"template_id\": \"<one of {}>\", \"reasoning\": \"<one sentence>\"}}",
        data_summary(profile),
        intent.trim(),
        ids.join(", ")
    );
    ClassificationRequest::new(ClassifierTask::Template, TEMPLATE_SYSTEM, prompt, ids)
}

pub fn auxiliary_request(
    template: &TemplateSpec,
    profile: &DataProfile,
    intent: &str,
) -> ClassificationRequest {
    let mut prompt = format!("Chart template: {} ({})\n\nAvailable aids:\n", template.id, template.name);
    for element in &template.auxiliary {
        let _ = writeln!(prompt, "- {}: {}", element.as_str(), element.description());
    }
    let allowed: Vec<String> = template
        .auxiliary
        .iter()
        .map(|element| element.as_str().to_string())
        .collect();
    let _ = write!(
        prompt,
        "\nData:\n{}\nRequest: {}\n\nChoose at most {MAX_AUXILIARY}, most useful first.\nReply as JSON: {{\"auxiliary\": [<ids from the list>]}}",
        data_summary(profile),
        intent.trim()
    );
    ClassificationRequest::new(ClassifierTask::Auxiliary, AUXILIARY_SYSTEM, prompt, allowed)
}

pub fn mapping_request(
    template: &TemplateSpec,
    profile: &DataProfile,
    intent: &str,
) -> ClassificationRequest {
    let mut prompt = format!("Chart template: {} ({})\n\nChannels:\n", template.id, template.name);
    for (spec, required) in template.channels() {
        let types: Vec<&str> = spec.types.iter().map(|ty| ty.as_str()).collect();
        let _ = writeln!(
            prompt,
            "- {} ({}): accepts {}",
            spec.channel,
            if required { "required" } else { "optional" },
            types.join(", ")
        );
    }
    let _ = write!(
        prompt,
        "\nData:\n{}\nRequest: {}\n\nUse each column at most once. Leave out optional channels that no column fits.\nReply as JSON: {{\"<channel>\": \"<column>\"}}",
        data_summary(profile),
        intent.trim()
    );
    let allowed = profile.columns.iter().map(|c| c.name.clone()).collect();
    ClassificationRequest::new(ClassifierTask::Mapping, MAPPING_SYSTEM, prompt, allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_model::{ColumnDtype, SemanticType};

    fn profile() -> DataProfile {
        DataProfile {
            rows: 3,
            columns: vec![
                ColumnProfile {
                    name: "date".to_string(),
                    dtype: ColumnDtype::Date,
                    semantic_type: SemanticType::Temporal,
                    null_ratio: 0.0,
                    unique_count: 3,
                    numeric_like: false,
                    temporal_like: false,
                },
                ColumnProfile {
                    name: "sales".to_string(),
                    dtype: ColumnDtype::Integer,
                    semantic_type: SemanticType::Quantitative,
                    null_ratio: 0.0,
                    unique_count: 3,
                    numeric_like: false,
                    temporal_like: false,
                },
            ],
            sampled: false,
            original_rows: None,
        }
    }

    #[test]
    fn pattern_prompt_snapshot() {
        let request = pattern_request(&profile(), "  show sales trend ");
        assert_eq!(request.allowed.len(), 9);
        insta::assert_snapshot!(request.prompt, @r#"
        Choose the visualization pattern that best matches the request.

        Patterns:
        - P01: Transition only: how a single measure changes over time
        - P02: Difference only: comparing a measure across categories
        - P03: Overview only: distribution of a single measure
        - P12: Transition + Difference: several series changing over time, compared
        - P13: Transition + Overview: how a distribution shifts over time
        - P21: Difference + Transition: how category differences change over time
        - P23: Difference + Overview: distributions compared across categories
        - P31: Overview + Transition: the overall picture over time, in panels
        - P32: Overview + Difference: distribution summaries compared between categories

        Data:
        - Rows: 3
        - Columns: 2
        - Temporal columns: 1
        - Quantitative columns: 1
        - Contains temporal data
        Columns (first 10):
          - date: temporal (null: 0.0%, distinct: 3)
          - sales: quantitative (null: 0.0%, distinct: 3)

        Request: show sales trend

        Reply as JSON: {"pattern_id": "<one of P01, P02, P03, P12, P13, P21, P23, P31, P32>", "reasoning": "<one sentence>", "confidence": <0 to 1>}
        "#);
    }

    #[test]
    fn summary_truncates_wide_tables() {
        let mut profile = profile();
        let template = profile.columns[1].clone();
        for i in 0..12 {
            let mut column = template.clone();
            column.name = format!("m{i}");
            profile.columns.push(column);
        }
        let summary = data_summary(&profile);
        assert!(summary.contains("  ... and 4 more columns\n"));
        assert!(!summary.contains("m8:"));
    }
}
