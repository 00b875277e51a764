//! Plan selection.

use chart_model::{
    Channel, DataProfile, OperationPlan, OperationStep, SemanticType, TemplateSpec,
};

/// The caller's plan when one was given, otherwise one derived from the
/// template and profile. An explicit empty plan stays empty.
pub fn resolve_plan(
    supplied: Option<&OperationPlan>,
    template: &TemplateSpec,
    profile: &DataProfile,
) -> OperationPlan {
    match supplied {
        Some(plan) => plan.clone(),
        None => derive_plan(template, profile),
    }
}

/// Sorts by the first date column when the template draws time on `x`.
pub fn derive_plan(template: &TemplateSpec, profile: &DataProfile) -> OperationPlan {
    let x_takes_time = template
        .channel_spec(Channel::X)
        .is_some_and(|spec| spec.accepts(SemanticType::Temporal));
    let time_column = profile
        .columns
        .iter()
        .find(|column| column.semantic_type == SemanticType::Temporal);

    match (x_takes_time, time_column) {
        (true, Some(column)) => OperationPlan::new(vec![
            OperationStep::new("sort")
                .with_param("by", column.name.as_str())
                .with_param("descending", false),
        ]),
        _ => OperationPlan::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_model::{ChannelSpec, ColumnDtype, ColumnProfile, Pattern};

    fn column(name: &str, semantic_type: SemanticType) -> ColumnProfile {
        ColumnProfile {
            name: name.to_string(),
            dtype: ColumnDtype::Other,
            semantic_type,
            null_ratio: 0.0,
            unique_count: 3,
            numeric_like: false,
            temporal_like: false,
        }
    }

    fn template(x: Vec<SemanticType>) -> TemplateSpec {
        TemplateSpec {
            id: "t".to_string(),
            pattern: Pattern::P01,
            name: "t".to_string(),
            description: String::new(),
            required: vec![ChannelSpec::new(Channel::X, x)],
            optional: Vec::new(),
            auxiliary: Vec::new(),
            is_default: true,
        }
    }

    fn profile() -> DataProfile {
        DataProfile {
            rows: 3,
            columns: vec![
                column("sales", SemanticType::Quantitative),
                column("date", SemanticType::Temporal),
            ],
            sampled: false,
            original_rows: None,
        }
    }

    #[test]
    fn time_axis_sorts_by_first_date_column() {
        let plan = derive_plan(&template(vec![SemanticType::Temporal]), &profile());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps[0].operation, "sort");
        assert_eq!(plan.steps[0].params["by"], "date");
    }

    #[test]
    fn categorical_axis_gets_no_plan() {
        let plan = derive_plan(&template(vec![SemanticType::Nominal]), &profile());
        assert!(plan.is_empty());
    }

    #[test]
    fn supplied_plan_wins_even_when_empty() {
        let empty = OperationPlan::empty();
        let plan = resolve_plan(
            Some(&empty),
            &template(vec![SemanticType::Temporal]),
            &profile(),
        );
        assert!(plan.is_empty());
    }
}
