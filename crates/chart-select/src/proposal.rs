//! Classifier-proposed column mappings.

use chart_common::CaseInsensitiveSet;
use chart_model::{Channel, DataProfile, MappingConfig, TemplateSpec};
use serde_json::{Map, Value};

use crate::classifier::{ClassifierError, ClassifierTask, ConstrainedClassifier};
use crate::prompt::mapping_request;

/// Asks the classifier which column should feed each channel.
///
/// The proposal is advisory: entries naming unknown channels or columns are
/// dropped here, and the mapper validates the rest.
#[derive(Debug, Clone)]
pub struct MappingProposer {
    classifier: ConstrainedClassifier,
}

impl MappingProposer {
    pub fn new(classifier: ConstrainedClassifier) -> Self {
        Self { classifier }
    }

    pub async fn propose(
        &self,
        template: &TemplateSpec,
        profile: &DataProfile,
        intent: &str,
    ) -> Result<MappingConfig, ClassifierError> {
        let request = mapping_request(template, profile, intent);
        let reply: Map<String, Value> = self.classifier.ask(request).await?;
        let proposal = restrict_proposal(&reply, template, profile);
        if proposal.is_empty() && !reply.is_empty() {
            return Err(ClassifierError::OutOfEnumeration(ClassifierTask::Mapping));
        }
        tracing::debug!(
            template = %template.id,
            proposed = proposal.len(),
            "mapping proposal received"
        );
        Ok(proposal)
    }
}

/// Keeps entries whose channel belongs to the template and whose value
/// names a column of the table.
pub fn restrict_proposal(
    reply: &Map<String, Value>,
    template: &TemplateSpec,
    profile: &DataProfile,
) -> MappingConfig {
    let columns = CaseInsensitiveSet::new(profile.columns.iter().map(|column| &column.name));
    let mut proposal = MappingConfig::new();
    for (key, value) in reply {
        let Ok(channel) = key.parse::<Channel>() else {
            continue;
        };
        if template.channel_spec(channel).is_none() {
            continue;
        }
        if let Some(column) = value.as_str().and_then(|name| columns.get(name)) {
            proposal.bind(channel, column);
        }
    }
    proposal
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_model::{ChannelSpec, ColumnDtype, ColumnProfile, Pattern, SemanticType};

    fn template() -> TemplateSpec {
        TemplateSpec {
            id: "bar".to_string(),
            pattern: Pattern::P02,
            name: "Bar chart".to_string(),
            description: String::new(),
            required: vec![
                ChannelSpec::new(Channel::X, vec![SemanticType::Nominal]),
                ChannelSpec::new(Channel::Y, vec![SemanticType::Quantitative]),
            ],
            optional: vec![ChannelSpec::with_default_types(Channel::Color)],
            auxiliary: Vec::new(),
            is_default: true,
        }
    }

    fn profile() -> DataProfile {
        let column = |name: &str| ColumnProfile {
            name: name.to_string(),
            dtype: ColumnDtype::String,
            semantic_type: SemanticType::Nominal,
            null_ratio: 0.0,
            unique_count: 2,
            numeric_like: false,
            temporal_like: false,
        };
        DataProfile {
            rows: 2,
            columns: vec![column("Region"), column("Sales")],
            sampled: false,
            original_rows: None,
        }
    }

    #[test]
    fn keeps_only_template_channels_and_known_columns() {
        let reply: Map<String, Value> = serde_json::from_str(
            r#"{"x": "region", "y": "profit", "facet": "Sales", "colour": "Sales", "color": null}"#,
        )
        .unwrap();
        let proposal = restrict_proposal(&reply, &template(), &profile());
        assert_eq!(proposal, MappingConfig::new().with(Channel::X, "Region"));
    }
}
