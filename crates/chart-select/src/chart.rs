//! Template and auxiliary selection.
//!
//! Selection happens inside an already confirmed pattern, so a failed or
//! invalid template proposal falls back to the pattern's default template.
//! Auxiliary elements are a second, independent decision: they are cut down
//! to the template's allow-list and never exceed [`MAX_AUXILIARY`].

use std::collections::BTreeSet;
use std::sync::Arc;

use chart_model::{
    AuxiliaryElement, DataProfile, ErrorCategory, ErrorCode, MAX_AUXILIARY, Pattern, Phase,
    PipelineError, TemplateSpec,
};
use chart_standards::TemplateRegistry;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;

use crate::classifier::{ClassifierError, ClassifierTask, ConstrainedClassifier};
use crate::prompt::{auxiliary_request, template_request};

/// Outcome of chart selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartDecision {
    pub template_id: String,
    pub auxiliary: Vec<AuxiliaryElement>,
    pub reasoning: Option<String>,
    /// The pattern's default template was used instead of a proposal.
    pub fallback_applied: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ChartSelectionError {
    #[error("no default template is registered for pattern {0}")]
    NoDefault(Pattern),
}

impl From<ChartSelectionError> for PipelineError {
    fn from(error: ChartSelectionError) -> Self {
        PipelineError::new(
            ErrorCategory::InternalError,
            Phase::ChartSelection,
            error.to_string(),
        )
        .with_code(ErrorCode::E500Internal)
        .with_hint("The template catalog is incomplete; report this to the operator")
        .with_fallback_attempted(true)
    }
}

#[derive(Debug, Deserialize)]
struct TemplateReply {
    template_id: String,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuxiliaryReply {
    #[serde(default)]
    auxiliary: Vec<Value>,
}

/// Chooses a template for a pattern, then auxiliary elements for it.
#[derive(Clone)]
pub struct ChartSelector {
    classifier: ConstrainedClassifier,
    registry: Arc<dyn TemplateRegistry>,
    auxiliary_deadline: Option<Instant>,
}

impl ChartSelector {
    pub fn new(classifier: ConstrainedClassifier, registry: Arc<dyn TemplateRegistry>) -> Self {
        Self {
            classifier,
            registry,
            auxiliary_deadline: None,
        }
    }

    /// Auxiliary selection still running at `deadline` is abandoned and the
    /// chosen template is kept without auxiliary elements.
    pub fn with_auxiliary_deadline(mut self, deadline: Instant) -> Self {
        self.auxiliary_deadline = Some(deadline);
        self
    }

    /// Always consults the classifier for the template, even with a single
    /// candidate. Only a missing default template is an error.
    pub async fn select(
        &self,
        pattern: Pattern,
        profile: &DataProfile,
        intent: &str,
    ) -> Result<ChartDecision, ChartSelectionError> {
        let candidates = self.registry.templates_for(pattern);
        tracing::debug!(
            pattern = %pattern,
            candidates = candidates.len(),
            "selecting chart template"
        );

        let (template, reasoning) = match self
            .choose_template(pattern, &candidates, profile, intent)
            .await
        {
            Ok(choice) => choice,
            Err(error) => {
                let mut decision = self.fallback(pattern)?;
                decision.warnings.push(format!(
                    "Chart selection fell back to default template '{}': {error}",
                    decision.template_id
                ));
                return Ok(decision);
            }
        };

        let mut warnings = Vec::new();
        let auxiliary = if template.auxiliary.is_empty() {
            Vec::new()
        } else {
            match self.bounded_auxiliary(template, profile, intent).await {
                Ok(auxiliary) => auxiliary,
                Err(error) => {
                    warnings.push(format!(
                        "Auxiliary selection failed, continuing without auxiliary elements: {error}"
                    ));
                    Vec::new()
                }
            }
        };

        tracing::debug!(
            template = %template.id,
            auxiliary = auxiliary.len(),
            "chart template selected"
        );
        Ok(ChartDecision {
            template_id: template.id.clone(),
            auxiliary,
            reasoning,
            fallback_applied: false,
            warnings,
        })
    }

    /// The pattern's default template with no auxiliary elements.
    pub fn fallback(&self, pattern: Pattern) -> Result<ChartDecision, ChartSelectionError> {
        let template = self
            .registry
            .default_for(pattern)
            .ok_or(ChartSelectionError::NoDefault(pattern))?;
        tracing::warn!(pattern = %pattern, template = %template.id, "chart selection fell back");
        Ok(ChartDecision {
            template_id: template.id.clone(),
            auxiliary: Vec::new(),
            reasoning: None,
            fallback_applied: true,
            warnings: Vec::new(),
        })
    }

    async fn choose_template<'r>(
        &self,
        pattern: Pattern,
        candidates: &[&'r TemplateSpec],
        profile: &DataProfile,
        intent: &str,
    ) -> Result<(&'r TemplateSpec, Option<String>), ClassifierError> {
        let request = template_request(pattern, candidates, profile, intent);
        let reply: TemplateReply = self.classifier.ask(request).await?;
        let wanted = reply.template_id.trim();
        let template = candidates
            .iter()
            .find(|template| template.id.eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or(ClassifierError::OutOfEnumeration(ClassifierTask::Template))?;
        let reasoning = reply.reasoning.filter(|text| !text.trim().is_empty());
        Ok((template, reasoning))
    }

    async fn bounded_auxiliary(
        &self,
        template: &TemplateSpec,
        profile: &DataProfile,
        intent: &str,
    ) -> Result<Vec<AuxiliaryElement>, ClassifierError> {
        let work = self.choose_auxiliary(template, profile, intent);
        let Some(deadline) = self.auxiliary_deadline else {
            return work.await;
        };
        let left_ms = deadline
            .saturating_duration_since(Instant::now())
            .as_millis() as u64;
        tokio::time::timeout_at(deadline, work)
            .await
            .unwrap_or(Err(ClassifierError::Timeout(left_ms)))
    }

    async fn choose_auxiliary(
        &self,
        template: &TemplateSpec,
        profile: &DataProfile,
        intent: &str,
    ) -> Result<Vec<AuxiliaryElement>, ClassifierError> {
        let request = auxiliary_request(template, profile, intent);
        let reply: AuxiliaryReply = self.classifier.ask(request).await?;
        let proposed: Vec<&str> = reply.auxiliary.iter().filter_map(Value::as_str).collect();
        Ok(filter_auxiliary(template, &proposed))
    }
}

impl std::fmt::Debug for ChartSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartSelector")
            .field("classifier", &self.classifier)
            .field("revision", &self.registry.revision())
            .finish()
    }
}

/// Keeps known, allowed, distinct elements in proposal order, at most
/// [`MAX_AUXILIARY`] of them.
pub fn filter_auxiliary<S: AsRef<str>>(
    template: &TemplateSpec,
    proposed: &[S],
) -> Vec<AuxiliaryElement> {
    let mut seen = BTreeSet::new();
    proposed
        .iter()
        .filter_map(|name| name.as_ref().parse::<AuxiliaryElement>().ok())
        .filter(|element| template.allows_auxiliary(*element))
        .filter(|element| seen.insert(*element))
        .take(MAX_AUXILIARY)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_model::{Channel, ChannelSpec, SemanticType};
    use proptest::prelude::*;

    fn template(auxiliary: Vec<AuxiliaryElement>) -> TemplateSpec {
        TemplateSpec {
            id: "line".to_string(),
            pattern: Pattern::P01,
            name: "Line chart".to_string(),
            description: String::new(),
            required: vec![ChannelSpec::new(Channel::X, vec![SemanticType::Temporal])],
            optional: Vec::new(),
            auxiliary,
            is_default: true,
        }
    }

    #[test]
    fn filter_drops_unknown_duplicate_and_disallowed() {
        let spec = template(vec![
            AuxiliaryElement::MeanLine,
            AuxiliaryElement::Regression,
            AuxiliaryElement::Highlight,
            AuxiliaryElement::Annotation,
        ]);
        let picked = filter_auxiliary(
            &spec,
            &[
                "sparkles",
                "regression",
                "REGRESSION",
                "threshold",
                "mean_line",
                "highlight",
                "annotation",
            ],
        );
        assert_eq!(
            picked,
            vec![
                AuxiliaryElement::Regression,
                AuxiliaryElement::MeanLine,
                AuxiliaryElement::Highlight,
            ]
        );
    }

    fn element() -> impl Strategy<Value = String> {
        prop_oneof![
            proptest::sample::select(AuxiliaryElement::ALL.to_vec())
                .prop_map(|element| element.as_str().to_string()),
            "[a-z_]{1,12}",
        ]
    }

    proptest! {
        #[test]
        fn filtered_auxiliary_stays_within_allow_list(
            allowed in proptest::sample::subsequence(AuxiliaryElement::ALL.to_vec(), 0..=10),
            proposed in proptest::collection::vec(element(), 0..12),
        ) {
            let spec = template(allowed);
            let picked = filter_auxiliary(&spec, &proposed);
            prop_assert!(picked.len() <= MAX_AUXILIARY);
            let distinct: BTreeSet<_> = picked.iter().copied().collect();
            prop_assert_eq!(distinct.len(), picked.len());
            for element in &picked {
                prop_assert!(spec.allows_auxiliary(*element));
            }
        }
    }
}
