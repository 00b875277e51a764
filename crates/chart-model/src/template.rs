//! Template constraint records.
//!
//! A template is described only by its constraints: which channels it needs,
//! which types each channel accepts, and which auxiliary elements may be
//! drawn on it. Drawing logic lives behind the render capability.

use serde::{Deserialize, Serialize};

use crate::auxiliary::AuxiliaryElement;
use crate::encoding::{Channel, SemanticType};
use crate::pattern::Pattern;

/// One encoding channel of a template together with the types it accepts.
///
/// `types` is ordered by preference; the mapper tries them front to back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub channel: Channel,
    pub types: Vec<SemanticType>,
}

impl ChannelSpec {
    pub fn new(channel: Channel, types: Vec<SemanticType>) -> Self {
        Self { channel, types }
    }

    /// Spec accepting the channel's default type set.
    pub fn with_default_types(channel: Channel) -> Self {
        Self::new(channel, channel.default_types().to_vec())
    }

    pub fn accepts(&self, ty: SemanticType) -> bool {
        self.types.contains(&ty)
    }

    /// Position of `ty` in the preference order, if accepted.
    pub fn preference(&self, ty: SemanticType) -> Option<usize> {
        self.types.iter().position(|candidate| *candidate == ty)
    }
}

/// Constraint record for one chart template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub id: String,
    pub pattern: Pattern,
    pub name: String,
    pub description: String,
    pub required: Vec<ChannelSpec>,
    pub optional: Vec<ChannelSpec>,
    /// Auxiliary allow-list, kept in catalog order.
    pub auxiliary: Vec<AuxiliaryElement>,
    pub is_default: bool,
}

impl TemplateSpec {
    pub fn allows_auxiliary(&self, element: AuxiliaryElement) -> bool {
        self.auxiliary.contains(&element)
    }

    /// Required channels first, then optional ones.
    pub fn channels(&self) -> impl Iterator<Item = (&ChannelSpec, bool)> {
        self.required
            .iter()
            .map(|spec| (spec, true))
            .chain(self.optional.iter().map(|spec| (spec, false)))
    }

    pub fn channel_spec(&self, channel: Channel) -> Option<&ChannelSpec> {
        self.channels()
            .map(|(spec, _)| spec)
            .find(|spec| spec.channel == channel)
    }

    pub fn is_required(&self, channel: Channel) -> bool {
        self.required.iter().any(|spec| spec.channel == channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> TemplateSpec {
        TemplateSpec {
            id: "line".to_string(),
            pattern: Pattern::P01,
            name: "Line chart".to_string(),
            description: String::new(),
            required: vec![
                ChannelSpec::new(
                    Channel::X,
                    vec![SemanticType::Temporal, SemanticType::Ordinal],
                ),
                ChannelSpec::new(Channel::Y, vec![SemanticType::Quantitative]),
            ],
            optional: vec![ChannelSpec::with_default_types(Channel::Color)],
            auxiliary: vec![AuxiliaryElement::MeanLine],
            is_default: true,
        }
    }

    #[test]
    fn channels_lists_required_before_optional() {
        let spec = line();
        let order: Vec<(Channel, bool)> = spec
            .channels()
            .map(|(channel, required)| (channel.channel, required))
            .collect();
        assert_eq!(
            order,
            vec![
                (Channel::X, true),
                (Channel::Y, true),
                (Channel::Color, false)
            ]
        );
    }

    #[test]
    fn preference_follows_declared_order() {
        let spec = line();
        let x = spec.channel_spec(Channel::X).unwrap();
        assert_eq!(x.preference(SemanticType::Temporal), Some(0));
        assert_eq!(x.preference(SemanticType::Ordinal), Some(1));
        assert_eq!(x.preference(SemanticType::Nominal), None);
        assert!(spec.is_required(Channel::Y));
        assert!(!spec.is_required(Channel::Color));
        assert!(spec.allows_auxiliary(AuxiliaryElement::MeanLine));
        assert!(!spec.allows_auxiliary(AuxiliaryElement::Regression));
    }
}
