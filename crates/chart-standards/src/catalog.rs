//! Template catalog.
//!
//! The catalog is parsed and validated once, then shared read-only between
//! requests. Raw TOML records keep names as strings so an unknown name is
//! reported against the template that used it.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::Deserialize;

use chart_model::{AuxiliaryElement, Channel, ChannelSpec, Pattern, SemanticType, TemplateSpec};

use crate::error::{CatalogError, Result};
use crate::registry::TemplateRegistry;

/// Catalog shipped with the crate.
const BUILTIN_CATALOG: &str = include_str!("../data/templates.toml");

#[derive(Debug, Deserialize)]
struct RawCatalog {
    revision: String,
    #[serde(default, rename = "template")]
    templates: Vec<RawTemplate>,
}

#[derive(Debug, Deserialize)]
struct RawTemplate {
    id: String,
    pattern: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    default: bool,
    required: Vec<RawChannel>,
    #[serde(default)]
    optional: Vec<RawChannel>,
    #[serde(default)]
    auxiliary: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    channel: String,
    types: Option<Vec<String>>,
}

/// Immutable set of templates, indexed by pattern.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    revision: String,
    templates: Vec<TemplateSpec>,
    by_pattern: BTreeMap<Pattern, Vec<usize>>,
}

impl TemplateCatalog {
    /// Loads the catalog embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parses and validates a catalog in the embedded TOML layout.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawCatalog = toml::from_str(text)?;
        let templates = raw
            .templates
            .into_iter()
            .map(convert_template)
            .collect::<Result<Vec<_>>>()?;
        Self::from_templates(raw.revision, templates)
    }

    /// Builds a catalog from already-typed templates.
    ///
    /// # Errors
    ///
    /// Fails on duplicate ids or channels, templates without required
    /// channels, and patterns with zero or several default templates.
    pub fn from_templates(revision: impl Into<String>, templates: Vec<TemplateSpec>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut by_pattern: BTreeMap<Pattern, Vec<usize>> = BTreeMap::new();

        for (idx, template) in templates.iter().enumerate() {
            if !seen.insert(template.id.as_str()) {
                return Err(CatalogError::DuplicateTemplate(template.id.clone()));
            }
            validate_channels(template)?;
            by_pattern.entry(template.pattern).or_default().push(idx);
        }

        for pattern in Pattern::ALL {
            let defaults: Vec<String> = by_pattern
                .get(&pattern)
                .into_iter()
                .flatten()
                .map(|&idx| &templates[idx])
                .filter(|template| template.is_default)
                .map(|template| template.id.clone())
                .collect();
            match defaults.len() {
                0 => return Err(CatalogError::NoDefault(pattern)),
                1 => {}
                _ => {
                    return Err(CatalogError::MultipleDefaults {
                        pattern,
                        ids: defaults,
                    });
                }
            }
        }

        let revision = revision.into();
        tracing::debug!(
            revision = %revision,
            templates = templates.len(),
            "loaded template catalog"
        );

        Ok(Self {
            revision,
            templates,
            by_pattern,
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// All templates in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &TemplateSpec> {
        self.templates.iter()
    }
}

impl TemplateRegistry for TemplateCatalog {
    fn revision(&self) -> &str {
        &self.revision
    }

    fn templates_for(&self, pattern: Pattern) -> Vec<&TemplateSpec> {
        self.by_pattern
            .get(&pattern)
            .map(|indices| indices.iter().map(|&idx| &self.templates[idx]).collect())
            .unwrap_or_default()
    }

    fn template(&self, id: &str) -> Option<&TemplateSpec> {
        self.templates.iter().find(|template| template.id == id)
    }
}

fn validate_channels(template: &TemplateSpec) -> Result<()> {
    if template.required.is_empty() {
        return Err(CatalogError::NoRequiredChannels(template.id.clone()));
    }
    let mut channels = BTreeSet::new();
    for (spec, _) in template.channels() {
        if !channels.insert(spec.channel) {
            return Err(CatalogError::DuplicateChannel {
                template: template.id.clone(),
                channel: spec.channel,
            });
        }
        if spec.types.is_empty() {
            return Err(CatalogError::EmptyTypes {
                template: template.id.clone(),
                channel: spec.channel,
            });
        }
    }
    Ok(())
}

fn convert_template(raw: RawTemplate) -> Result<TemplateSpec> {
    let id = raw.id;
    let named = |source| CatalogError::UnknownName {
        template: id.clone(),
        source,
    };

    let pattern = Pattern::from_str(&raw.pattern).map_err(named)?;
    let required = raw
        .required
        .iter()
        .map(convert_channel)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(named)?;
    let optional = raw
        .optional
        .iter()
        .map(convert_channel)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(named)?;
    let auxiliary = raw
        .auxiliary
        .iter()
        .map(|name| AuxiliaryElement::from_str(name))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(named)?;

    Ok(TemplateSpec {
        id,
        pattern,
        name: raw.name,
        description: raw.description,
        required,
        optional,
        auxiliary,
        is_default: raw.default,
    })
}

fn convert_channel(raw: &RawChannel) -> chart_model::Result<ChannelSpec> {
    let channel = Channel::from_str(&raw.channel)?;
    match &raw.types {
        None => Ok(ChannelSpec::with_default_types(channel)),
        Some(types) => {
            let types = types
                .iter()
                .map(|name| SemanticType::from_str(name))
                .collect::<chart_model::Result<Vec<_>>>()?;
            Ok(ChannelSpec::new(channel, types))
        }
    }
}
