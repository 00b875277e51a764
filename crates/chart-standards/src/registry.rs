//! Template registry capability.

use chart_model::{Pattern, TemplateSpec};

/// Read-only lookup of chart templates by pattern and id.
///
/// Implemented by [`TemplateCatalog`](crate::TemplateCatalog); tests may
/// supply their own.
pub trait TemplateRegistry: Send + Sync {
    /// Revision string reported in results.
    fn revision(&self) -> &str;

    /// Templates registered for `pattern`, in catalog order.
    fn templates_for(&self, pattern: Pattern) -> Vec<&TemplateSpec>;

    fn template(&self, id: &str) -> Option<&TemplateSpec>;

    /// The template used when selection for `pattern` falls back.
    fn default_for(&self, pattern: Pattern) -> Option<&TemplateSpec> {
        self.templates_for(pattern)
            .into_iter()
            .find(|template| template.is_default)
    }

    fn default_id(&self, pattern: Pattern) -> Option<&str> {
        self.default_for(pattern).map(|template| template.id.as_str())
    }

    /// Ids eligible for `pattern`; the only values a template proposal may take.
    fn template_ids(&self, pattern: Pattern) -> Vec<&str> {
        self.templates_for(pattern)
            .into_iter()
            .map(|template| template.id.as_str())
            .collect()
    }
}
