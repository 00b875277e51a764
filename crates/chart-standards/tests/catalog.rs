use chart_model::{AuxiliaryElement, Channel, Pattern, SemanticType};
use chart_standards::{TemplateCatalog, TemplateRegistry};

#[test]
fn template_ids_are_scoped_to_their_pattern() {
    let catalog = TemplateCatalog::builtin().unwrap();
    assert_eq!(catalog.template_ids(Pattern::P01), vec!["line", "area"]);
    assert_eq!(catalog.template_ids(Pattern::P02), vec!["bar", "lollipop"]);
    assert_eq!(catalog.template_ids(Pattern::P32), vec!["box_plot", "strip_plot"]);
    assert_eq!(catalog.template_ids(Pattern::P03), vec!["histogram"]);
}

#[test]
fn every_template_is_internally_consistent() {
    let catalog = TemplateCatalog::builtin().unwrap();
    for template in catalog.iter() {
        assert!(!template.required.is_empty(), "{}", template.id);
        assert!(template.channel_spec(Channel::X).is_some(), "{}", template.id);
        for element in &template.auxiliary {
            assert!(AuxiliaryElement::ALL.contains(element));
        }
    }
}

#[test]
fn line_x_prefers_temporal() {
    let catalog = TemplateCatalog::builtin().unwrap();
    let x = catalog
        .template("line")
        .and_then(|template| template.channel_spec(Channel::X))
        .unwrap();
    assert_eq!(x.preference(SemanticType::Temporal), Some(0));
    assert!(!x.accepts(SemanticType::Nominal));
}

#[test]
fn multi_series_templates_require_color() {
    let catalog = TemplateCatalog::builtin().unwrap();
    for id in ["multi_line", "stacked_area", "grouped_bar", "overlay_histogram"] {
        let template = catalog.template(id).unwrap();
        assert!(template.is_required(Channel::Color), "{id}");
    }
}
