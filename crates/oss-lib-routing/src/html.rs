use crate::RouteEntry;
use tera::{Context, Tera};

const MAP_TEMPLATE: &str = include_str!("../templates/map.html");

/// Render the route map page; values are HTML-escaped by the template engine.
pub(crate) fn render(entries: &[RouteEntry]) -> tera::Result<String> {
    let mut context = Context::new();
    context.insert("routes", entries);
    Tera::one_off(MAP_TEMPLATE, &context, true)
}
