#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod parser;
pub mod render;
pub mod route_dump;
pub mod templates;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RouterOptions};
pub use ir::{Connection, ConnectionKey, Diagram, Instance, PortRef, RouteMode};
pub use layout::{
    Aabb, GridRouter, Point, Route, RouteError, RouteKind, RouteSet, compute_routes, simplify,
};
pub use parser::parse_diagram;
pub use render::render_svg;
pub use templates::{Template, TemplateCatalog, TemplateProvider};
pub use theme::Theme;

/// Parse a diagram definition and route it against the built-in template
/// library plus the diagram's own templates.
pub fn route_diagram(input: &str, config: &LayoutConfig) -> anyhow::Result<RouteSet> {
    let diagram = parse_diagram(input)?;
    let catalog = TemplateCatalog::with_overrides(&diagram.templates);
    Ok(compute_routes(&diagram, &catalog, config)?)
}
