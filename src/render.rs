use crate::config::RenderConfig;
use crate::ir::{ConnectionKey, Diagram};
use crate::layout::{Aabb, RouteKind, RouteSet, instance_aabb};
use crate::templates::TemplateProvider;
use crate::theme::Theme;
use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Live flags for one route, supplied by the telemetry layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LineState {
    pub active: bool,
    pub moving: bool,
}

pub type RouteStates = HashMap<String, LineState>;

/// Parse a `{ "<key>": {active, moving} }` map and bind it to `routes`.
///
/// Keys are matched verbatim first, then in canonical connection-key form so
/// `"a:out -> b:in"` binds to `a:out->b:in`.
pub fn bind_route_states(raw: &str, routes: &RouteSet) -> Result<RouteStates> {
    let parsed: BTreeMap<String, LineState> = serde_json::from_str(raw)?;
    let mut states = RouteStates::new();
    for (key, state) in parsed {
        if routes.get(&key).is_some() {
            states.insert(key, state);
            continue;
        }
        let canonical = key
            .parse::<ConnectionKey>()
            .map_err(|err| anyhow!("state entry '{key}': {err}"))?
            .to_string();
        if routes.get(&canonical).is_none() {
            return Err(anyhow!("state entry '{key}' does not match any route"));
        }
        states.insert(canonical, state);
    }
    Ok(states)
}

pub fn render_svg(
    diagram: &Diagram,
    routes: &RouteSet,
    templates: &dyn TemplateProvider,
    theme: &Theme,
    config: &RenderConfig,
    states: &RouteStates,
) -> String {
    let view = diagram
        .view_box
        .unwrap_or_else(|| Aabb::new(0.0, 0.0, config.width, config.height));
    let width = view.width().max(1.0);
    let height = view.height().max(1.0);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"{} {} {width} {height}\">",
        view.min_x, view.min_y
    ));
    svg.push_str(&format!(
        "<style>.conn{{fill:none;stroke:{};stroke-width:{}}}.conn.active{{stroke:{}}}.conn.moving{{stroke-dasharray:6 4}}.conn.fallback{{stroke-dasharray:2 3;stroke:{}}}</style>",
        theme.line_color, theme.line_width, theme.active_color, theme.fallback_color
    ));
    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        view.min_x, view.min_y, config.background
    ));

    for instance in &diagram.instances {
        let Some(bounds) = instance_aabb(instance, templates, 0.0) else {
            continue;
        };
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"4\" ry=\"4\" fill=\"{}\" stroke=\"{}\" data-id=\"{}\"/>",
            bounds.min_x,
            bounds.min_y,
            bounds.width(),
            bounds.height(),
            theme.component_fill,
            theme.component_stroke,
            escape_xml(&instance.id)
        ));
        let center = bounds.center();
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            center.x,
            center.y,
            escape_xml(&theme.font_family),
            theme.font_size,
            theme.label_color,
            escape_xml(&instance.id)
        ));
    }

    for (key, route) in routes.iter() {
        let state = states.get(key).copied().unwrap_or_default();
        let mut classes = String::from("conn");
        if let Some(style) = &route.style {
            classes.push(' ');
            classes.push_str(&escape_xml(style));
        }
        if route.kind == RouteKind::Fallback {
            classes.push_str(" fallback");
        }
        if state.active {
            classes.push_str(" active");
        }
        if state.moving {
            classes.push_str(" moving");
        }
        svg.push_str(&format!(
            "<path d=\"{}\" class=\"{}\" data-key=\"{}\"/>",
            route.path_data(),
            classes,
            escape_xml(key)
        ));
    }

    svg.push_str("</svg>");
    svg
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow!("invalid render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
