use schematic_router::config::{Config, RouterOptionsOverride};
use schematic_router::render::{RouteStates, bind_route_states, render_svg};
use schematic_router::route_dump::RouteDump;
use schematic_router::{Theme, TemplateCatalog, compute_routes, parse_diagram};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchematicRouteOptions {
    theme: Option<String>,
    stub_length: Option<f32>,
    obstacle_padding: Option<f32>,
    router: Option<RouterOptionsOverride>,
    /// Live-state map as a JSON string, keyed by route key.
    states: Option<String>,
}

fn build_config(options: &SchematicRouteOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("dark") {
        config.theme = Theme::dark();
        config.render.background = config.theme.background.clone();
    }
    if let Some(stub_length) = options.stub_length {
        config.layout.stub_length = stub_length;
    }
    if let Some(padding) = options.obstacle_padding {
        config.layout.obstacle_padding = padding;
    }
    if let Some(router) = &options.router {
        config.layout.router = config.layout.router.merged(router);
    }
    config
}

fn parse_options(options_json: Option<String>) -> Result<SchematicRouteOptions, JsValue> {
    match options_json {
        Some(raw) => serde_json::from_str::<SchematicRouteOptions>(&raw)
            .map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(SchematicRouteOptions::default()),
    }
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn route_json(code: &str, options: &SchematicRouteOptions) -> Result<String, String> {
    let config = build_config(options);
    let diagram = parse_diagram(code).map_err(|e| format!("{e:#}"))?;
    let catalog = TemplateCatalog::with_overrides(&diagram.templates);
    let routes = compute_routes(&diagram, &catalog, &config.layout).map_err(|e| e.to_string())?;
    RouteDump::from_routes(&routes)
        .to_json()
        .map_err(|e| e.to_string())
}

fn render(code: &str, options: &SchematicRouteOptions) -> Result<String, String> {
    let config = build_config(options);
    let diagram = parse_diagram(code).map_err(|e| format!("{e:#}"))?;
    let catalog = TemplateCatalog::with_overrides(&diagram.templates);
    let routes = compute_routes(&diagram, &catalog, &config.layout).map_err(|e| e.to_string())?;
    let states = match &options.states {
        Some(raw) => bind_route_states(raw, &routes).map_err(|e| format!("{e:#}"))?,
        None => RouteStates::new(),
    };
    Ok(render_svg(
        &diagram,
        &routes,
        &catalog,
        &config.theme,
        &config.render,
        &states,
    ))
}

/// Route every connection and return the route dump as JSON.
#[wasm_bindgen]
pub fn route_diagram(code: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options_json)?;
    route_json(code, &options).map_err(to_js)
}

#[wasm_bindgen]
pub fn render_diagram_svg(code: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options_json)?;
    render(code, &options).map_err(to_js)
}

#[cfg(test)]
mod tests {
    use crate::{SchematicRouteOptions, render, route_json};

    const PLANT: &str = r#"{
        instances: [
            {id: "hp", templateId: "heat_pump", x: 80, y: 100},
            {id: "tank", templateId: "buffer_tank", x: 260, y: 100},
        ],
        connections: [
            {from: "hp:flow", to: "tank:in_top"},
            {from: "hp:return", to: "tank:in_bottom", routeMode: "manhattan"},
        ],
    }"#;

    #[test]
    fn routes_plant_to_json() {
        let json = route_json(PLANT, &SchematicRouteOptions::default())
            .expect("plant should route");
        assert!(json.contains("hp:flow->tank:in_top"));
        assert!(json.contains("\"manhattan\""));
    }

    #[test]
    fn renders_with_live_state() {
        let options = SchematicRouteOptions {
            states: Some(
                r#"{"hp:flow->tank:in_top": {"active": true, "moving": true}}"#.to_string(),
            ),
            ..Default::default()
        };
        let svg = render(PLANT, &options).expect("plant should render");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("conn active moving"));
    }

    #[test]
    fn unknown_port_is_reported() {
        let broken = PLANT.replace("tank:in_top", "tank:nope");
        let err = route_json(&broken, &SchematicRouteOptions::default()).unwrap_err();
        assert!(err.contains("nope"));
    }
}
