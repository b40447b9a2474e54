use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Designer-declared preferred axes. `x` entries are vertical lines at that
/// x coordinate, `y` entries horizontal lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorSet {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
}

impl CorridorSet {
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }

    pub fn extend(&mut self, other: &CorridorSet) {
        self.x.extend_from_slice(&other.x);
        self.y.extend_from_slice(&other.y);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterOptions {
    pub grid_size: f32,
    pub max_iterations: usize,
    pub corridors: CorridorSet,
    pub corridor_penalty: f32,
    pub corridor_snap_distance: f32,
    pub prefer_edges: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            grid_size: 10.0,
            max_iterations: 20_000,
            corridors: CorridorSet::default(),
            corridor_penalty: 0.5,
            corridor_snap_distance: 10.0,
            prefer_edges: false,
        }
    }
}

impl RouterOptions {
    /// Copy with every field present in `patch` replacing ours.
    pub fn merged(&self, patch: &RouterOptionsOverride) -> RouterOptions {
        let mut out = self.clone();
        if let Some(v) = patch.grid_size {
            out.grid_size = v;
        }
        if let Some(v) = patch.max_iterations {
            out.max_iterations = v;
        }
        if let Some(v) = &patch.corridors {
            out.corridors = v.clone();
        }
        if let Some(v) = patch.corridor_penalty {
            out.corridor_penalty = v;
        }
        if let Some(v) = patch.corridor_snap_distance {
            out.corridor_snap_distance = v;
        }
        if let Some(v) = patch.prefer_edges {
            out.prefer_edges = v;
        }
        out
    }
}

/// Partial router options, as written in diagram files and connections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterOptionsOverride {
    pub grid_size: Option<f32>,
    pub max_iterations: Option<usize>,
    pub corridors: Option<CorridorSet>,
    pub corridor_penalty: Option<f32>,
    pub corridor_snap_distance: Option<f32>,
    pub prefer_edges: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Distance a connector runs straight out of its port before routing.
    pub stub_length: f32,
    /// Margin added around every component footprint.
    pub obstacle_padding: f32,
    pub router: RouterOptions,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            stub_length: 20.0,
            obstacle_padding: 8.0,
            router: RouterOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    line_color: Option<String>,
    active_color: Option<String>,
    fallback_color: Option<String>,
    component_fill: Option<String>,
    component_stroke: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    stub_length: Option<f32>,
    obstacle_padding: Option<f32>,
    router: Option<RouterOptionsOverride>,
    width: Option<f32>,
    height: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;
    apply_config_file(&mut config, parsed);
    Ok(config)
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) {
    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "dark" {
            config.theme = Theme::dark();
        } else if theme_name == "default" || theme_name == "light" {
            config.theme = Theme::light();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.active_color {
            config.theme.active_color = v;
        }
        if let Some(v) = vars.fallback_color {
            config.theme.fallback_color = v;
        }
        if let Some(v) = vars.component_fill {
            config.theme.component_fill = v;
        }
        if let Some(v) = vars.component_stroke {
            config.theme.component_stroke = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(v) = parsed.stub_length {
        config.layout.stub_length = v;
    }
    if let Some(v) = parsed.obstacle_padding {
        config.layout.obstacle_padding = v;
    }
    if let Some(router) = parsed.router {
        config.layout.router = config.layout.router.merged(&router);
    }
    if let Some(v) = parsed.width {
        config.render.width = v;
    }
    if let Some(v) = parsed.height {
        config.render.height = v;
    }
    config.render.background = config.theme.background.clone();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_only_touches_present_fields() {
        let base = RouterOptions::default();
        let patch = RouterOptionsOverride {
            grid_size: Some(5.0),
            prefer_edges: Some(true),
            ..Default::default()
        };
        let merged = base.merged(&patch);
        assert_eq!(merged.grid_size, 5.0);
        assert!(merged.prefer_edges);
        assert_eq!(merged.max_iterations, base.max_iterations);
        assert_eq!(merged.corridor_penalty, base.corridor_penalty);
    }

    #[test]
    fn config_file_layers_over_defaults() {
        let parsed: ConfigFile = serde_json::from_str(
            r##"{
                "theme": "dark",
                "themeVariables": {"lineColor": "#ff0000"},
                "stubLength": 12,
                "router": {"gridSize": 4, "corridors": {"x": [50]}}
            }"##,
        )
        .unwrap();
        let mut config = Config::default();
        apply_config_file(&mut config, parsed);
        assert_eq!(config.theme.line_color, "#ff0000");
        assert_eq!(config.render.background, Theme::dark().background);
        assert_eq!(config.layout.stub_length, 12.0);
        assert_eq!(config.layout.router.grid_size, 4.0);
        assert_eq!(config.layout.router.corridors.x, vec![50.0]);
        assert_eq!(config.layout.obstacle_padding, LayoutConfig::default().obstacle_padding);
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.router, RouterOptions::default());
    }
}
