use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{CorridorSet, RouterOptionsOverride};
use crate::layout::{Aabb, Point};
use crate::templates::Template;

/// Where an instance sits. The only instance data the router reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub rotation_deg: f32,
}

/// Renderer-owned variable bag (labels, live values, colors).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualState(pub BTreeMap<String, serde_json::Value>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub template_id: String,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default, skip_serializing_if = "vars_empty")]
    pub vars: VisualState,
}

fn vars_empty(vars: &VisualState) -> bool {
    vars.0.is_empty()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub component_id: String,
    pub port_name: String,
}

impl PortRef {
    pub fn new(component_id: impl Into<String>, port_name: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            port_name: port_name.into(),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.component_id, self.port_name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRefRepr {
    Short(String),
    #[serde(rename_all = "camelCase")]
    Full {
        component_id: String,
        port_name: String,
    },
}

impl<'de> Deserialize<'de> for PortRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PortRefRepr::deserialize(deserializer)? {
            PortRefRepr::Short(raw) => raw.parse().map_err(serde::de::Error::custom),
            PortRefRepr::Full {
                component_id,
                port_name,
            } => Ok(PortRef::new(component_id, port_name)),
        }
    }
}

impl Serialize for PortRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    #[default]
    Auto,
    Manhattan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from: PortRef,
    pub to: PortRef,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub route_mode: RouteMode,
    /// Stub length override.
    #[serde(default)]
    pub stub: Option<f32>,
    /// Corridor hints appended to the merged corridor set.
    #[serde(default)]
    pub corridors: Option<CorridorSet>,
    #[serde(default)]
    pub router: Option<RouterOptionsOverride>,
}

impl Connection {
    pub fn new(from: PortRef, to: PortRef) -> Self {
        Self {
            from,
            to,
            style: None,
            route_mode: RouteMode::Auto,
            stub: None,
            corridors: None,
            router: None,
        }
    }

    pub fn key(&self) -> ConnectionKey {
        ConnectionKey {
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }
}

/// Stable `"compA:portX->compB:portY"` identity of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey {
    pub from: PortRef,
    pub to: PortRef,
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Points given verbatim by the diagram author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualPolyline {
    pub id: String,
    pub points: Vec<Point>,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Diagram {
    pub view_box: Option<Aabb>,
    pub templates: BTreeMap<String, Template>,
    pub instances: Vec<Instance>,
    pub connections: Vec<Connection>,
    pub polylines: Vec<ManualPolyline>,
    pub router: Option<RouterOptionsOverride>,
}

impl Diagram {
    pub fn instance(&self, id: &str) -> Option<&Instance> {
        self.instances.iter().find(|inst| inst.id == id)
    }
}
