//! Component templates: untransformed shape bounds plus named port anchors.
//!
//! Templates come from the diagram file or from the built-in heating-system
//! library. The router only ever sees them through [`TemplateProvider`].

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::layout::{Aabb, Point, PortDir, RouteError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSpec {
    pub anchor: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PortDir>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Shape bounds in template-local coordinates.
    pub bounds: Aabb,
    #[serde(default)]
    pub ports: BTreeMap<String, PortSpec>,
}

impl Template {
    pub fn validate(&self, id: &str) -> Result<(), RouteError> {
        if !self.bounds.is_valid() {
            return Err(RouteError::MalformedTemplate {
                template: id.to_string(),
                reason: "bounds must be finite with min <= max".to_string(),
            });
        }
        for (name, port) in &self.ports {
            if !port.anchor.is_finite() {
                return Err(RouteError::MalformedTemplate {
                    template: id.to_string(),
                    reason: format!("port '{name}' has a non-finite anchor"),
                });
            }
        }
        Ok(())
    }

    /// Declared exit direction, or the side of the bounds nearest the anchor.
    pub fn port_dir(&self, port: &PortSpec) -> PortDir {
        if let Some(dir) = port.dir {
            return dir;
        }
        let a = port.anchor;
        let b = &self.bounds;
        let candidates = [
            (PortDir::Left, (a.x - b.min_x).abs()),
            (PortDir::Right, (b.max_x - a.x).abs()),
            (PortDir::Up, (a.y - b.min_y).abs()),
            (PortDir::Down, (b.max_y - a.y).abs()),
        ];
        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 < best.1 {
                best = *candidate;
            }
        }
        best.0
    }
}

/// Resolves template ids to geometry.
pub trait TemplateProvider {
    fn template(&self, id: &str) -> Option<&Template>;
}

impl TemplateProvider for BTreeMap<String, Template> {
    fn template(&self, id: &str) -> Option<&Template> {
        self.get(id)
    }
}

impl TemplateProvider for HashMap<String, Template> {
    fn template(&self, id: &str) -> Option<&Template> {
        self.get(id)
    }
}

/// Diagram-local templates layered over the built-in library.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, Template>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self {
            templates: BUILTIN_TEMPLATES.clone(),
        }
    }

    /// Built-ins overridden by the given templates.
    pub fn with_overrides(templates: &BTreeMap<String, Template>) -> Self {
        let mut catalog = Self::builtin();
        for (id, template) in templates {
            catalog.insert(id.clone(), template.clone());
        }
        catalog
    }

    pub fn insert(&mut self, id: impl Into<String>, template: Template) {
        self.templates.insert(id.into(), template);
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateProvider for TemplateCatalog {
    fn template(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }
}

fn port(x: f32, y: f32, dir: PortDir) -> PortSpec {
    PortSpec {
        anchor: Point::new(x, y),
        dir: Some(dir),
    }
}

fn template(bounds: Aabb, ports: &[(&str, PortSpec)]) -> Template {
    Template {
        bounds,
        ports: ports
            .iter()
            .map(|(name, spec)| (name.to_string(), spec.clone()))
            .collect(),
    }
}

static BUILTIN_TEMPLATES: Lazy<HashMap<String, Template>> = Lazy::new(|| {
    use PortDir::*;
    let mut map = HashMap::new();
    map.insert(
        "boiler".to_string(),
        template(
            Aabb::new(-30.0, -40.0, 30.0, 40.0),
            &[
                ("flow", port(30.0, -20.0, Right)),
                ("return", port(30.0, 20.0, Right)),
                ("flue", port(0.0, -40.0, Up)),
            ],
        ),
    );
    map.insert(
        "heat_pump".to_string(),
        template(
            Aabb::new(-40.0, -30.0, 40.0, 30.0),
            &[
                ("flow", port(40.0, -15.0, Right)),
                ("return", port(40.0, 15.0, Right)),
                ("source_in", port(-40.0, -15.0, Left)),
                ("source_out", port(-40.0, 15.0, Left)),
            ],
        ),
    );
    map.insert(
        "pump".to_string(),
        template(
            Aabb::new(-12.0, -12.0, 12.0, 12.0),
            &[("in", port(-12.0, 0.0, Left)), ("out", port(12.0, 0.0, Right))],
        ),
    );
    map.insert(
        "mixer".to_string(),
        template(
            Aabb::new(-12.0, -12.0, 12.0, 12.0),
            &[
                ("a", port(-12.0, 0.0, Left)),
                ("ab", port(12.0, 0.0, Right)),
                ("b", port(0.0, 12.0, Down)),
            ],
        ),
    );
    map.insert(
        "buffer_tank".to_string(),
        template(
            Aabb::new(-25.0, -60.0, 25.0, 60.0),
            &[
                ("in_top", port(-25.0, -40.0, Left)),
                ("in_bottom", port(-25.0, 40.0, Left)),
                ("out_top", port(25.0, -40.0, Right)),
                ("out_bottom", port(25.0, 40.0, Right)),
            ],
        ),
    );
    map.insert(
        "dhw_tank".to_string(),
        template(
            Aabb::new(-25.0, -50.0, 25.0, 50.0),
            &[
                ("coil_in", port(-25.0, -10.0, Left)),
                ("coil_out", port(-25.0, 30.0, Left)),
                ("cold", port(0.0, 50.0, Down)),
                ("hot", port(0.0, -50.0, Up)),
            ],
        ),
    );
    map.insert(
        "heating_circuit".to_string(),
        template(
            Aabb::new(-35.0, -25.0, 35.0, 25.0),
            &[
                ("flow", port(-35.0, -10.0, Left)),
                ("return", port(-35.0, 10.0, Left)),
            ],
        ),
    );
    map.insert(
        "manifold".to_string(),
        template(
            Aabb::new(-60.0, -6.0, 60.0, 6.0),
            &[
                ("in", port(-60.0, 0.0, Left)),
                ("out1", port(-30.0, 6.0, Down)),
                ("out2", port(0.0, 6.0, Down)),
                ("out3", port(30.0, 6.0, Down)),
                ("end", port(60.0, 0.0, Right)),
            ],
        ),
    );
    map.insert(
        "sensor".to_string(),
        template(
            Aabb::new(-6.0, -6.0, 6.0, 6.0),
            &[("probe", port(0.0, 6.0, Down))],
        ),
    );
    map
});
