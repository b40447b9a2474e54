use std::collections::HashMap;

use super::{Point, ResolvedPort, RouteError, Transform};
use crate::ir::{Connection, Diagram, PortRef};
use crate::templates::TemplateProvider;

/// Every port referenced by the diagram's connections, resolved to diagram
/// space once per layout pass.
#[derive(Debug, Clone, Default)]
pub struct PortTable {
    ports: HashMap<PortRef, ResolvedPort>,
}

impl PortTable {
    /// Resolve both endpoints of every connection; the first unresolvable
    /// reference aborts the pass.
    pub fn build(diagram: &Diagram, templates: &dyn TemplateProvider) -> Result<Self, RouteError> {
        let mut table = PortTable::default();
        for conn in &diagram.connections {
            for port_ref in [&conn.from, &conn.to] {
                if table.ports.contains_key(port_ref) {
                    continue;
                }
                let resolved = resolve_port(diagram, templates, conn, port_ref)?;
                table.ports.insert(port_ref.clone(), resolved);
            }
        }
        Ok(table)
    }

    pub fn get(&self, port_ref: &PortRef) -> Option<&ResolvedPort> {
        self.ports.get(port_ref)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.ports.values().map(|port| port.point)
    }
}

fn resolve_port(
    diagram: &Diagram,
    templates: &dyn TemplateProvider,
    conn: &Connection,
    port_ref: &PortRef,
) -> Result<ResolvedPort, RouteError> {
    let connection = conn.key().to_string();
    let instance = diagram
        .instance(&port_ref.component_id)
        .ok_or_else(|| RouteError::UnknownComponent {
            connection: connection.clone(),
            component: port_ref.component_id.clone(),
        })?;
    let template = templates
        .template(&instance.template_id)
        .ok_or_else(|| RouteError::UnknownTemplate {
            instance: instance.id.clone(),
            template: instance.template_id.clone(),
        })?;
    template.validate(&instance.template_id)?;
    let spec = template
        .ports
        .get(&port_ref.port_name)
        .ok_or_else(|| RouteError::UnknownPort {
            connection,
            component: port_ref.component_id.clone(),
            port: port_ref.port_name.clone(),
        })?;
    let placement = instance.placement;
    let transform = Transform::new(placement.x, placement.y, placement.rotation_deg).ok_or_else(
        || RouteError::DegeneratePlacement {
            instance: instance.id.clone(),
        },
    )?;
    Ok(ResolvedPort {
        point: transform.apply(spec.anchor),
        dir: transform.apply_dir(template.port_dir(spec)),
    })
}

pub fn stub_point(port: &ResolvedPort, length: f32) -> Point {
    let (dx, dy) = port.dir.vector();
    Point::new(port.point.x + dx * length, port.point.y + dy * length)
}
