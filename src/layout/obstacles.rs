use std::collections::HashSet;

use log::warn;

use super::{Aabb, Transform};
use crate::ir::Instance;
use crate::templates::TemplateProvider;

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: String,
    pub bounds: Aabb,
}

/// On-screen footprint of an instance, inflated by `padding`.
///
/// `None` when the template is unknown or malformed, or when the placement is
/// not finite.
pub fn instance_aabb(
    instance: &Instance,
    templates: &dyn TemplateProvider,
    padding: f32,
) -> Option<Aabb> {
    let template = templates.template(&instance.template_id)?;
    if !template.bounds.is_valid() {
        return None;
    }
    let placement = instance.placement;
    let transform = Transform::new(placement.x, placement.y, placement.rotation_deg)?;
    let footprint = transform.apply_aabb(&template.bounds)?.inflate(padding);
    footprint.is_valid().then_some(footprint)
}

/// Footprints of every instance, computed once per layout pass.
///
/// Instances that cannot be placed are skipped rather than failing the pass.
pub fn collect_obstacles(
    instances: &[Instance],
    templates: &dyn TemplateProvider,
    padding: f32,
) -> Vec<Obstacle> {
    let mut obstacles = Vec::with_capacity(instances.len());
    for instance in instances {
        match instance_aabb(instance, templates, padding) {
            Some(bounds) => obstacles.push(Obstacle {
                id: instance.id.clone(),
                bounds,
            }),
            None => warn!(
                "skipping obstacle for instance '{}' (template '{}'): no usable footprint",
                instance.id, instance.template_id
            ),
        }
    }
    obstacles
}

/// Obstacle boxes excluding the ignored component ids.
pub fn build_obstacles(
    instances: &[Instance],
    templates: &dyn TemplateProvider,
    ignore: &HashSet<&str>,
    padding: f32,
) -> Vec<Aabb> {
    instances
        .iter()
        .filter(|inst| !ignore.contains(inst.id.as_str()))
        .filter_map(|inst| instance_aabb(inst, templates, padding))
        .collect()
}

pub fn obstacles_without(obstacles: &[Obstacle], ignore: &HashSet<&str>) -> Vec<Aabb> {
    obstacles
        .iter()
        .filter(|obs| !ignore.contains(obs.id.as_str()))
        .map(|obs| obs.bounds)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Placement, VisualState};
    use crate::layout::Point;
    use crate::templates::{PortSpec, Template, TemplateCatalog};

    fn catalog() -> TemplateCatalog {
        let mut catalog = TemplateCatalog::new();
        catalog.insert(
            "bar",
            Template {
                bounds: Aabb::new(0.0, 0.0, 40.0, 10.0),
                ports: [(
                    "p".to_string(),
                    PortSpec {
                        anchor: Point::new(40.0, 5.0),
                        dir: None,
                    },
                )]
                .into_iter()
                .collect(),
            },
        );
        catalog
    }

    fn instance(id: &str, template: &str, x: f32, y: f32, rot: f32) -> Instance {
        Instance {
            id: id.to_string(),
            template_id: template.to_string(),
            placement: Placement {
                x,
                y,
                rotation_deg: rot,
            },
            vars: VisualState::default(),
        }
    }

    #[test]
    fn applies_placement_and_padding() {
        let aabb = instance_aabb(&instance("a", "bar", 100.0, 50.0, 0.0), &catalog(), 2.0).unwrap();
        assert_eq!(aabb, Aabb::new(98.0, 48.0, 142.0, 62.0));
    }

    #[test]
    fn rotation_swaps_extent() {
        let aabb = instance_aabb(&instance("a", "bar", 0.0, 0.0, 90.0), &catalog(), 0.0).unwrap();
        assert_eq!(aabb, Aabb::new(-10.0, 0.0, 0.0, 40.0));
    }

    #[test]
    fn skips_ignored_and_unplaceable_instances() {
        let instances = vec![
            instance("a", "bar", 0.0, 0.0, 0.0),
            instance("b", "bar", 100.0, 0.0, 0.0),
            instance("c", "missing", 0.0, 0.0, 0.0),
            instance("d", "bar", f32::NAN, 0.0, 0.0),
            instance("e", "bar", 200.0, 0.0, 0.0),
        ];
        let ignore: HashSet<&str> = ["a", "e"].into_iter().collect();
        let boxes = build_obstacles(&instances, &catalog(), &ignore, 1.0);
        assert_eq!(boxes, vec![Aabb::new(99.0, -1.0, 141.0, 11.0)]);
        for b in &boxes {
            assert!(b.min_x <= b.max_x && b.min_y <= b.max_y);
        }
    }
}
