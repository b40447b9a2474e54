mod error;
mod obstacles;
mod ports;
mod routing;
mod simplify;
mod types;

pub use error::RouteError;
pub use obstacles::{
    Obstacle, build_obstacles, collect_obstacles, instance_aabb, obstacles_without,
};
pub use ports::{PortTable, stub_point};
pub use routing::{GridRoute, GridRouter, Terminal, manhattan_path};
pub use simplify::simplify;
pub use types::*;

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::config::{LayoutConfig, RouterOptions};
use crate::ir::{Connection, Diagram, ManualPolyline, PortRef, RouteMode};
use crate::templates::TemplateProvider;

/// Margin, in grid steps, around the content when the diagram has no view box.
const CONTENT_MARGIN_CELLS: f32 = 4.0;

/// Route every connection of the diagram and pass manual polylines through.
///
/// A full, stateless layout pass: ports are resolved and obstacles derived
/// once, then each connection is routed independently against the shared,
/// read-only obstacle list. Configuration problems abort the pass; a failed
/// grid search only downgrades that connection to a two-segment route.
pub fn compute_routes(
    diagram: &Diagram,
    templates: &dyn TemplateProvider,
    config: &LayoutConfig,
) -> Result<RouteSet, RouteError> {
    let base_options = match &diagram.router {
        Some(patch) => config.router.merged(patch),
        None => config.router.clone(),
    };
    let ports = PortTable::build(diagram, templates)?;
    let obstacles = collect_obstacles(&diagram.instances, templates, config.obstacle_padding);
    let bounds = diagram.view_box.or_else(|| {
        let margin = base_options.grid_size.max(0.0) * CONTENT_MARGIN_CELLS
            + longest_stub(diagram, config);
        content_bounds(&obstacles, &ports).map(|b| b.inflate(margin))
    });

    let mut routes = RouteSet::default();
    for conn in &diagram.connections {
        let key = conn.key().to_string();
        if routes.routes.contains_key(&key) {
            return Err(RouteError::DuplicateRoute { key });
        }
        let route =
            route_connection(conn, &key, &ports, &obstacles, bounds, &base_options, config)?;
        routes.routes.insert(key, route);
    }

    for polyline in &diagram.polylines {
        let route = manual_route(polyline)?;
        if routes.routes.contains_key(&polyline.id) {
            return Err(RouteError::DuplicateRoute {
                key: polyline.id.clone(),
            });
        }
        routes.routes.insert(polyline.id.clone(), route);
    }

    info!(
        "layout pass: {} routes ({} fallback) over {} obstacles",
        routes.len(),
        routes.fallback_count(),
        obstacles.len()
    );
    Ok(routes)
}

fn route_connection(
    conn: &Connection,
    key: &str,
    ports: &PortTable,
    obstacles: &[Obstacle],
    bounds: Option<Aabb>,
    base_options: &RouterOptions,
    config: &LayoutConfig,
) -> Result<Route, RouteError> {
    let from = resolved(ports, key, &conn.from)?;
    let to = resolved(ports, key, &conn.to)?;

    let stub_length = conn.stub.unwrap_or(config.stub_length);
    if !(stub_length.is_finite() && stub_length >= 0.0) {
        return Err(RouteError::InvalidRouterOptions {
            reason: format!("connection {key}: stub length must be a non-negative number"),
        });
    }
    let stub_from = stub_point(from, stub_length);
    let stub_to = stub_point(to, stub_length);
    let first_axis = from.dir.axis();

    let (middle, kind) = match (conn.route_mode, bounds) {
        (RouteMode::Auto, Some(bounds)) => {
            let mut options = match &conn.router {
                Some(patch) => base_options.merged(patch),
                None => base_options.clone(),
            };
            if let Some(hints) = &conn.corridors {
                options.corridors.extend(hints);
            }
            let router = GridRouter::new(bounds, &options)?;
            let ignore: HashSet<&str> =
                [conn.from.component_id.as_str(), conn.to.component_id.as_str()]
                    .into_iter()
                    .collect();
            let blocking = obstacles_without(obstacles, &ignore);
            let start = Terminal::facing(stub_from, from.dir);
            let goal = Terminal::facing(stub_to, to.dir);
            match router.route_terminals(start, goal, &blocking) {
                Some(middle) => (middle, RouteKind::Routed),
                None => {
                    warn!("{key}: no obstacle-free path, using direct route");
                    (manhattan_path(stub_from, stub_to, first_axis), RouteKind::Fallback)
                }
            }
        }
        _ => (manhattan_path(stub_from, stub_to, first_axis), RouteKind::Manhattan),
    };

    let mut points = Vec::with_capacity(middle.len() + 2);
    points.push(from.point);
    points.extend(middle);
    points.push(to.point);
    let points = simplify(&points);
    debug!("{key}: {:?} route with {} points", kind, points.len());

    Ok(Route {
        points,
        style: conn.style.clone(),
        kind,
    })
}

fn manual_route(polyline: &ManualPolyline) -> Result<Route, RouteError> {
    if polyline.points.len() < 2 || polyline.points.iter().any(|p| !p.is_finite()) {
        return Err(RouteError::InvalidPolyline {
            id: polyline.id.clone(),
        });
    }
    Ok(Route {
        points: polyline.points.clone(),
        style: polyline.style.clone(),
        kind: RouteKind::Manual,
    })
}

fn resolved<'a>(
    ports: &'a PortTable,
    key: &str,
    port_ref: &PortRef,
) -> Result<&'a ResolvedPort, RouteError> {
    // Only reachable when the table was built from another diagram.
    ports.get(port_ref).ok_or_else(|| RouteError::UnknownComponent {
        connection: key.to_string(),
        component: port_ref.component_id.clone(),
    })
}

/// Longest stub of any connection, so stub ends stay inside the grid.
fn longest_stub(diagram: &Diagram, config: &LayoutConfig) -> f32 {
    diagram
        .connections
        .iter()
        .filter_map(|conn| conn.stub)
        .filter(|len| len.is_finite())
        .fold(config.stub_length, f32::max)
        .max(0.0)
}

/// Union of every obstacle and resolved port.
fn content_bounds(obstacles: &[Obstacle], ports: &PortTable) -> Option<Aabb> {
    let mut bounds: Option<Aabb> = None;
    for obs in obstacles {
        bounds = Some(match bounds {
            Some(b) => b.union(obs.bounds),
            None => obs.bounds,
        });
    }
    for point in ports.points() {
        bounds = Some(match bounds {
            Some(b) => b.include(point),
            None => Aabb::new(point.x, point.y, point.x, point.y),
        });
    }
    bounds
}
