use std::collections::HashSet;
use std::path::Path;

use schematic_router::layout::{collect_obstacles, obstacles_without};
use schematic_router::{
    ConnectionKey, Diagram, LayoutConfig, Point, RouteError, RouteKind, RouteSet, TemplateCatalog,
    compute_routes, parse_diagram, simplify,
};

const FIXTURES: [&str; 3] = ["plant.json5", "rotated.json5", "blocked.json5"];

fn load_fixture(name: &str) -> Diagram {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    parse_diagram(&input).expect("parse failed")
}

fn route(diagram: &Diagram) -> RouteSet {
    let catalog = TemplateCatalog::with_overrides(&diagram.templates);
    compute_routes(diagram, &catalog, &LayoutConfig::default()).expect("routing failed")
}

fn route_str(input: &str) -> Result<RouteSet, RouteError> {
    let diagram = parse_diagram(input).expect("parse failed");
    let catalog = TemplateCatalog::with_overrides(&diagram.templates);
    compute_routes(&diagram, &catalog, &LayoutConfig::default())
}

fn p(x: f32, y: f32) -> Point {
    Point::new(x, y)
}

// Two single-port stand-ins whose ports sit exactly on the instance origin.
const STUB_TEMPLATES: &str = r#"
    templates: {
        src: {
            bounds: {minX: -10, minY: -5, maxX: 0, maxY: 5},
            ports: {p: {anchor: {x: 0, y: 0}, dir: "right"}},
        },
        dst: {
            bounds: {minX: 0, minY: -5, maxX: 10, maxY: 5},
            ports: {p: {anchor: {x: 0, y: 0}, dir: "left"}},
        },
        riser: {
            bounds: {minX: -5, minY: 0, maxX: 5, maxY: 10},
            ports: {p: {anchor: {x: 0, y: 0}, dir: "up"}},
        },
        block: {bounds: {minX: 0, minY: 0, maxX: 31, maxY: 49}},
    },
"#;

// Shortest perpendicular jog allowed between two opposite runs.
const MIN_JOG: f32 = 2.0;

fn heading(a: Point, b: Point) -> (i8, i8) {
    let sign = |v: f32| {
        if v > 0.0 {
            1
        } else if v < 0.0 {
            -1
        } else {
            0
        }
    };
    (sign(b.x - a.x), sign(b.y - a.y))
}

#[test]
fn endpoints_are_exact_port_coordinates() {
    for name in FIXTURES {
        let diagram = load_fixture(name);
        let routes = route(&diagram);
        let catalog = TemplateCatalog::with_overrides(&diagram.templates);
        let ports = schematic_router::layout::PortTable::build(&diagram, &catalog).unwrap();
        for conn in &diagram.connections {
            let key = conn.key().to_string();
            let route = routes.get(&key).unwrap_or_else(|| panic!("{name}: missing {key}"));
            let from = ports.get(&conn.from).unwrap().point;
            let to = ports.get(&conn.to).unwrap().point;
            assert_eq!(route.points.first(), Some(&from), "{name}: {key} start");
            assert_eq!(route.points.last(), Some(&to), "{name}: {key} end");
        }
    }
}

#[test]
fn routed_waypoints_stay_out_of_foreign_obstacles() {
    let config = LayoutConfig::default();
    for name in FIXTURES {
        let diagram = load_fixture(name);
        let catalog = TemplateCatalog::with_overrides(&diagram.templates);
        let obstacles = collect_obstacles(&diagram.instances, &catalog, config.obstacle_padding);
        let routes = route(&diagram);
        for (key, route) in routes.iter() {
            if route.kind != RouteKind::Routed {
                continue;
            }
            let parsed: ConnectionKey = key.parse().unwrap();
            let ignore: HashSet<&str> = [
                parsed.from.component_id.as_str(),
                parsed.to.component_id.as_str(),
            ]
            .into_iter()
            .collect();
            let foreign = obstacles_without(&obstacles, &ignore);
            let interior = &route.points[1..route.points.len() - 1];
            for point in interior {
                for obstacle in &foreign {
                    assert!(
                        !obstacle.contains_strict(*point),
                        "{name}: {key} waypoint {point:?} inside {obstacle:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn routes_are_orthogonal_and_simplified() {
    for name in FIXTURES {
        let routes = route(&load_fixture(name));
        for (key, route) in routes.iter() {
            if route.kind == RouteKind::Manual {
                continue;
            }
            assert!(
                route
                    .points
                    .windows(2)
                    .all(|w| w[0].x == w[1].x || w[0].y == w[1].y),
                "{name}: {key} has a diagonal segment"
            );
            assert_eq!(simplify(&route.points), route.points, "{name}: {key}");
        }
    }
}

#[test]
fn layout_pass_is_deterministic() {
    for name in FIXTURES {
        let diagram = load_fixture(name);
        let first = route(&diagram);
        for _ in 0..3 {
            assert_eq!(route(&diagram), first, "{name}");
        }
    }
}

#[test]
fn manual_polylines_are_untouched() {
    let diagram = load_fixture("plant.json5");
    let routes = route(&diagram);
    let manual = routes.get("s1-probe").unwrap();
    assert_eq!(manual.kind, RouteKind::Manual);
    assert_eq!(manual.points, diagram.polylines[0].points);
    assert_eq!(manual.style.as_deref(), Some("signal"));
    assert_eq!(routes.len(), diagram.connections.len() + diagram.polylines.len());
}

#[test]
fn stub_beside_a_foreign_component_keeps_waypoints_outside_it() {
    // "blk" pads to (21, 3)-(68, 68), just past the stub end at (20, 0).
    let input = format!(
        r#"{{
            viewBox: {{minX: -95, minY: -95, maxX: 205, maxY: 205}},
            {STUB_TEMPLATES}
            instances: [
                {{id: "a", templateId: "src", x: 0, y: 0}},
                {{id: "blk", templateId: "block", x: 29, y: 11}},
                {{id: "b", templateId: "riser", x: -60, y: 150}},
            ],
            connections: [{{from: "a:p", to: "b:p"}}],
        }}"#
    );
    let routes = route_str(&input).unwrap();
    let route = routes.get("a:p->b:p").unwrap();
    assert_eq!(route.kind, RouteKind::Routed);
    assert_eq!(route.points.first(), Some(&p(0.0, 0.0)));
    assert_eq!(route.points.last(), Some(&p(-60.0, 150.0)));
    let blk = schematic_router::Aabb::new(21.0, 3.0, 68.0, 68.0);
    for point in &route.points[1..route.points.len() - 1] {
        assert!(!blk.contains_strict(*point), "waypoint {point:?} inside {blk:?}");
    }
}

#[test]
fn routes_do_not_double_back_at_stubs() {
    for name in FIXTURES {
        let routes = route(&load_fixture(name));
        for (key, route) in routes.iter() {
            if route.kind != RouteKind::Routed {
                continue;
            }
            for w in route.points.windows(4) {
                let (first, last) = (heading(w[0], w[1]), heading(w[2], w[3]));
                let reversed = first == (-last.0, -last.1);
                let jog = (w[2].x - w[1].x).abs() + (w[2].y - w[1].y).abs();
                assert!(
                    !(reversed && jog < MIN_JOG),
                    "{name}: {key} turns back around a {jog} jog: {:?}",
                    route.points
                );
            }
        }
    }
}

#[test]
fn blocking_component_forces_a_detour() {
    let routes = route(&load_fixture("blocked.json5"));
    let route = routes.get("left:out->right:in").unwrap();
    assert_eq!(route.kind, RouteKind::Routed);
    assert!(route.points.len() > 2);
    assert!(route.points.iter().any(|pt| pt.y < 82.0 || pt.y > 218.0));
}

#[test]
fn facing_ports_without_obstacles_route_straight() {
    let input = format!(
        r#"{{
            viewBox: {{minX: -50, minY: -50, maxX: 150, maxY: 50}},
            {STUB_TEMPLATES}
            instances: [
                {{id: "a", templateId: "src", x: 0, y: 0}},
                {{id: "b", templateId: "dst", x: 100, y: 0}},
            ],
            connections: [{{from: "a:p", to: "b:p"}}],
        }}"#
    );
    let routes = route_str(&input).unwrap();
    let route = routes.get("a:p->b:p").unwrap();
    assert_eq!(route.points, vec![p(0.0, 0.0), p(100.0, 0.0)]);
}

#[test]
fn corridor_pulls_the_route_toward_it() {
    let input = format!(
        r#"{{
            viewBox: {{minX: -40, minY: -40, maxX: 140, maxY: 60}},
            router: {{corridors: {{x: [50]}}, corridorPenalty: 5, corridorSnapDistance: 0}},
            {STUB_TEMPLATES}
            instances: [
                {{id: "a", templateId: "src", x: 0, y: 0}},
                {{id: "b", templateId: "dst", x: 100, y: 20}},
            ],
            connections: [{{from: "a:p", to: "b:p"}}],
        }}"#
    );
    let routes = route_str(&input).unwrap();
    let route = routes.get("a:p->b:p").unwrap();
    assert_eq!(route.kind, RouteKind::Routed);
    assert_eq!(
        route.points,
        vec![p(0.0, 0.0), p(50.0, 0.0), p(50.0, 20.0), p(100.0, 20.0)]
    );
}

#[test]
fn exhausted_search_falls_back_to_two_segments() {
    let input = format!(
        r#"{{
            viewBox: {{minX: -50, minY: -50, maxX: 150, maxY: 100}},
            {STUB_TEMPLATES}
            instances: [
                {{id: "a", templateId: "src", x: 0, y: 0}},
                {{id: "b", templateId: "dst", x: 100, y: 40}},
            ],
            connections: [{{from: "a:p", to: "b:p", router: {{maxIterations: 1}}}}],
        }}"#
    );
    let routes = route_str(&input).unwrap();
    let route = routes.get("a:p->b:p").unwrap();
    assert_eq!(route.kind, RouteKind::Fallback);
    assert_eq!(
        route.points,
        vec![p(0.0, 0.0), p(80.0, 0.0), p(80.0, 40.0), p(100.0, 40.0)]
    );
    assert_eq!(routes.fallback_count(), 1);
}

#[test]
fn unknown_references_fail_the_pass() {
    let plant = std::fs::read_to_string(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/plant.json5"),
    )
    .unwrap();

    let bad_port = plant.replace("to: \"p1:in\"", "to: \"p1:suction\"");
    match route_str(&bad_port) {
        Err(RouteError::UnknownPort {
            component, port, ..
        }) => {
            assert_eq!(component, "p1");
            assert_eq!(port, "suction");
        }
        other => panic!("expected UnknownPort, got {other:?}"),
    }

    let bad_component = plant.replace("from: \"m1:b\"", "from: \"m2:b\"");
    assert!(matches!(
        route_str(&bad_component),
        Err(RouteError::UnknownComponent { component, .. }) if component == "m2"
    ));

    let bad_template = plant.replace("templateId: \"sensor\"", "templateId: \"thermostat\"");
    // The sensor is not a connection endpoint, so it is only skipped as an obstacle.
    assert!(route_str(&bad_template).is_ok());
    let bad_endpoint_template = plant.replace("templateId: \"mixer\"", "templateId: \"valve4\"");
    assert!(matches!(
        route_str(&bad_endpoint_template),
        Err(RouteError::UnknownTemplate { template, .. }) if template == "valve4"
    ));
}
