use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in diagram space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box containing every point, `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut out = Aabb::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            out.min_x = out.min_x.min(p.x);
            out.min_y = out.min_y.min(p.y);
            out.max_x = out.max_x.max(p.x);
            out.max_y = out.max_y.max(p.y);
        }
        Some(out)
    }

    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    pub fn inflate(self, amount: f32) -> Aabb {
        Aabb {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn include(self, point: Point) -> Aabb {
        self.union(Aabb::new(point.x, point.y, point.x, point.y))
    }

    /// Closed containment, boundary included.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    pub fn contains_strict(&self, point: Point) -> bool {
        point.x > self.min_x && point.x < self.max_x && point.y > self.min_y && point.y < self.max_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDir {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl PortDir {
    pub fn vector(self) -> (f32, f32) {
        match self {
            PortDir::Left => (-1.0, 0.0),
            PortDir::Right => (1.0, 0.0),
            PortDir::Up => (0.0, -1.0),
            PortDir::Down => (0.0, 1.0),
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            PortDir::Left | PortDir::Right => Axis::Horizontal,
            PortDir::Up | PortDir::Down => Axis::Vertical,
        }
    }

    /// Snap an arbitrary vector to the dominant cardinal direction.
    /// Horizontal wins when both components are equal.
    pub fn from_vector(dx: f32, dy: f32) -> Self {
        if dx.abs() >= dy.abs() {
            if dx < 0.0 { PortDir::Left } else { PortDir::Right }
        } else if dy < 0.0 {
            PortDir::Up
        } else {
            PortDir::Down
        }
    }
}

/// Instance placement: rotation about the template origin, then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub tx: f32,
    pub ty: f32,
    cos: f32,
    sin: f32,
}

impl Transform {
    /// `None` when any component is non-finite.
    pub fn new(tx: f32, ty: f32, rotation_deg: f32) -> Option<Self> {
        if !tx.is_finite() || !ty.is_finite() || !rotation_deg.is_finite() {
            return None;
        }
        let (sin, cos) = snapped_sin_cos(rotation_deg);
        Some(Self { tx, ty, cos, sin })
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            p.x * self.cos - p.y * self.sin + self.tx,
            p.x * self.sin + p.y * self.cos + self.ty,
        )
    }

    pub fn apply_dir(&self, dir: PortDir) -> PortDir {
        let (dx, dy) = dir.vector();
        PortDir::from_vector(dx * self.cos - dy * self.sin, dx * self.sin + dy * self.cos)
    }

    /// Axis-aligned bounds of a transformed box.
    pub fn apply_aabb(&self, bounds: &Aabb) -> Option<Aabb> {
        let corners = bounds.corners().map(|c| self.apply(c));
        let out = Aabb::from_points(&corners)?;
        out.is_valid().then_some(out)
    }
}

// Quarter turns are exact so rotated anchors stay on integer coordinates.
fn snapped_sin_cos(rotation_deg: f32) -> (f32, f32) {
    let normalized = rotation_deg.rem_euclid(360.0);
    for (deg, sin, cos) in [
        (0.0, 0.0, 1.0),
        (90.0, 1.0, 0.0),
        (180.0, 0.0, -1.0),
        (270.0, -1.0, 0.0),
        (360.0, 0.0, 1.0),
    ] {
        if (normalized - deg).abs() < 1e-4 {
            return (sin, cos);
        }
    }
    normalized.to_radians().sin_cos()
}

/// A port resolved to diagram space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPort {
    pub point: Point,
    pub dir: PortDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Grid search succeeded.
    Routed,
    /// Grid search exhausted; direct two-segment path.
    Fallback,
    /// Connection asked for a direct two-segment path.
    Manhattan,
    /// Points supplied by the diagram, passed through.
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub points: Vec<Point>,
    pub style: Option<String>,
    pub kind: RouteKind,
}

impl Route {
    /// "M x y L x y ..." descriptor for vector renderers.
    pub fn path_data(&self) -> String {
        points_to_path(&self.points)
    }
}

pub fn points_to_path(points: &[Point]) -> String {
    let mut d = String::new();
    for (idx, p) in points.iter().enumerate() {
        if idx > 0 {
            d.push(' ');
        }
        let cmd = if idx == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd} {} {}", fmt_coord(p.x), fmt_coord(p.y));
    }
    d
}

fn fmt_coord(value: f32) -> String {
    if value.fract() == 0.0 && value.abs() < 1e7 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Polylines of one layout pass, keyed by connection key or manual polyline id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSet {
    pub routes: BTreeMap<String, Route>,
}

impl RouteSet {
    pub fn get(&self, key: &str) -> Option<&Route> {
        self.routes.get(key)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Route)> {
        self.routes.iter()
    }

    pub fn fallback_count(&self) -> usize {
        self.routes
            .values()
            .filter(|route| route.kind == RouteKind::Fallback)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_is_exact() {
        let t = Transform::new(100.0, 50.0, 90.0).unwrap();
        let p = t.apply(Point::new(10.0, 0.0));
        assert_eq!(p, Point::new(100.0, 60.0));
        assert_eq!(t.apply_dir(PortDir::Right), PortDir::Down);
        assert_eq!(t.apply_dir(PortDir::Up), PortDir::Right);
    }

    #[test]
    fn rotated_bounds_stay_axis_aligned() {
        let t = Transform::new(0.0, 0.0, 45.0).unwrap();
        let out = t.apply_aabb(&Aabb::new(-10.0, -10.0, 10.0, 10.0)).unwrap();
        let half_diag = 200f32.sqrt();
        assert!((out.max_x - half_diag).abs() < 1e-3);
        assert!((out.min_y + half_diag).abs() < 1e-3);
    }

    #[test]
    fn non_finite_transform_is_rejected() {
        assert!(Transform::new(f32::NAN, 0.0, 0.0).is_none());
        assert!(Transform::new(0.0, 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn path_data_uses_move_then_lines() {
        let route = Route {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 2.5)],
            style: None,
            kind: RouteKind::Routed,
        };
        assert_eq!(route.path_data(), "M 0 0 L 10 0 L 10 2.50");
    }
}
