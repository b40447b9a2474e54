use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, warn};

use super::simplify::simplify;
use super::{Aabb, Axis, Point, PortDir, RouteError};
use crate::config::RouterOptions;

// ── A* cost scaling ─────────────────────────────────────────────────
/// Integer cost multiplier so A* can use u64 costs with fractional penalties.
const ASTAR_COST_SCALE: f64 = 1000.0;
/// Cost of one grid step before corridor penalty.
const STEP_COST: u64 = ASTAR_COST_SCALE as u64;

// ── Routing grid ────────────────────────────────────────────────────
/// Grids with more points than this are not searched.
const MAX_GRID_CELLS: usize = 4_000_000;
/// Inset, in grid steps, of the corridor lines synthesized by `prefer_edges`.
const EDGE_CORRIDOR_INSET_CELLS: f32 = 2.0;

const NO_PREV: u32 = u32::MAX;
/// Slack when deciding whether a grid point lies behind an endpoint.
const SNAP_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone)]
struct RoutingGrid {
    cell: f32,
    min_x: f32,
    min_y: f32,
    cols: i32,
    rows: i32,
}

impl RoutingGrid {
    fn new(bounds: &Aabb, cell: f32) -> Self {
        let cols = ((bounds.width() / cell).floor() as i32).saturating_add(1).max(1);
        let rows = ((bounds.height() / cell).floor() as i32).saturating_add(1).max(1);
        Self {
            cell,
            min_x: bounds.min_x,
            min_y: bounds.min_y,
            cols,
            rows,
        }
    }

    fn cell_count(&self) -> usize {
        (self.cols as usize).saturating_mul(self.rows as usize)
    }

    fn index(&self, ix: i32, iy: i32) -> usize {
        (iy as usize) * (self.cols as usize) + ix as usize
    }

    fn coords(&self, idx: usize) -> (i32, i32) {
        let cols = self.cols as usize;
        ((idx % cols) as i32, (idx / cols) as i32)
    }

    fn col_x(&self, ix: i32) -> f32 {
        self.min_x + ix as f32 * self.cell
    }

    fn row_y(&self, iy: i32) -> f32 {
        self.min_y + iy as f32 * self.cell
    }

    fn point(&self, ix: i32, iy: i32) -> Point {
        Point::new(self.col_x(ix), self.row_y(iy))
    }

    /// The (up to four) grid points around `p`, best first: points that do
    /// not lie behind `p` along `dir`, then the closest.
    fn candidate_cells(&self, p: Point, dir: Option<PortDir>) -> Vec<(i32, i32)> {
        let fx = (p.x - self.min_x) / self.cell;
        let fy = (p.y - self.min_y) / self.cell;
        let xs = [fx.floor(), fx.ceil()].map(|v| (v as i32).clamp(0, self.cols - 1));
        let ys = [fy.floor(), fy.ceil()].map(|v| (v as i32).clamp(0, self.rows - 1));
        let mut cells: Vec<(i32, i32)> = Vec::with_capacity(4);
        for iy in ys {
            for ix in xs {
                if !cells.contains(&(ix, iy)) {
                    cells.push((ix, iy));
                }
            }
        }
        let (dx, dy) = dir.map(PortDir::vector).unwrap_or((0.0, 0.0));
        let rank = |&(ix, iy): &(i32, i32)| {
            let g = self.point(ix, iy);
            let behind = (g.x - p.x) * dx + (g.y - p.y) * dy < -SNAP_EPSILON;
            (behind, (g.x - p.x).abs() + (g.y - p.y).abs())
        };
        cells.sort_by(|a, b| {
            let (behind_a, dist_a) = rank(a);
            let (behind_b, dist_b) = rank(b);
            behind_a.cmp(&behind_b).then(dist_a.total_cmp(&dist_b))
        });
        cells
    }

    /// Cells whose grid point lies inside any obstacle (boundary included).
    fn blocked_mask(&self, obstacles: &[Aabb]) -> Vec<bool> {
        let mut blocked = vec![false; self.cell_count()];
        for obs in obstacles {
            if !obs.is_valid() {
                continue;
            }
            let start_x = ((obs.min_x - self.min_x) / self.cell).ceil().max(0.0);
            let end_x = ((obs.max_x - self.min_x) / self.cell)
                .floor()
                .min((self.cols - 1) as f32);
            let start_y = ((obs.min_y - self.min_y) / self.cell).ceil().max(0.0);
            let end_y = ((obs.max_y - self.min_y) / self.cell)
                .floor()
                .min((self.rows - 1) as f32);
            if start_x > end_x || start_y > end_y {
                continue;
            }
            for iy in start_y as i32..=end_y as i32 {
                for ix in start_x as i32..=end_x as i32 {
                    if obs.contains(self.point(ix, iy)) {
                        let idx = self.index(ix, iy);
                        blocked[idx] = true;
                    }
                }
            }
        }
        blocked
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct GridEntry {
    est: u64,
    seq: u64,
    cost: u64,
    node: u32,
}

// Min-heap on estimate; among equal estimates the earliest push wins.
impl Ord for GridEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .est
            .cmp(&self.est)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for GridEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of [`GridRouter::route_detailed`].
#[derive(Debug, Clone, PartialEq)]
pub enum GridRoute {
    Found(Vec<Point>),
    Fallback(Vec<Point>),
}

impl GridRoute {
    pub fn points(&self) -> &[Point] {
        match self {
            GridRoute::Found(points) | GridRoute::Fallback(points) => points,
        }
    }

    pub fn into_points(self) -> Vec<Point> {
        match self {
            GridRoute::Found(points) | GridRoute::Fallback(points) => points,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GridRoute::Fallback(_))
    }
}

/// One end of a grid search: the point the route must reach and, for port
/// stubs, the direction it leaves that point in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terminal {
    pub point: Point,
    pub dir: Option<PortDir>,
}

impl Terminal {
    pub fn free(point: Point) -> Self {
        Self { point, dir: None }
    }

    pub fn facing(point: Point, dir: PortDir) -> Self {
        Self {
            point,
            dir: Some(dir),
        }
    }

    /// Corner joining the terminal to grid point `g`, reached by moving along
    /// the exit axis first.
    fn elbow(&self, g: Point) -> Point {
        match self.dir.map(PortDir::axis) {
            Some(Axis::Vertical) => Point::new(self.point.x, g.y),
            _ => Point::new(g.x, self.point.y),
        }
    }
}

/// 4-connected A* over a uniform grid spanning `bounds`, with a cost bias
/// toward corridor lines.
#[derive(Debug, Clone)]
pub struct GridRouter {
    grid: RoutingGrid,
    options: RouterOptions,
    /// Distance from each grid column to the nearest x corridor.
    col_corridor_dist: Vec<f32>,
    /// Distance from each grid row to the nearest y corridor.
    row_corridor_dist: Vec<f32>,
}

impl GridRouter {
    pub fn new(bounds: Aabb, options: &RouterOptions) -> Result<Self, RouteError> {
        validate_options(options)?;
        if !bounds.is_valid() {
            return Err(RouteError::InvalidRouterOptions {
                reason: format!("routing bounds {bounds:?} are not a valid box"),
            });
        }
        let grid = RoutingGrid::new(&bounds, options.grid_size);
        let (xs, ys) = corridor_lines(&bounds, options);
        // Oversized grids are never searched; skip the per-line tables.
        let searchable = grid.cell_count() <= MAX_GRID_CELLS;
        let col_corridor_dist = if searchable {
            (0..grid.cols).map(|ix| nearest_distance(grid.col_x(ix), &xs)).collect()
        } else {
            Vec::new()
        };
        let row_corridor_dist = if searchable {
            (0..grid.rows).map(|iy| nearest_distance(grid.row_y(iy), &ys)).collect()
        } else {
            Vec::new()
        };
        Ok(Self {
            grid,
            options: options.clone(),
            col_corridor_dist,
            row_corridor_dist,
        })
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Orthogonal polyline from `start` to `end`. Never fails: when the
    /// search gives up the result is a direct two-segment path.
    pub fn route(&self, start: Point, end: Point, obstacles: &[Aabb]) -> Vec<Point> {
        self.route_detailed(start, end, obstacles).into_points()
    }

    pub fn route_detailed(&self, start: Point, end: Point, obstacles: &[Aabb]) -> GridRoute {
        let (from, to) = (Terminal::free(start), Terminal::free(end));
        match self.route_terminals(from, to, obstacles) {
            Some(points) => GridRoute::Found(points),
            None => GridRoute::Fallback(manhattan_path(start, end, Axis::Horizontal)),
        }
    }

    /// Orthogonal polyline between two terminals, joined to the grid path
    /// with elbows, or `None` when the search gives up.
    pub fn route_terminals(
        &self,
        from: Terminal,
        to: Terminal,
        obstacles: &[Aabb],
    ) -> Option<Vec<Point>> {
        let grid_points = self.search_terminals(from, to, obstacles)?;
        Some(stitch(&from, &grid_points, &to))
    }

    /// Grid waypoints from the cell nearest `start` to the cell nearest `end`,
    /// or `None` when the goal is unreachable within `max_iterations`.
    pub fn search(&self, start: Point, end: Point, obstacles: &[Aabb]) -> Option<Vec<Point>> {
        self.search_terminals(Terminal::free(start), Terminal::free(end), obstacles)
    }

    /// Grid waypoints between two terminals.
    ///
    /// A terminal with a direction snaps to a grid point ahead of it, the
    /// path never leaves the start cell backwards and never enters the goal
    /// cell from the port side.
    pub fn search_terminals(
        &self,
        from: Terminal,
        to: Terminal,
        obstacles: &[Aabb],
    ) -> Option<Vec<Point>> {
        let grid = &self.grid;
        let total = grid.cell_count();
        if total > MAX_GRID_CELLS {
            warn!(
                "routing grid of {}x{} points exceeds {MAX_GRID_CELLS}; skipping search",
                grid.cols, grid.rows
            );
            return None;
        }

        let blocked = grid.blocked_mask(obstacles);
        let (start_ix, start_iy) = self.snap(&from, &blocked, obstacles);
        let (end_ix, end_iy) = self.snap(&to, &blocked, obstacles);
        let start_idx = grid.index(start_ix, start_iy);
        let goal_idx = grid.index(end_ix, end_iy);
        if start_idx == goal_idx {
            return Some(vec![grid.point(start_ix, start_iy)]);
        }

        let dirs: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
        let leave_back = from.dir.map(|dir| {
            let (dx, dy) = grid_step(dir);
            (-dx, -dy)
        });
        let enter_from_port = to.dir.map(grid_step);
        let mut best_cost = vec![u64::MAX; total];
        let mut prev = vec![NO_PREV; total];
        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;

        best_cost[start_idx] = 0;
        heap.push(GridEntry {
            est: manhattan_steps(start_ix, start_iy, end_ix, end_iy),
            seq,
            cost: 0,
            node: start_idx as u32,
        });

        let mut expansions = 0usize;
        let mut reached = false;
        while let Some(entry) = heap.pop() {
            let idx = entry.node as usize;
            if entry.cost != best_cost[idx] {
                continue;
            }
            if idx == goal_idx {
                reached = true;
                break;
            }
            if expansions >= self.options.max_iterations {
                break;
            }
            expansions += 1;

            let (x, y) = grid.coords(idx);
            for (dx, dy) in dirs {
                if idx == start_idx && leave_back == Some((dx, dy)) {
                    continue;
                }
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= grid.cols || ny >= grid.rows {
                    continue;
                }
                let next_idx = grid.index(nx, ny);
                if next_idx == goal_idx && enter_from_port == Some((dx, dy)) {
                    continue;
                }
                if blocked[next_idx] && next_idx != goal_idx && next_idx != start_idx {
                    continue;
                }
                let next_cost = entry.cost.saturating_add(self.step_cost(nx, ny));
                if next_cost >= best_cost[next_idx] {
                    continue;
                }
                best_cost[next_idx] = next_cost;
                prev[next_idx] = idx as u32;
                seq += 1;
                heap.push(GridEntry {
                    est: next_cost.saturating_add(manhattan_steps(nx, ny, end_ix, end_iy)),
                    seq,
                    cost: next_cost,
                    node: next_idx as u32,
                });
            }
        }

        if !reached {
            debug!(
                "grid search gave up after {expansions} expansions ({:?} -> {:?})",
                from.point, to.point
            );
            return None;
        }

        let mut cells = Vec::new();
        let mut cur = goal_idx;
        loop {
            cells.push(cur);
            let p = prev[cur];
            if p == NO_PREV {
                break;
            }
            cur = p as usize;
        }
        cells.reverse();
        debug!(
            "grid search reached goal in {expansions} expansions, {} cells",
            cells.len()
        );
        Some(
            cells
                .into_iter()
                .map(|idx| {
                    let (ix, iy) = grid.coords(idx);
                    grid.point(ix, iy)
                })
                .collect(),
        )
    }

    /// Grid cell a terminal joins the path at: the best candidate that is
    /// open and whose elbow stays out of every obstacle. When none is, the
    /// first candidate is used and treated as passable.
    fn snap(&self, terminal: &Terminal, blocked: &[bool], obstacles: &[Aabb]) -> (i32, i32) {
        let grid = &self.grid;
        let candidates = grid.candidate_cells(terminal.point, terminal.dir);
        let usable = candidates.iter().copied().find(|&(ix, iy)| {
            let elbow = terminal.elbow(grid.point(ix, iy));
            !blocked[grid.index(ix, iy)] && !obstacles.iter().any(|obs| obs.contains_strict(elbow))
        });
        usable.unwrap_or(candidates[0])
    }

    /// Scaled cost of stepping onto grid point (ix, iy).
    fn step_cost(&self, ix: i32, iy: i32) -> u64 {
        let d = self.col_corridor_dist[ix as usize].min(self.row_corridor_dist[iy as usize]);
        if !d.is_finite() {
            return STEP_COST;
        }
        let penalty = (d - self.options.corridor_snap_distance).max(0.0) as f64
            * self.options.corridor_penalty as f64;
        // Float to int casts saturate.
        ((1.0 + penalty) * ASTAR_COST_SCALE).round() as u64
    }
}

fn manhattan_steps(x: i32, y: i32, gx: i32, gy: i32) -> u64 {
    ((x - gx).unsigned_abs() as u64 + (y - gy).unsigned_abs() as u64) * STEP_COST
}

fn nearest_distance(value: f32, lines: &[f32]) -> f32 {
    lines
        .iter()
        .map(|line| (value - line).abs())
        .fold(f32::INFINITY, f32::min)
}

/// Declared corridor lines plus the synthesized viewport-edge lines.
fn corridor_lines(bounds: &Aabb, options: &RouterOptions) -> (Vec<f32>, Vec<f32>) {
    let mut xs = options.corridors.x.clone();
    let mut ys = options.corridors.y.clone();
    if options.prefer_edges {
        let inset = options.grid_size * EDGE_CORRIDOR_INSET_CELLS;
        xs.push(bounds.min_x + inset);
        xs.push(bounds.max_x - inset);
        ys.push(bounds.min_y + inset);
        ys.push(bounds.max_y - inset);
    }
    (xs, ys)
}

fn validate_options(options: &RouterOptions) -> Result<(), RouteError> {
    let invalid = |reason: &str| {
        Err(RouteError::InvalidRouterOptions {
            reason: reason.to_string(),
        })
    };
    if !(options.grid_size.is_finite() && options.grid_size > 0.0) {
        return invalid("gridSize must be a positive number");
    }
    if options.max_iterations == 0 {
        return invalid("maxIterations must be at least 1");
    }
    if !(options.corridor_penalty.is_finite() && options.corridor_penalty >= 0.0) {
        return invalid("corridorPenalty must be a non-negative number");
    }
    if !(options.corridor_snap_distance.is_finite() && options.corridor_snap_distance >= 0.0) {
        return invalid("corridorSnapDistance must be a non-negative number");
    }
    let corridors = &options.corridors;
    if corridors.x.iter().chain(&corridors.y).any(|v| !v.is_finite()) {
        return invalid("corridor coordinates must be finite");
    }
    Ok(())
}

fn grid_step(dir: PortDir) -> (i32, i32) {
    match dir {
        PortDir::Left => (-1, 0),
        PortDir::Right => (1, 0),
        PortDir::Up => (0, -1),
        PortDir::Down => (0, 1),
    }
}

/// Join off-grid terminals to the grid path with axis-aligned elbows.
fn stitch(from: &Terminal, grid_points: &[Point], to: &Terminal) -> Vec<Point> {
    let mut points = Vec::with_capacity(grid_points.len() + 4);
    points.push(from.point);
    if let (Some(&first), Some(&last)) = (grid_points.first(), grid_points.last()) {
        points.push(from.elbow(first));
        points.extend_from_slice(grid_points);
        points.push(to.elbow(last));
    }
    points.push(to.point);
    simplify(&points)
}

/// Direct two-segment orthogonal path; ignores obstacles.
pub fn manhattan_path(a: Point, b: Point, first: Axis) -> Vec<Point> {
    if a.x == b.x || a.y == b.y {
        return vec![a, b];
    }
    let corner = match first {
        Axis::Horizontal => Point::new(b.x, a.y),
        Axis::Vertical => Point::new(a.x, b.y),
    };
    vec![a, corner, b]
}
