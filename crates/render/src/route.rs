//! Orthogonal routing for dependency connectors.
//!
//! Two fixed patterns are tried first: three segments (right, vertical,
//! right) when the successor starts to the right of the predecessor, and a
//! five-segment detour that doubles back to the left of the successor. When
//! both cross a bar, an A* search over a lattice of free points finds a path
//! with few bends; if even that fails the connector runs down a lane to the
//! right of every bar.

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

/// A point in chart coordinates.
pub type Point = (f64, f64);

/// Horizontal gap between a bar edge and the connector end.
const X_PAD: f64 = 6.0;
/// Clearance kept around bars.
const CLEARANCE: f64 = 3.0;
/// How far a blocked detour lane moves left per attempt.
const DETOUR_STEP: f64 = 8.0;
const DETOUR_MAX_STEPS: usize = 8;
/// Detour lanes never go further left than this past the leftmost bar.
const DETOUR_MARGIN: f64 = 16.0;

/// Lattice pitch of the fallback search; divides the row height, so bar
/// mid-lines fall on lattice points.
const GRID_STEP: f64 = 6.0;
/// Free space around the obstacles' bounding box.
const GRID_MARGIN: f64 = 24.0;
/// Extra cost of a turn, in lattice steps.
const BEND_PENALTY: f64 = 5.0;
/// Right, left, down, up.
const MOVES: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
/// Direction slot of the start state, which has no incoming move.
const NO_MOVE: usize = MOVES.len();
const SLOTS: usize = NO_MOVE + 1;

/// Axis-aligned bar bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x0: f64,
    /// Right edge.
    pub x1: f64,
    /// Top edge.
    pub y0: f64,
    /// Bottom edge.
    pub y1: f64,
}

impl Rect {
    const fn inflate(self, by: f64) -> Self {
        Self {
            x0: self.x0 - by,
            x1: self.x1 + by,
            y0: self.y0 - by,
            y1: self.y1 + by,
        }
    }

    fn mid_y(self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    fn contains(self, (x, y): Point) -> bool {
        self.x0 <= x && x <= self.x1 && self.y0 <= y && y <= self.y1
    }
}

/// Whether an orthogonal segment touches a rectangle.
fn segment_hits(from: Point, to: Point, rect: Rect) -> bool {
    let ((x1, y1), (x2, y2)) = (from, to);
    if (y1 - y2).abs() < f64::EPSILON {
        let (lo, hi) = (x1.min(x2), x1.max(x2));
        rect.y0 <= y1 && y1 <= rect.y1 && hi >= rect.x0 && lo <= rect.x1
    } else if (x1 - x2).abs() < f64::EPSILON {
        let (lo, hi) = (y1.min(y2), y1.max(y2));
        rect.x0 <= x1 && x1 <= rect.x1 && hi >= rect.y0 && lo <= rect.y1
    } else {
        // Diagonals never come out of the patterns; count them as blocked.
        true
    }
}

fn polyline_hits(points: &[Point], rects: &[Rect]) -> bool {
    points.windows(2).any(|seg| {
        rects
            .iter()
            .any(|r| segment_hits(seg[0], seg[1], r.inflate(CLEARANCE)))
    })
}

fn endpoints(from: Rect, to: Rect) -> (Point, Point) {
    (
        (from.x1 + X_PAD, from.mid_y()),
        (to.x0 - X_PAD, to.mid_y()),
    )
}

fn simple(from: Rect, to: Rect) -> Vec<Point> {
    let (start, goal) = endpoints(from, to);
    let lane = (start.0 + goal.0) / 2.0;
    vec![start, (lane, start.1), (lane, goal.1), goal]
}

/// Leftmost-free vertical lane left of the successor, between both bars'
/// mid-heights.
fn detour_lane(from: Rect, to: Rect) -> f64 {
    let floor = from.x0.min(to.x0) - DETOUR_MARGIN;
    let mut candidate = to.x0 - X_PAD;

    for _ in 0..=DETOUR_MAX_STEPS {
        let lane = [(candidate, from.mid_y()), (candidate, to.mid_y())];
        if !polyline_hits(&lane, &[from, to]) {
            return candidate;
        }
        candidate = (candidate - DETOUR_STEP).max(floor);
    }
    candidate
}

fn detour(from: Rect, to: Rect) -> Vec<Point> {
    let (start, goal) = endpoints(from, to);
    let lane = from.x1 + X_PAD * 2.0;
    let back = detour_lane(from, to);
    let mid = (start.1 + goal.1) / 2.0;
    vec![
        start,
        (lane, start.1),
        (lane, mid),
        (back, mid),
        (back, goal.1),
        goal,
    ]
}

/// Drop points that lie on a straight line between their neighbours.
fn simplify(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        if out.last() == Some(&point) {
            continue;
        }
        if let [.., a, b] = out.as_slice() {
            let same = |p: f64, q: f64| (p - q).abs() < f64::EPSILON;
            let collinear =
                (same(a.0, b.0) && same(b.0, point.0)) || (same(a.1, b.1) && same(b.1, point.1));
            if collinear {
                out.pop();
            }
        }
        out.push(point);
    }
    out
}

/// Lattice of candidate bend points, anchored on the connector start.
struct Grid {
    anchor: Point,
    anchor_col: usize,
    anchor_row: usize,
    cols: usize,
    rows: usize,
    free: Vec<bool>,
}

impl Grid {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn new(start: Point, goal: Point, obstacles: &[Rect]) -> Self {
        let (mut lo, mut hi) = (start, start);
        let corners = obstacles.iter().flat_map(|r| [(r.x0, r.y0), (r.x1, r.y1)]);
        for (x, y) in corners.chain([goal]) {
            lo = (lo.0.min(x), lo.1.min(y));
            hi = (hi.0.max(x), hi.1.max(y));
        }
        let steps = |span: f64| ((span + GRID_MARGIN) / GRID_STEP).ceil() as usize;

        let anchor_col = steps(start.0 - lo.0);
        let anchor_row = steps(start.1 - lo.1);
        let mut grid = Self {
            anchor: start,
            anchor_col,
            anchor_row,
            cols: anchor_col + steps(hi.0 - start.0) + 1,
            rows: anchor_row + steps(hi.1 - start.1) + 1,
            free: Vec::new(),
        };

        let blocked: Vec<Rect> = obstacles.iter().map(|r| r.inflate(CLEARANCE)).collect();
        grid.free = (0..grid.cols * grid.rows)
            .map(|cell| {
                let point = grid.point(cell);
                !blocked.iter().any(|r| r.contains(point))
            })
            .collect();
        for end in [start, goal] {
            let cell = grid.cell(end);
            grid.free[cell] = true;
        }
        grid
    }

    #[allow(clippy::cast_precision_loss)]
    fn point(&self, cell: usize) -> Point {
        let (col, row) = (cell % self.cols, cell / self.cols);
        let offset = |index: usize, anchor: usize| (index as f64 - anchor as f64) * GRID_STEP;
        (
            self.anchor.0 + offset(col, self.anchor_col),
            self.anchor.1 + offset(row, self.anchor_row),
        )
    }

    /// Cell at or before `point` on both axes.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn cell(&self, point: Point) -> usize {
        let index = |value: f64, anchor: f64, anchor_index: usize, len: usize| {
            let steps = ((value - anchor) / GRID_STEP + 1e-9).floor();
            ((anchor_index as f64 + steps).max(0.0) as usize).min(len - 1)
        };
        let col = index(point.0, self.anchor.0, self.anchor_col, self.cols);
        let row = index(point.1, self.anchor.1, self.anchor_row, self.rows);
        row * self.cols + col
    }

    fn neighbour(&self, cell: usize, (dx, dy): (isize, isize)) -> Option<usize> {
        let col = (cell % self.cols).checked_add_signed(dx)?;
        let row = (cell / self.cols).checked_add_signed(dy)?;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        let next = row * self.cols + col;
        self.free[next].then_some(next)
    }

    #[allow(clippy::cast_precision_loss)]
    fn distance(&self, a: usize, b: usize) -> f64 {
        let (ac, ar) = (a % self.cols, a / self.cols);
        let (bc, br) = (b % self.cols, b / self.cols);
        (ac.abs_diff(bc) + ar.abs_diff(br)) as f64
    }
}

/// A* over (cell, incoming move) states, so that turns can be charged.
fn grid_route(from: Rect, to: Rect, obstacles: &[Rect]) -> Option<Vec<Point>> {
    let (start, goal) = endpoints(from, to);
    let grid = Grid::new(start, goal, obstacles);
    let target = grid.cell(goal);

    let cells = grid.free.len();
    let mut graph: DiGraph<usize, f64> = DiGraph::with_capacity(cells * SLOTS, cells * SLOTS);
    for state in 0..cells * SLOTS {
        graph.add_node(state / SLOTS);
    }
    let state = |cell: usize, slot: usize| NodeIndex::new(cell * SLOTS + slot);
    for cell in (0..cells).filter(|&cell| grid.free[cell]) {
        for (dir, &step) in MOVES.iter().enumerate() {
            let Some(next) = grid.neighbour(cell, step) else {
                continue;
            };
            for incoming in 0..SLOTS {
                let turn = incoming != dir && incoming != NO_MOVE;
                let cost = if turn { 1.0 + BEND_PENALTY } else { 1.0 };
                graph.add_edge(state(cell, incoming), state(next, dir), cost);
            }
        }
    }

    let (_, path) = astar(
        &graph,
        state(grid.cell(start), NO_MOVE),
        |node| graph[node] == target,
        |edge| *edge.weight(),
        |node| grid.distance(graph[node], target),
    )?;

    let mut points = vec![start];
    points.extend(path.iter().skip(1).map(|&node| grid.point(graph[node])));
    let last = *points.last()?;
    if (last.1 - goal.1).abs() >= f64::EPSILON {
        points.push((last.0, goal.1));
    }
    points.push(goal);
    Some(simplify(points))
}

/// Last resort: a vertical lane to the right of every bar.
fn lane_route(from: Rect, to: Rect, obstacles: &[Rect]) -> Vec<Point> {
    let (start, goal) = endpoints(from, to);
    let right = obstacles
        .iter()
        .chain([&from, &to])
        .fold(f64::NEG_INFINITY, |acc, r| acc.max(r.x1));
    let lane = right + X_PAD * 4.0;
    simplify(vec![start, (lane, start.1), (lane, goal.1), goal])
}

/// Route a connector from the right face of `from` to the left face of `to`.
///
/// The first of the simple pattern (when it fits) and the detour that
/// avoids every obstacle wins; otherwise the lattice search runs.
#[must_use]
pub fn route(from: Rect, to: Rect, obstacles: &[Rect]) -> Vec<Point> {
    let mut candidates = Vec::with_capacity(2);
    if to.x0 >= from.x1 + CLEARANCE {
        candidates.push(simple(from, to));
    }
    candidates.push(detour(from, to));

    let clear = candidates
        .into_iter()
        .find(|c| !polyline_hits(c, obstacles));
    if let Some(points) = clear {
        return simplify(points);
    }
    debug!("Connector patterns blocked, searching for a path");
    grid_route(from, to, obstacles).unwrap_or_else(|| lane_route(from, to, obstacles))
}
