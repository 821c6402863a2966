//! Boolean operations between two polygons.
//!
//! Both boundaries are split at every crossing and contact point, then each
//! resulting sub-edge is classified against the other polygon (inside,
//! outside, or lying on its boundary in the same or the opposite direction).
//! The operation selects the sub-edges that bound the result and walks them
//! into rings. Rings are oriented so the filled region is always on the
//! right: clockwise rings are outlines and counter-clockwise rings are holes.
//!
//! Computations use `f64` internally. Points closer than the tolerance are
//! welded into a single vertex so contacts produced by rounding do not create
//! sliver edges.

use glam::{DVec2, Vec2};
use navmesh_common::{intersect_segments_2d, SegmentIntersection};

use super::CsgPolygon;

/// Tolerance used when no explicit one is given
pub const DEFAULT_CSG_TOLERANCE: f32 = 1e-4;

/// Default limit on the number of edges a single operation may walk
pub const DEFAULT_CSG_MAX_WALK_STEPS: usize = 1 << 16;

/// Parameters shared by every boolean operation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CsgOptions {
    /// Points closer than this are welded into one vertex
    pub tolerance: f32,
    /// Edges walked into rings before the operation gives up and keeps the
    /// rings closed so far
    pub max_walk_steps: usize,
}

impl Default for CsgOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_CSG_TOLERANCE,
            max_walk_steps: DEFAULT_CSG_MAX_WALK_STEPS,
        }
    }
}

impl CsgOptions {
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_walk_steps(mut self, max_walk_steps: usize) -> Self {
        self.max_walk_steps = max_walk_steps;
        self
    }
}

/// Polygons produced by [`apply_operation`]
#[derive(Debug, Clone)]
pub struct CsgOutcome {
    pub polygons: Vec<CsgPolygon>,
    /// False when the ring walk hit the step limit and `polygons` only holds
    /// the rings closed before it
    pub complete: bool,
}

const PARAMETER_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsgOperation {
    Union,
    Intersection,
    Subtraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeClass {
    Inside,
    Outside,
    SharedSameDirection,
    SharedOppositeDirection,
}

/// Polygon rings with the filled region on the right of every ring
struct Region {
    rings: Vec<Vec<DVec2>>,
}

impl Region {
    fn from_polygon(polygon: &CsgPolygon) -> Self {
        let mut rings = Vec::with_capacity(1 + polygon.holes().len());
        rings.push(polygon.points().iter().map(|p| p.as_dvec2()).collect());
        for hole in polygon.holes() {
            rings.push(hole.iter().rev().map(|p| p.as_dvec2()).collect());
        }
        Self { rings }
    }

    fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        self.rings.iter().filter(|r| r.len() >= 2).flat_map(|ring| {
            (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
        })
    }

    fn contains(&self, point: DVec2) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if ((a.y > point.y) != (b.y > point.y))
                && (point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x)
            {
                inside = !inside;
            }
        }
        inside
    }

    fn classify(&self, from: DVec2, to: DVec2, tolerance: f64) -> EdgeClass {
        let middle = (from + to) * 0.5;
        let direction = to - from;
        for (a, b) in self.edges() {
            if dist_point_segment_sqr(middle, a, b) <= tolerance * tolerance {
                let along = b - a;
                // a sub-edge touching the boundary only at its middle is not lying on it
                if direction.perp_dot(along).abs() <= tolerance * along.length() * direction.length().max(1.0) {
                    return if direction.dot(along) > 0.0 {
                        EdgeClass::SharedSameDirection
                    } else {
                        EdgeClass::SharedOppositeDirection
                    };
                }
            }
        }
        if self.contains(middle) {
            EdgeClass::Inside
        } else {
            EdgeClass::Outside
        }
    }
}

fn dist_point_segment_sqr(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f64::MIN_POSITIVE {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// Points inserted on an edge, keyed by their parameter along the edge
#[derive(Default)]
struct EdgeSplits {
    splits: Vec<(f64, DVec2)>,
}

impl EdgeSplits {
    fn add(&mut self, t: f64, point: DVec2) {
        self.splits.push((t, point));
    }

    /// Sub-segments of `a -> b` in parametric order
    fn segments(mut self, a: DVec2, b: DVec2, tolerance: f64) -> Vec<(DVec2, DVec2)> {
        self.splits
            .sort_by(|l, r| l.0.partial_cmp(&r.0).unwrap_or(std::cmp::Ordering::Equal));
        let mut points = Vec::with_capacity(self.splits.len() + 2);
        points.push(a);
        for (_, point) in self.splits {
            if let Some(last) = points.last() {
                if last.distance_squared(point) > tolerance * tolerance
                    && b.distance_squared(point) > tolerance * tolerance
                {
                    points.push(point);
                }
            }
        }
        points.push(b);
        points.windows(2).map(|w| (w[0], w[1])).collect()
    }
}

/// Splits the edges of both regions at their mutual crossings and contacts
fn split_edges(
    a: &Region,
    b: &Region,
    tolerance: f64,
) -> (Vec<(DVec2, DVec2)>, Vec<(DVec2, DVec2)>) {
    let a_edges: Vec<_> = a.edges().collect();
    let b_edges: Vec<_> = b.edges().collect();
    let mut a_splits: Vec<EdgeSplits> = a_edges.iter().map(|_| EdgeSplits::default()).collect();
    let mut b_splits: Vec<EdgeSplits> = b_edges.iter().map(|_| EdgeSplits::default()).collect();
    let tolerance_sq = tolerance * tolerance;

    for (i, &(a0, a1)) in a_edges.iter().enumerate() {
        for (j, &(b0, b1)) in b_edges.iter().enumerate() {
            match intersect_segments_2d(a0, a1, b0, b1, PARAMETER_EPSILON) {
                SegmentIntersection::None => {}
                SegmentIntersection::Point { point, t, u } => {
                    let snapped = [a0, a1, b0, b1]
                        .into_iter()
                        .find(|p| p.distance_squared(point) <= tolerance_sq)
                        .unwrap_or(point);
                    a_splits[i].add(t, snapped);
                    b_splits[j].add(u, snapped);
                }
                SegmentIntersection::Collinear => {
                    add_collinear_endpoints(&mut a_splits[i], a0, a1, [b0, b1], tolerance);
                    add_collinear_endpoints(&mut b_splits[j], b0, b1, [a0, a1], tolerance);
                }
            }
        }
    }

    let split = |edges: Vec<(DVec2, DVec2)>, splits: Vec<EdgeSplits>| {
        edges
            .into_iter()
            .zip(splits)
            .flat_map(|((from, to), s)| s.segments(from, to, tolerance))
            .collect::<Vec<_>>()
    };
    (split(a_edges, a_splits), split(b_edges, b_splits))
}

fn add_collinear_endpoints(
    splits: &mut EdgeSplits,
    from: DVec2,
    to: DVec2,
    others: [DVec2; 2],
    tolerance: f64,
) {
    let direction = to - from;
    let len_sq = direction.length_squared();
    if len_sq <= f64::MIN_POSITIVE {
        return;
    }
    let t_tolerance = tolerance / len_sq.sqrt();
    for point in others {
        let t = (point - from).dot(direction) / len_sq;
        if t > t_tolerance && t < 1.0 - t_tolerance {
            splits.add(t, point);
        }
    }
}

/// Welds near-identical points into shared vertex ids
struct VertexPool {
    vertices: Vec<DVec2>,
    tolerance_sq: f64,
}

impl VertexPool {
    fn new(tolerance: f64) -> Self {
        Self {
            vertices: Vec::new(),
            tolerance_sq: tolerance * tolerance,
        }
    }

    fn id(&mut self, point: DVec2) -> usize {
        if let Some(id) = self
            .vertices
            .iter()
            .position(|v| v.distance_squared(point) <= self.tolerance_sq)
        {
            return id;
        }
        self.vertices.push(point);
        self.vertices.len() - 1
    }
}

fn select_edges(
    operation: CsgOperation,
    a_edges: &[(DVec2, DVec2)],
    a: &Region,
    b_edges: &[(DVec2, DVec2)],
    b: &Region,
    tolerance: f64,
) -> Vec<(DVec2, DVec2)> {
    let mut selected = Vec::new();
    for &(from, to) in a_edges {
        let keep = match (operation, b.classify(from, to, tolerance)) {
            (CsgOperation::Union, EdgeClass::Outside | EdgeClass::SharedSameDirection) => true,
            (CsgOperation::Intersection, EdgeClass::Inside | EdgeClass::SharedSameDirection) => true,
            (CsgOperation::Subtraction, EdgeClass::Outside | EdgeClass::SharedOppositeDirection) => true,
            _ => false,
        };
        if keep {
            selected.push((from, to));
        }
    }
    for &(from, to) in b_edges {
        match (operation, a.classify(from, to, tolerance)) {
            (CsgOperation::Union, EdgeClass::Outside) => selected.push((from, to)),
            (CsgOperation::Intersection, EdgeClass::Inside) => selected.push((from, to)),
            (CsgOperation::Subtraction, EdgeClass::Inside) => selected.push((to, from)),
            _ => {}
        }
    }
    selected
}

/// Chains the selected edges into closed rings.
///
/// At a vertex with several outgoing edges the sharpest right turn is taken,
/// which splits rings touching at a single point instead of merging them into
/// a figure-eight.
fn walk_rings(
    edges: &[(DVec2, DVec2)],
    tolerance: f64,
    max_steps: usize,
    description: &str,
) -> (Vec<Vec<DVec2>>, bool) {
    let mut pool = VertexPool::new(tolerance);
    let mut graph: Vec<(usize, usize)> = Vec::with_capacity(edges.len());
    for &(from, to) in edges {
        let from_id = pool.id(from);
        let to_id = pool.id(to);
        if from_id != to_id {
            graph.push((from_id, to_id));
        }
    }

    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); pool.vertices.len()];
    for (edge, &(from, _)) in graph.iter().enumerate() {
        outgoing[from].push(edge);
    }

    let mut used = vec![false; graph.len()];
    let mut rings = Vec::new();
    let mut steps = 0;
    let mut complete = true;

    'rings: for start_edge in 0..graph.len() {
        if used[start_edge] {
            continue;
        }
        if steps >= max_steps {
            log::warn!(
                "Polygon {}: ring walk stopped after {} steps, keeping {} rings",
                description,
                steps,
                rings.len()
            );
            complete = false;
            break;
        }
        steps += 1;
        used[start_edge] = true;
        let (start, mut current) = graph[start_edge];
        let mut ring_ids = vec![start];
        let mut incoming = pool.vertices[current] - pool.vertices[start];

        while current != start {
            if steps >= max_steps {
                log::warn!(
                    "Polygon {}: ring walk stopped after {} steps, keeping {} rings",
                    description,
                    steps,
                    rings.len()
                );
                complete = false;
                break 'rings;
            }
            steps += 1;

            ring_ids.push(current);
            let origin = pool.vertices[current];
            let next_edge = outgoing[current]
                .iter()
                .copied()
                .filter(|&e| !used[e])
                .min_by(|&l, &r| {
                    let turn = |e: usize| {
                        let out = pool.vertices[graph[e].1] - origin;
                        incoming.perp_dot(out).atan2(incoming.dot(out))
                    };
                    turn(l).partial_cmp(&turn(r)).unwrap_or(std::cmp::Ordering::Equal)
                });

            match next_edge {
                Some(edge) => {
                    used[edge] = true;
                    incoming = pool.vertices[graph[edge].1] - origin;
                    current = graph[edge].1;
                }
                None => {
                    log::warn!("Polygon {}: open boundary, ring dropped", description);
                    continue 'rings;
                }
            }
        }

        rings.push(ring_ids.into_iter().map(|id| pool.vertices[id]).collect());
    }
    (rings, complete)
}

fn ring_area(ring: &[DVec2]) -> f64 {
    let mut area = 0.0;
    for i in 0..ring.len() {
        area += ring[i].perp_dot(ring[(i + 1) % ring.len()]);
    }
    area * 0.5
}

fn ring_contains(ring: &[DVec2], point: DVec2) -> bool {
    Region {
        rings: vec![ring.to_vec()],
    }
    .contains(point)
}

/// Point of `hole` to test for containment: its first vertex away from the
/// outline boundary, or the middle of its first edge.
fn sample_point(hole: &[DVec2], outline: &[DVec2], tolerance: f64) -> DVec2 {
    let away = |p: &DVec2| {
        (0..outline.len()).all(|i| {
            dist_point_segment_sqr(*p, outline[i], outline[(i + 1) % outline.len()])
                > tolerance * tolerance
        })
    };
    hole.iter()
        .copied()
        .find(away)
        .unwrap_or_else(|| (hole[0] + hole[1 % hole.len()]) * 0.5)
}

/// Sorts walked rings into outlines and holes, producing clockwise polygons
fn assemble(rings: Vec<Vec<DVec2>>, name: &str, tolerance: f64) -> Vec<CsgPolygon> {
    let min_area = tolerance * tolerance;
    let mut outlines: Vec<(f64, Vec<DVec2>, Vec<Vec<DVec2>>)> = Vec::new();
    let mut holes = Vec::new();
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        let area = ring_area(&ring);
        if area.abs() <= min_area {
            log::debug!("Polygon {}: dropped degenerate ring of area {}", name, area);
            continue;
        }
        if area < 0.0 {
            outlines.push((-area, ring, Vec::new()));
        } else {
            holes.push(ring);
        }
    }

    for mut hole in holes {
        let owner = outlines
            .iter_mut()
            .filter(|(_, outline, _)| ring_contains(outline, sample_point(&hole, outline, tolerance)))
            .min_by(|l, r| l.0.partial_cmp(&r.0).unwrap_or(std::cmp::Ordering::Equal));
        match owner {
            Some((_, _, owned)) => {
                hole.reverse();
                owned.push(hole);
            }
            None => log::warn!("Polygon {}: hole outside of any outline dropped", name),
        }
    }

    let to_vec2 = |ring: Vec<DVec2>| ring.into_iter().map(|p| p.as_vec2()).collect::<Vec<Vec2>>();
    outlines
        .into_iter()
        .map(|(_, outline, holes)| {
            CsgPolygon::with_holes(name, to_vec2(outline), holes.into_iter().map(to_vec2).collect())
        })
        .collect()
}

/// Applies a boolean operation, returning every resulting polygon.
///
/// When the walk exceeds `options.max_walk_steps` the outcome is marked
/// incomplete and holds the polygons built from the rings closed so far.
pub fn apply_operation(
    operation: CsgOperation,
    a: &CsgPolygon,
    b: &CsgPolygon,
    name: &str,
    options: CsgOptions,
) -> CsgOutcome {
    let tolerance = options.tolerance as f64;
    let region_a = Region::from_polygon(a);
    let region_b = Region::from_polygon(b);
    let (a_edges, b_edges) = split_edges(&region_a, &region_b, tolerance);
    let selected = select_edges(operation, &a_edges, &region_a, &b_edges, &region_b, tolerance);
    let (rings, complete) = walk_rings(&selected, tolerance, options.max_walk_steps, name);
    CsgOutcome {
        polygons: assemble(rings, name, tolerance),
        complete,
    }
}

fn bounds_overlap(a: &CsgPolygon, b: &CsgPolygon) -> bool {
    match (a.bounding_box(), b.bounding_box()) {
        (Some((amin, amax)), Some((bmin, bmax))) => {
            navmesh_common::overlap_bounds_2d(amin, amax, bmin, bmax)
        }
        _ => false,
    }
}

/// Union of two polygons.
///
/// Returns a single polygon named `"<a>-<b>"` when they overlap or share
/// part of an edge, otherwise both inputs unchanged.
pub fn union(a: &CsgPolygon, b: &CsgPolygon, options: CsgOptions) -> Vec<CsgPolygon> {
    if a.is_empty() || b.is_empty() {
        return [a, b].into_iter().filter(|p| !p.is_empty()).cloned().collect();
    }
    if !bounds_overlap(a, b) {
        return vec![a.clone(), b.clone()];
    }
    let name = format!("{}-{}", a.name(), b.name());
    let outcome = apply_operation(CsgOperation::Union, a, b, &name, options);
    if outcome.complete && outcome.polygons.len() == 1 {
        outcome.polygons
    } else {
        vec![a.clone(), b.clone()]
    }
}

/// Intersection of two polygons, empty when they do not overlap
pub fn intersection(a: &CsgPolygon, b: &CsgPolygon, options: CsgOptions) -> Vec<CsgPolygon> {
    if a.is_empty() || b.is_empty() || !bounds_overlap(a, b) {
        return Vec::new();
    }
    let name = format!("{}-{}", a.name(), b.name());
    apply_operation(CsgOperation::Intersection, a, b, &name, options).polygons
}

/// Subtracts `subtrahend` from `minuend`.
///
/// Result polygons keep the minuend name. A subtrahend strictly inside the
/// minuend becomes a hole. The result is empty when the subtrahend covers the
/// minuend.
pub fn subtract(minuend: &CsgPolygon, subtrahend: &CsgPolygon, options: CsgOptions) -> Vec<CsgPolygon> {
    try_subtract(minuend, subtrahend, options).polygons
}

/// Same as [`subtract`], also telling whether the walk finished
pub fn try_subtract(minuend: &CsgPolygon, subtrahend: &CsgPolygon, options: CsgOptions) -> CsgOutcome {
    if minuend.is_empty() {
        return CsgOutcome {
            polygons: Vec::new(),
            complete: true,
        };
    }
    if subtrahend.is_empty() || !bounds_overlap(minuend, subtrahend) {
        return CsgOutcome {
            polygons: vec![minuend.clone()],
            complete: true,
        };
    }
    apply_operation(
        CsgOperation::Subtraction,
        minuend,
        subtrahend,
        minuend.name(),
        options,
    )
}

/// Merges overlapping polygons until every remaining pair is disjoint
pub fn union_polygons(polygons: &[CsgPolygon], options: CsgOptions) -> Vec<CsgPolygon> {
    let mut merged: Vec<CsgPolygon> = polygons.iter().filter(|p| !p.is_empty()).cloned().collect();
    let mut changed = true;
    while changed {
        changed = false;
        'search: for i in 0..merged.len() {
            for j in (i + 1)..merged.len() {
                let result = union(&merged[i], &merged[j], options);
                if result.len() == 1 {
                    let other = merged.remove(j);
                    log::debug!("Merged polygons {} and {}", merged[i].name(), other.name());
                    merged[i] = result.into_iter().next().unwrap_or(other);
                    changed = true;
                    break 'search;
                }
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: CsgOptions = CsgOptions {
        tolerance: DEFAULT_CSG_TOLERANCE,
        max_walk_steps: DEFAULT_CSG_MAX_WALK_STEPS,
    };

    fn rect(name: &str, min: (f32, f32), max: (f32, f32)) -> CsgPolygon {
        CsgPolygon::rectangle(name, Vec2::new(min.0, min.1), Vec2::new(max.0, max.1))
    }

    fn assert_same_ring(actual: &[Vec2], expected: &[(f32, f32)]) {
        assert_eq!(actual.len(), expected.len(), "ring: {:?}", actual);
        let start = actual
            .iter()
            .position(|p| (p.x - expected[0].0).abs() < 1e-4 && (p.y - expected[0].1).abs() < 1e-4)
            .unwrap_or_else(|| panic!("{:?} not found in {:?}", expected[0], actual));
        for (k, &(x, y)) in expected.iter().enumerate() {
            let p = actual[(start + k) % actual.len()];
            assert!(
                (p.x - x).abs() < 1e-4 && (p.y - y).abs() < 1e-4,
                "ring {:?} differs from {:?}",
                actual,
                expected
            );
        }
    }

    #[test]
    fn test_union_overlapping_squares() {
        let a = rect("a", (0.0, 0.0), (2.0, 2.0));
        let b = rect("b", (1.0, 1.0), (3.0, 3.0));
        let result = union(&a, &b, OPTIONS);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name(), "a-b");
        assert!((result[0].area() - 7.0).abs() < 1e-4);
        assert_eq!(result[0].points().len(), 8);
        assert!(result[0].validate().is_ok());
    }

    #[test]
    fn test_union_disjoint_squares() {
        let a = rect("a", (0.0, 0.0), (1.0, 1.0));
        let b = rect("b", (3.0, 0.0), (4.0, 1.0));
        let result = union(&a, &b, OPTIONS);
        assert_eq!(result, vec![a, b]);
    }

    #[test]
    fn test_union_corner_touching_is_not_merged() {
        let a = rect("a", (0.0, 0.0), (1.0, 1.0));
        let b = rect("b", (1.0, 1.0), (2.0, 2.0));
        let result = union(&a, &b, OPTIONS);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name(), "a");
    }

    #[test]
    fn test_union_shared_edge() {
        let a = rect("a", (0.0, 0.0), (1.0, 1.0));
        let b = rect("b", (1.0, 0.0), (2.0, 1.0));
        let result = union(&a, &b, OPTIONS);
        assert_eq!(result.len(), 1);
        assert!((result[0].area() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_union_identical_polygons() {
        let a = rect("a", (0.0, 0.0), (1.0, 1.0));
        let result = union(&a, &a.clone(), OPTIONS);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].points().len(), 4);
    }

    #[test]
    fn test_union_encloses_hole() {
        // U shape closed by a bar: the union has a hole in the middle
        let u = CsgPolygon::new(
            "u",
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 3.0),
                Vec2::new(1.0, 3.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(2.0, 1.0),
                Vec2::new(2.0, 3.0),
                Vec2::new(3.0, 3.0),
                Vec2::new(3.0, 0.0),
            ],
        );
        assert!(u.validate().is_ok());
        let bar = rect("bar", (0.0, 2.0), (3.0, 3.0));
        let result = union(&u, &bar, OPTIONS);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes().len(), 1);
        assert!((result[0].area() - 8.0).abs() < 1e-4);
        assert!(!result[0].contains_point(Vec2::new(1.5, 1.5)));
    }

    #[test]
    fn test_subtract_crossing() {
        let a = rect("a", (0.0, 0.0), (2.0, 2.0));
        let b = rect("b", (1.0, 1.0), (3.0, 3.0));
        let result = subtract(&a, &b, OPTIONS);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name(), "a");
        assert!((result[0].area() - 3.0).abs() < 1e-4);
        assert_same_ring(
            result[0].points(),
            &[(0.0, 0.0), (0.0, 2.0), (1.0, 2.0), (1.0, 1.0), (2.0, 1.0), (2.0, 0.0)],
        );
    }

    #[test]
    fn test_subtract_inner_creates_hole() {
        let a = rect("a", (0.0, 0.0), (4.0, 4.0));
        let b = rect("b", (1.0, 1.0), (2.0, 2.0));
        let result = subtract(&a, &b, OPTIONS);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes().len(), 1);
        assert!(navmesh_common::is_clockwise(&result[0].holes()[0]));
        assert!((result[0].area() - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_subtract_covering_is_empty() {
        let a = rect("a", (1.0, 1.0), (2.0, 2.0));
        let b = rect("b", (0.0, 0.0), (4.0, 4.0));
        assert!(subtract(&a, &b, OPTIONS).is_empty());
        assert!(subtract(&a, &a.clone(), OPTIONS).is_empty());
    }

    #[test]
    fn test_subtract_splits_minuend() {
        let a = rect("a", (0.0, 0.0), (3.0, 1.0));
        let b = rect("b", (1.0, -1.0), (2.0, 2.0));
        let result = subtract(&a, &b, OPTIONS);
        assert_eq!(result.len(), 2);
        for polygon in &result {
            assert!((polygon.area() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_subtract_on_edge_notch() {
        // obstacle straddling the bottom edge of the surface
        let a = rect("a", (0.0, 0.0), (4.0, 4.0));
        let b = rect("b", (1.0, -1.0), (2.0, 1.0));
        let result = subtract(&a, &b, OPTIONS);
        assert_eq!(result.len(), 1);
        assert!(result[0].holes().is_empty());
        assert_eq!(result[0].points().len(), 8);
        assert!((result[0].area() - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_subtract_touching_edge_inside() {
        // obstacle inside the surface sharing part of its left edge
        let a = rect("a", (0.0, 0.0), (4.0, 4.0));
        let b = rect("b", (0.0, 1.0), (1.0, 2.0));
        let result = subtract(&a, &b, OPTIONS);
        assert_eq!(result.len(), 1);
        assert!(result[0].holes().is_empty());
        assert_eq!(result[0].points().len(), 8);
        assert!((result[0].area() - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_intersection() {
        let a = rect("a", (0.0, 0.0), (2.0, 2.0));
        let b = rect("b", (1.0, 1.0), (3.0, 3.0));
        let result = intersection(&a, &b, OPTIONS);
        assert_eq!(result.len(), 1);
        assert_same_ring(result[0].points(), &[(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0)]);

        let far = rect("far", (5.0, 5.0), (6.0, 6.0));
        assert!(intersection(&a, &far, OPTIONS).is_empty());
    }

    #[test]
    fn test_subtract_union_leaves_no_overlap() {
        let a = rect("a", (0.0, 0.0), (2.0, 2.0));
        let b = rect("b", (1.0, 0.5), (3.0, 1.5));
        let merged = union(&a, &b, OPTIONS);
        assert_eq!(merged.len(), 1);
        let remaining = subtract(&merged[0], &b, OPTIONS);
        let overlap: f32 = remaining
            .iter()
            .flat_map(|p| intersection(p, &b, OPTIONS))
            .map(|p| p.area())
            .sum();
        assert!(overlap.abs() < 1e-4);
    }

    #[test]
    fn test_walk_step_limit_keeps_closed_rings() {
        let outer = rect("outer", (0.0, 0.0), (4.0, 4.0));
        let inner = rect("inner", (1.0, 1.0), (2.0, 2.0));

        let full = apply_operation(CsgOperation::Subtraction, &outer, &inner, "outer", OPTIONS);
        assert!(full.complete);
        assert_eq!(full.polygons.len(), 1);
        assert_eq!(full.polygons[0].holes().len(), 1);
        assert!((full.polygons[0].area() - 15.0).abs() < 1e-4);

        // Room for the outline only, the hole ring is never started
        let limited = OPTIONS.with_max_walk_steps(4);
        let partial = apply_operation(CsgOperation::Subtraction, &outer, &inner, "outer", limited);
        assert!(!partial.complete);
        assert_eq!(partial.polygons.len(), 1);
        assert!(partial.polygons[0].holes().is_empty());
        assert!((partial.polygons[0].area() - 16.0).abs() < 1e-4);

        // Stopping inside the first ring leaves nothing closed
        let limited = OPTIONS.with_max_walk_steps(2);
        let partial = apply_operation(CsgOperation::Subtraction, &outer, &inner, "outer", limited);
        assert!(!partial.complete);
        assert!(partial.polygons.is_empty());
    }

    #[test]
    fn test_union_polygons_chain() {
        let polygons = vec![
            rect("a", (0.0, 0.0), (2.0, 1.0)),
            rect("b", (5.0, 0.0), (6.0, 1.0)),
            rect("c", (1.5, 0.0), (3.0, 1.0)),
        ];
        let merged = union_polygons(&polygons, OPTIONS);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name(), "a-c");
        assert!((merged[0].area() - 3.0).abs() < 1e-4);
        assert_eq!(merged[1].name(), "b");
    }
}
