//! Decomposition of a polygon with holes into Y-monotone polygons.
//!
//! A Y-monotone polygon is crossed at most once (in a point or a segment) by
//! any horizontal line. The decomposition sweeps the points from top to bottom,
//! classifies every vertex and inserts diagonals at split and merge vertices.
//! Each diagonal is recorded on both polygons it separates as a shared edge.

use glam::{DVec2, Vec2};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Y-monotone polygon expressed as indices into the decomposed point buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonotonePolygon {
    ccw_points: Vec<usize>,
    shared_edges: BTreeSet<(usize, usize)>,
}

impl MonotonePolygon {
    /// Point indices in counter-clockwise order
    pub fn ccw_points(&self) -> &[usize] {
        &self.ccw_points
    }

    /// Diagonals added by the decomposition, stored with the smaller index first
    pub fn shared_edges(&self) -> &BTreeSet<(usize, usize)> {
        &self.shared_edges
    }

    pub fn is_shared_edge(&self, start: usize, end: usize) -> bool {
        self.shared_edges.contains(&(start.min(end), start.max(end)))
    }

    fn add_shared_edge(&mut self, start: usize, end: usize) {
        self.shared_edges.insert((start.min(end), start.max(end)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointType {
    Start,
    Split,
    End,
    Merge,
    RegularDown,
    RegularUp,
}

#[derive(Debug, Clone, Copy)]
struct EdgeHelper {
    edge_start: usize,
    edge_end: usize,
    helper: usize,
    helper_type: PointType,
}

#[derive(Debug, Clone, Copy)]
struct Diagonal {
    end: usize,
    processed: bool,
}

/// Sweep-line decomposition state
pub struct MonotonePolygonAlgorithm<'a> {
    points: &'a [Vec2],
    end_contour_indices: &'a [usize],
    contour_names: &'a [String],
    edge_helpers: Vec<EdgeHelper>,
    diagonals: BTreeMap<usize, Vec<Diagonal>>,
}

impl<'a> MonotonePolygonAlgorithm<'a> {
    /// `points` holds the counter-clockwise outline followed by the clockwise
    /// holes. `end_contour_indices[k]` is the index one past the end of
    /// contour `k`.
    pub fn new(points: &'a [Vec2], end_contour_indices: &'a [usize], contour_names: &'a [String]) -> Self {
        Self {
            points,
            end_contour_indices,
            contour_names,
            edge_helpers: Vec::with_capacity(5),
            diagonals: BTreeMap::new(),
        }
    }

    /// Splits the polygon into Y-monotone polygons.
    ///
    /// Inconsistent input (self-intersecting contours, holes outside the
    /// outline) is logged and yields the polygons built so far.
    pub fn create_y_monotone_polygons(&mut self) -> Vec<MonotonePolygon> {
        if self.points.len() < 3 || self.end_contour_indices.is_empty() {
            return Vec::new();
        }

        if let Err(message) = self.create_diagonals() {
            self.log_input(&message);
            return Vec::new();
        }

        if self.diagonals.is_empty() {
            return vec![MonotonePolygon {
                ccw_points: (0..self.points.len()).collect(),
                shared_edges: BTreeSet::new(),
            }];
        }

        let mut polygons = Vec::with_capacity(self.diagonals.len());
        let starts: Vec<usize> = self.diagonals.keys().copied().collect();
        for start in starts {
            let count = self.diagonals.get(&start).map_or(0, Vec::len);
            for slot in 0..count {
                let diagonal = self.diagonals[&start][slot];
                if diagonal.processed {
                    continue;
                }

                let mut polygon = MonotonePolygon::default();
                self.mark_processed(start, slot, &mut polygon);

                let mut ccw_points = vec![start, diagonal.end];
                let mut previous = start;
                let mut current = diagonal.end;
                loop {
                    let next = self.next_monotone_point(previous, current, &mut polygon);
                    if next == start {
                        break;
                    }
                    ccw_points.push(next);
                    previous = current;
                    current = next;

                    if ccw_points.len() > self.points.len() {
                        self.log_input("impossible to close monotone polygon");
                        return polygons;
                    }
                }

                polygon.ccw_points = ccw_points;
                polygons.push(polygon);
            }
        }
        polygons
    }

    fn create_diagonals(&mut self) -> Result<(), String> {
        let (sorted, is_monotone) = self.sorted_typed_points()?;
        if is_monotone {
            return Ok(());
        }

        for (index, point_type) in sorted {
            match point_type {
                PointType::Start => self.create_edge_helper(index, PointType::Start),
                PointType::Split => {
                    let left = self.nearest_left_edge_helper(index)?;
                    let helper = self.edge_helpers[left].helper;
                    self.create_diagonal(index, helper);
                    self.edge_helpers[left].helper = index;
                    self.edge_helpers[left].helper_type = PointType::Split;
                    self.create_edge_helper(index, PointType::Split);
                }
                PointType::End => {
                    self.close_previous_edge(index)?;
                }
                PointType::Merge => {
                    self.close_previous_edge(index)?;
                    let left = self.nearest_left_edge_helper(index)?;
                    let EdgeHelper { helper, helper_type, .. } = self.edge_helpers[left];
                    if helper_type == PointType::Merge {
                        self.create_diagonal(index, helper);
                    }
                    self.edge_helpers[left].helper = index;
                    self.edge_helpers[left].helper_type = PointType::Merge;
                }
                PointType::RegularDown => {
                    self.close_previous_edge(index)?;
                    self.create_edge_helper(index, PointType::RegularDown);
                }
                PointType::RegularUp => {
                    let left = self.nearest_left_edge_helper(index)?;
                    let EdgeHelper { helper, helper_type, .. } = self.edge_helpers[left];
                    if helper_type == PointType::Merge {
                        self.create_diagonal(index, helper);
                    }
                    self.edge_helpers[left].helper = index;
                    self.edge_helpers[left].helper_type = PointType::RegularUp;
                }
            }
        }
        Ok(())
    }

    /// Classifies every point and sorts them from top to bottom.
    /// Also reports whether the polygon is already monotone.
    fn sorted_typed_points(&self) -> Result<(Vec<(usize, PointType)>, bool), String> {
        let mut is_monotone = true;
        let mut typed: Vec<(usize, PointType)> = (0..self.points.len())
            .map(|i| {
                let previous = self.previous_index(i);
                let next = self.next_index(i);
                let above_previous = self.is_above(i, previous);
                let above_next = self.is_above(i, next);

                let orientation = || {
                    let previous_to_origin = self.points[i] - self.points[previous];
                    let origin_to_next = self.points[next] - self.points[i];
                    previous_to_origin.perp_dot(origin_to_next)
                };

                let point_type = if above_previous && above_next {
                    if orientation() >= 0.0 {
                        PointType::Start
                    } else {
                        is_monotone = false;
                        PointType::Split
                    }
                } else if !above_previous && !above_next {
                    if orientation() >= 0.0 {
                        PointType::End
                    } else {
                        is_monotone = false;
                        PointType::Merge
                    }
                } else if !above_previous {
                    PointType::RegularDown
                } else {
                    PointType::RegularUp
                };
                (i, point_type)
            })
            .collect();

        typed.sort_by(|l, r| self.sweep_order(l.0, r.0));

        match typed.first() {
            Some(&(_, PointType::Start)) | None => Ok((typed, is_monotone)),
            Some(&(index, point_type)) => Err(format!(
                "first point {} should be a start vertex, found {:?}",
                index, point_type
            )),
        }
    }

    fn is_above(&self, first: usize, second: usize) -> bool {
        is_above(self.points[first], self.points[second])
    }

    fn sweep_order(&self, first: usize, second: usize) -> Ordering {
        if first == second {
            Ordering::Equal
        } else if self.is_above(first, second) {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    /// Next point on the same contour
    fn next_index(&self, index: usize) -> usize {
        next_contour_index(index, self.end_contour_indices)
    }

    /// Previous point on the same contour
    fn previous_index(&self, index: usize) -> usize {
        if index == 0 {
            return self.end_contour_indices[0] - 1;
        }
        match self.end_contour_indices.iter().position(|&end| end == index) {
            Some(k) if k + 1 < self.end_contour_indices.len() => self.end_contour_indices[k + 1] - 1,
            _ => index - 1,
        }
    }

    fn create_edge_helper(&mut self, index: usize, helper_type: PointType) {
        self.edge_helpers.push(EdgeHelper {
            edge_start: index,
            edge_end: self.next_index(index),
            helper: index,
            helper_type,
        });
    }

    /// Handles the edge ending at `index`: connects a pending merge helper and
    /// removes the edge from the sweep status.
    fn close_previous_edge(&mut self, index: usize) -> Result<(), String> {
        let previous = self.previous_index(index);
        let position = self
            .edge_helpers
            .iter()
            .position(|h| h.edge_start == previous)
            .ok_or_else(|| format!("impossible to find edge helper for edge starting at {}", previous))?;
        let helper = self.edge_helpers.swap_remove(position);
        if helper.helper_type == PointType::Merge {
            self.create_diagonal(index, helper.helper);
        }
        Ok(())
    }

    fn nearest_left_edge_helper(&self, index: usize) -> Result<usize, String> {
        let point = self.points[index].as_dvec2();
        let mut nearest_distance = f64::MIN;
        let mut nearest = None;
        for (position, helper) in self.edge_helpers.iter().enumerate() {
            let a = self.points[helper.edge_start].as_dvec2();
            let b = self.points[helper.edge_end].as_dvec2();
            let distance = horizontal_distance(a, b, point);
            if distance < 0.0 && distance > nearest_distance {
                nearest_distance = distance;
                nearest = Some(position);
            }
        }
        nearest.ok_or_else(|| format!("impossible to find edge on the left of point {}", index))
    }

    fn create_diagonal(&mut self, first: usize, second: usize) {
        self.diagonals.entry(first).or_default().push(Diagonal {
            end: second,
            processed: false,
        });
        self.diagonals.entry(second).or_default().push(Diagonal {
            end: first,
            processed: false,
        });
    }

    fn mark_processed(&mut self, start: usize, slot: usize, polygon: &mut MonotonePolygon) {
        if let Some(diagonal) = self.diagonals.get_mut(&start).and_then(|d| d.get_mut(slot)) {
            diagonal.processed = true;
            polygon.add_shared_edge(start, diagonal.end);
        }
    }

    /// Next point after the edge `start -> end`: among the next contour point
    /// and the unprocessed diagonals leaving `end`, the sharpest left turn wins.
    fn next_monotone_point(&mut self, start: usize, end: usize, polygon: &mut MonotonePolygon) -> usize {
        let mut candidates: Vec<(usize, Option<usize>)> = vec![(self.next_index(end), None)];
        if let Some(diagonals) = self.diagonals.get(&end) {
            candidates.extend(
                diagonals
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| !d.processed)
                    .map(|(slot, d)| (d.end, Some(slot))),
            );
        }

        // going back along the incoming edge never closes a valid polygon
        if candidates.len() > 1 {
            candidates.retain(|&(index, _)| index != start);
        }

        let chosen = if candidates.len() == 1 {
            candidates[0]
        } else {
            let edge = (self.points[end].as_dvec2() - self.points[start].as_dvec2()).normalize_or_zero();
            let mut best_ccw: Option<((usize, Option<usize>), f64)> = None;
            let mut best_cw: Option<((usize, Option<usize>), f64)> = None;
            for &candidate in &candidates {
                let next_edge = self.points[candidate.0].as_dvec2() - self.points[end].as_dvec2();
                let orientation = edge.perp_dot(next_edge);
                let angle = edge.dot(next_edge.normalize_or_zero());
                if orientation > 0.0 {
                    if best_ccw.map_or(true, |(_, best)| angle < best) {
                        best_ccw = Some((candidate, angle));
                    }
                } else if best_cw.map_or(true, |(_, best)| angle > best) {
                    best_cw = Some((candidate, angle));
                }
            }
            best_ccw.or(best_cw).map_or(candidates[0], |(candidate, _)| candidate)
        };

        if let Some(slot) = chosen.1 {
            self.mark_processed(end, slot, polygon);
        }
        chosen.0
    }

    fn log_input(&self, message: &str) {
        let mut contour = 0;
        let mut description = String::new();
        for (i, point) in self.points.iter().enumerate() {
            if i == 0 || self.end_contour_indices.contains(&i) {
                let name = self.contour_names.get(contour).map_or("?", String::as_str);
                description.push_str(&format!("\n  {} {}:", if i == 0 { "outline" } else { "hole" }, name));
                contour += 1;
            }
            description.push_str(&format!(" ({}, {})", point.x, point.y));
        }
        log::warn!("Monotone decomposition failed: {}{}", message, description);
    }
}

/// Next point on the same contour for a packed contour buffer
pub(crate) fn next_contour_index(index: usize, end_contour_indices: &[usize]) -> usize {
    let next = index + 1;
    match end_contour_indices.iter().position(|&end| end == next) {
        Some(0) => 0,
        Some(k) => end_contour_indices[k - 1],
        None => next,
    }
}

/// Sweep order: higher Y first, then smaller X
pub(crate) fn is_above(first: Vec2, second: Vec2) -> bool {
    if first.y == second.y {
        return first.x < second.x;
    }
    first.y > second.y
}

/// Signed horizontal distance from `point` to the line through `a` and `b`,
/// negative when the line is on the left of the point.
fn horizontal_distance(a: DVec2, b: DVec2, point: DVec2) -> f64 {
    let ab = b - a;
    let normal = DVec2::new(-ab.y, ab.x);
    normal.dot(a - point) / normal.x
}
