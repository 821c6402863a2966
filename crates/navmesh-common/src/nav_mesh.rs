//! Navigation mesh data model.
//!
//! A [`NavMesh`] is an immutable snapshot: a set of [`NavPolygon`]s, each
//! owning its points and its [`NavTriangle`]s. Triangles reference each other
//! through [`NavLink`]s holding a [`TriangleRef`] (polygon id plus triangle
//! index), never through ownership, so a link can outlive its target and is
//! simply dropped when the target polygon disappears.

use glam::Vec3;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Stable identifier of a navigation polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavPolygonId(pub u32);

impl std::fmt::Display for NavPolygonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Weak reference to a triangle of the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TriangleRef {
    pub polygon: NavPolygonId,
    pub triangle: usize,
}

impl TriangleRef {
    pub fn new(polygon: NavPolygonId, triangle: usize) -> Self {
        Self { polygon, triangle }
    }

    /// Packs the reference into a single key: polygon id in the high bits
    pub fn key(&self) -> u64 {
        ((self.polygon.0 as u64) << 32) | (self.triangle as u64 & 0xFFFF_FFFF)
    }
}

/// Portion of a source edge on which a link is usable.
///
/// Ranges are barycentric weights of the edge start point: a point of the
/// edge `(A, B)` at range `r` is `r * A + (1 - r) * B`, so `(1, 0)` covers
/// the whole edge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavLinkConstraint {
    pub start_range: f32,
    pub end_range: f32,
}

impl NavLinkConstraint {
    pub fn new(start_range: f32, end_range: f32) -> Self {
        Self {
            start_range,
            end_range,
        }
    }

    pub fn full() -> Self {
        Self::new(1.0, 0.0)
    }

    pub fn point_at(range: f32, a: Vec3, b: Vec3) -> Vec3 {
        a * range + b * (1.0 - range)
    }

    /// Clips the edge `(a, b)` to the usable segment, keeping its direction
    pub fn clip(&self, a: Vec3, b: Vec3) -> (Vec3, Vec3) {
        (
            Self::point_at(self.start_range, a, b),
            Self::point_at(self.end_range, a, b),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum NavLinkKind {
    /// Walkable connection through a shared (or overlapping collinear) edge
    Direct,
    /// Discrete hop over a gap between two facing edges
    Jump,
}

/// Connection from one edge of a triangle to another triangle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavLink {
    pub kind: NavLinkKind,
    pub source_edge: usize,
    pub target: TriangleRef,
    pub target_edge: usize,
    /// Usable part of the source edge, `None` when the whole edge is usable
    pub constraint: Option<NavLinkConstraint>,
}

impl NavLink {
    pub fn direct(source_edge: usize, target: TriangleRef, target_edge: usize) -> Self {
        Self {
            kind: NavLinkKind::Direct,
            source_edge,
            target,
            target_edge,
            constraint: None,
        }
    }

    pub fn jump(
        source_edge: usize,
        target: TriangleRef,
        target_edge: usize,
        constraint: NavLinkConstraint,
    ) -> Self {
        Self {
            kind: NavLinkKind::Jump,
            source_edge,
            target,
            target_edge,
            constraint: Some(constraint),
        }
    }

    pub fn with_constraint(mut self, constraint: NavLinkConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn is_jump(&self) -> bool {
        self.kind == NavLinkKind::Jump
    }
}

/// Triangle of a navigation polygon.
///
/// Indices are counter-clockwise seen from above. Edge `i` goes from
/// `indices[i]` to `indices[(i + 1) % 3]`. An edge can carry several links
/// when it borders more than one neighbouring triangle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavTriangle {
    indices: [usize; 3],
    center: Vec3,
    links: Vec<NavLink>,
}

impl NavTriangle {
    pub fn new(indices: [usize; 3], points: &[Vec3]) -> Self {
        let center = (points[indices[0]] + points[indices[1]] + points[indices[2]]) / 3.0;
        Self {
            indices,
            center,
            links: Vec::new(),
        }
    }

    pub fn indices(&self) -> [usize; 3] {
        self.indices
    }

    pub fn index(&self, i: usize) -> usize {
        self.indices[i]
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Point indices of an edge, in triangle order
    pub fn edge(&self, edge: usize) -> (usize, usize) {
        (self.indices[edge], self.indices[(edge + 1) % 3])
    }

    /// First link of an edge
    pub fn link(&self, edge: usize) -> Option<&NavLink> {
        self.edge_links(edge).next()
    }

    pub fn edge_links(&self, edge: usize) -> impl Iterator<Item = &NavLink> {
        self.links.iter().filter(move |link| link.source_edge == edge)
    }

    pub fn links(&self) -> impl Iterator<Item = &NavLink> {
        self.links.iter()
    }

    pub fn has_link(&self, edge: usize) -> bool {
        self.edge_links(edge).next().is_some()
    }

    /// Edge without any link: a boundary of the walkable area
    pub fn is_external_edge(&self, edge: usize) -> bool {
        !self.has_link(edge)
    }

    /// Sets the only link of an edge, replacing any previous ones
    pub fn set_link(&mut self, link: NavLink) {
        debug_assert!(link.source_edge < 3);
        self.clear_links(link.source_edge);
        self.links.push(link);
    }

    /// Adds a link to an edge. A link from the same edge to the same target
    /// edge is replaced.
    ///
    /// Returns `false` when an identical link was already there.
    pub fn add_link(&mut self, link: NavLink) -> bool {
        debug_assert!(link.source_edge < 3);
        let same_target = self.links.iter_mut().find(|existing| {
            existing.source_edge == link.source_edge
                && existing.target == link.target
                && existing.target_edge == link.target_edge
        });
        match same_target {
            Some(existing) if *existing == link => false,
            Some(existing) => {
                *existing = link;
                true
            }
            None => {
                self.links.push(link);
                true
            }
        }
    }

    pub fn clear_links(&mut self, edge: usize) {
        self.links.retain(|link| link.source_edge != edge);
    }

    /// Keeps only the links matching the predicate, returns how many were removed
    pub fn retain_links(&mut self, mut keep: impl FnMut(&NavLink) -> bool) -> usize {
        let before = self.links.len();
        self.links.retain(|link| keep(link));
        before - self.links.len()
    }

    /// Removes links pointing into the given polygon, returns how many were removed
    pub fn remove_links_to(&mut self, polygon: NavPolygonId) -> usize {
        self.retain_links(|link| link.target.polygon != polygon)
    }
}

/// Walkable polygon: a set of triangles sharing one point array
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavPolygon {
    id: NavPolygonId,
    name: String,
    points: Vec<Vec3>,
    triangles: Vec<NavTriangle>,
    bounds_min: Vec3,
    bounds_max: Vec3,
}

impl NavPolygon {
    pub fn new(id: NavPolygonId, name: String, points: Vec<Vec3>, triangles: Vec<NavTriangle>) -> Self {
        let (bounds_min, bounds_max) = points
            .iter()
            .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(min, max), p| {
                (min.min(*p), max.max(*p))
            });
        Self {
            id,
            name,
            points,
            triangles,
            bounds_min,
            bounds_max,
        }
    }

    pub fn id(&self) -> NavPolygonId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    pub fn triangles(&self) -> &[NavTriangle] {
        &self.triangles
    }

    pub fn triangles_mut(&mut self) -> &mut [NavTriangle] {
        &mut self.triangles
    }

    pub fn triangle(&self, index: usize) -> Option<&NavTriangle> {
        self.triangles.get(index)
    }

    pub fn triangle_points(&self, index: usize) -> [Vec3; 3] {
        let indices = self.triangles[index].indices();
        [
            self.points[indices[0]],
            self.points[indices[1]],
            self.points[indices[2]],
        ]
    }

    /// End points of a triangle edge
    pub fn edge_points(&self, triangle: usize, edge: usize) -> (Vec3, Vec3) {
        let (a, b) = self.triangles[triangle].edge(edge);
        (self.points[a], self.points[b])
    }

    pub fn bounds(&self) -> (Vec3, Vec3) {
        (self.bounds_min, self.bounds_max)
    }

    pub fn remove_links_to(&mut self, polygon: NavPolygonId) -> usize {
        self.triangles
            .iter_mut()
            .map(|triangle| triangle.remove_links_to(polygon))
            .sum()
    }
}

/// Summary counters of a navigation mesh
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NavMeshStatistics {
    pub polygon_count: usize,
    pub triangle_count: usize,
    pub link_count: usize,
    pub jump_link_count: usize,
}

/// Immutable navigation mesh snapshot.
///
/// Polygons are shared with `Arc` so a new snapshot reuses every polygon an
/// incremental regeneration did not touch.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavMesh {
    update_id: u64,
    polygons: BTreeMap<NavPolygonId, Arc<NavPolygon>>,
}

impl NavMesh {
    /// Creates an empty mesh with update id 0
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_polygons(update_id: u64, polygons: BTreeMap<NavPolygonId, Arc<NavPolygon>>) -> Self {
        Self {
            update_id,
            polygons,
        }
    }

    /// Increases on every published generation
    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn polygon(&self, id: NavPolygonId) -> Option<&NavPolygon> {
        self.polygons.get(&id).map(|p| p.as_ref())
    }

    pub fn polygons(&self) -> impl Iterator<Item = &NavPolygon> {
        self.polygons.values().map(|p| p.as_ref())
    }

    pub fn polygon_map(&self) -> &BTreeMap<NavPolygonId, Arc<NavPolygon>> {
        &self.polygons
    }

    pub fn triangle(&self, reference: TriangleRef) -> Option<&NavTriangle> {
        self.polygon(reference.polygon)?.triangle(reference.triangle)
    }

    /// End points of an edge of a referenced triangle
    pub fn edge_points(&self, reference: TriangleRef, edge: usize) -> Option<(Vec3, Vec3)> {
        let polygon = self.polygon(reference.polygon)?;
        polygon.triangle(reference.triangle)?;
        Some(polygon.edge_points(reference.triangle, edge))
    }

    pub fn statistics(&self) -> NavMeshStatistics {
        let mut stats = NavMeshStatistics {
            polygon_count: self.polygons.len(),
            ..Default::default()
        };
        for polygon in self.polygons() {
            stats.triangle_count += polygon.triangles().len();
            for link in polygon.triangles().iter().flat_map(|t| t.links()) {
                stats.link_count += 1;
                if link.is_jump() {
                    stats.jump_link_count += 1;
                }
            }
        }
        stats
    }
}
