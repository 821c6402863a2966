//! Heightfield terrain used as a walkable surface.
//!
//! Vertices are laid out row by row: vertex `(x, z)` is at index
//! `x + z * x_length`, rows going from the far side (small z) to the near
//! side. A square is identified by the index of its far-left vertex.

use glam::{Vec2, Vec3};
use navmesh_common::{point_in_triangle_xz, triangle_height_at, Error, Result};
use std::collections::{HashMap, HashSet};

use crate::csg::CsgPolygon;

/// Regular heightfield grid
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TerrainSurface {
    name: String,
    position: Vec3,
    local_vertices: Vec<Vec3>,
    x_length: usize,
    z_length: usize,
}

impl TerrainSurface {
    pub fn new(
        name: impl Into<String>,
        position: Vec3,
        local_vertices: Vec<Vec3>,
        x_length: usize,
        z_length: usize,
    ) -> Result<Self> {
        if x_length < 2 || z_length < 2 {
            return Err(Error::InvalidInput(format!(
                "terrain needs at least 2x2 vertices, got {}x{}",
                x_length, z_length
            )));
        }
        if local_vertices.len() != x_length * z_length {
            return Err(Error::InvalidInput(format!(
                "terrain expects {} vertices, got {}",
                x_length * z_length,
                local_vertices.len()
            )));
        }
        let terrain = Self {
            name: name.into(),
            position,
            local_vertices,
            x_length,
            z_length,
        };
        if !(terrain.x_interval() > 0.0 && terrain.z_interval() > 0.0) {
            return Err(Error::InvalidInput(
                "terrain vertices must increase along x and z".to_string(),
            ));
        }
        Ok(terrain)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x_length(&self) -> usize {
        self.x_length
    }

    pub fn z_length(&self) -> usize {
        self.z_length
    }

    /// World position of a vertex
    pub fn vertex(&self, index: usize) -> Vec3 {
        self.local_vertices[index] + self.position
    }

    fn x_interval(&self) -> f32 {
        self.local_vertices[1].x - self.local_vertices[0].x
    }

    fn z_interval(&self) -> f32 {
        self.local_vertices[self.x_length].z - self.local_vertices[0].z
    }

    /// Lowest and highest vertex heights
    pub fn height_range(&self) -> (f32, f32) {
        self.local_vertices
            .iter()
            .fold((f32::MAX, f32::MIN), |(min, max), v| {
                let y = v.y + self.position.y;
                (min.min(y), max.max(y))
            })
    }

    /// Clockwise outline of the terrain on the walking plane
    pub fn outline(&self) -> CsgPolygon {
        let corners = [
            0,
            self.x_length - 1,
            self.x_length * self.z_length - 1,
            self.x_length * (self.z_length - 1),
        ];
        let points = corners
            .iter()
            .map(|&index| {
                let vertex = self.vertex(index);
                Vec2::new(vertex.x, -vertex.z)
            })
            .collect();
        CsgPolygon::new(self.name.clone(), points)
    }

    /// Height of the terrain below a plane point, interpolated over the
    /// triangle containing it. Points outside the terrain use the closest square.
    pub fn height_at(&self, point: Vec2) -> f32 {
        let world = Vec3::new(point.x, 0.0, -point.y);
        let origin = self.vertex(0);
        let max_x = (self.x_length - 2) as f32;
        let max_z = (self.z_length - 2) as f32;
        let x = ((world.x - origin.x) / self.x_interval()).floor().clamp(0.0, max_x) as usize;
        let z = ((world.z - origin.z) / self.z_interval()).floor().clamp(0.0, max_z) as usize;

        let square = x + z * self.x_length;
        let [far_left, far_right, near_left, near_right] = self.square_vertices(square);
        if point_in_triangle_xz(world, far_left, near_left, near_right) {
            triangle_height_at(world, far_left, near_left, near_right)
        } else {
            triangle_height_at(world, far_left, near_right, far_right)
        }
    }

    fn square_vertices(&self, square: usize) -> [Vec3; 4] {
        [
            self.vertex(square),
            self.vertex(square + 1),
            self.vertex(square + self.x_length),
            self.vertex(square + self.x_length + 1),
        ]
    }

    fn is_square(&self, index: usize) -> bool {
        (index + 1) % self.x_length != 0 && index < self.x_length * (self.z_length - 1)
    }

    /// A square is walkable when both of its triangles are within the slope limit
    fn is_walkable_square(&self, square: usize, min_up_dot: f32) -> bool {
        let [far_left, far_right, near_left, near_right] = self.square_vertices(square);
        let up_dot = |a: Vec3, b: Vec3, c: Vec3| {
            (b - a)
                .cross(c - a)
                .try_normalize()
                .map_or(-1.0, |normal| normal.y)
        };
        let first = up_dot(far_left, near_left, near_right);
        let second = up_dot(far_left, near_right, far_right);
        first.min(second) >= min_up_dot
    }

    fn square_neighbors(&self, square: usize) -> impl Iterator<Item = usize> + '_ {
        let x_length = self.x_length;
        let left = (square % x_length != 0).then(|| square - 1);
        let right = Some(square + 1);
        let far = square.checked_sub(x_length);
        let near = Some(square + x_length);
        [left, right, far, near]
            .into_iter()
            .flatten()
            .filter(move |&neighbor| self.is_square(neighbor))
    }

    /// Groups of connected squares steeper than `max_slope_radians`, each one
    /// traced into a clockwise obstacle polygon named `<terrain>_obstacle<N>`.
    pub fn self_obstacles(&self, max_slope_radians: f32) -> Vec<CsgPolygon> {
        let min_up_dot = max_slope_radians.cos();
        let square_count = self.x_length * (self.z_length - 1);
        let mut processed = vec![false; square_count];
        let mut obstacles = Vec::new();

        for square in 0..square_count {
            if !self.is_square(square) || processed[square] {
                continue;
            }
            if self.is_walkable_square(square, min_up_dot) {
                continue;
            }

            let mut group = vec![square];
            let mut stack = vec![square];
            processed[square] = true;
            while let Some(current) = stack.pop() {
                for neighbor in self.square_neighbors(current) {
                    if !processed[neighbor] && !self.is_walkable_square(neighbor, min_up_dot) {
                        processed[neighbor] = true;
                        group.push(neighbor);
                        stack.push(neighbor);
                    }
                }
            }

            let name = format!("{}_obstacle{}", self.name, obstacles.len());
            match self.trace_outline(square, &group) {
                Some(points) => obstacles.push(CsgPolygon::new(name, points)),
                None => log::warn!("Cannot trace outline of terrain obstacle {}", name),
            }
        }

        log::debug!(
            "Terrain {} has {} steep obstacle(s)",
            self.name,
            obstacles.len()
        );
        obstacles
    }

    /// Follows the outer boundary of a group of squares clockwise, starting
    /// at the far-left vertex of its first square.
    fn trace_outline(&self, first_square: usize, squares: &[usize]) -> Option<Vec<Vec2>> {
        let x_length = self.x_length;
        let square_set: HashSet<usize> = squares.iter().copied().collect();

        // Clockwise square edges; an edge shared by two squares of the group
        // appears in both directions and is not part of the boundary.
        let mut directed: HashSet<(usize, usize)> = HashSet::new();
        for &square in &square_set {
            let corners = [square, square + 1, square + x_length + 1, square + x_length];
            for i in 0..4 {
                let edge = (corners[i], corners[(i + 1) % 4]);
                if !directed.remove(&(edge.1, edge.0)) {
                    directed.insert(edge);
                }
            }
        }
        let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
        for &(from, to) in &directed {
            outgoing.entry(from).or_default().push(to);
        }

        let direction = |from: usize, to: usize| -> Direction {
            if to == from + 1 {
                Direction::Right
            } else if to + 1 == from {
                Direction::Left
            } else if to > from {
                Direction::Down
            } else {
                Direction::Up
            }
        };

        let start = first_square;
        let mut indices = vec![start, start + 1];
        let mut current_direction = Direction::Right;
        for _ in 0..=directed.len() {
            let last = *indices.last()?;
            let candidates = outgoing.get(&last)?;
            let next = current_direction
                .turn_preference()
                .iter()
                .find_map(|preferred| {
                    candidates
                        .iter()
                        .copied()
                        .find(|&to| direction(last, to) == *preferred)
                })?;
            let next_direction = direction(last, next);

            if next == start {
                if next_direction == current_direction {
                    indices.pop();
                }
                return Some(
                    indices
                        .into_iter()
                        .map(|index| {
                            let vertex = self.vertex(index);
                            Vec2::new(vertex.x, -vertex.z)
                        })
                        .collect(),
                );
            }

            if next_direction == current_direction {
                if let Some(slot) = indices.last_mut() {
                    *slot = next;
                }
            } else {
                indices.push(next);
                current_direction = next_direction;
            }
        }
        None
    }
}

/// Moving direction on the vertex grid, seen from above with far at the top
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    /// Left turn first, then straight on, then right turn
    fn turn_preference(self) -> [Direction; 3] {
        match self {
            Direction::Right => [Direction::Up, Direction::Right, Direction::Down],
            Direction::Down => [Direction::Right, Direction::Down, Direction::Left],
            Direction::Left => [Direction::Down, Direction::Left, Direction::Up],
            Direction::Up => [Direction::Left, Direction::Up, Direction::Right],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terrain(heights: &[f32], x_length: usize, z_length: usize) -> TerrainSurface {
        let vertices = heights
            .iter()
            .enumerate()
            .map(|(i, &y)| Vec3::new((i % x_length) as f32, y, (i / x_length) as f32))
            .collect();
        TerrainSurface::new("terrain", Vec3::ZERO, vertices, x_length, z_length).unwrap()
    }

    fn assert_points(polygon: &CsgPolygon, expected: &[(f32, f32)]) {
        let actual: Vec<(f32, f32)> = polygon.points().iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_one_steep_square() {
        #[rustfmt::skip]
        let terrain = terrain(&[
            0.0, 0.0, 100.0,
            0.0, 0.0, 0.0,
            0.0, 0.0, 0.0,
        ], 3, 3);
        let obstacles = terrain.self_obstacles(0.01);
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].name(), "terrain_obstacle0");
        assert_points(&obstacles[0], &[(1.0, 0.0), (2.0, 0.0), (2.0, -1.0), (1.0, -1.0)]);
        assert!(obstacles[0].validate().is_ok());
    }

    #[test]
    fn test_two_aligned_squares() {
        #[rustfmt::skip]
        let terrain = terrain(&[
            0.0, 0.0, 100.0,
            0.0, 0.0, 100.0,
            0.0, 0.0, 0.0,
        ], 3, 3);
        let obstacles = terrain.self_obstacles(0.01);
        assert_eq!(obstacles.len(), 1);
        assert_points(&obstacles[0], &[(1.0, 0.0), (2.0, 0.0), (2.0, -2.0), (1.0, -2.0)]);
    }

    #[test]
    fn test_squares_sharing_a_corner_are_separate() {
        #[rustfmt::skip]
        let terrain = terrain(&[
            0.0, 0.0, 100.0,
            0.0, 0.0, 0.0,
            100.0, 0.0, 0.0,
        ], 3, 3);
        let obstacles = terrain.self_obstacles(0.01);
        assert_eq!(obstacles.len(), 2);
        assert_eq!(obstacles[1].name(), "terrain_obstacle1");
        assert_points(&obstacles[0], &[(1.0, 0.0), (2.0, 0.0), (2.0, -1.0), (1.0, -1.0)]);
        assert_points(&obstacles[1], &[(0.0, -1.0), (1.0, -1.0), (1.0, -2.0), (0.0, -2.0)]);
    }

    #[test]
    fn test_squares_in_u_form() {
        #[rustfmt::skip]
        let terrain = terrain(&[
            0.0, 0.0, 0.0, 0.0,
            100.0, 0.0, 0.0, 100.0,
            100.0, 100.0, 100.0, 100.0,
        ], 4, 3);
        let obstacles = terrain.self_obstacles(0.01);
        assert_eq!(obstacles.len(), 1);
        assert_points(
            &obstacles[0],
            &[
                (0.0, 0.0),
                (1.0, 0.0),
                (1.0, -1.0),
                (2.0, -1.0),
                (2.0, 0.0),
                (3.0, 0.0),
                (3.0, -2.0),
                (0.0, -2.0),
            ],
        );
    }

    #[test]
    fn test_flat_terrain_has_no_obstacle() {
        let terrain = terrain(&[0.0; 9], 3, 3);
        assert!(terrain.self_obstacles(0.5).is_empty());
        assert_points(
            &terrain.outline(),
            &[(0.0, 0.0), (2.0, 0.0), (2.0, -2.0), (0.0, -2.0)],
        );
    }

    #[test]
    fn test_height_interpolation() {
        #[rustfmt::skip]
        let terrain = terrain(&[
            0.0, 1.0,
            0.0, 1.0,
        ], 2, 2);
        assert!((terrain.height_at(Vec2::new(0.5, -0.5)) - 0.5).abs() < 1e-5);
        assert!((terrain.height_at(Vec2::new(0.25, -0.75)) - 0.25).abs() < 1e-5);
        assert!((terrain.height_at(Vec2::new(1.0, -0.1)) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_terrain() {
        assert!(TerrainSurface::new("t", Vec3::ZERO, vec![Vec3::ZERO; 3], 2, 2).is_err());
        assert!(TerrainSurface::new("t", Vec3::ZERO, vec![Vec3::ZERO; 2], 1, 2).is_err());
    }
}
