use std::collections::HashSet;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::Plane3;

/// Three vertex indices into a [`TriangleMesh`].
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Triangle {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Triangle {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    pub fn indices(&self) -> [usize; 3] {
        [self.a as usize, self.b as usize, self.c as usize]
    }

    /// Directed edges in winding order.
    pub fn edges(&self) -> [(u32, u32); 3] {
        [(self.a, self.b), (self.b, self.c), (self.c, self.a)]
    }
}

/// Append-only triangle mesh the triangulator writes into.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    triangles: Vec<Triangle>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a vertex and returns its index.
    pub fn add_vertex(&mut self, vertex: Vec3) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub fn add_triangle(&mut self, a: usize, b: usize, c: usize) {
        debug_assert!(
            a < self.vertices.len() && b < self.vertices.len() && c < self.vertices.len(),
            "triangle ({a}, {b}, {c}) references a missing vertex"
        );
        self.triangles
            .push(Triangle::new(a as u32, b as u32, c as u32));
    }

    /// Drops all vertices and triangles.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.triangles.is_empty()
    }

    /// Corner positions of a triangle.
    pub fn corners(&self, triangle: &Triangle) -> [Vec3; 3] {
        let [a, b, c] = triangle.indices();
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Unit normal of every triangle, zero for degenerate ones.
    pub fn face_normals(&self) -> Vec<Vec3> {
        self.triangles
            .iter()
            .map(|triangle| {
                let [a, b, c] = self.corners(triangle);
                (b - a).cross(c - a).normalize_or_zero()
            })
            .collect()
    }

    /// Normalized plane of every triangle.
    pub fn face_planes(&self) -> Vec<Plane3> {
        self.triangles
            .iter()
            .map(|triangle| {
                let [a, b, c] = self.corners(triangle);
                Plane3::from_points(a, b, c).normalized()
            })
            .collect()
    }

    /// Total surface area.
    pub fn area(&self) -> f32 {
        self.triangles
            .iter()
            .map(|triangle| {
                let [a, b, c] = self.corners(triangle);
                (b - a).cross(c - a).length() * 0.5
            })
            .sum()
    }

    /// True when every directed edge is matched by its reverse, i.e. the
    /// mesh is a closed, consistently wound surface.
    pub fn is_closed(&self) -> bool {
        if self.triangles.is_empty() {
            return false;
        }
        let edges: HashSet<(u32, u32)> = self
            .triangles
            .iter()
            .flat_map(|triangle| triangle.edges())
            .collect();
        edges.iter().all(|&(from, to)| edges.contains(&(to, from)))
    }

    /// Index buffer as raw bytes, three native-endian `u32` per triangle.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }
}
