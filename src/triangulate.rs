use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::ear_clipper::{EarClipper, VertexSet};
use crate::error::TriangulationError;
use crate::mesh::TriangleMesh;
use crate::planar::map_to_planar;

/// How clipped ears are wound when they are written to the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindingPolicy {
    /// Emit `(left, ear, right)` when `left > right`, `(right, ear, left)`
    /// otherwise. Compatible with older tooling but ignores geometry.
    IndexOrder,
    /// Wind every triangle so its normal agrees with the contour normal.
    #[default]
    Normal,
}

/// Tunables for [`Triangulator`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationConfig {
    /// Largest normal X/Y magnitude for which the contour counts as already
    /// facing +Z and is not rotated.
    pub axis_epsilon: f32,
    /// Smallest area vector, relative to the squared contour extent, that is
    /// still treated as a polygon rather than a line or a point.
    pub degenerate_epsilon: f32,
    pub winding: WindingPolicy,
}

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            axis_epsilon: 1e-6,
            degenerate_epsilon: 1e-6,
            winding: WindingPolicy::default(),
        }
    }
}

/// Converts closed 3D contours into triangle meshes by ear clipping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Triangulator {
    config: TriangulationConfig,
}

impl Triangulator {
    pub fn new(config: TriangulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TriangulationConfig {
        &self.config
    }

    /// Triangulates `contour` into `mesh` and returns the estimated contour
    /// normal.
    ///
    /// On success the mesh is cleared and refilled with every contour point,
    /// in order, plus `contour.len() - 2` triangles indexing them. On error
    /// the mesh is left untouched.
    pub fn triangulate(
        &self,
        contour: &[Vec3],
        mesh: &mut TriangleMesh,
    ) -> Result<Vec3, TriangulationError> {
        let count = contour.len();
        if count < 3 {
            return Err(TriangulationError::InvalidInput { count });
        }

        if count == 3 {
            mesh.clear();
            for point in contour {
                mesh.add_vertex(*point);
            }
            mesh.add_triangle(0, 1, 2);
            let [a, b, c] = [contour[0], contour[1], contour[2]];
            return Ok((b - a).cross(c - a).normalize_or_zero());
        }

        let planar = map_to_planar(contour, &self.config)?;
        mesh.clear();
        for point in contour {
            mesh.add_vertex(*point);
        }

        let mut clipper = EarClipper::new(planar.points);
        while let Some(set) = clipper.clip_ear() {
            let [a, b, c] = self.wind_ear(set, contour, planar.normal);
            mesh.add_triangle(a, b, c);
        }

        let [a, b, c] = match clipper.original_indices() {
            &[a, b, c] => [a, b, c],
            remaining => unreachable!("clipper finished with {} vertices", remaining.len()),
        };
        let [a, b, c] = match self.config.winding {
            WindingPolicy::IndexOrder => [a, b, c],
            WindingPolicy::Normal => wind_along(contour, planar.normal, [a, b, c]),
        };
        mesh.add_triangle(a, b, c);

        debug!(
            "triangulated {count} point contour into {} triangles",
            mesh.triangle_count()
        );
        Ok(planar.normal)
    }

    fn wind_ear(&self, set: VertexSet, contour: &[Vec3], normal: Vec3) -> [usize; 3] {
        let VertexSet { ear, left, right } = set;
        match self.config.winding {
            WindingPolicy::IndexOrder if left > right => [left, ear, right],
            WindingPolicy::IndexOrder => [right, ear, left],
            WindingPolicy::Normal => wind_along(contour, normal, [left, ear, right]),
        }
    }
}

/// Returns `indices` reversed when the triangle they form faces away from
/// `normal`.
fn wind_along(contour: &[Vec3], normal: Vec3, indices: [usize; 3]) -> [usize; 3] {
    let [a, b, c] = indices.map(|index| contour[index]);
    if (b - a).cross(c - a).dot(normal) < 0.0 {
        [indices[2], indices[1], indices[0]]
    } else {
        indices
    }
}

/// Triangulates with the default configuration.
pub fn triangulate(contour: &[Vec3], mesh: &mut TriangleMesh) -> Result<Vec3, TriangulationError> {
    Triangulator::default().triangulate(contour, mesh)
}

/// Boolean form of [`triangulate`]: `false` means the contour was rejected
/// and `mesh` was not modified.
pub fn process(contour: &[Vec3], mesh: &mut TriangleMesh) -> bool {
    match triangulate(contour, mesh) {
        Ok(_) => true,
        Err(err) => {
            debug!("triangulation rejected: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Triangle;

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    fn index_order() -> Triangulator {
        Triangulator::new(TriangulationConfig {
            winding: WindingPolicy::IndexOrder,
            ..TriangulationConfig::default()
        })
    }

    #[test]
    fn rejects_short_contours_without_touching_mesh() {
        let mut mesh = TriangleMesh::new();
        mesh.add_vertex(Vec3::ONE);
        for count in 0..3 {
            let contour = vec![Vec3::X; count];
            assert!(!process(&contour, &mut mesh));
            assert_eq!(
                triangulate(&contour, &mut mesh),
                Err(TriangulationError::InvalidInput { count })
            );
        }
        assert_eq!(mesh.vertices(), &[Vec3::ONE]);
    }

    #[test]
    fn triangle_passes_through() {
        let contour = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let mut mesh = TriangleMesh::new();
        mesh.add_vertex(Vec3::splat(9.0));
        assert!(process(&contour, &mut mesh));
        assert_eq!(mesh.vertices(), &contour);
        assert_eq!(mesh.triangles(), &[Triangle::new(0, 1, 2)]);
    }

    #[test]
    fn square_with_index_order_winding() {
        let mut mesh = TriangleMesh::new();
        let normal = index_order().triangulate(&square(), &mut mesh).unwrap();
        assert_eq!(normal, Vec3::Z);
        assert_eq!(mesh.vertices(), square().as_slice());
        assert_eq!(
            mesh.triangles(),
            &[Triangle::new(2, 3, 0), Triangle::new(0, 1, 2)]
        );
    }

    #[test]
    fn normal_winding_faces_contour_normal() {
        let contour = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        let mut mesh = TriangleMesh::new();
        triangulate(&contour, &mut mesh).unwrap();
        assert_eq!(mesh.triangle_count(), 4);
        for normal in mesh.face_normals() {
            assert!(normal.z > 0.99, "{normal:?}");
        }
        assert!((mesh.area() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_contour_leaves_mesh_untouched() {
        let contour = vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Vec3::X * 3.0];
        let mut mesh = TriangleMesh::new();
        mesh.add_vertex(Vec3::ONE);
        assert_eq!(
            triangulate(&contour, &mut mesh),
            Err(TriangulationError::DegenerateGeometry)
        );
        assert!(!process(&contour, &mut mesh));
        assert_eq!(mesh.vertex_count(), 1);
    }

    #[test]
    fn previous_contents_are_replaced() {
        let mut mesh = TriangleMesh::new();
        triangulate(&square(), &mut mesh).unwrap();
        triangulate(&square(), &mut mesh).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn default_config_prefers_normal_winding() {
        let config = TriangulationConfig::default();
        assert_eq!(config.winding, WindingPolicy::Normal);
        assert_eq!(Triangulator::new(config).config(), &config);
    }
}
