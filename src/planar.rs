//! Plane fitting for possibly non-planar contours and the mapping into a
//! canonical frame where the polygon normal is +Z.

use glam::{Mat3, Vec3};
use log::debug;

use crate::error::TriangulationError;
use crate::geometry::{centroid, next_index, prior_index, Plane3};
use crate::triangulate::TriangulationConfig;

/// Minimum length of the summed per-vertex unit normals for that sum to be
/// trusted over the area vector. Each convex/reflex pair cancels out.
const LOCAL_AGREEMENT: f32 = 0.5;

/// Contour flattened into the canonical frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarContour {
    /// Points in the canonical frame, index-aligned with the input contour.
    pub points: Vec<Vec3>,
    /// Unit normal estimated for the input contour, in input space.
    pub normal: Vec3,
    /// Whether the canonical rotation was applied.
    pub rotated: bool,
}

/// Estimates a unit normal for a closed contour.
///
/// Every vertex contributes the unit cross product of its incoming and
/// outgoing edge, which averages out mild non-planarity. The sum is then
/// oriented to agree with the contour's area vector; when the local
/// estimates cancel (as many reflex as convex corners) the area vector is
/// used directly.
pub fn estimate_normal(
    contour: &[Vec3],
    degenerate_epsilon: f32,
) -> Result<Vec3, TriangulationError> {
    let len = contour.len();
    if len < 3 {
        return Err(TriangulationError::InvalidInput { count: len });
    }
    if contour.iter().any(|point| !point.is_finite()) {
        return Err(TriangulationError::DegenerateGeometry);
    }

    let origin = contour[0];
    let mut local = Vec3::ZERO;
    let mut area = Vec3::ZERO;
    let mut extent = 0.0f32;
    for i in 0..len {
        let prior = contour[prior_index(i, len)];
        let next = contour[next_index(i, len)];
        let current = contour[i];
        local += (current - prior).cross(next - current).normalize_or_zero();
        area += (current - origin).cross(next - origin);
        extent = extent.max((current - origin).length_squared());
    }

    let area_length = area.length();
    if extent <= f32::EPSILON * f32::EPSILON || area_length <= degenerate_epsilon * extent {
        debug!("degenerate contour: area {area_length}, extent {extent}");
        return Err(TriangulationError::DegenerateGeometry);
    }

    let normal = if local.length() >= LOCAL_AGREEMENT {
        let local = local.normalize();
        if local.dot(area) < 0.0 {
            -local
        } else {
            local
        }
    } else {
        area / area_length
    };
    debug!("estimated contour normal {normal:?}");
    Ok(normal)
}

/// Rotation (about X, then about Y) that carries `normal` onto +Z.
pub fn canonical_rotation(normal: Vec3) -> Mat3 {
    let about_x = Mat3::from_rotation_x(normal.y.atan2(normal.z));
    let tilted = about_x * normal;
    let about_y = Mat3::from_rotation_y((-tilted.x).atan2(tilted.z));
    about_y * about_x
}

/// Projects the contour onto its best-fit plane and rotates it so the plane
/// normal is +Z. Contours already facing +Z are only projected.
pub fn map_to_planar(
    contour: &[Vec3],
    config: &TriangulationConfig,
) -> Result<PlanarContour, TriangulationError> {
    let normal = estimate_normal(contour, config.degenerate_epsilon)?;
    let plane = Plane3::from_normal_and_point(normal, centroid(contour));
    let projected = contour.iter().map(|point| plane.project(*point));

    let aligned = normal.x.abs() <= config.axis_epsilon
        && normal.y.abs() <= config.axis_epsilon
        && normal.z > 0.0;
    if aligned {
        return Ok(PlanarContour {
            points: projected.collect(),
            normal,
            rotated: false,
        });
    }

    let rotation = canonical_rotation(normal);
    let points = projected
        .map(|point| {
            let mut rotated = rotation * point;
            rotated.z = 0.0;
            rotated
        })
        .collect();
    Ok(PlanarContour {
        points,
        normal,
        rotated: true,
    })
}
