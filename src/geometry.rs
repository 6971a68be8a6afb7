use std::ops::{Deref, DerefMut};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Ordered, implicitly closed sequence of 3D points describing a polygon
/// boundary. Points are expected in counter-clockwise order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contour {
    points: Vec<Vec3>,
}

impl Contour {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: Vec3) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Vec3> {
        self.points
    }

    pub fn centroid(&self) -> Vec3 {
        centroid(&self.points)
    }
}

impl Deref for Contour {
    type Target = [Vec3];

    fn deref(&self) -> &[Vec3] {
        &self.points
    }
}

impl DerefMut for Contour {
    fn deref_mut(&mut self) -> &mut [Vec3] {
        &mut self.points
    }
}

impl From<Vec<Vec3>> for Contour {
    fn from(points: Vec<Vec3>) -> Self {
        Self { points }
    }
}

impl FromIterator<Vec3> for Contour {
    fn from_iter<I: IntoIterator<Item = Vec3>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Arithmetic mean of `points`, or the origin when there are none.
pub fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::ZERO;
    }
    points.iter().copied().sum::<Vec3>() / points.len() as f32
}

/// Index of the point preceding `index` in a closed loop of `len` points.
pub(crate) fn prior_index(index: usize, len: usize) -> usize {
    if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

/// Index of the point following `index` in a closed loop of `len` points.
pub(crate) fn next_index(index: usize, len: usize) -> usize {
    (index + 1) % len
}

/// Plane in `normal . p + d = 0` form. The normal is not required to be
/// unit length; [`Plane3::classify`] then returns a scaled distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane3 {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane3 {
    pub fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Plane through three points. Counter-clockwise points (seen from the
    /// side the normal points to) give a normal of `(b - a) x (c - a)`.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a);
        Self {
            normal,
            d: -normal.dot(a),
        }
    }

    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Signed, normal-scaled distance of `point` to the plane. Positive on
    /// the side the normal points to.
    pub fn classify(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Euclidean signed distance; zero for a plane without a normal.
    pub fn distance(&self, point: Vec3) -> f32 {
        let length = self.normal.length();
        if length <= f32::EPSILON {
            0.0
        } else {
            self.classify(point) / length
        }
    }

    /// Orthogonal projection of `point` onto the plane.
    pub fn project(&self, point: Vec3) -> Vec3 {
        let length_squared = self.normal.length_squared();
        if length_squared <= f32::EPSILON * f32::EPSILON {
            return point;
        }
        point - self.normal * (self.classify(point) / length_squared)
    }

    pub fn normalized(&self) -> Self {
        let length = self.normal.length();
        if length <= f32::EPSILON {
            *self
        } else {
            Self {
                normal: self.normal / length,
                d: self.d / length,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_around_neighbours() {
        assert_eq!(prior_index(0, 4), 3);
        assert_eq!(prior_index(2, 4), 1);
        assert_eq!(next_index(3, 4), 0);
        assert_eq!(next_index(1, 4), 2);
    }

    #[test]
    fn plane_from_ccw_points_faces_up() {
        let plane = Plane3::from_points(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!(plane.classify(Vec3::Z) > 0.0);
        assert!(plane.classify(-Vec3::Z) < 0.0);
        assert_eq!(plane.classify(Vec3::new(3.0, -2.0, 0.0)), 0.0);
    }

    #[test]
    fn projection_lands_on_plane() {
        let plane =
            Plane3::from_normal_and_point(Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, 0.0, 2.0));
        let projected = plane.project(Vec3::new(1.0, 5.0, 3.0));
        assert!(plane.distance(projected).abs() < 1e-5);
        assert!((projected - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn normalized_plane_measures_true_distance() {
        let plane = Plane3::new(Vec3::new(0.0, 0.0, 4.0), -8.0).normalized();
        assert!((plane.classify(Vec3::new(0.0, 0.0, 5.0)) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn contour_collects_and_derefs() {
        let contour: Contour = [Vec3::ZERO, Vec3::X, Vec3::Y].into_iter().collect();
        assert_eq!(contour.len(), 3);
        assert_eq!(contour[1], Vec3::X);
        let centroid = contour.centroid();
        assert!((centroid - Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0)).length() < 1e-6);
    }
}
