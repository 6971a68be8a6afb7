//! Ear clipping over a contour that has already been flattened into the
//! canonical frame (polygon normal along +Z, counter-clockwise).

use glam::Vec3;
use log::{debug, warn};

use crate::geometry::{next_index, prior_index, Plane3};

/// Indices into the original contour describing one clipped ear: the ear
/// vertex and its neighbours at the time it was clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexSet {
    pub ear: usize,
    pub left: usize,
    pub right: usize,
}

impl VertexSet {
    /// Indices in `[ear, left, right]` order.
    pub fn to_array(self) -> [usize; 3] {
        [self.ear, self.left, self.right]
    }
}

impl From<VertexSet> for [usize; 3] {
    fn from(set: VertexSet) -> Self {
        set.to_array()
    }
}

/// Working state for one triangulation.
///
/// `polygon`, `original_indices` and `is_reflex` stay index-aligned and
/// shrink together; classification and the candidate list are rebuilt
/// from scratch after every clip.
#[derive(Debug, Clone)]
pub struct EarClipper {
    polygon: Vec<Vec3>,
    original_indices: Vec<usize>,
    is_reflex: Vec<bool>,
    ear_candidates: Vec<usize>,
}

impl EarClipper {
    /// Builds a clipper over planar points; point `i` maps back to original
    /// index `i`.
    pub fn new(polygon: Vec<Vec3>) -> Self {
        let original_indices = (0..polygon.len()).collect();
        Self::with_original_indices(polygon, original_indices)
    }

    /// Builds a clipper whose points carry explicit original indices.
    ///
    /// # Panics
    ///
    /// Panics if `polygon` and `original_indices` differ in length.
    pub fn with_original_indices(polygon: Vec<Vec3>, original_indices: Vec<usize>) -> Self {
        assert_eq!(
            polygon.len(),
            original_indices.len(),
            "every point needs an original index"
        );
        let mut clipper = Self {
            polygon,
            original_indices,
            is_reflex: Vec::new(),
            ear_candidates: Vec::new(),
        };
        clipper.classify_vertices();
        clipper
    }

    /// Number of vertices still in the working polygon.
    pub fn vertex_count(&self) -> usize {
        self.polygon.len()
    }

    /// Clipping is done once a single triangle (or less) remains.
    pub fn is_finished(&self) -> bool {
        self.polygon.len() <= 3
    }

    pub fn points(&self) -> &[Vec3] {
        &self.polygon
    }

    /// Original contour indices of the remaining vertices, in polygon order.
    pub fn original_indices(&self) -> &[usize] {
        &self.original_indices
    }

    pub fn original_index(&self, index: usize) -> Option<usize> {
        self.original_indices.get(index).copied()
    }

    pub fn is_reflex(&self, index: usize) -> Option<bool> {
        self.is_reflex.get(index).copied()
    }

    /// Working-polygon indices of the current ears, in push order. The last
    /// entry is clipped next.
    pub fn ear_candidates(&self) -> &[usize] {
        &self.ear_candidates
    }

    /// Removes the most recently found ear and returns its original indices,
    /// or `None` once the clipper is finished.
    pub fn clip_ear(&mut self) -> Option<VertexSet> {
        if self.is_finished() {
            return None;
        }
        let len = self.polygon.len();
        let ear = match self.ear_candidates.pop() {
            Some(ear) => ear,
            None => self.fallback_ear(),
        };

        let set = VertexSet {
            ear: self.original_indices[ear],
            left: self.original_indices[prior_index(ear, len)],
            right: self.original_indices[next_index(ear, len)],
        };
        debug!(
            "clipping ear {} between {} and {} ({} vertices left)",
            set.ear,
            set.left,
            set.right,
            len - 1
        );

        self.polygon.remove(ear);
        self.original_indices.remove(ear);
        self.classify_vertices();
        Some(set)
    }

    /// Picks a vertex to clip when no strict ear exists, which only happens
    /// for degenerate or self-intersecting input.
    fn fallback_ear(&self) -> usize {
        let len = self.polygon.len();
        let ear = self
            .is_reflex
            .iter()
            .rposition(|reflex| !reflex)
            .unwrap_or(len - 1);
        warn!(
            "no valid ear among {len} vertices, clipping vertex {}",
            self.original_indices[ear]
        );
        ear
    }

    /// Reclassifies every vertex and rebuilds the candidate list.
    fn classify_vertices(&mut self) {
        let len = self.polygon.len();
        self.ear_candidates.clear();
        if len < 3 {
            self.is_reflex = vec![false; len];
            return;
        }

        self.is_reflex = (0..len).map(|i| !self.is_convex(i)).collect();
        for i in 0..len {
            if !self.is_reflex[i] && self.is_ear(i) {
                self.ear_candidates.push(i);
            }
        }
    }

    /// A vertex is convex when the plane through it and its neighbours,
    /// taken in polygon order, has the frame normal (+Z) on its positive
    /// side.
    fn is_convex(&self, index: usize) -> bool {
        let len = self.polygon.len();
        let prior = self.polygon[prior_index(index, len)];
        let next = self.polygon[next_index(index, len)];
        let current = self.polygon[index];
        let plane = Plane3::from_points(prior, current, next);
        plane.classify(current + Vec3::Z) > 0.0
    }

    /// A convex vertex is an ear when no reflex vertex lies inside or on the
    /// triangle it forms with its neighbours.
    fn is_ear(&self, index: usize) -> bool {
        let len = self.polygon.len();
        let prior = prior_index(index, len);
        let next = next_index(index, len);
        let (a, b, c) = (self.polygon[prior], self.polygon[index], self.polygon[next]);
        (0..len)
            .filter(|&j| j != prior && j != index && j != next && self.is_reflex[j])
            .all(|j| !point_in_triangle(self.polygon[j], a, b, c))
    }
}

fn edge_side(from: Vec3, to: Vec3, point: Vec3) -> f32 {
    (to.x - from.x) * (point.y - from.y) - (to.y - from.y) * (point.x - from.x)
}

/// Inclusive containment test in the XY plane.
fn point_in_triangle(point: Vec3, a: Vec3, b: Vec3, c: Vec3) -> bool {
    let d1 = edge_side(a, b, point);
    let d2 = edge_side(b, c, point);
    let d3 = edge_side(c, a, point);
    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_negative && has_positive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(coords: &[(f32, f32)]) -> Vec<Vec3> {
        coords.iter().map(|&(x, y)| Vec3::new(x, y, 0.0)).collect()
    }

    fn square() -> Vec<Vec3> {
        points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
    }

    // L-shape with a single reflex corner at index 3.
    fn l_shape() -> Vec<Vec3> {
        points(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ])
    }

    #[test]
    fn square_vertices_are_all_ears() {
        let clipper = EarClipper::new(square());
        assert_eq!(clipper.ear_candidates(), &[0, 1, 2, 3]);
        assert!((0..4).all(|i| clipper.is_reflex(i) == Some(false)));
        assert!(!clipper.is_finished());
    }

    #[test]
    fn clips_last_candidate_first() {
        let mut clipper = EarClipper::new(square());
        let set = clipper.clip_ear().unwrap();
        assert_eq!(
            set,
            VertexSet {
                ear: 3,
                left: 2,
                right: 0
            }
        );
        assert!(clipper.is_finished());
        assert_eq!(clipper.original_indices(), &[0, 1, 2]);
        assert_eq!(clipper.clip_ear(), None);
    }

    #[test]
    fn reflex_corner_is_detected() {
        let clipper = EarClipper::new(l_shape());
        assert_eq!(clipper.is_reflex(3), Some(true));
        assert_eq!(
            (0..6).filter(|&i| clipper.is_reflex(i) == Some(true)).count(),
            1
        );
        assert!(!clipper.ear_candidates().contains(&3));
    }

    #[test]
    fn ear_containing_reflex_vertex_is_rejected() {
        let clipper = EarClipper::new(l_shape());
        // Vertex 1's triangle (0, 1, 2) is clear of the reflex corner; the
        // diagonal of vertex 0's triangle (5, 0, 1) runs through it.
        assert!(clipper.ear_candidates().contains(&1));
        assert!(!clipper.ear_candidates().contains(&0));
    }

    #[test]
    fn arrays_stay_aligned_while_clipping() {
        let mut clipper = EarClipper::new(l_shape());
        let mut clipped = Vec::new();
        while let Some(set) = clipper.clip_ear() {
            assert_eq!(clipper.points().len(), clipper.original_indices().len());
            assert!((0..clipper.vertex_count()).all(|i| clipper.is_reflex(i).is_some()));
            clipped.push(set.ear);
        }
        assert_eq!(clipped.len(), 3);
        assert_eq!(clipper.vertex_count(), 3);
        let mut seen: Vec<usize> = clipped
            .into_iter()
            .chain(clipper.original_indices().iter().copied())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn colinear_vertex_is_not_convex() {
        let clipper = EarClipper::new(points(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (0.0, 2.0),
        ]));
        assert_eq!(clipper.is_reflex(1), Some(true));
    }

    #[test]
    fn explicit_original_indices_are_reported() {
        let mut clipper = EarClipper::with_original_indices(square(), vec![10, 11, 12, 13]);
        let set = clipper.clip_ear().unwrap();
        assert_eq!(set.to_array(), [13, 12, 10]);
        assert_eq!(clipper.original_index(2), Some(12));
    }

    #[test]
    fn clockwise_input_still_makes_progress() {
        let mut polygon = square();
        polygon.reverse();
        let mut clipper = EarClipper::new(polygon);
        assert!(clipper.ear_candidates().is_empty());
        assert!(clipper.clip_ear().is_some());
        assert!(clipper.is_finished());
    }

    #[test]
    fn point_in_triangle_includes_edges() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X * 2.0, Vec3::Y * 2.0);
        assert!(point_in_triangle(Vec3::new(0.5, 0.5, 0.0), a, b, c));
        assert!(point_in_triangle(Vec3::new(1.0, 1.0, 0.0), a, b, c));
        assert!(!point_in_triangle(Vec3::new(1.5, 1.5, 0.0), a, b, c));
    }
}
