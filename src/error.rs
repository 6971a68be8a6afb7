use thiserror::Error;

/// Failures reported by the triangulation core.
///
/// Loader and CLI layers wrap these in `anyhow` with added context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TriangulationError {
    /// The contour has fewer than three points.
    #[error("contour needs at least 3 points, got {count}")]
    InvalidInput { count: usize },

    /// No usable polygon normal could be derived from the contour.
    #[error("contour is degenerate (colinear, coincident or non-finite points)")]
    DegenerateGeometry,
}
