//! Polygon triangulation for the Crystal Space geometry toolkit, rewritten
//! in Rust.
//!
//! The core converts a closed, possibly slightly non-planar 3D contour into
//! a triangle mesh that keeps the contour's vertex numbering: the contour is
//! fitted to a plane, rotated into a canonical frame and ear clipped. Small
//! loaders for world-file polygons and OBJ faces sit on top so the crate can
//! be used from headless tools.

pub mod contour_xml;
pub mod ear_clipper;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod obj;
pub mod planar;
pub mod triangulate;

pub use contour_xml::{load_contours_from_str, NamedContour};
pub use ear_clipper::{EarClipper, VertexSet};
pub use error::TriangulationError;
pub use geometry::{Contour, Plane3};
pub use mesh::{Triangle, TriangleMesh};
pub use obj::{load_obj_from_str, load_obj_with, ObjMesh};
pub use planar::{map_to_planar, PlanarContour};
pub use triangulate::{process, triangulate, TriangulationConfig, Triangulator, WindingPolicy};
