//! Triangulation of the polygonal faces of polyhedra.
//!
//! A [`Polyhedron`] is a vertex array plus faces given as loops of vertex
//! indices. Faces may be convex or not, may repeat their first index at the
//! end, and may be slightly non-planar. [`triangulate_faces`] cuts all of
//! them into triangles for exporters that only accept triangular facets.
//!
//! ```
//! use facetri::{triangulate_faces, TriangulationConfig, Vec3};
//!
//! let vertices: Vec<Vec3> = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
//!     .into_iter()
//!     .map(Vec3::from)
//!     .collect();
//! let faces = vec![vec![0, 1, 2, 3, 0]];
//!
//! let triangles = triangulate_faces(&vertices, &faces, &TriangulationConfig::default()).unwrap();
//! assert_eq!(triangles, vec![[0, 1, 2], [2, 3, 0]]);
//! ```
//!
//! [`Polyhedron`]: polyhedron/struct.Polyhedron.html
//! [`triangulate_faces`]: triangulate/fn.triangulate_faces.html

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod math;
pub mod polyhedron;
pub mod triangulate;

pub use config::TriangulationConfig;
pub use math::Vec3;
pub use polyhedron::{Face, Polyhedron, TriangleMesh};
pub use triangulate::{
    normalize_face, triangulate_face, triangulate_faces, Error, Result, Tri, Triangulation,
};
