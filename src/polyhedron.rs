//! Polyhedra handed over by a solid modeler, and the triangle meshes handed
//! on to a mesh writer.

use serde::{Deserialize, Serialize};

use crate::config::TriangulationConfig;
use crate::math::Vec3;
use crate::triangulate::{self, FaceTriangulations, Result, Tri};

/// A loop of indices into [`Polyhedron::vertices`], wound so that its
/// normal points out of the solid. The first index may be repeated at the
/// end.
///
/// [`Polyhedron::vertices`]: struct.Polyhedron.html#structfield.vertices
pub type Face = Vec<usize>;

/// A solid described by a shared vertex array and polygonal faces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyhedron {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
}

impl Polyhedron {
    pub fn new(vertices: Vec<Vec3>, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }

    /// Triangulates all faces, see [`triangulate_faces`].
    ///
    /// [`triangulate_faces`]: ../triangulate/fn.triangulate_faces.html
    pub fn triangulate(&self, config: &TriangulationConfig) -> Result<TriangleMesh> {
        let triangles = triangulate::triangulate_faces(&self.vertices, &self.faces, config)?;
        Ok(TriangleMesh {
            vertices: self.vertices.clone(),
            triangles,
        })
    }

    /// Triangulates the faces one by one, yielding a result per face.
    pub fn face_triangulations<'a>(
        &'a self,
        config: &'a TriangulationConfig,
    ) -> FaceTriangulations<'a, Face> {
        FaceTriangulations::new(&self.vertices, &self.faces, config)
    }
}

/// A mesh made of triangles only, as accepted by STL style writers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<Tri>,
}

impl TriangleMesh {
    pub fn surface_area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|tri| triangulate::triangle_area(&self.vertices, tri))
            .sum()
    }

    /// Corner positions of every triangle, in triangle order.
    pub fn facets(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangles
            .iter()
            .map(|&[a, b, c]| [self.vertices[a], self.vertices[b], self.vertices[c]])
    }
}
