//! Everything related to triangulation.
//!
//! Faces are loops of indices into a shared vertex array. Each face is
//! normalized, checked and handed to the ear clipper in [`earclipping`];
//! triangles that repeat an index are dropped from batch output.

pub mod earclipping;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TriangulationConfig;
use crate::math::Vec3;

pub use earclipping::{
    closing_edge_vertex, ear_blocker, face_normal, find_convex_vertex, is_only_noncollinear_vertex,
    triangulate_face, Ear, EarBlocker, HalfPlane,
};

pub type Tri = [usize; 3];
pub type Triangulation = Vec<Tri>;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors related to face triangulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The face has fewer than 3 vertices once its closing index is stripped.
    #[error("face has {len} vertices after normalization, need at least 3")]
    InvalidFace { len: usize },

    #[error("vertex index {index} is out of bounds ({vertex_count} vertices)")]
    IndexOutOfBounds { index: usize, vertex_count: usize },

    /// All cross products of the loop cancel out, so the face has no normal.
    #[error("face normal is undefined: vertices are collinear or coincident")]
    DegenerateNormal,

    /// No corner of the loop turns the same way as its normal, which only
    /// happens for self-intersecting or zero-area input.
    #[error("no convex vertex in a loop of {len} vertices")]
    NoConvexVertex { len: usize },

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },

    /// Wraps the failure of one face in a batch.
    #[error("face {face}: {source}")]
    Face {
        face: usize,
        #[source]
        source: Box<Error>,
    },
}

/// Strips closing indices equal to the first one, so `[0, 1, 2, 3, 0]`
/// becomes `[0, 1, 2, 3]`. Applying it twice yields the same loop.
pub fn normalize_face(face: &[usize]) -> &[usize] {
    let mut face = face;
    while let [first, .., last] = face {
        if first != last {
            break;
        }
        face = &face[..face.len() - 1];
    }
    face
}

/// Rejects loops that are too short or that point outside the vertex array.
pub(crate) fn check_face(face: &[usize], vertex_count: usize) -> Result<()> {
    if face.len() < 3 {
        return Err(Error::InvalidFace { len: face.len() });
    }
    match face.iter().find(|&&index| index >= vertex_count) {
        Some(&index) => Err(Error::IndexOutOfBounds {
            index,
            vertex_count,
        }),
        None => Ok(()),
    }
}

/// Whether the triangle repeats a vertex index.
#[inline(always)]
pub fn is_degenerate(&[a, b, c]: &Tri) -> bool {
    a == b || b == c || a == c
}

/// Area of the triangle spanned by three entries of `vertices`.
pub fn triangle_area(vertices: &[Vec3], &[a, b, c]: &Tri) -> f64 {
    let (a, b, c) = (vertices[a], vertices[b], vertices[c]);
    0.5 * (b - a).cross(&(c - a)).magnitude()
}

/// Area of a planar polygon given as a loop of indices into `vertices`.
pub fn polygon_area(vertices: &[Vec3], face: &[usize]) -> f64 {
    let mut area = Vec3::ZERO;
    for (i, &index) in face.iter().enumerate() {
        let next = face[(i + 1) % face.len()];
        area += vertices[index].cross(&vertices[next]);
    }
    0.5 * area.magnitude()
}

/// Triangulates every face of a polyhedron and concatenates the results in
/// face order, dropping triangles that repeat a vertex index.
///
/// A face that fails is reported as [`Error::Face`] carrying its position,
/// unless [`TriangulationConfig::skip_invalid_faces`] is set, in which case
/// it is logged and left out. When faces are triangulated in parallel and
/// more than one fails, any one of the failures may be reported.
///
/// [`Error::Face`]: enum.Error.html#variant.Face
/// [`TriangulationConfig::skip_invalid_faces`]: ../config/struct.TriangulationConfig.html#structfield.skip_invalid_faces
pub fn triangulate_faces<F>(
    vertices: &[Vec3],
    faces: &[F],
    config: &TriangulationConfig,
) -> Result<Triangulation>
where
    F: AsRef<[usize]> + Sync,
{
    config.validate()?;

    let per_face = if config.parallel {
        faces
            .par_iter()
            .enumerate()
            .map(|(i, face)| batch_face(vertices, i, face.as_ref(), config))
            .collect::<Result<Vec<_>>>()?
    } else {
        faces
            .iter()
            .enumerate()
            .map(|(i, face)| batch_face(vertices, i, face.as_ref(), config))
            .collect::<Result<Vec<_>>>()?
    };

    let mut triangles = Vec::with_capacity(per_face.iter().flatten().map(Vec::len).sum());
    let mut dropped = 0;
    for tri in per_face.into_iter().flatten().flatten() {
        if is_degenerate(&tri) {
            dropped += 1;
        } else {
            triangles.push(tri);
        }
    }

    debug!(
        faces = faces.len(),
        triangles = triangles.len(),
        dropped,
        "triangulated faces"
    );
    Ok(triangles)
}

/// `Ok(None)` marks a face that failed and was skipped.
fn batch_face(
    vertices: &[Vec3],
    index: usize,
    face: &[usize],
    config: &TriangulationConfig,
) -> Result<Option<Triangulation>> {
    match earclipping::triangulate_checked(vertices, face, config) {
        Ok(triangles) => Ok(Some(triangles)),
        Err(err) if config.skip_invalid_faces => {
            warn!(face = index, error = %err, "skipping face");
            Ok(None)
        }
        Err(err) => Err(Error::Face {
            face: index,
            source: Box::new(err),
        }),
    }
}

/// Iterator triangulating the faces of a polyhedron one at a time.
///
/// Unlike [`triangulate_faces`], every face yields its own result, so a
/// caller can tell which faces failed and why. Triangles are returned as
/// produced by the ear clipper, without degenerate filtering.
///
/// [`triangulate_faces`]: fn.triangulate_faces.html
#[derive(Debug)]
pub struct FaceTriangulations<'a, F> {
    vertices: &'a [Vec3],
    faces: std::slice::Iter<'a, F>,
    config: &'a TriangulationConfig,
}

impl<'a, F: AsRef<[usize]>> FaceTriangulations<'a, F> {
    pub fn new(vertices: &'a [Vec3], faces: &'a [F], config: &'a TriangulationConfig) -> Self {
        Self {
            vertices,
            faces: faces.iter(),
            config,
        }
    }
}

impl<'a, F: AsRef<[usize]>> Iterator for FaceTriangulations<'a, F> {
    type Item = Result<Triangulation>;

    fn next(&mut self) -> Option<Self::Item> {
        let face = self.faces.next()?;
        Some(triangulate_face(self.vertices, face.as_ref(), self.config))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.faces.size_hint()
    }
}

impl<'a, F: AsRef<[usize]>> ExactSizeIterator for FaceTriangulations<'a, F> {}
