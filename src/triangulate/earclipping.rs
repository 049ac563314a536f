//! Everything related to triangulation using ear clipping.
//!
//! The clipper works on a loop of vertex indices. At every step it takes the
//! first convex corner of the loop as the candidate ear and either clips it,
//! or splits the loop in two along a diagonal when another vertex lies in
//! the ear or on its closing edge. Sub-loops are fresh rotated copies of the index loop, so the
//! caller's face is never touched.

use tracing::{debug, trace};

use super::{check_face, normalize_face, Error, Result, Triangulation};
use crate::config::TriangulationConfig;
use crate::math::Vec3;

/// Copies the loop positions `from..=to` of `face`, wrapping past the end.
fn select(face: &[usize], from: usize, to: usize) -> Vec<usize> {
    if from <= to {
        face[from..=to].to_vec()
    } else {
        face[from..].iter().chain(&face[..=to]).copied().collect()
    }
}

/// Sum of the cross products of consecutive edge pairs, each measured from
/// the first vertex of the loop.
fn summed_cross_products<'a>(
    vertices: &'a [Vec3],
    face: &'a [usize],
) -> impl Iterator<Item = Vec3> + 'a {
    let count = face.len();
    let anchor = vertices[face[0]];
    (0..count).map(move |i| {
        let p1 = vertices[face[(i + 1) % count]];
        let p2 = vertices[face[(i + 2) % count]];
        (p1 - anchor).cross(&(p2 - p1))
    })
}

/// Calculates the unit normal of the given face by summing the cross
/// products around the loop (Newell's method), which averages out mild
/// non-planarity.
///
/// # Panics
///
/// Panics if an index of `face` is out of bounds for `vertices`.
pub fn face_normal(vertices: &[Vec3], face: &[usize]) -> Result<Vec3> {
    if face.len() < 3 {
        return Err(Error::InvalidFace { len: face.len() });
    }
    let mut normal = Vec3::ZERO;
    for cross in summed_cross_products(vertices, face) {
        normal += cross;
    }
    normal.normalized().ok_or(Error::DegenerateNormal)
}

/// Finds the first convex corner of the loop, scanning corner triples from
/// position `start`, and returns the loop position of its tip.
///
/// The corner at `i + 1` is convex when the turn from edge `i -> i+1` to
/// edge `i+1 -> i+2` agrees with `normal`.
///
/// # Panics
///
/// Panics if an index of `face` is out of bounds for `vertices`.
pub fn find_convex_vertex(
    vertices: &[Vec3],
    face: &[usize],
    normal: Vec3,
    start: usize,
) -> Result<usize> {
    let count = face.len();
    for i in start..count {
        let p0 = vertices[face[i]];
        let p1 = vertices[face[(i + 1) % count]];
        let p2 = vertices[face[(i + 2) % count]];
        if (p1 - p0).cross(&(p2 - p1)).dot(&normal) > 0.0 {
            return Ok((i + 1) % count);
        }
    }
    Err(Error::NoConvexVertex { len: count })
}

/// The half-space to the left of a directed edge, seen from the face normal.
/// Points on the interior side of the edge have a positive [`value`].
///
/// [`value`]: #method.value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfPlane {
    pub normal: Vec3,
    pub offset: f64,
}

impl HalfPlane {
    pub fn left_of(from: Vec3, to: Vec3, face_normal: Vec3) -> Self {
        let normal = face_normal.cross(&(to - from));
        Self {
            normal,
            offset: normal.dot(&to),
        }
    }

    #[inline(always)]
    pub fn value(&self, point: Vec3) -> f64 {
        self.normal.dot(&point) - self.offset
    }
}

/// A candidate ear: three consecutive loop positions and the half-planes of
/// its edges.
///
/// `planes[0]` belongs to the closing edge `next -> prev`, which becomes the
/// new boundary edge when the ear is clipped; `planes[1]` and `planes[2]`
/// belong to `prev -> tip` and `tip -> next`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ear {
    pub prev: usize,
    pub tip: usize,
    pub next: usize,
    pub planes: [HalfPlane; 3],
}

impl Ear {
    pub fn new(vertices: &[Vec3], face: &[usize], tip: usize, normal: Vec3) -> Self {
        let count = face.len();
        let prev = (tip + count - 1) % count;
        let next = (tip + 1) % count;

        macro_rules! edge {
            ($from:expr => $to:expr) => {
                HalfPlane::left_of(vertices[face[$from]], vertices[face[$to]], normal)
            };
        }

        Self {
            prev,
            tip,
            next,
            planes: [edge!(next => prev), edge!(prev => tip), edge!(tip => next)],
        }
    }

    /// Returns the closing edge value of `point` if it lies inside the ear,
    /// widened by `tolerance` on every edge.
    fn contains(&self, point: Vec3, tolerance: f64) -> Option<f64> {
        let [closing, first, second] = self.planes.map(|plane| plane.value(point));
        (closing > -tolerance && first > -tolerance && second > -tolerance).then_some(closing)
    }

    /// Like [`contains`], but also accepts points lying on the closing edge.
    ///
    /// [`contains`]: #method.contains
    fn touches(&self, point: Vec3, tolerance: f64) -> Option<f64> {
        let [closing, first, second] = self.planes.map(|plane| plane.value(point));
        (closing >= -tolerance && first > -tolerance && second > -tolerance).then_some(closing)
    }
}

/// A vertex lying inside a candidate ear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarBlocker {
    /// Loop position of the vertex.
    pub position: usize,
    /// Its value on the ear's closing edge half-plane.
    pub value: f64,
}

/// Looks for loop vertices inside `ear` and returns the one farthest from
/// the ear's closing edge, i.e. with the greatest closing edge value. Ties
/// go to the later loop position. `None` means no vertex is strictly inside.
///
/// The ear's own three positions are never reported.
pub fn ear_blocker(
    vertices: &[Vec3],
    face: &[usize],
    ear: &Ear,
    tolerance: f64,
) -> Option<EarBlocker> {
    farthest_vertex(vertices, face, ear, |point| ear.contains(point, tolerance))
}

/// Looks for a loop vertex lying on the open closing edge of `ear`, between
/// its `next` and `prev` corners. Clipping such an ear would pinch the rest
/// of the loop at that vertex, so it has to be cut to instead. Ties go to
/// the later loop position.
pub fn closing_edge_vertex(
    vertices: &[Vec3],
    face: &[usize],
    ear: &Ear,
    tolerance: f64,
) -> Option<EarBlocker> {
    farthest_vertex(vertices, face, ear, |point| ear.touches(point, tolerance))
}

fn farthest_vertex(
    vertices: &[Vec3],
    face: &[usize],
    ear: &Ear,
    test: impl Fn(Vec3) -> Option<f64>,
) -> Option<EarBlocker> {
    let mut best: Option<EarBlocker> = None;
    for (position, &index) in face.iter().enumerate() {
        if position == ear.prev || position == ear.tip || position == ear.next {
            continue;
        }
        let Some(value) = test(vertices[index]) else {
            continue;
        };
        if best.map_or(true, |best| value >= best.value) {
            best = Some(EarBlocker { position, value });
        }
    }
    best
}

/// Whether every vertex of the loop except the one at `position` lies on a
/// single line, i.e. the face is a straight run with one vertex sticking out.
pub fn is_only_noncollinear_vertex(
    vertices: &[Vec3],
    face: &[usize],
    position: usize,
    tolerance: f64,
) -> bool {
    let count = face.len();
    let rest = select(face, (position + 1) % count, (position + count - 1) % count);
    let spread: f64 = summed_cross_products(vertices, &rest)
        .map(|cross| cross.magnitude())
        .sum();
    spread <= tolerance
}

/// Triangulates a single face.
///
/// The face is normalized first (see [`normalize_face`]), so a loop written
/// with its first index repeated at the end is accepted. Triangles are
/// returned in the order they are cut; a loop of three collinear vertices
/// comes back as one zero-area triangle.
///
/// [`normalize_face`]: ../fn.normalize_face.html
pub fn triangulate_face(
    vertices: &[Vec3],
    face: &[usize],
    config: &TriangulationConfig,
) -> Result<Triangulation> {
    config.validate()?;
    triangulate_checked(vertices, face, config)
}

/// [`triangulate_face`] for an already validated config.
pub(super) fn triangulate_checked(
    vertices: &[Vec3],
    face: &[usize],
    config: &TriangulationConfig,
) -> Result<Triangulation> {
    let face = normalize_face(face);
    check_face(face, vertices.len())?;

    let mut triangles = Vec::with_capacity(face.len() - 2);
    clip_or_split(vertices, face.to_vec(), config, &mut triangles)?;
    Ok(triangles)
}

/// How one step of the clipper shrinks the loop.
enum Cut {
    /// Split along the diagonal from the ear tip to this vertex.
    Diagonal(EarBlocker),
    /// Split from the ear tip to the far end of the line's first segment.
    Collinear,
    Clip,
}

/// Cuts `face` down to triangles, appending them to `triangles`.
///
/// An ear clip continues with the shrunk loop. A split continues with its
/// first half and parks the second one on `pending`; popping the most
/// recently parked loop first emits triangles depth first, the same order
/// as recursing into both halves.
fn clip_or_split(
    vertices: &[Vec3],
    face: Vec<usize>,
    config: &TriangulationConfig,
    triangles: &mut Triangulation,
) -> Result<()> {
    let mut pending = vec![face];
    while let Some(mut face) = pending.pop() {
        loop {
            let count = face.len();
            if count == 3 {
                triangles.push([face[0], face[1], face[2]]);
                break;
            }

            let normal = face_normal(vertices, &face)?;
            let tip = find_convex_vertex(vertices, &face, normal, 0)?;
            let ear = Ear::new(vertices, &face, tip, normal);

            let cut = match ear_blocker(vertices, &face, &ear, config.ear_tolerance) {
                Some(blocker) => Cut::Diagonal(blocker),
                None if is_only_noncollinear_vertex(
                    vertices,
                    &face,
                    tip,
                    config.collinear_tolerance,
                ) =>
                {
                    Cut::Collinear
                }
                None => closing_edge_vertex(vertices, &face, &ear, config.ear_tolerance)
                    .map_or(Cut::Clip, Cut::Diagonal),
            };

            match cut {
                Cut::Diagonal(blocker) => {
                    debug!(
                        from = face[tip],
                        to = face[blocker.position],
                        len = count,
                        "diagonal split"
                    );
                    pending.push(select(&face, blocker.position, tip));
                    face = select(&face, tip, blocker.position);
                }
                Cut::Collinear => {
                    let across = (tip + 2) % count;
                    debug!(vertex = face[tip], len = count, "collinear split");
                    pending.push(select(&face, across, tip));
                    face = select(&face, tip, across);
                }
                Cut::Clip => {
                    trace!(vertex = face[tip], len = count, "clipping ear");
                    triangles.push([face[ear.prev], face[ear.tip], face[ear.next]]);
                    face = select(&face, ear.next, ear.prev);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn points(coords: &[[f64; 3]]) -> Vec<Vec3> {
        coords.iter().copied().map(Vec3::from).collect()
    }

    fn xz_plane_angle_x(x_radians: f64) -> Vec<Vec3> {
        let (s, c) = x_radians.sin_cos();
        macro_rules! make_pos {
            ($x:literal $y:literal $z:literal) => {
                Vec3::new($x, $y * c - $z * s, $y * s + $z * c)
            };
        }
        vec![
            make_pos!( -1.0  0.0  1.0 ),
            make_pos!(  1.0  0.0  1.0 ),
            make_pos!( -1.0  0.0 -1.0 ),
            make_pos!(  1.0  0.0 -1.0 ),
        ]
    }

    #[test]
    fn test_plane_xz_angle_x() {
        for degrees in 0..360 {
            let radians = (degrees as f64).to_radians();
            let vertices = xz_plane_angle_x(radians);
            let normal = face_normal(&vertices, &[0, 1, 3, 2]).unwrap();
            let expected = Vec3::new(0.0, radians.cos(), radians.sin());
            if (normal - expected).magnitude() > 1e-9 {
                panic!("angle = {} deg: normal {} != {}", degrees, normal, expected);
            }
        }
    }

    #[test]
    fn normal_tolerates_non_planar_faces() {
        let vertices = points(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.01],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, -0.01],
        ]);
        let normal = face_normal(&vertices, &[0, 1, 2, 3]).unwrap();
        assert!(normal.z > 0.999);
        assert!((normal.magnitude() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normal_of_collinear_face_is_degenerate() {
        let vertices = points(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);
        assert_eq!(
            face_normal(&vertices, &[0, 1, 2]),
            Err(Error::DegenerateNormal)
        );
        assert_eq!(
            face_normal(&vertices, &[0, 1]),
            Err(Error::InvalidFace { len: 2 })
        );
    }

    fn arrow() -> Vec<Vec3> {
        points(&[
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 4.0, 0.0],
            [2.0, 1.0, 0.0],
            [0.0, 4.0, 0.0],
        ])
    }

    #[test]
    fn convex_vertex_skips_reflex_corner() {
        let vertices = arrow();
        let face = [2, 3, 4, 0, 1];
        let normal = face_normal(&vertices, &face).unwrap();
        assert_eq!(find_convex_vertex(&vertices, &face, normal, 0), Ok(2));
        assert_eq!(find_convex_vertex(&vertices, &face, normal, 2), Ok(3));
    }

    #[test]
    fn convex_vertex_missing_for_flipped_normal() {
        let vertices = points(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        let flipped = Vec3::new(0.0, 0.0, -1.0);
        assert_eq!(
            find_convex_vertex(&vertices, &[0, 1, 2, 3], flipped, 0),
            Err(Error::NoConvexVertex { len: 4 })
        );
    }

    #[test]
    fn ear_planes_are_positive_inside() {
        let vertices = arrow();
        let face = [0, 1, 2, 3, 4];
        let ear = Ear::new(&vertices, &face, 1, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!((ear.prev, ear.tip, ear.next), (0, 1, 2));

        let centroid = Vec3::new(8.0 / 3.0, 4.0 / 3.0, 0.0);
        assert!(ear.planes.iter().all(|plane| plane.value(centroid) > 0.0));
        for corner in [vertices[0], vertices[1], vertices[2]] {
            assert!(ear.contains(corner, 0.0).is_none());
        }
    }

    #[test]
    fn ear_blocker_picks_farthest_vertex() {
        let vertices = points(&[
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [10.0, 10.0, 0.0],
            [8.0, 1.0, 0.0],
            [6.0, 2.0, 0.0],
            [0.0, 10.0, 0.0],
        ]);
        let face = [0, 1, 2, 3, 4, 5];
        let ear = Ear::new(&vertices, &face, 1, Vec3::new(0.0, 0.0, 1.0));
        let blocker = ear_blocker(&vertices, &face, &ear, 0.0).unwrap();
        assert_eq!(blocker.position, 3);
        assert!((blocker.value - 70.0).abs() < 1e-9);
    }

    #[test]
    fn ear_blocker_ties_go_to_later_position() {
        let vertices = points(&[
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [10.0, 10.0, 0.0],
            [8.0, 3.0, 0.0],
            [6.0, 1.0, 0.0],
            [0.0, 10.0, 0.0],
        ]);
        let face = [0, 1, 2, 3, 4, 5];
        let ear = Ear::new(&vertices, &face, 1, Vec3::new(0.0, 0.0, 1.0));
        let blocker = ear_blocker(&vertices, &face, &ear, 0.0).unwrap();
        assert_eq!(blocker.position, 4);
        assert!((blocker.value - 50.0).abs() < 1e-9);
    }

    #[test]
    fn ear_tolerance_catches_vertex_on_closing_edge() {
        // Vertex 4 sits exactly on the closing edge 2 -> 0 of the ear at 1.
        let vertices = points(&[
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 4.0, 0.0],
            [3.0, 5.0, 0.0],
            [2.0, 2.0, 0.0],
            [0.0, 3.0, 0.0],
        ]);
        let face = [0, 1, 2, 3, 4, 5];
        let ear = Ear::new(&vertices, &face, 1, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(ear_blocker(&vertices, &face, &ear, 0.0), None);

        let blocker = ear_blocker(&vertices, &face, &ear, 1e-9).unwrap();
        assert_eq!(blocker.position, 4);
    }

    #[test]
    fn closing_edge_vertex_found_without_tolerance() {
        let vertices = points(&[
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 4.0, 0.0],
            [3.0, 5.0, 0.0],
            [2.0, 2.0, 0.0],
            [0.0, 3.0, 0.0],
        ]);
        let face = [0, 1, 2, 3, 4, 5];
        let ear = Ear::new(&vertices, &face, 1, Vec3::new(0.0, 0.0, 1.0));
        let vertex = closing_edge_vertex(&vertices, &face, &ear, 0.0).unwrap();
        assert_eq!(vertex.position, 4);
        assert_eq!(vertex.value, 0.0);

        // Cut along 1-4 rather than clipping 0-1-2 and pinching the loop at 4.
        let triangles =
            triangulate_face(&vertices, &face, &TriangulationConfig::default()).unwrap();
        assert_eq!(triangles, vec![[1, 2, 3], [3, 4, 1], [4, 5, 0], [0, 1, 4]]);
    }

    #[test]
    fn closing_edge_ignores_points_past_the_corners() {
        // Vertex 3 is on the line through 2 and 0, but beyond corner 2.
        let vertices = points(&[
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 4.0, 0.0],
            [5.0, 5.0, 0.0],
            [0.0, 5.0, 0.0],
        ]);
        let face = [0, 1, 2, 3, 4];
        let ear = Ear::new(&vertices, &face, 1, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(closing_edge_vertex(&vertices, &face, &ear, 0.0), None);
    }

    fn point_and_line() -> Vec<Vec3> {
        points(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [2.0, 2.0, 0.0],
        ])
    }

    #[test]
    fn detects_point_and_line() {
        let vertices = point_and_line();
        let face = [4, 5, 0, 1, 2, 3];
        assert!(is_only_noncollinear_vertex(&vertices, &face, 1, 0.0));
        assert!(!is_only_noncollinear_vertex(&vertices, &face, 0, 0.0));
        assert!(!is_only_noncollinear_vertex(&vertices, &face, 3, 0.0));
    }

    #[test]
    fn select_wraps_around() {
        let face = [10, 11, 12, 13, 14];
        assert_eq!(select(&face, 1, 3), vec![11, 12, 13]);
        assert_eq!(select(&face, 3, 1), vec![13, 14, 10, 11]);
        assert_eq!(select(&face, 4, 0), vec![14, 10]);
    }

    #[test]
    fn triangle_passes_through() {
        let vertices = arrow();
        let config = TriangulationConfig::default();
        assert_eq!(
            triangulate_face(&vertices, &[4, 0, 1], &config),
            Ok(vec![[4, 0, 1]])
        );
        assert_eq!(
            triangulate_face(&vertices, &[4, 0, 1, 4], &config),
            Ok(vec![[4, 0, 1]])
        );
    }

    #[test]
    fn arrow_is_split_along_diagonal() {
        let vertices = arrow();
        let triangles =
            triangulate_face(&vertices, &[0, 1, 2, 3, 4], &TriangulationConfig::default())
                .unwrap();
        assert_eq!(triangles, vec![[1, 2, 3], [3, 4, 0], [0, 1, 3]]);
    }

    #[test]
    fn collinear_loop_is_degenerate() {
        let vertices = point_and_line();
        assert_eq!(
            triangulate_face(&vertices, &[0, 1, 2, 3], &TriangulationConfig::default()),
            Err(Error::DegenerateNormal)
        );
    }
}
