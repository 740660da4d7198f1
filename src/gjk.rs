//! GJK distance and EPA penetration depth between convex support maps.
//!
//! Used for collision volumes that are only known as a vertex hull. Both
//! shapes must live in the same frame; callers transform into the hull's
//! local space first.

use alloc::vec::Vec;
use glam::Vec3;

const MAX_ITERATIONS: usize = 64;
const REL_TOLERANCE: f32 = 1e-6;
const ABS_TOLERANCE_SQ: f32 = 1e-12;
const EPA_TOLERANCE: f32 = 1e-5;

/// A convex shape described by its support function.
pub trait SupportMap {
    /// Point of the shape farthest along `dir`.
    fn support(&self, dir: Vec3) -> Vec3;

    /// Any interior point, used to pick a push direction when the shapes
    /// only touch and no better normal is available.
    fn center(&self) -> Vec3;
}

/// Line segment, the core of a capsule.
#[derive(Copy, Clone, Debug)]
pub struct Segment {
    pub a: Vec3,
    pub b: Vec3,
}

impl SupportMap for Segment {
    fn support(&self, dir: Vec3) -> Vec3 {
        if self.a.dot(dir) >= self.b.dot(dir) {
            self.a
        } else {
            self.b
        }
    }

    fn center(&self) -> Vec3 {
        (self.a + self.b) * 0.5
    }
}

/// Convex hull of a point cloud. Must not be empty.
#[derive(Copy, Clone, Debug)]
pub struct PointCloud<'a>(pub &'a [Vec3]);

impl SupportMap for PointCloud<'_> {
    fn support(&self, dir: Vec3) -> Vec3 {
        let mut best = self.0[0];
        let mut best_dot = best.dot(dir);
        for &v in self.0.iter().skip(1) {
            let d = v.dot(dir);
            if d > best_dot {
                best = v;
                best_dot = d;
            }
        }
        best
    }

    fn center(&self) -> Vec3 {
        let sum = self.0.iter().fold(Vec3::ZERO, |acc, &v| acc + v);
        sum / self.0.len().max(1) as f32
    }
}

/// How two convex shapes `a` and `b` relate.
///
/// `normal` always points the way `a` must move to get away from `b`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Proximity {
    Separated { distance: f32, normal: Vec3 },
    Overlapping { depth: f32, normal: Vec3 },
}

/// Distance (GJK) or penetration depth (EPA) between `a` and `b`.
pub fn proximity<A: SupportMap, B: SupportMap>(a: &A, b: &B) -> Proximity {
    let support = |dir: Vec3| a.support(dir) - b.support(-dir);

    let mut simplex = Simplex::new();
    let mut v = support(Vec3::X);

    for _ in 0..MAX_ITERATIONS {
        let v_len_sq = v.length_squared();
        let w = support(-v);

        if v_len_sq - v.dot(w) <= REL_TOLERANCE * v_len_sq || simplex.contains(w) {
            return separated(v, a, b);
        }

        simplex.push(w);
        v = simplex.reduce_to_closest();

        if simplex.len == 4 || v.length_squared() <= ABS_TOLERANCE_SQ * simplex.max_norm_sq() {
            return overlapping(&simplex, &support, a, b);
        }
    }

    // Out of iterations; the current estimate is still a valid distance bound.
    if v.length_squared() > ABS_TOLERANCE_SQ {
        separated(v, a, b)
    } else {
        overlapping(&simplex, &support, a, b)
    }
}

fn separated<A: SupportMap, B: SupportMap>(v: Vec3, a: &A, b: &B) -> Proximity {
    let distance = v.length();
    if distance <= 0.0 {
        return touching(a, b);
    }
    Proximity::Separated { distance, normal: v / distance }
}

fn overlapping<A, B, F>(simplex: &Simplex, support: &F, a: &A, b: &B) -> Proximity
where
    A: SupportMap,
    B: SupportMap,
    F: Fn(Vec3) -> Vec3,
{
    if simplex.len == 4 {
        if let Some((depth, outward)) = epa(simplex.points, support) {
            return Proximity::Overlapping { depth, normal: -outward };
        }
    }
    touching(a, b)
}

/// Fallback when no polytope is available: push `a` away from `b`'s centre
/// by exactly the overlap of their extents along that axis.
fn touching<A: SupportMap, B: SupportMap>(a: &A, b: &B) -> Proximity {
    let mut normal = (a.center() - b.center()).normalize_or_zero();
    if normal == Vec3::ZERO {
        normal = Vec3::Y;
    }
    let depth = b.support(normal).dot(normal) - a.support(-normal).dot(normal);
    Proximity::Overlapping { depth: depth.max(0.0), normal }
}

#[derive(Copy, Clone, Debug)]
struct Simplex {
    points: [Vec3; 4],
    len: usize,
}

impl Simplex {
    fn new() -> Self {
        Simplex { points: [Vec3::ZERO; 4], len: 0 }
    }

    fn from_slice(points: &[Vec3]) -> Self {
        let mut s = Simplex::new();
        for &p in points {
            s.push(p);
        }
        s
    }

    fn push(&mut self, p: Vec3) {
        self.points[self.len] = p;
        self.len += 1;
    }

    fn contains(&self, p: Vec3) -> bool {
        self.points[..self.len]
            .iter()
            .any(|q| (*q - p).length_squared() <= ABS_TOLERANCE_SQ)
    }

    fn max_norm_sq(&self) -> f32 {
        self.points[..self.len]
            .iter()
            .map(|p| p.length_squared())
            .fold(0.0, f32::max)
    }

    /// Replaces the simplex by the smallest sub-simplex supporting its
    /// closest point to the origin, and returns that point.
    fn reduce_to_closest(&mut self) -> Vec3 {
        let p = self.points;
        let (closest, reduced) = match self.len {
            1 => (p[0], *self),
            2 => closest_on_segment(p[0], p[1]),
            3 => closest_on_triangle(p[0], p[1], p[2]),
            _ => closest_on_tetrahedron(p[0], p[1], p[2], p[3]),
        };
        *self = reduced;
        closest
    }
}

fn closest_on_segment(a: Vec3, b: Vec3) -> (Vec3, Simplex) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= ABS_TOLERANCE_SQ {
        return (a, Simplex::from_slice(&[a]));
    }
    let t = -a.dot(ab) / len_sq;
    if t <= 0.0 {
        (a, Simplex::from_slice(&[a]))
    } else if t >= 1.0 {
        (b, Simplex::from_slice(&[b]))
    } else {
        (a + ab * t, Simplex::from_slice(&[a, b]))
    }
}

// Voronoi-region walk of the triangle, with the query point at the origin.
fn closest_on_triangle(a: Vec3, b: Vec3, c: Vec3) -> (Vec3, Simplex) {
    let ab = b - a;
    let ac = c - a;

    let d1 = ab.dot(-a);
    let d2 = ac.dot(-a);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, Simplex::from_slice(&[a]));
    }

    let d3 = ab.dot(-b);
    let d4 = ac.dot(-b);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, Simplex::from_slice(&[b]));
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, Simplex::from_slice(&[a, b]));
    }

    let d5 = ab.dot(-c);
    let d6 = ac.dot(-c);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, Simplex::from_slice(&[c]));
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, Simplex::from_slice(&[a, c]));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, Simplex::from_slice(&[b, c]));
    }

    let sum = va + vb + vc;
    if sum <= ABS_TOLERANCE_SQ {
        // Collinear triangle: fall back to the best edge.
        return [closest_on_segment(a, b), closest_on_segment(b, c), closest_on_segment(a, c)]
            .into_iter()
            .min_by(|x, y| x.0.length_squared().total_cmp(&y.0.length_squared()))
            .unwrap_or((a, Simplex::from_slice(&[a])));
    }
    let v = vb / sum;
    let w = vc / sum;
    (a + ab * v + ac * w, Simplex::from_slice(&[a, b, c]))
}

fn closest_on_tetrahedron(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> (Vec3, Simplex) {
    let faces = [(a, b, c, d), (a, c, d, b), (a, d, b, c), (b, d, c, a)];
    let mut best: Option<(Vec3, Simplex)> = None;

    for (p, q, r, opposite) in faces {
        if !origin_outside_plane(p, q, r, opposite) {
            continue;
        }
        let candidate = closest_on_triangle(p, q, r);
        let better = match &best {
            Some((point, _)) => candidate.0.length_squared() < point.length_squared(),
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    best.unwrap_or((Vec3::ZERO, Simplex::from_slice(&[a, b, c, d])))
}

/// Whether the origin and `opposite` lie on different sides of plane `pqr`.
/// A flat tetrahedron counts every face as facing the origin.
fn origin_outside_plane(p: Vec3, q: Vec3, r: Vec3, opposite: Vec3) -> bool {
    let n = (q - p).cross(r - p);
    let sign_origin = (-p).dot(n);
    let sign_opposite = (opposite - p).dot(n);
    if sign_opposite * sign_opposite <= ABS_TOLERANCE_SQ * n.length_squared() {
        return true;
    }
    sign_origin * sign_opposite < 0.0
}

/// Triangle face of the EPA polytope, wound so `normal` points outward.
#[derive(Clone, Debug)]
struct Face {
    indices: [usize; 3],
    normal: Vec3,
    distance: f32,
}

impl Face {
    fn new(points: &[Vec3], indices: [usize; 3]) -> Option<Self> {
        let a = points[indices[0]];
        let n = (points[indices[1]] - a).cross(points[indices[2]] - a);
        let normal = n.try_normalize()?;
        Some(Face { indices, normal, distance: normal.dot(a) })
    }

    /// Like `new`, but flips the winding so the normal faces away from `inside`.
    fn outward(points: &[Vec3], [i, j, k]: [usize; 3], inside: Vec3) -> Option<Self> {
        let face = Face::new(points, [i, j, k])?;
        if face.normal.dot(inside - points[i]) > 0.0 {
            Face::new(points, [i, k, j])
        } else {
            Some(face)
        }
    }

    fn sees(&self, points: &[Vec3], p: Vec3) -> bool {
        self.normal.dot(p - points[self.indices[0]]) > 0.0
    }
}

/// Expands a tetrahedron enclosing the origin until the face nearest to the
/// origin lies on the Minkowski difference boundary. Returns `(depth, normal)`
/// with the normal pointing out of the difference.
fn epa<F: Fn(Vec3) -> Vec3>(tetrahedron: [Vec3; 4], support: &F) -> Option<(f32, Vec3)> {
    let mut points: Vec<Vec3> = tetrahedron.to_vec();
    let mut faces: Vec<Face> = Vec::new();
    for (i, j, k, opposite) in [(0, 1, 2, 3), (0, 3, 1, 2), (0, 2, 3, 1), (1, 3, 2, 0)] {
        faces.push(Face::outward(&points, [i, j, k], points[opposite])?);
    }

    for _ in 0..MAX_ITERATIONS {
        let closest = faces
            .iter()
            .min_by(|x, y| x.distance.total_cmp(&y.distance))?
            .clone();

        let s = support(closest.normal);
        if s.dot(closest.normal) - closest.distance < EPA_TOLERANCE {
            return Some((closest.distance.max(0.0), closest.normal));
        }

        // Remove every face that can see the new point and stitch the horizon.
        let mut horizon: Vec<(usize, usize)> = Vec::new();
        faces.retain(|face| {
            if !face.sees(&points, s) {
                return true;
            }
            for e in 0..3 {
                let edge = (face.indices[e], face.indices[(e + 1) % 3]);
                if let Some(pos) = horizon.iter().position(|&(x, y)| (y, x) == edge) {
                    horizon.swap_remove(pos);
                } else {
                    horizon.push(edge);
                }
            }
            false
        });

        if horizon.is_empty() {
            return Some((closest.distance.max(0.0), closest.normal));
        }

        let new_index = points.len();
        points.push(s);
        for (i, j) in horizon {
            if let Some(face) = Face::new(&points, [i, j, new_index]) {
                faces.push(face);
            }
        }
        if faces.is_empty() {
            return Some((closest.distance.max(0.0), closest.normal));
        }
    }

    faces
        .iter()
        .min_by(|x, y| x.distance.total_cmp(&y.distance))
        .map(|face| (face.distance.max(0.0), face.normal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> [Vec3; 8] {
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            *corner = Vec3::new(
                if i & 1 == 0 { -0.5 } else { 0.5 },
                if i & 2 == 0 { -0.5 } else { 0.5 },
                if i & 4 == 0 { -0.5 } else { 0.5 },
            );
        }
        corners
    }

    #[test]
    fn separated_segment_above_cube() {
        let cube = unit_cube();
        let seg = Segment { a: Vec3::new(-1.0, 1.5, 0.0), b: Vec3::new(1.0, 1.5, 0.0) };
        match proximity(&seg, &PointCloud(&cube)) {
            Proximity::Separated { distance, normal } => {
                assert!((distance - 1.0).abs() < 1e-4, "distance = {}", distance);
                assert!(normal.abs_diff_eq(Vec3::Y, 1e-4), "normal = {:?}", normal);
            }
            other => panic!("expected separation, got {:?}", other),
        }
    }

    #[test]
    fn separated_segment_beside_cube_edge() {
        let cube = unit_cube();
        // Segment parallel to the cube's z edge at (+0.5, +0.5), offset diagonally.
        let seg = Segment { a: Vec3::new(1.5, 1.5, -2.0), b: Vec3::new(1.5, 1.5, 2.0) };
        match proximity(&seg, &PointCloud(&cube)) {
            Proximity::Separated { distance, normal } => {
                assert!((distance - 2f32.sqrt()).abs() < 1e-4, "distance = {}", distance);
                let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
                assert!(normal.abs_diff_eq(expected, 1e-3), "normal = {:?}", normal);
            }
            other => panic!("expected separation, got {:?}", other),
        }
    }

    #[test]
    fn segment_through_cube_overlaps() {
        let cube = unit_cube();
        let seg = Segment { a: Vec3::new(-2.0, 0.4, 0.0), b: Vec3::new(2.0, 0.4, 0.0) };
        match proximity(&seg, &PointCloud(&cube)) {
            Proximity::Overlapping { depth, normal } => {
                assert!((depth - 0.1).abs() < 1e-3, "depth = {}", depth);
                assert!(normal.abs_diff_eq(Vec3::Y, 1e-3), "normal = {:?}", normal);
            }
            other => panic!("expected overlap, got {:?}", other),
        }
    }

    #[test]
    fn triangle_region_interior() {
        let (p, s) = closest_on_triangle(
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        );
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-6));
        assert_eq!(s.len, 3);
    }

    #[test]
    fn triangle_region_vertex() {
        let (p, s) = closest_on_triangle(
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
        );
        assert_eq!(p, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(s.len, 1);
    }

    #[test]
    fn tetrahedron_containing_origin() {
        let (p, s) = closest_on_tetrahedron(
            Vec3::new(1.0, 0.0, -0.5),
            Vec3::new(-1.0, 0.0, -0.5),
            Vec3::new(0.0, 1.0, 0.5),
            Vec3::new(0.0, -1.0, 0.5),
        );
        assert_eq!(p, Vec3::ZERO);
        assert_eq!(s.len, 4);
    }
}
