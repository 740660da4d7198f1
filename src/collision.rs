//! Capsule collision between ring edges and host collision volumes.
//!
//! Every horizontal edge below the root ring sweeps a capsule that sits one
//! radius outside the edge, so its inner surface runs along the cloth. When
//! a volume penetrates that capsule, both edge particles are pushed out by
//! the penetration vector. Volumes are tested in list order and each push
//! moves the capsule before the next test.

use crate::gjk::{self, PointCloud, Proximity, Segment};
use crate::grid::SkirtGrid;
use crate::math::{closest_point_on_segment, closest_points_segments, look_rotation, midpoint, Pose};
use crate::particle::Particle;
use alloc::vec::Vec;
use glam::{Affine3A, Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Penetrations this shallow are ignored.
pub const CONTACT_SLOP: f32 = 1e-5;

const GOLDEN_SECTION_STEPS: usize = 48;
const INV_PHI: f32 = 0.618_034;
const TOUCH_DISTANCE: f32 = 1e-6;

/// A capsule whose core segment runs along its local Z axis.
///
/// `height` is the full tip-to-tip length, so the core segment is
/// `height - 2 * radius` long (never negative).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Capsule {
    pub center: Vec3,
    pub rotation: Quat,
    pub radius: f32,
    pub height: f32,
}

impl Capsule {
    pub fn new(center: Vec3, rotation: Quat, radius: f32, height: f32) -> Self {
        Capsule { center, rotation, radius, height }
    }

    /// The capsule swept along the edge `left..right` of a ring centred at
    /// `ring_center`, shifted outward by `radius`.
    ///
    /// Local -X of the result faces away from the ring centre.
    pub fn along_edge(left: Vec3, right: Vec3, ring_center: Vec3, radius: f32) -> Self {
        let mid = midpoint(left, right);
        let forward = left - mid;
        let outward = (mid - ring_center).normalize_or_zero();
        Capsule {
            center: mid + outward * radius,
            rotation: look_rotation(forward, outward.cross(forward)),
            radius,
            height: (left - right).length() + 2.0 * radius,
        }
    }

    #[inline]
    pub fn axis(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn half_segment(&self) -> f32 {
        (self.height * 0.5 - self.radius).max(0.0)
    }

    /// End points of the core segment.
    pub fn segment(&self) -> (Vec3, Vec3) {
        let half = self.axis() * self.half_segment();
        (self.center + half, self.center - half)
    }

    pub fn translated(mut self, delta: Vec3) -> Self {
        self.center += delta;
        self
    }

    // Used when the contact normal is undefined (core passes through the
    // other shape's centre). Edge capsules push outward from the ring.
    fn fallback_normal(&self) -> Vec3 {
        self.rotation * Vec3::NEG_X
    }
}

/// How far, and which way, a capsule must move to stop overlapping a volume.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Penetration {
    /// Unit direction to move the capsule.
    pub direction: Vec3,
    /// Positive overlap depth.
    pub distance: f32,
}

impl Penetration {
    /// `Some` only if `distance` exceeds [`CONTACT_SLOP`].
    pub fn resolve(direction: Vec3, distance: f32) -> Option<Self> {
        (distance > CONTACT_SLOP).then_some(Penetration { direction, distance })
    }

    pub fn vector(&self) -> Vec3 {
        self.direction * self.distance
    }
}

/// Anything that can tell how deep a capsule sits inside it.
pub trait PenetrationTestable {
    fn penetration(&self, capsule: &Capsule) -> Option<Penetration>;
}

impl<T: PenetrationTestable + ?Sized> PenetrationTestable for &T {
    fn penetration(&self, capsule: &Capsule) -> Option<Penetration> {
        (**self).penetration(capsule)
    }
}

/// Geometry of a collision volume in its own local frame.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    Sphere { radius: f32 },
    /// Upright capsule along local Y; `height` is tip to tip.
    Capsule { radius: f32, height: f32 },
    Box { half_extents: Vec3 },
    /// Convex hull of the given local-space points.
    ConvexMesh { vertices: Vec<Vec3> },
}

/// A posed shape the skirt must stay out of.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionVolume {
    pub shape: Shape,
    pub pose: Pose,
}

impl CollisionVolume {
    pub fn new(shape: Shape, pose: Pose) -> Self {
        CollisionVolume { shape, pose }
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        CollisionVolume::new(Shape::Sphere { radius }, Pose::from_position(center))
    }

    /// Capsule whose core runs from `start` to `end`.
    pub fn capsule_between(start: Vec3, end: Vec3, radius: f32) -> Self {
        let span = end - start;
        let rotation = match span.try_normalize() {
            Some(dir) => Quat::from_rotation_arc(Vec3::Y, dir),
            None => Quat::IDENTITY,
        };
        CollisionVolume::new(
            Shape::Capsule { radius, height: span.length() + 2.0 * radius },
            Pose::new(midpoint(start, end), rotation),
        )
    }

    pub fn cuboid(pose: Pose, half_extents: Vec3) -> Self {
        CollisionVolume::new(Shape::Box { half_extents }, pose)
    }

    pub fn convex_mesh(pose: Pose, vertices: Vec<Vec3>) -> Self {
        CollisionVolume::new(Shape::ConvexMesh { vertices }, pose)
    }
}

impl PenetrationTestable for CollisionVolume {
    fn penetration(&self, capsule: &Capsule) -> Option<Penetration> {
        match &self.shape {
            Shape::Sphere { radius } => sphere_penetration(capsule, self.pose.position, *radius),
            Shape::Capsule { radius, height } => {
                let half = (height * 0.5 - radius).max(0.0);
                let a = self.pose.transform_point(Vec3::Y * half);
                let b = self.pose.transform_point(Vec3::NEG_Y * half);
                capsule_penetration(capsule, a, b, *radius)
            }
            Shape::Box { half_extents } => box_penetration(capsule, &self.pose, *half_extents),
            Shape::ConvexMesh { vertices } => convex_penetration(capsule, &self.pose, vertices),
        }
    }
}

fn sphere_penetration(capsule: &Capsule, center: Vec3, radius: f32) -> Option<Penetration> {
    let (a, b) = capsule.segment();
    let (closest, _) = closest_point_on_segment(a, b, center);
    push_apart(capsule, closest - center, capsule.radius + radius)
}

fn capsule_penetration(capsule: &Capsule, a: Vec3, b: Vec3, radius: f32) -> Option<Penetration> {
    let (p, q) = capsule.segment();
    let (on_capsule, on_volume) = closest_points_segments(p, q, a, b);
    push_apart(capsule, on_capsule - on_volume, capsule.radius + radius)
}

/// Shared tail of the round-shape tests: `separation` runs from the volume's
/// core to the capsule's core, `reach` is the sum of radii.
fn push_apart(capsule: &Capsule, separation: Vec3, reach: f32) -> Option<Penetration> {
    let distance = separation.length();
    let direction = if distance > TOUCH_DISTANCE {
        separation / distance
    } else {
        capsule.fallback_normal()
    };
    Penetration::resolve(direction, reach - distance)
}

fn box_penetration(capsule: &Capsule, pose: &Pose, half_extents: Vec3) -> Option<Penetration> {
    let (a, b) = capsule.segment();
    let a = pose.inverse_transform_point(a);
    let b = pose.inverse_transform_point(b);
    let h = half_extents.abs();

    let outside = |t: f32| {
        let q = a.lerp(b, t);
        q - q.clamp(-h, h)
    };

    // Distance to a box is convex along the segment.
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    for _ in 0..GOLDEN_SECTION_STEPS {
        let m1 = hi - (hi - lo) * INV_PHI;
        let m2 = lo + (hi - lo) * INV_PHI;
        if outside(m1).length_squared() <= outside(m2).length_squared() {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    let gap = outside((lo + hi) * 0.5);
    let distance = gap.length();

    if distance > TOUCH_DISTANCE {
        return Penetration::resolve(pose.transform_vector(gap / distance), capsule.radius - distance);
    }

    // Core inside the box: leave through the cheapest face.
    let lower = a.min(b);
    let upper = a.max(b);
    let mut best = (f32::INFINITY, Vec3::ZERO);
    for (axis, unit) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().enumerate() {
        let up = h[axis] - lower[axis];
        let down = upper[axis] + h[axis];
        if up < best.0 {
            best = (up, unit);
        }
        if down < best.0 {
            best = (down, -unit);
        }
    }
    Penetration::resolve(pose.transform_vector(best.1), best.0 + capsule.radius)
}

fn convex_penetration(capsule: &Capsule, pose: &Pose, vertices: &[Vec3]) -> Option<Penetration> {
    if vertices.is_empty() {
        return None;
    }
    let (a, b) = capsule.segment();
    let core = Segment {
        a: pose.inverse_transform_point(a),
        b: pose.inverse_transform_point(b),
    };
    let (normal, depth) = match gjk::proximity(&core, &PointCloud(vertices)) {
        Proximity::Separated { distance, normal } => (normal, capsule.radius - distance),
        Proximity::Overlapping { depth, normal } => (normal, capsule.radius + depth),
    };
    Penetration::resolve(pose.transform_vector(normal), depth)
}

/// Pushes every edge capsule of ring 1 and below out of `volumes`.
///
/// Returns the number of edge/volume contacts resolved.
pub fn resolve_collisions<V: PenetrationTestable>(
    grid: &mut SkirtGrid,
    root: &Affine3A,
    radius: f32,
    volumes: &[V],
) -> usize {
    if volumes.is_empty() || grid.is_empty() {
        return 0;
    }

    let mut contacts = 0;
    for ring in 1..grid.ring_count() {
        let center = grid.ring_center(ring, root);
        for segment in 0..grid.segment_count() {
            let left = grid.index(ring, segment);
            let right = grid.index(ring, grid.next_segment(segment));
            let (_, hits) = resolve_edge(grid.particles_mut(), left, right, center, radius, volumes);
            contacts += hits;
        }
    }
    contacts
}

/// Resolves one edge against every volume in order. Returns the final
/// capsule and how many volumes touched it.
pub fn resolve_edge<V: PenetrationTestable>(
    particles: &mut [Particle],
    left: usize,
    right: usize,
    ring_center: Vec3,
    radius: f32,
    volumes: &[V],
) -> (Capsule, usize) {
    let mut capsule =
        Capsule::along_edge(particles[left].position, particles[right].position, ring_center, radius);
    let mut hits = 0;

    for volume in volumes {
        if let Some(penetration) = volume.penetration(&capsule) {
            let delta = penetration.vector();
            capsule = capsule.translated(delta);
            particles[left].displace(delta);
            particles[right].displace(delta);
            hits += 1;
        }
    }
    (capsule, hits)
}
