//! Maps skeleton bones onto quads of skirt particles.
//!
//! At bind time each bone link of a chain is attached to the quad spanned by
//! two neighbouring segments on rings `r` and `r + 1`, and the difference
//! between the bone's authored pose and the quad's rest orientation is frozen
//! as a calibration offset. Every frame the quad's current orientation plus
//! that offset gives the bone's new world pose.

use crate::error::SkirtError;
use crate::grid::SkirtGrid;
use crate::math::{look_rotation, midpoint, Pose};
use crate::particle::Particle;
use crate::skeleton::{BoneId, Skeleton};
use alloc::vec::Vec;
use glam::{Affine3A, Quat, Vec3};

/// One bone of a chain with the world pose it had when captured.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoneLink {
    pub bone: BoneId,
    pub authored: Pose,
}

/// A bone chain walked from a root bone through first children.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneChain {
    links: Vec<BoneLink>,
}

impl BoneChain {
    /// Walks at most `max_links` bones down from `root`.
    ///
    /// Fails only if `root` itself is missing; a chain that ends early (or a
    /// child without a pose) just makes a shorter chain.
    pub fn capture<S: Skeleton + ?Sized>(
        skeleton: &S,
        root: BoneId,
        max_links: usize,
    ) -> Result<Self, SkirtError> {
        let authored = skeleton.world_pose(root).ok_or(SkirtError::UnknownBone(root))?;
        let mut links = Vec::new();
        let mut link = BoneLink { bone: root, authored };

        while links.len() < max_links {
            links.push(link);
            let next = skeleton
                .first_child(link.bone)
                .and_then(|bone| skeleton.world_pose(bone).map(|authored| BoneLink { bone, authored }));
            match next {
                Some(child) => link = child,
                None => break,
            }
        }
        Ok(BoneChain { links })
    }

    pub fn root(&self) -> Option<BoneId> {
        self.links.first().map(|l| l.bone)
    }

    pub fn links(&self) -> &[BoneLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Particle indices of a quad: two neighbours on the upper ring (`top`) and
/// the same two segments one ring below (`bottom`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QuadAnchors {
    pub top: [usize; 2],
    pub bottom: [usize; 2],
}

impl QuadAnchors {
    pub fn new(grid: &SkirtGrid, ring: usize, s0: usize, s1: usize) -> Self {
        QuadAnchors {
            top: [grid.index(ring, s0), grid.index(ring, s1)],
            bottom: [grid.index(ring + 1, s0), grid.index(ring + 1, s1)],
        }
    }

    /// Orientation of the quad from current particle positions.
    pub fn pose(&self, particles: &[Particle]) -> Pose {
        let at = |i: usize| particles[i].position;
        orient(
            [at(self.top[0]), at(self.top[1])],
            [at(self.bottom[0]), at(self.bottom[1])],
        )
    }

    /// Orientation the quad has when every particle sits at rest under `root`.
    pub fn rest_pose(&self, particles: &[Particle], root: &Affine3A) -> Pose {
        let at = |i: usize| particles[i].rest_position(root);
        orient(
            [at(self.top[0]), at(self.top[1])],
            [at(self.bottom[0]), at(self.bottom[1])],
        )
    }
}

// Position is the top edge midpoint; +Z points down the quad, +Y along the
// top edge crossed with that direction.
fn orient(top: [Vec3; 2], bottom: [Vec3; 2]) -> Pose {
    let position = midpoint(top[0], top[1]);
    let direction = midpoint(bottom[0], bottom[1]) - position;
    let normal = (top[1] - top[0]).cross(direction);
    Pose::new(position, look_rotation(direction, normal))
}

/// A bone attached to a particle quad with a fixed calibration offset.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoneBinding {
    pub bone: BoneId,
    pub quad: QuadAnchors,
    pub offset: Vec3,
    pub rotation_offset: Quat,
}

impl BoneBinding {
    /// Freezes the offset between `authored` and the quad's rest pose.
    pub fn calibrate(bone: BoneId, quad: QuadAnchors, authored: Pose, neutral: Pose) -> Self {
        BoneBinding {
            bone,
            quad,
            offset: authored.position - neutral.position,
            rotation_offset: neutral.rotation.inverse() * authored.rotation,
        }
    }

    /// World pose of the bone for the current particle positions.
    pub fn solve(&self, particles: &[Particle]) -> Pose {
        let quad = self.quad.pose(particles);
        Pose::new(quad.position + self.offset, quad.rotation * self.rotation_offset)
    }
}

/// Root-ring segment pair `(s, s + 1)` whose rest midpoint is closest to
/// `position`. Ties keep the earlier pair.
pub fn closest_root_segment(grid: &SkirtGrid, root: &Affine3A, position: Vec3) -> (usize, usize) {
    let segments = grid.segment_count();
    let distance_sq = |s: usize| {
        let a = grid.particle(0, s).rest_position(root);
        let b = grid.particle(0, grid.next_segment(s)).rest_position(root);
        (position - midpoint(a, b)).length_squared()
    };

    let mut best = 0;
    let mut best_distance = distance_sq(0);
    for s in 1..segments {
        let d = distance_sq(s);
        if d < best_distance {
            best = s;
            best_distance = d;
        }
    }
    (best, grid.next_segment(best))
}

/// Binds link `r` of `chain` to the quad between rings `r` and `r + 1`.
///
/// Links past the second-to-last ring are left unbound.
pub fn bind_chain(grid: &SkirtGrid, root: &Affine3A, chain: &BoneChain) -> Vec<BoneBinding> {
    let Some(first) = chain.links().first() else {
        return Vec::new();
    };
    if grid.is_empty() {
        return Vec::new();
    }

    let (s0, s1) = closest_root_segment(grid, root, first.authored.position);
    let quads = grid.ring_count().saturating_sub(1);

    chain
        .links()
        .iter()
        .take(quads)
        .enumerate()
        .map(|(ring, link)| {
            let quad = QuadAnchors::new(grid, ring, s0, s1);
            let neutral = quad.rest_pose(grid.particles(), root);
            BoneBinding::calibrate(link.bone, quad, link.authored, neutral)
        })
        .collect()
}
