//! Skirt particles: explicit velocity plus a per-step force accumulator.

use glam::{Affine3A, Vec3};

/// One simulated point of the skirt grid.
///
/// `rest_local` is the undeformed position in attachment-root space; it is
/// both the shape-matching target and, for ring 0, the kinematic drive.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub rest_local: Vec3,
    pub position: Vec3,
    pub velocity: Vec3,
    pub force: Vec3,
}

impl Particle {
    /// A particle sitting at its rest position under `root`, at rest.
    pub fn at_rest(rest_local: Vec3, root: &Affine3A) -> Self {
        Particle {
            rest_local,
            position: root.transform_point3(rest_local),
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
        }
    }

    /// World position this particle would have in the undeformed pose.
    #[inline]
    pub fn rest_position(&self, root: &Affine3A) -> Vec3 {
        root.transform_point3(self.rest_local)
    }

    pub fn apply_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Damped explicit step: the accumulated force is a direct velocity
    /// increment scaled by `inertia` (no mass, no timestep).
    pub fn integrate(&mut self, damping: f32, inertia: f32) {
        self.velocity = self.velocity * (1.0 - damping) + self.force * inertia;
        self.position += self.velocity;
    }

    /// Moves the particle and adds the same delta to its velocity, so the
    /// correction also bleeds the motion that caused it.
    #[inline]
    pub fn displace(&mut self, delta: Vec3) {
        self.position += delta;
        self.velocity += delta;
    }

    /// Snaps to the kinematic rest position and drops any velocity.
    pub fn drive_to(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
    }
}
