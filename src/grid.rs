//! Ring/segment particle grid: the cylindrical topology of the skirt.

use crate::particle::Particle;
use alloc::vec::Vec;
use glam::{Affine3A, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One horizontal cross-section of the skirt, in attachment-root space.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ring {
    pub radius_x: f32,
    pub radius_z: f32,
    pub offset: Vec3,
}

impl Ring {
    pub fn new(offset: Vec3, radius_x: f32, radius_z: f32) -> Self {
        Ring { radius_x, radius_z, offset }
    }

    /// A ring with the same radius on both horizontal axes.
    pub fn circle(offset: Vec3, radius: f32) -> Self {
        Ring::new(offset, radius, radius)
    }

    /// Root-local position of the point at `angle` (radians) on this ring.
    pub fn local_point(&self, angle: f32) -> Vec3 {
        self.offset
            + Vec3::new(
                libm::cosf(angle) * self.radius_x,
                0.0,
                libm::sinf(angle) * self.radius_z,
            )
    }
}

/// Particles of every (ring, segment) pair, stored ring-major.
///
/// Particle at (ring, segment) has index `ring * segments + segment`.
/// Ring 0 is attached to the root and never simulated freely.
#[derive(Clone, Debug)]
pub struct SkirtGrid {
    particles: Vec<Particle>,
    rings: Vec<Ring>,
    segments: usize,
}

impl SkirtGrid {
    /// Lays out `segments` particles on every ring, starting at
    /// `starting_angle` degrees and stepping `360 / segments` degrees.
    ///
    /// The layout is a pure function of its inputs, so regenerating with the
    /// same rings, segment count, angle and root gives the same grid.
    pub fn generate(rings: &[Ring], segments: usize, starting_angle: f32, root: &Affine3A) -> Self {
        let step = 360.0 / segments as f32;
        let mut particles = Vec::with_capacity(rings.len() * segments);

        for ring in rings {
            for i in 0..segments {
                let angle = (starting_angle + i as f32 * step).to_radians();
                particles.push(Particle::at_rest(ring.local_point(angle), root));
            }
        }

        SkirtGrid { particles, rings: rings.to_vec(), segments }
    }

    #[inline]
    pub fn index(&self, ring: usize, segment: usize) -> usize {
        ring * self.segments + segment
    }

    /// The neighbouring segment, wrapping around the ring.
    #[inline]
    pub fn next_segment(&self, segment: usize) -> usize {
        (segment + 1) % self.segments
    }

    pub fn particle(&self, ring: usize, segment: usize) -> &Particle {
        &self.particles[self.index(ring, segment)]
    }

    pub fn position_at(&self, ring: usize, segment: usize) -> Vec3 {
        self.particle(ring, segment).position
    }

    /// Pins ring 0 to the root: every root particle is moved to its rest
    /// position under `root` and loses its velocity.
    pub fn drive_kinematic_ring(&mut self, root: &Affine3A) {
        for p in self.particles.iter_mut().take(self.segments) {
            let target = p.rest_position(root);
            p.drive_to(target);
        }
    }

    /// Particles of ring 1 and below, the ones the integrator moves.
    pub fn free_particles_mut(&mut self) -> &mut [Particle] {
        let start = self.segments.min(self.particles.len());
        &mut self.particles[start..]
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.particles.iter().map(|p| p.position).collect()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// World-space centre of row `ring` under `root`.
    pub fn ring_center(&self, ring: usize, root: &Affine3A) -> Vec3 {
        root.transform_point3(self.rings[ring].offset)
    }

    pub fn ring_count(&self) -> usize { self.rings.len() }
    pub fn segment_count(&self) -> usize { self.segments }
    pub fn particle_count(&self) -> usize { self.particles.len() }
    pub fn is_empty(&self) -> bool { self.particles.is_empty() }
}
