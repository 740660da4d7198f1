//! Directional springs between neighbouring grid particles.

use crate::grid::SkirtGrid;
use crate::particle::Particle;
use alloc::vec::Vec;
use glam::Vec3;

/// Fraction of the configured elasticity applied as spring stiffness.
pub const ELASTIC_SCALE: f32 = 0.25;

/// Orientation of a spring within the ring/segment grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SpringKind {
    /// Between the same segment of two consecutive rings.
    Vertical,
    /// Between two neighbouring segments of one ring.
    Horizontal,
}

/// A spring from particle `a` to particle `b` that remembers its rest vector,
/// not just its rest length, so it resists shearing as well as stretching.
#[derive(Clone, Debug, PartialEq)]
pub struct Spring {
    pub kind: SpringKind,
    /// `a` sits on the kinematic root ring and is never moved by this spring.
    pub anchor_static: bool,
    pub a: usize,
    pub b: usize,
    pub rest: Vec3,
    pub rest_length: f32,
}

impl Spring {
    /// Captures the current `a -> b` vector as the rest state.
    pub fn from_particles(
        kind: SpringKind,
        anchor_static: bool,
        a: usize,
        b: usize,
        particles: &[Particle],
    ) -> Self {
        let rest = particles[b].position - particles[a].position;
        Spring {
            kind,
            anchor_static,
            a,
            b,
            rest,
            rest_length: rest.length(),
        }
    }

    /// Current `a -> b` vector.
    #[inline]
    pub fn span(&self, particles: &[Particle]) -> Vec3 {
        particles[self.b].position - particles[self.a].position
    }

    pub fn length(&self, particles: &[Particle]) -> f32 {
        self.span(particles).length()
    }

    /// Adds the elastic force `((b - a) - rest) * k` pulling both ends back
    /// toward the rest vector. An anchored `a` receives nothing.
    pub fn apply_elastic_force(&self, particles: &mut [Particle], k: f32) {
        let force = (self.span(particles) - self.rest) * k;
        if !self.anchor_static {
            particles[self.a].apply_force(force);
        }
        particles[self.b].apply_force(-force);
    }
}

/// Builds the vertical and horizontal springs of a freshly generated grid.
///
/// For every ring below the root and every segment, a vertical spring to the
/// ring above is emitted first, then a horizontal spring to the next segment.
/// Total: `(rings - 1) * segments * 2`.
pub fn build_springs(grid: &SkirtGrid) -> Vec<Spring> {
    let rings = grid.ring_count();
    let segments = grid.segment_count();
    let mut springs = Vec::with_capacity(rings.saturating_sub(1) * segments * 2);
    let particles = grid.particles();

    for r in 1..rings {
        for s in 0..segments {
            springs.push(Spring::from_particles(
                SpringKind::Vertical,
                r == 1,
                grid.index(r - 1, s),
                grid.index(r, s),
                particles,
            ));
            springs.push(Spring::from_particles(
                SpringKind::Horizontal,
                false,
                grid.index(r, s),
                grid.index(r, grid.next_segment(s)),
                particles,
            ));
        }
    }

    springs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Ring;
    use glam::Affine3A;

    fn grid(rings: usize, segments: usize) -> SkirtGrid {
        let rings: Vec<Ring> = (0..rings)
            .map(|r| Ring::circle(Vec3::new(0.0, -0.3 * r as f32, 0.0), 0.5 + 0.1 * r as f32))
            .collect();
        SkirtGrid::generate(&rings, segments, 22.5, &Affine3A::IDENTITY)
    }

    #[test]
    fn spring_count_matches_grid() {
        assert_eq!(build_springs(&grid(3, 8)).len(), 2 * 8 * 2);
        assert_eq!(build_springs(&grid(1, 8)).len(), 0);
    }

    #[test]
    fn only_first_ring_verticals_are_anchored() {
        let springs = build_springs(&grid(3, 6));
        for (i, spring) in springs.iter().enumerate() {
            let ring = i / (6 * 2) + 1;
            match spring.kind {
                SpringKind::Vertical => assert_eq!(spring.anchor_static, ring == 1),
                SpringKind::Horizontal => assert!(!spring.anchor_static),
            }
        }
    }

    #[test]
    fn rest_vector_matches_initial_span() {
        let g = grid(2, 4);
        for spring in build_springs(&g) {
            assert_eq!(spring.span(g.particles()), spring.rest);
            assert!((spring.rest.length() - spring.rest_length).abs() < 1e-6);
        }
    }

    #[test]
    fn elastic_force_is_zero_at_rest() {
        let mut g = grid(2, 4);
        let springs = build_springs(&g);
        for spring in &springs {
            spring.apply_elastic_force(g.particles_mut(), 1.0);
        }
        assert!(g.particles().iter().all(|p| p.force == Vec3::ZERO));
    }

    #[test]
    fn elastic_force_pulls_stretched_ends_together() {
        let mut g = grid(2, 4);
        let springs = build_springs(&g);
        let horizontal = springs.iter().find(|s| s.kind == SpringKind::Horizontal).unwrap();
        let dir = horizontal.rest.normalize();
        g.particles_mut()[horizontal.b].position += dir * 0.2;

        horizontal.apply_elastic_force(g.particles_mut(), 0.5);

        assert!(g.particles()[horizontal.a].force.dot(dir) > 0.0);
        assert!(g.particles()[horizontal.b].force.dot(dir) < 0.0);
    }

    #[test]
    fn anchored_end_receives_no_force() {
        let mut g = grid(2, 4);
        let springs = build_springs(&g);
        let vertical = &springs[0];
        assert!(vertical.anchor_static);
        g.particles_mut()[vertical.b].position.y -= 0.1;

        vertical.apply_elastic_force(g.particles_mut(), 1.0);

        assert_eq!(g.particles()[vertical.a].force, Vec3::ZERO);
        assert!(g.particles()[vertical.b].force.y > 0.0);
    }
}
