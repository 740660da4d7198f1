//! Fixed-order integrator for the skirt particle grid.
//!
//! One step runs, in order: drive the root ring, accumulate shape forces,
//! accumulate elastic spring forces, integrate free particles, clamp stretch.
//! Each phase reads what the previous one wrote.

use crate::config::SkirtConfig;
use crate::constraint::StretchLimits;
use crate::grid::SkirtGrid;
use crate::observer::StepObserver;
use crate::spring::{Spring, ELASTIC_SCALE};
use glam::Affine3A;

/// Coefficients the integrator reads every step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Dynamics {
    pub inertia: f32,
    pub damping: f32,
    pub shape_stiffness: f32,
    pub elasticity: f32,
    pub stretch_limits: StretchLimits,
}

impl From<&SkirtConfig> for Dynamics {
    fn from(config: &SkirtConfig) -> Self {
        Dynamics {
            inertia: config.inertia,
            damping: config.damping,
            shape_stiffness: config.shape_stiffness,
            elasticity: config.elasticity,
            stretch_limits: config.stretch_limits,
        }
    }
}

impl Default for Dynamics {
    fn default() -> Self {
        Dynamics::from(&SkirtConfig::default())
    }
}

/// Runs the integrator phases over a grid and its springs.
pub struct Integrator<'a> {
    grid: &'a mut SkirtGrid,
    springs: &'a [Spring],
}

impl<'a> Integrator<'a> {
    pub fn new(grid: &'a mut SkirtGrid, springs: &'a [Spring]) -> Self {
        Integrator { grid, springs }
    }

    /// One full integrator pass. Returns the number of stretch corrections.
    pub fn step<O: StepObserver>(
        &mut self,
        root: &Affine3A,
        dynamics: &Dynamics,
        observer: &mut O,
    ) -> usize {
        if self.grid.is_empty() {
            return 0;
        }

        self.grid.drive_kinematic_ring(root);
        self.accumulate_shape_forces(root, dynamics.shape_stiffness);
        self.accumulate_elastic_forces(dynamics.elasticity);
        observer.on_forces();

        self.integrate(dynamics.damping, dynamics.inertia);
        observer.on_integrate();

        let corrections = self.enforce_stretch_limits(&dynamics.stretch_limits);
        observer.on_stretch_limits(corrections);
        corrections
    }

    /// Resets every force to the pull toward the particle's rest position.
    pub fn accumulate_shape_forces(&mut self, root: &Affine3A, stiffness: f32) {
        for p in self.grid.particles_mut() {
            p.force = (p.rest_position(root) - p.position) * stiffness;
        }
    }

    pub fn accumulate_elastic_forces(&mut self, elasticity: f32) {
        let k = elasticity * ELASTIC_SCALE;
        let particles = self.grid.particles_mut();
        for spring in self.springs {
            spring.apply_elastic_force(particles, k);
        }
    }

    /// Integrates every particle below the root ring. Ring 0 is kinematic and
    /// stays where `drive_kinematic_ring` put it.
    pub fn integrate(&mut self, damping: f32, inertia: f32) {
        for p in self.grid.free_particles_mut() {
            p.integrate(damping, inertia);
        }
    }

    /// Single sequential pass over the springs in array order.
    pub fn enforce_stretch_limits(&mut self, limits: &StretchLimits) -> usize {
        let particles = self.grid.particles_mut();
        self.springs
            .iter()
            .filter(|spring| spring.limit_stretch(particles, limits.for_kind(spring.kind)))
            .count()
    }
}
