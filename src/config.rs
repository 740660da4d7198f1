//! Configuration for a skirt simulation.

use crate::constraint::StretchLimits;
use crate::error::SkirtError;
use crate::grid::Ring;
use crate::skeleton::BoneId;
use alloc::vec::Vec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fewest segments a ring may be split into.
pub const MIN_SEGMENTS: usize = 4;

/// Everything the host configures about one skirt.
///
/// # Builder Pattern
/// ```
/// use flounce::config::SkirtConfig;
/// use flounce::grid::Ring;
/// use glam::Vec3;
///
/// let config = SkirtConfig::new()
///     .with_ring(Ring::circle(Vec3::ZERO, 0.5))
///     .with_ring(Ring::circle(Vec3::new(0.0, -0.3, 0.0), 0.6))
///     .with_segments(8)
///     .with_damping(0.1)
///     .with_collision_radius(0.15);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SkirtConfig {
    /// Cross-sections from the attachment root (ring 0) downward.
    pub rings: Vec<Ring>,
    /// Particles per ring. At least 4. Default: 8.
    pub segments: usize,
    /// Angle of segment 0, in degrees. Default: 22.5.
    pub starting_angle: f32,
    /// How much of the accumulated force becomes velocity, [0, 1]. Default: 1.0.
    pub inertia: f32,
    /// Fraction of velocity lost every step, [0, 1]. Default: 0.1.
    pub damping: f32,
    /// Pull toward the authored rest shape, >= 0. Default: 0.2.
    pub shape_stiffness: f32,
    /// Spring elasticity, [0, 1]. Default: 0.1.
    pub elasticity: f32,
    /// Maximum stretch ratios. Default: 1.1 vertical, 2.0 horizontal.
    pub stretch_limits: StretchLimits,
    /// Radius of the capsules swept along ring edges. Default: 0.15.
    pub collision_radius: f32,
    /// First bone of every chain driven by the skirt.
    pub bone_roots: Vec<BoneId>,
}

impl SkirtConfig {
    /// Create a new config with default values and no rings.
    pub fn new() -> Self {
        SkirtConfig {
            rings: Vec::new(),
            segments: 8,
            starting_angle: 22.5,
            inertia: 1.0,
            damping: 0.1,
            shape_stiffness: 0.2,
            elasticity: 0.1,
            stretch_limits: StretchLimits::default(),
            collision_radius: 0.15,
            bone_roots: Vec::new(),
        }
    }

    /// Set the ring list, replacing any rings already added.
    pub fn with_rings(mut self, rings: Vec<Ring>) -> Self {
        self.rings = rings;
        self
    }

    /// Append a ring below the existing ones.
    pub fn with_ring(mut self, ring: Ring) -> Self {
        self.rings.push(ring);
        self
    }

    /// Set the number of segments per ring.
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }

    /// Set the angle of segment 0, in degrees.
    pub fn with_starting_angle(mut self, degrees: f32) -> Self {
        self.starting_angle = degrees;
        self
    }

    /// Set the inertia factor.
    pub fn with_inertia(mut self, inertia: f32) -> Self {
        self.inertia = inertia;
        self
    }

    /// Set the damping factor.
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// Set the pull toward the rest shape.
    pub fn with_shape_stiffness(mut self, stiffness: f32) -> Self {
        self.shape_stiffness = stiffness;
        self
    }

    /// Set the spring elasticity.
    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }

    /// Set the vertical and horizontal stretch ratios.
    pub fn with_stretch_limits(mut self, vertical: f32, horizontal: f32) -> Self {
        self.stretch_limits = StretchLimits::new(vertical, horizontal);
        self
    }

    /// Set the radius of the edge capsules.
    pub fn with_collision_radius(mut self, radius: f32) -> Self {
        self.collision_radius = radius;
        self
    }

    /// Add the root bone of a chain to drive.
    pub fn with_bone_root(mut self, bone: BoneId) -> Self {
        self.bone_roots.push(bone);
        self
    }

    /// Clamps every coefficient into its supported range.
    ///
    /// NaN coefficients fall back to the lower bound of their range.
    pub fn sanitized(mut self) -> Self {
        self.segments = self.segments.max(MIN_SEGMENTS);
        self.inertia = clamp01(self.inertia);
        self.damping = clamp01(self.damping);
        self.shape_stiffness = at_least(self.shape_stiffness, 0.0);
        self.elasticity = clamp01(self.elasticity);
        self.stretch_limits = StretchLimits::new(
            at_least(self.stretch_limits.vertical, 1.0),
            at_least(self.stretch_limits.horizontal, 1.0),
        );
        self.collision_radius = at_least(self.collision_radius, 0.0);
        self
    }

    /// Reports what clamping cannot repair.
    pub fn validate(&self) -> Result<(), SkirtError> {
        if self.rings.is_empty() {
            return Err(SkirtError::NoRings);
        }
        if self.segments < MIN_SEGMENTS {
            return Err(SkirtError::TooFewSegments { segments: self.segments });
        }
        Ok(())
    }

    /// Whether switching to `other` requires rebuilding the particle grid.
    pub fn topology_differs(&self, other: &SkirtConfig) -> bool {
        self.segments != other.segments
            || self.rings != other.rings
            || self.starting_angle != other.starting_angle
    }
}

impl Default for SkirtConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp01(value: f32) -> f32 {
    at_least(value, 0.0).min(1.0)
}

// `f32::max` returns the other operand for NaN.
fn at_least(value: f32, min: f32) -> f32 {
    value.max(min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn defaults_match_documented_values() {
        let c = SkirtConfig::default();
        assert_eq!(c.segments, 8);
        assert_eq!(c.starting_angle, 22.5);
        assert_eq!(c.inertia, 1.0);
        assert_eq!(c.damping, 0.1);
        assert_eq!(c.shape_stiffness, 0.2);
        assert_eq!(c.elasticity, 0.1);
        assert_eq!(c.stretch_limits, StretchLimits::new(1.1, 2.0));
        assert_eq!(c.collision_radius, 0.15);
    }

    #[test]
    fn sanitized_clamps_every_range() {
        let c = SkirtConfig::new()
            .with_segments(2)
            .with_inertia(1.5)
            .with_damping(-0.2)
            .with_shape_stiffness(-1.0)
            .with_elasticity(3.0)
            .with_stretch_limits(0.5, 0.9)
            .with_collision_radius(-0.1)
            .sanitized();
        assert_eq!(c.segments, 4);
        assert_eq!(c.inertia, 1.0);
        assert_eq!(c.damping, 0.0);
        assert_eq!(c.shape_stiffness, 0.0);
        assert_eq!(c.elasticity, 1.0);
        assert_eq!(c.stretch_limits, StretchLimits::new(1.0, 1.0));
        assert_eq!(c.collision_radius, 0.0);
    }

    #[test]
    fn sanitized_replaces_nan() {
        let c = SkirtConfig::new().with_damping(f32::NAN).sanitized();
        assert_eq!(c.damping, 0.0);
    }

    #[test]
    fn validate_rejects_missing_rings() {
        assert_eq!(SkirtConfig::new().validate(), Err(SkirtError::NoRings));
        let c = SkirtConfig::new().with_ring(Ring::circle(Vec3::ZERO, 0.5));
        assert_eq!(c.validate(), Ok(()));
        assert_eq!(
            c.clone().with_segments(3).validate(),
            Err(SkirtError::TooFewSegments { segments: 3 })
        );
    }

    #[test]
    fn topology_changes_are_detected() {
        let base = SkirtConfig::new().with_ring(Ring::circle(Vec3::ZERO, 0.5));
        assert!(!base.topology_differs(&base.clone().with_damping(0.5)));
        assert!(base.topology_differs(&base.clone().with_segments(12)));
        assert!(base.topology_differs(&base.clone().with_starting_angle(0.0)));
        assert!(base.topology_differs(&base.clone().with_ring(Ring::circle(Vec3::NEG_Y, 0.6))));
    }
}
