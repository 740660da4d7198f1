//! Stretch limits: the one-pass length clamp applied after integration.

use crate::particle::Particle;
use crate::spring::{Spring, SpringKind};
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum ratio of current to rest length, per spring orientation.
///
/// Both ratios are at least 1.0 once the configuration is sanitized.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StretchLimits {
    pub vertical: f32,
    pub horizontal: f32,
}

impl StretchLimits {
    pub fn new(vertical: f32, horizontal: f32) -> Self {
        StretchLimits { vertical, horizontal }
    }

    #[inline]
    pub fn for_kind(&self, kind: SpringKind) -> f32 {
        match kind {
            SpringKind::Vertical => self.vertical,
            SpringKind::Horizontal => self.horizontal,
        }
    }

    /// Clamps both ratios to at least 1.0.
    pub fn sanitized(self) -> Self {
        StretchLimits {
            vertical: self.vertical.max(1.0),
            horizontal: self.horizontal.max(1.0),
        }
    }
}

impl Default for StretchLimits {
    fn default() -> Self {
        StretchLimits { vertical: 1.1, horizontal: 2.0 }
    }
}

impl Spring {
    /// Pulls the ends together when the spring is longer than
    /// `rest_length * limit`. Returns whether a correction was applied.
    ///
    /// The excess is split evenly between both ends, except for anchored
    /// springs where `b` takes all of it. Corrections are added to velocity
    /// as well as position.
    pub fn limit_stretch(&self, particles: &mut [Particle], limit: f32) -> bool {
        let span = self.span(particles);
        let len_sq = span.length_squared();
        let max_len = self.rest_length * limit;
        if len_sq <= max_len * max_len {
            return false;
        }

        let len = libm::sqrtf(len_sq);
        let dir = span.normalize_or_zero();
        let excess = len - max_len;
        let (a_delta, b_delta) = if self.anchor_static {
            (Vec3::ZERO, -dir * excess)
        } else {
            let half = dir * (excess * 0.5);
            (half, -half)
        };

        particles[self.a].displace(a_delta);
        particles[self.b].displace(b_delta);
        true
    }
}
