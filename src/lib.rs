//! Particle-based secondary motion for skirts and other ring-shaped garments.
//!
//! `flounce` simulates a skirt as a grid of particles laid out on horizontal
//! rings, held in shape by springs and a pull toward the authored rest pose,
//! kept out of the character's body with capsule collision, and mapped back
//! onto skeleton bones every frame.
//!
//! # Features
//!
//! - **Ring/segment topology**: elliptical rings, configurable segment count
//! - **Fixed-step integrator**: shape forces, elastic springs, damping, stretch limits
//! - **Capsule collision**: spheres, capsules, boxes and convex hulls (GJK/EPA)
//! - **Bone mapping**: bone chains follow particle quads with a fixed calibration offset
//! - **Observable**: Monitor step phases via the `StepObserver` trait
//! - **`no_std` compatible**: Works in embedded and WASM environments
//!
//! # Example
//!
//! ```
//! use flounce::{CollisionVolume, NoOpStepObserver, Ring, SkirtConfig, SkirtSimulation};
//! use glam::{Affine3A, Vec3};
//!
//! let config = SkirtConfig::new()
//!     .with_ring(Ring::circle(Vec3::ZERO, 0.5))
//!     .with_ring(Ring::circle(Vec3::new(0.0, -0.3, 0.0), 0.6));
//! let mut skirt = SkirtSimulation::new(config);
//! skirt.initialize(&Affine3A::IDENTITY).unwrap();
//!
//! let legs = [CollisionVolume::capsule_between(
//!     Vec3::new(0.2, -0.1, 0.0),
//!     Vec3::new(0.2, -0.9, 0.0),
//!     0.12,
//! )];
//! let report = skirt.step(&Affine3A::IDENTITY, &legs, &mut NoOpStepObserver);
//! assert_eq!(report.corrections, 0);
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod math;
pub mod particle;
pub mod grid;
pub mod spring;
pub mod constraint;
pub mod solver;
pub mod gjk;
pub mod collision;
pub mod skeleton;
pub mod binding;
pub mod debug;
pub mod skirt;
pub mod observer;
pub mod config;
pub mod error;

// Re-export primary API
pub use math::{look_rotation, Pose};
pub use particle::Particle;
pub use grid::{Ring, SkirtGrid};
pub use spring::{build_springs, Spring, SpringKind};
pub use constraint::StretchLimits;
pub use solver::{Dynamics, Integrator};
pub use collision::{
    resolve_collisions, Capsule, CollisionVolume, Penetration, PenetrationTestable, Shape,
};
pub use skeleton::{BoneId, BoneTree, Skeleton};
pub use binding::{bind_chain, BoneBinding, BoneChain, QuadAnchors};
pub use debug::DebugDraw;
pub use skirt::{SkirtSimulation, StepReport};
pub use config::SkirtConfig;
pub use observer::{StepObserver, NoOpStepObserver};
pub use error::SkirtError;
