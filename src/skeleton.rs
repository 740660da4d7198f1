//! Minimal view of the host's bone hierarchy.
//!
//! The simulation only needs to walk one chain per root bone, read world
//! poses while binding, and write world poses every frame. Hosts with their
//! own scene graph implement [`Skeleton`]; [`BoneTree`] is a small standalone
//! implementation for tools and tests.

use crate::math::Pose;
use alloc::vec::Vec;
use core::fmt;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle of a bone inside a [`Skeleton`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneId(pub usize);

impl fmt::Display for BoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait Skeleton {
    /// World pose of `bone`, or `None` if the skeleton has no such bone.
    fn world_pose(&self, bone: BoneId) -> Option<Pose>;

    /// First child of `bone`. Chains are followed through first children only.
    fn first_child(&self, bone: BoneId) -> Option<BoneId>;

    /// Overwrites the world pose of `bone`. Unknown bones are ignored.
    fn set_world_pose(&mut self, bone: BoneId, pose: Pose);
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct Bone {
    pose: Pose,
    parent: Option<BoneId>,
    children: Vec<BoneId>,
}

/// Flat bone hierarchy storing world poses directly.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneTree {
    bones: Vec<Bone>,
}

impl BoneTree {
    pub fn new() -> Self {
        BoneTree { bones: Vec::new() }
    }

    /// Adds a bone at world `pose` under `parent` and returns its id.
    ///
    /// A parent id that does not exist is treated as no parent.
    pub fn add_bone(&mut self, parent: Option<BoneId>, pose: Pose) -> BoneId {
        let id = BoneId(self.bones.len());
        let parent = parent.filter(|p| p.0 < self.bones.len());
        if let Some(p) = parent {
            self.bones[p.0].children.push(id);
        }
        self.bones.push(Bone { pose, parent, children: Vec::new() });
        id
    }

    /// Adds a straight chain of bones, each a child of the previous one.
    /// Returns the ids from root to tip.
    pub fn add_chain(&mut self, parent: Option<BoneId>, poses: &[Pose]) -> Vec<BoneId> {
        let mut ids = Vec::with_capacity(poses.len());
        let mut parent = parent;
        for &pose in poses {
            let id = self.add_bone(parent, pose);
            ids.push(id);
            parent = Some(id);
        }
        ids
    }

    pub fn parent(&self, bone: BoneId) -> Option<BoneId> {
        self.bones.get(bone.0).and_then(|b| b.parent)
    }

    pub fn children(&self, bone: BoneId) -> &[BoneId] {
        self.bones.get(bone.0).map_or(&[], |b| b.children.as_slice())
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

impl Skeleton for BoneTree {
    fn world_pose(&self, bone: BoneId) -> Option<Pose> {
        self.bones.get(bone.0).map(|b| b.pose)
    }

    fn first_child(&self, bone: BoneId) -> Option<BoneId> {
        self.bones.get(bone.0).and_then(|b| b.children.first().copied())
    }

    fn set_world_pose(&mut self, bone: BoneId, pose: Pose) {
        if let Some(b) = self.bones.get_mut(bone.0) {
            b.pose = pose;
        }
    }
}
