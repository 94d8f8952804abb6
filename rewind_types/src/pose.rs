use std::{slice, sync::Arc};

use ultraviolet::{Rotor3, Vec3};

/// A local transform: translation, rotation and non-uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation relative to the parent.
    pub translation: Vec3,
    /// Unit rotor relative to the parent.
    pub rotation: Rotor3,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zero(),
            rotation: Rotor3::identity(),
            scale: Vec3::one(),
        }
    }

    /// A transform with only a translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// A named bone and its local transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// The bone name.
    ///
    /// Names are shared between the many snapshots of one skeleton, so cloning a pose
    /// doesn't reallocate them.
    pub name: Arc<str>,
    /// Transform relative to the parent bone.
    pub transform: Transform,
}

impl Bone {
    /// Construct a bone.
    pub fn new(name: impl Into<Arc<str>>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }
}

/// The configuration of a skeleton at one instant, as an ordered list of bones.
///
/// Two poses can only be blended if they list the same bones in the same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    bones: Vec<Bone>,
}

impl Pose {
    /// Construct a pose from its bones, in skeleton order.
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { bones }
    }

    /// The bones of the pose, in skeleton order.
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Look up a bone by name.
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|bone| &*bone.name == name)
    }

    /// The number of bones.
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// True if the pose has no bones.
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Iterate over the bones in skeleton order.
    pub fn iter(&self) -> slice::Iter<'_, Bone> {
        self.bones.iter()
    }
}

impl FromIterator<Bone> for Pose {
    fn from_iter<T: IntoIterator<Item = Bone>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Pose {
    type Item = &'a Bone;
    type IntoIter = slice::Iter<'a, Bone>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
