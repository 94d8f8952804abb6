//! Blending between two captured frames.
//!
//! All functions take a weight `t` where 0 yields `from` and 1 yields `to`. Weights outside
//! of `[0, 1]` extrapolate for the linear blends.

use ultraviolet::{Lerp, Rotor3, Slerp, Vec3};

use crate::{BlendedFrame, FrameSnapshot, MotionState, Pose, PoseError, Transform};

/// Linearly interpolate two vectors.
pub fn lerp_vec3(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    from.lerp(to, t)
}

/// Spherically interpolate two unit rotors along the shortest arc.
///
/// Nearly parallel rotors fall back to a normalized lerp.
pub fn slerp_rotation(from: Rotor3, to: Rotor3, t: f32) -> Rotor3 {
    from.slerp(to, t).normalized()
}

/// Blend two local transforms: translation and scale linearly, rotation spherically.
pub fn blend_transform(from: &Transform, to: &Transform, t: f32) -> Transform {
    Transform {
        translation: lerp_vec3(from.translation, to.translation, t),
        rotation: slerp_rotation(from.rotation, to.rotation, t),
        scale: lerp_vec3(from.scale, to.scale, t),
    }
}

/// Blend two poses bone by bone.
///
/// The poses must list the same bones in the same order, otherwise an error describing
/// the first difference is returned and nothing is blended.
pub fn blend_pose(from: &Pose, to: &Pose, t: f32) -> Result<Pose, PoseError> {
    if from.len() != to.len() {
        return Err(PoseError::BoneCountMismatch {
            from: from.len(),
            to: to.len(),
        });
    }

    from.iter()
        .zip(to.iter())
        .enumerate()
        .map(|(index, (from_bone, to_bone))| {
            if from_bone.name != to_bone.name {
                return Err(PoseError::BoneNameMismatch {
                    index,
                    from: from_bone.name.clone(),
                    to: to_bone.name.clone(),
                });
            }
            Ok(crate::Bone {
                name: from_bone.name.clone(),
                transform: blend_transform(&from_bone.transform, &to_bone.transform, t),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Pose::new)
}

/// Blend two rigid-body states.
pub fn blend_motion(from: &MotionState, to: &MotionState, t: f32) -> MotionState {
    MotionState {
        position: lerp_vec3(from.position, to.position, t),
        rotation: slerp_rotation(from.rotation, to.rotation, t),
        linear_velocity: lerp_vec3(from.linear_velocity, to.linear_velocity, t),
        angular_velocity: lerp_vec3(from.angular_velocity, to.angular_velocity, t),
    }
}

/// Blend two captured frames, including their poses if they have any.
pub fn blend_snapshots(from: &FrameSnapshot, to: &FrameSnapshot, t: f32) -> BlendedFrame {
    let pose = match (from.pose(), to.pose()) {
        (None, None) => None,
        (Some(from_pose), Some(to_pose)) => Some(blend_pose(from_pose, to_pose, t)),
        _ => Some(Err(PoseError::MissingPose)),
    };
    BlendedFrame {
        motion: blend_motion(from.motion(), to.motion(), t),
        pose,
    }
}

#[cfg(test)]
mod test {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::Bone;

    fn assert_vec_near(a: Vec3, b: Vec3) {
        assert!((a - b).mag() < 1e-5, "{:?} != {:?}", a, b);
    }

    /// Rotors are equal as rotations if they agree up to sign.
    fn assert_rotor_near(a: Rotor3, b: Rotor3) {
        assert!(a.dot(b).abs() > 1.0 - 1e-5, "{:?} != {:?}", a, b);
    }

    fn frame(position: Vec3, rotation: Rotor3, pose: Option<Pose>) -> FrameSnapshot {
        let motion = MotionState {
            position,
            rotation,
            linear_velocity: position * 2.0,
            angular_velocity: Vec3::new(0.0, 1.0, 0.0),
        };
        FrameSnapshot::new(motion, 0.1, pose).unwrap()
    }

    #[test]
    fn test_blend_endpoints() {
        let right = frame(Vec3::new(1.0, 2.0, 3.0), Rotor3::identity(), None);
        let left = frame(
            Vec3::new(-4.0, 0.0, 8.0),
            Rotor3::from_rotation_xz(FRAC_PI_2),
            None,
        );

        let start = blend_snapshots(&right, &left, 0.0);
        assert_eq!(start.motion.position, right.motion().position);
        assert_eq!(start.motion.linear_velocity, right.motion().linear_velocity);
        assert_rotor_near(start.motion.rotation, right.motion().rotation);
        assert_eq!(start.pose, None);

        let end = blend_snapshots(&right, &left, 1.0);
        assert_vec_near(end.motion.position, left.motion().position);
        assert_vec_near(end.motion.linear_velocity, left.motion().linear_velocity);
        assert_rotor_near(end.motion.rotation, left.motion().rotation);
    }

    #[test]
    fn test_position_stays_on_segment() {
        let from = Vec3::new(0.0, 0.0, 0.0);
        let to = Vec3::new(10.0, -5.0, 2.5);
        for step in 0..=20 {
            let t = step as f32 / 20.0;
            let p = lerp_vec3(from, to, t);
            let along = (p - from).mag() + (to - p).mag();
            assert!((along - (to - from).mag()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_slerp_takes_shortest_arc() {
        let a = Rotor3::from_rotation_xz(0.2);
        let b = Rotor3::from_rotation_xz(0.6);
        let negated_b = b * -1.0;

        let mid = slerp_rotation(a, negated_b, 0.5);
        assert_rotor_near(mid, Rotor3::from_rotation_xz(0.4));
        assert!((mid.dot(mid) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_slerp_nearly_parallel() {
        let a = Rotor3::from_rotation_xz(0.1);
        let b = Rotor3::from_rotation_xz(0.1001);
        let mid = slerp_rotation(a, b, 0.5);
        assert!((mid.dot(mid) - 1.0).abs() < 1e-5);
        assert_rotor_near(mid, Rotor3::from_rotation_xz(0.10005));
    }

    #[test]
    fn test_blend_single_bone_pose() {
        let from = Pose::new(vec![Bone::new(
            "root",
            Transform::from_translation(Vec3::new(0.0, 0.0, 0.0)),
        )]);
        let to = Pose::new(vec![Bone::new(
            "root",
            Transform {
                translation: Vec3::new(2.0, 4.0, 6.0),
                rotation: Rotor3::identity(),
                scale: Vec3::new(3.0, 3.0, 3.0),
            },
        )]);

        let mid = blend_pose(&from, &to, 0.5).unwrap();
        assert_eq!(mid.len(), 1);
        let root = mid.bone("root").unwrap();
        assert_eq!(&*root.name, "root");
        assert_vec_near(root.transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_vec_near(root.transform.scale, Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_blend_mismatched_poses() {
        let root = Bone::new("root", Transform::identity());
        let spine = Bone::new("spine", Transform::identity());

        let one = Pose::new(vec![root.clone()]);
        let two = Pose::new(vec![root.clone(), spine.clone()]);
        assert_eq!(
            blend_pose(&one, &two, 0.5),
            Err(PoseError::BoneCountMismatch { from: 1, to: 2 })
        );

        let reordered = Pose::new(vec![spine, root]);
        assert!(matches!(
            blend_pose(&two, &reordered, 0.5),
            Err(PoseError::BoneNameMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_blend_snapshot_with_one_pose() {
        let pose = Pose::new(vec![Bone::new("root", Transform::identity())]);
        let posed = frame(Vec3::zero(), Rotor3::identity(), Some(pose));
        let bare = frame(Vec3::zero(), Rotor3::identity(), None);
        assert_eq!(
            blend_snapshots(&posed, &bare, 0.5).pose,
            Some(Err(PoseError::MissingPose))
        );
    }
}
