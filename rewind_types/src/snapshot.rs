use ultraviolet::{Rotor3, Vec3};

use crate::{Pose, PoseError, SnapshotError};

/// The rigid-body state of an entity: where it is, how it is oriented, and how it moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    /// World position.
    pub position: Vec3,
    /// World rotation as a unit rotor.
    pub rotation: Rotor3,
    /// Linear velocity in units per second.
    pub linear_velocity: Vec3,
    /// Angular velocity in radians per second.
    pub angular_velocity: Vec3,
}

impl MotionState {
    /// A motionless state at the given position with no rotation.
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            position: Vec3::zero(),
            rotation: Rotor3::identity(),
            linear_velocity: Vec3::zero(),
            angular_velocity: Vec3::zero(),
        }
    }
}

/// One captured frame of an entity's state, plus the simulated time the frame represents.
///
/// A snapshot is immutable once constructed, and its step duration is always positive.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    motion: MotionState,
    step_seconds: f32,
    pose: Option<Pose>,
}

impl FrameSnapshot {
    /// Capture a snapshot that covers `step_seconds` of simulated time.
    ///
    /// Returns an error if the step is not a positive, finite number of seconds.
    pub fn new(
        motion: MotionState,
        step_seconds: f32,
        pose: Option<Pose>,
    ) -> Result<Self, SnapshotError> {
        if !(step_seconds > 0.0 && step_seconds.is_finite()) {
            return Err(SnapshotError::NonPositiveStep(step_seconds));
        }
        Ok(Self {
            motion,
            step_seconds,
            pose,
        })
    }

    /// The captured rigid-body state.
    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    /// The simulated seconds covered by this frame.
    pub fn step_seconds(&self) -> f32 {
        self.step_seconds
    }

    /// The captured skeletal pose, for posed entities.
    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }
}

/// The result of blending two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedFrame {
    /// The blended rigid-body state.
    pub motion: MotionState,
    /// The blended pose.
    ///
    /// `None` if neither snapshot carries a pose. An error marks a pose that could not be
    /// blended; it must not be applied.
    pub pose: Option<Result<Pose, PoseError>>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rejects_non_positive_step() {
        let motion = MotionState::default();
        assert_eq!(
            FrameSnapshot::new(motion, 0.0, None),
            Err(SnapshotError::NonPositiveStep(0.0))
        );
        assert!(FrameSnapshot::new(motion, -0.1, None).is_err());
        assert!(FrameSnapshot::new(motion, f32::NAN, None).is_err());
        assert!(FrameSnapshot::new(motion, f32::INFINITY, None).is_err());
        assert_eq!(
            FrameSnapshot::new(motion, 0.1, None).unwrap().step_seconds(),
            0.1
        );
    }
}
