#![allow(missing_docs)]

use std::{error::Error, fmt, sync::Arc};

/// Reason two poses could not be blended.
#[derive(Debug, Clone, PartialEq)]
pub enum PoseError {
    BoneCountMismatch {
        from: usize,
        to: usize,
    },
    BoneNameMismatch {
        index: usize,
        from: Arc<str>,
        to: Arc<str>,
    },
    /// Only one of the two snapshots carries a pose.
    MissingPose,
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoseError::BoneCountMismatch { from, to } => {
                write!(f, "pose bone count mismatch: {} vs {}", from, to)
            }
            PoseError::BoneNameMismatch { index, from, to } => {
                write!(f, "pose bone {} mismatch: {} vs {}", index, from, to)
            }
            PoseError::MissingPose => write!(f, "only one of the blended frames has a pose"),
        }
    }
}

impl Error for PoseError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotError {
    NonPositiveStep(f32),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::NonPositiveStep(step) => {
                write!(f, "snapshot step duration must be positive, got {}", step)
            }
        }
    }
}

impl Error for SnapshotError {}
