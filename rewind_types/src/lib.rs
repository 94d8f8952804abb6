//! Snapshot types and the interpolation math used by the rewind timeline.
//!
//! A [FrameSnapshot] is the state of one entity captured on one simulation step. During
//! reverse playback two adjacent snapshots are blended with the functions in this crate:
//! positions, scales and velocities linearly, rotations along the shortest arc.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use error::*;
pub use interp::*;
pub use pose::*;
pub use snapshot::*;
pub use ultraviolet::{Bivec3, Rotor3, Vec3};

mod error;
mod interp;
mod pose;
mod snapshot;
