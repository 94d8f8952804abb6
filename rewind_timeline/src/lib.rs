//! The rewind timeline, which records entity motion and plays it back in reverse.
//!
//! There are three components to the timeline:
//! - An [EntityAccessor] implemented by the host simulation, which reads and writes the live
//!   state of entities
//! - An [EntityHistory] per entity, a sliding window of recorded frames
//! - [RewindEngine] which owns the above and is ticked once per simulation step
//!
//! # Recording and playback
//!
//! While recording, every tick captures one [FrameSnapshot](rewind_types::FrameSnapshot)
//! per entity. A history holds at most [RewindConfig::recorded_window_seconds] of simulated
//! time, not a fixed number of frames, so variable tick rates are fine.
//!
//! While reversing, each entity's playback cursor moves backward by
//! `delta * speed` recorded seconds per tick. The two recorded frames on either side of the
//! cursor are blended and written back to the entity, and frames the cursor has passed are
//! dropped. Recording resumes from whatever is left once the rewind ends.
//!
//! A rewind ends when [RewindEngine::end_reverse] is called, or automatically once the
//! average number of frames left per recorded entity drops below
//! [RewindConfig::min_average_frames]. Histories that ran out count as zero frames.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use accessor::*;
pub use config::*;
pub use curve::*;
pub use engine::*;
pub use error::*;
pub use events::{EndReason, RewindEvent};
pub use history::*;

mod accessor;
mod config;
mod curve;
mod engine;
mod error;
mod events;
mod history;
