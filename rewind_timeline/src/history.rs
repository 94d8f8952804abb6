use std::collections::VecDeque;

use rewind_types::{blend_snapshots, BlendedFrame, FrameSnapshot};

/// The outcome of advancing playback by one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStep {
    /// Number of frames removed from the newest end of the history.
    pub consumed: usize,
    /// The interpolated state to apply, if the cursor lies between the boundaries.
    pub frame: Option<BlendedFrame>,
}

/// The recorded frames of a single entity, with the cursor state used to play them back.
///
/// Frames are ordered oldest (front) to newest (back). Recording pushes at the back and
/// evicts from the front; playback consumes from the back.
///
/// During playback the cursor is bracketed by two adjacent frames. The right boundary is
/// always the newest remaining frame and the left boundary the one before it. The
/// boundary times are measured backward from where playback started.
#[derive(Debug, Clone, Default)]
pub struct EntityHistory {
    frames: VecDeque<FrameSnapshot>,
    recorded_seconds: f32,
    playback_cursor_seconds: f32,
    left_boundary_seconds: f32,
    right_boundary_seconds: f32,
    exhausted: bool,
}

impl EntityHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame, evicting the oldest frames until it fits in the window.
    ///
    /// A frame longer than the whole window is kept on its own. Returns the number of
    /// evicted frames.
    pub fn append(&mut self, snapshot: FrameSnapshot, window_seconds: f32) -> usize {
        let step = snapshot.step_seconds();
        let mut evicted = 0;
        while self.recorded_seconds + step > window_seconds {
            match self.frames.pop_front() {
                Some(oldest) => {
                    self.recorded_seconds -= oldest.step_seconds();
                    evicted += 1;
                }
                None => break,
            }
        }
        if self.frames.is_empty() {
            self.recorded_seconds = 0.0;
        }

        self.frames.push_back(snapshot);
        self.recorded_seconds += step;
        self.exhausted = false;
        evicted
    }

    /// Forget any playback progress. Consumed frames stay consumed.
    pub fn reset_playback(&mut self) {
        self.playback_cursor_seconds = 0.0;
        self.left_boundary_seconds = 0.0;
        self.right_boundary_seconds = 0.0;
    }

    /// Move the playback cursor `advance_seconds` further into the past.
    ///
    /// Frames the cursor has moved past are consumed. When only the two oldest frames
    /// remain the history is marked exhausted, the cursor is clamped to the oldest frame and
    /// that frame is returned. An exhausted history or one with fewer than two frames doesn't
    /// advance at all.
    pub fn step_playback(&mut self, advance_seconds: f32) -> PlaybackStep {
        let mut step = PlaybackStep {
            consumed: 0,
            frame: None,
        };
        if self.exhausted || self.frames.len() < 2 {
            return step;
        }

        self.playback_cursor_seconds += advance_seconds;
        self.left_boundary_seconds = self.right_boundary_seconds + self.newest_step_seconds();

        while self.playback_cursor_seconds > self.left_boundary_seconds {
            if self.frames.len() <= 2 {
                self.exhausted = true;
                break;
            }

            // The right frame is fully behind the cursor; the left frame becomes the new right
            if let Some(consumed) = self.frames.pop_back() {
                self.right_boundary_seconds += consumed.step_seconds();
                self.recorded_seconds -= consumed.step_seconds();
                step.consumed += 1;
            }
            self.left_boundary_seconds += self.newest_step_seconds();

            if self.frames.len() == 2 {
                self.exhausted = true;
                break;
            }
        }

        // Hold at the oldest pair rather than running past it
        if self.exhausted && self.playback_cursor_seconds > self.left_boundary_seconds {
            self.playback_cursor_seconds = self.left_boundary_seconds;
        }

        let cursor = self.playback_cursor_seconds;
        if self.right_boundary_seconds <= cursor && cursor <= self.left_boundary_seconds {
            let interval = self.left_boundary_seconds - self.right_boundary_seconds;
            let fraction = if interval > 0.0 {
                (cursor - self.right_boundary_seconds) / interval
            } else {
                0.0
            };
            let (right, left) = self.boundary_indices();
            step.frame = Some(blend_snapshots(
                &self.frames[right],
                &self.frames[left],
                fraction,
            ));
        }

        step
    }

    fn newest_step_seconds(&self) -> f32 {
        self.frames.back().map_or(0.0, FrameSnapshot::step_seconds)
    }

    /// Indices of the right (newer) and left (older) boundary frames.
    ///
    /// Only meaningful when there are at least two frames.
    fn boundary_indices(&self) -> (usize, usize) {
        let right = self.frames.len() - 1;
        (right, right - 1)
    }

    /// The right (newer) and left (older) frames bracketing the playback cursor.
    pub fn boundaries(&self) -> Option<(&FrameSnapshot, &FrameSnapshot)> {
        if self.frames.len() < 2 {
            return None;
        }
        let (right, left) = self.boundary_indices();
        Some((&self.frames[right], &self.frames[left]))
    }

    /// The stored frames, oldest first.
    pub fn frames(&self) -> impl Iterator<Item = &FrameSnapshot> {
        self.frames.iter()
    }

    /// The most recently recorded frame that hasn't been consumed.
    pub fn newest(&self) -> Option<&FrameSnapshot> {
        self.frames.back()
    }

    /// The oldest stored frame.
    pub fn oldest(&self) -> Option<&FrameSnapshot> {
        self.frames.front()
    }

    /// The number of stored frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if no frames are stored.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The sum of the step durations of the stored frames.
    pub fn recorded_seconds(&self) -> f32 {
        self.recorded_seconds
    }

    /// How far playback has rewound, in recorded seconds.
    pub fn playback_cursor_seconds(&self) -> f32 {
        self.playback_cursor_seconds
    }

    /// Cursor time of the left (older) boundary frame.
    pub fn left_boundary_seconds(&self) -> f32 {
        self.left_boundary_seconds
    }

    /// Cursor time of the right (newer) boundary frame.
    pub fn right_boundary_seconds(&self) -> f32 {
        self.right_boundary_seconds
    }

    /// True once playback has run out of older frames.
    ///
    /// Cleared by the next [append](Self::append).
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod test {
    use rewind_types::{MotionState, Vec3};

    use super::*;

    fn frame_at(x: f32, step: f32) -> FrameSnapshot {
        FrameSnapshot::new(MotionState::at_rest(Vec3::new(x, 0.0, 0.0)), step, None).unwrap()
    }

    fn summed_steps(history: &EntityHistory) -> f32 {
        history.frames().map(FrameSnapshot::step_seconds).sum()
    }

    /// History holding frames at x = 0, 1, .., count - 1, each 0.1 s long.
    fn recorded(count: usize) -> EntityHistory {
        let mut history = EntityHistory::new();
        for i in 0..count {
            history.append(frame_at(i as f32, 0.1), 100.0);
        }
        history
    }

    #[test]
    fn test_window_bound() {
        let mut history = EntityHistory::new();
        let steps = [0.016, 0.033, 0.1, 0.05, 0.25, 0.016];
        for i in 0..2000 {
            history.append(frame_at(i as f32, steps[i % steps.len()]), 2.0);
            assert!(history.recorded_seconds() <= 2.0 + 1e-4);
            assert!((history.recorded_seconds() - summed_steps(&history)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut history = EntityHistory::new();
        for i in 0..10 {
            let evicted = history.append(frame_at(i as f32, 0.25), 1.0);
            assert_eq!(evicted, if i < 4 { 0 } else { 1 });
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history.oldest().unwrap().motion().position.x, 6.0);
        assert_eq!(history.newest().unwrap().motion().position.x, 9.0);
        assert!((history.recorded_seconds() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_oversized_frame_is_kept_alone() {
        let mut history = recorded(5);
        let evicted = history.append(frame_at(99.0, 200.0), 100.0);
        assert_eq!(evicted, 5);
        assert_eq!(history.len(), 1);
        assert_eq!(history.recorded_seconds(), 200.0);
    }

    #[test]
    fn test_playback_interpolates_between_boundaries() {
        let mut history = recorded(10);

        let step = history.step_playback(0.05);
        assert_eq!(step.consumed, 0);
        let frame = step.frame.unwrap();
        assert!((frame.motion.position.x - 8.5).abs() < 1e-4);
        assert_eq!(history.right_boundary_seconds(), 0.0);
        assert!((history.left_boundary_seconds() - 0.1).abs() < 1e-6);

        let step = history.step_playback(0.1);
        assert_eq!(step.consumed, 1);
        assert_eq!(history.len(), 9);
        assert!((step.frame.unwrap().motion.position.x - 7.5).abs() < 1e-4);
        assert!((history.recorded_seconds() - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_playback_only_shrinks() {
        let mut history = recorded(40);
        let mut len = history.len();
        for _ in 0..100 {
            history.step_playback(0.037);
            assert!(history.len() <= len);
            len = history.len();
        }
    }

    #[test]
    fn test_exhaustion_holds() {
        let mut history = recorded(6);
        let step = history.step_playback(10.0);
        assert!(history.is_exhausted());
        assert_eq!(step.consumed, 4);
        assert_eq!(history.len(), 2);

        let step = history.step_playback(0.1);
        assert_eq!(step.consumed, 0);
        assert_eq!(step.frame, None);
        assert_eq!(history.len(), 2);

        history.append(frame_at(50.0, 0.1), 100.0);
        assert!(!history.is_exhausted());
    }

    #[test]
    fn test_overshoot_clamps_to_oldest_frame() {
        let mut history = recorded(6);
        let step = history.step_playback(10.0);
        assert!(history.is_exhausted());
        assert_eq!(history.len(), 2);
        assert_eq!(
            history.playback_cursor_seconds(),
            history.left_boundary_seconds()
        );
        // The oldest recorded frame is at x = 0
        let frame = step.frame.unwrap();
        assert_eq!(history.oldest().unwrap().motion().position.x, 0.0);
        assert!(frame.motion.position.x.abs() < 1e-5);
    }

    #[test]
    fn test_short_history_never_interpolates() {
        let mut history = recorded(1);
        let step = history.step_playback(0.05);
        assert_eq!(step.frame, None);
        assert_eq!(history.playback_cursor_seconds(), 0.0);
        assert!(!history.is_exhausted());
    }

    #[test]
    fn test_reset_playback() {
        let mut history = recorded(10);
        history.step_playback(0.25);
        assert!(history.playback_cursor_seconds() > 0.0);
        history.reset_playback();
        assert_eq!(history.playback_cursor_seconds(), 0.0);
        assert_eq!(history.left_boundary_seconds(), 0.0);
        assert_eq!(history.right_boundary_seconds(), 0.0);

        // Playback restarts from the newest remaining frame
        let frame = history.step_playback(0.0).frame.unwrap();
        assert_eq!(frame.motion.position, history.newest().unwrap().motion().position);
    }
}
