use std::fmt;

use crate::EntityId;

/// Why a rewind ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndReason {
    /// [end_reverse](crate::RewindEngine::end_reverse) was called.
    Requested,
    /// Too few recorded frames were left on average.
    HistoryExhausted,
}

/// A mode transition notification.
///
/// On a transition the engine-wide event is delivered first, followed by one event per
/// valid tracked entity in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewindEvent {
    /// The engine switched to reverse playback.
    ReverseStarted,
    /// The engine switched back to recording.
    ReverseEnded(EndReason),
    /// An entity started reversing.
    EntityReverseStarted(EntityId),
    /// An entity stopped reversing.
    EntityReverseEnded(EntityId),
}

pub(crate) type Listener = Box<dyn FnMut(&RewindEvent)>;

/// Listeners invoked synchronously on every [RewindEvent].
#[derive(Default)]
pub(crate) struct Listeners {
    listeners: Vec<Listener>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub(crate) fn emit(&mut self, event: RewindEvent) {
        tracing::trace!("rewind event {:?}", event);
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}
