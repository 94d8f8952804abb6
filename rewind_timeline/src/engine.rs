use indexmap::{IndexMap, IndexSet};
use rewind_types::{FrameSnapshot, Pose};

use crate::{
    events::Listeners, ConfigError, ControllerId, EndReason, EntityAccessor, EntityHistory,
    EntityId, RewindConfig, RewindEvent,
};

/// The global mode of a [RewindEngine].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewindMode {
    /// Live state is captured into history every tick.
    Recording,
    /// History is consumed and written back to the entities every tick.
    Reversing,
}

/// Registration record for a tracked entity.
#[derive(Debug)]
struct TrackedEntity {
    controller: ControllerId,
    reversing: bool,
    /// The last successfully blended pose, for the animation system to pick up.
    target_pose: Option<Pose>,
    /// Created on the entity's first recorded tick.
    history: Option<EntityHistory>,
}

impl TrackedEntity {
    fn is_valid<A: EntityAccessor>(&self, accessor: &A, entity: EntityId) -> bool {
        accessor.is_alive(entity) && accessor.is_controller_alive(self.controller)
    }
}

/// Debug counters accumulated over the lifetime of an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewindStats {
    /// Frames appended to histories.
    pub frames_recorded: usize,
    /// Frames evicted from the old end of a history to respect the window.
    pub frames_evicted: usize,
    /// Frames consumed by reverse playback.
    pub frames_consumed: usize,
}

/// Records the motion of a set of entities and plays it back in reverse on demand.
///
/// The engine is driven by calling [tick](Self::tick) once per simulation step. While
/// recording, each tick appends one frame per entity to its history; while reversing, each
/// tick moves a per-entity playback cursor backward through the history and writes the
/// interpolated state back through the [EntityAccessor].
#[derive(Debug)]
pub struct RewindEngine<A: EntityAccessor> {
    accessor: A,
    config: RewindConfig,
    mode: RewindMode,
    entities: IndexMap<EntityId, TrackedEntity>,
    pending_removal: IndexSet<EntityId>,
    listeners: Listeners,
    stats: RewindStats,
}

impl<A: EntityAccessor> RewindEngine<A> {
    /// Construct an engine in recording mode with no tracked entities.
    pub fn new(accessor: A, config: RewindConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            accessor,
            config,
            mode: RewindMode::Recording,
            entities: IndexMap::new(),
            pending_removal: IndexSet::new(),
            listeners: Listeners::default(),
            stats: RewindStats::default(),
        })
    }

    /// Destruct into the accessor and config.
    pub fn into_parts(self) -> (A, RewindConfig) {
        (self.accessor, self.config)
    }

    /// Start tracking an entity.
    ///
    /// Registering an entity again replaces its controller handle but keeps its history.
    pub fn register(&mut self, entity: EntityId, controller: ControllerId) {
        self.pending_removal.shift_remove(&entity);

        if let Some(tracked) = self.entities.get_mut(&entity) {
            tracked.controller = controller;
            return;
        }

        let reversing = self.mode == RewindMode::Reversing;
        self.entities.insert(
            entity,
            TrackedEntity {
                controller,
                reversing,
                target_pose: None,
                history: None,
            },
        );
        if reversing {
            self.listeners.emit(RewindEvent::EntityReverseStarted(entity));
        }
    }

    /// Stop tracking an entity.
    ///
    /// The entity and its history are dropped at the start of the next tick.
    pub fn unregister(&mut self, entity: EntityId) {
        self.pending_removal.insert(entity);
    }

    /// Add a listener for mode transitions.
    pub fn add_listener(&mut self, listener: impl FnMut(&RewindEvent) + 'static) {
        self.listeners.add(Box::new(listener));
    }

    /// Replace the config.
    ///
    /// An invalid config is rejected and the current one is kept.
    pub fn set_config(&mut self, config: RewindConfig) -> Result<(), ConfigError> {
        if let Err(error) = config.validate() {
            tracing::warn!("rejected rewind config: {}", error);
            return Err(error);
        }
        self.config = config;
        Ok(())
    }

    /// The current config.
    pub fn config(&self) -> &RewindConfig {
        &self.config
    }

    /// The current mode.
    pub fn mode(&self) -> RewindMode {
        self.mode
    }

    /// True while reverse playback is active.
    pub fn is_reversing(&self) -> bool {
        self.mode == RewindMode::Reversing
    }

    /// True if the entity is tracked and currently reversing.
    pub fn is_entity_reversing(&self, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .map_or(false, |tracked| tracked.reversing)
    }

    /// True if the entity is tracked.
    pub fn is_tracked(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// The tracked entities, in registration order.
    pub fn tracked_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// The recorded history of an entity, if it has been recorded at least once.
    pub fn history(&self, entity: EntityId) -> Option<&EntityHistory> {
        self.entities
            .get(&entity)
            .and_then(|tracked| tracked.history.as_ref())
    }

    /// The last pose computed for the entity during reverse playback.
    ///
    /// Returns None, and logs a warning, if the entity isn't tracked or no valid pose has been
    /// computed yet.
    pub fn target_pose(&self, entity: EntityId) -> Option<&Pose> {
        let tracked = match self.entities.get(&entity) {
            Some(tracked) => tracked,
            None => {
                tracing::warn!("requested target pose of untracked entity {}", entity);
                return None;
            }
        };
        if tracked.target_pose.is_none() {
            tracing::warn!("no target pose available for entity {}", entity);
        }
        tracked.target_pose.as_ref()
    }

    /// Debug counters.
    pub fn stats(&self) -> RewindStats {
        self.stats
    }

    /// The accessor used to read and write entity state.
    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// Mutable access to the accessor, e.g. to advance the host simulation.
    pub fn accessor_mut(&mut self) -> &mut A {
        &mut self.accessor
    }

    /// Switch to reverse playback.
    ///
    /// Every valid tracked entity is flagged as reversing and notified.
    pub fn start_reverse(&mut self) {
        if self.mode == RewindMode::Reversing {
            return;
        }
        tracing::info!("starting rewind of {} entities", self.entities.len());
        self.mode = RewindMode::Reversing;
        self.listeners.emit(RewindEvent::ReverseStarted);
        self.set_entities_reversing(true);
    }

    /// Switch back to recording.
    ///
    /// Playback progress is discarded; frames already consumed stay consumed.
    pub fn end_reverse(&mut self) {
        self.finish_reverse(EndReason::Requested);
    }

    fn finish_reverse(&mut self, reason: EndReason) {
        if self.mode == RewindMode::Recording {
            return;
        }
        tracing::info!("ending rewind ({:?})", reason);
        self.mode = RewindMode::Recording;
        self.listeners.emit(RewindEvent::ReverseEnded(reason));
        self.set_entities_reversing(false);
    }

    fn set_entities_reversing(&mut self, reversing: bool) {
        for (&entity, tracked) in &mut self.entities {
            if !tracked.is_valid(&self.accessor, entity) {
                continue;
            }
            if let Some(history) = &mut tracked.history {
                history.reset_playback();
            }
            tracked.reversing = reversing;
            self.listeners.emit(if reversing {
                RewindEvent::EntityReverseStarted(entity)
            } else {
                RewindEvent::EntityReverseEnded(entity)
            });
        }
    }

    /// Advance by one simulation step of `delta_seconds`.
    pub fn tick(&mut self, delta_seconds: f32) {
        let _span = tracing::trace_span!("rewind_tick").entered();

        self.remove_pending();
        if self.entities.is_empty() {
            return;
        }
        if !(delta_seconds > 0.0 && delta_seconds.is_finite()) {
            tracing::warn!("ignoring rewind tick with step {}", delta_seconds);
            return;
        }

        match self.mode {
            RewindMode::Recording => self.record(delta_seconds),
            RewindMode::Reversing => self.play_back(delta_seconds),
        }
    }

    /// Drop entities that were unregistered or have been destroyed.
    fn remove_pending(&mut self) {
        for (&entity, tracked) in &self.entities {
            if !tracked.is_valid(&self.accessor, entity) {
                self.pending_removal.insert(entity);
            }
        }
        if self.pending_removal.is_empty() {
            return;
        }

        let mut removed = 0;
        for entity in self.pending_removal.drain(..) {
            if self.entities.shift_remove(&entity).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::warn!("removed {} unregistered or destroyed rewind entities", removed);
        }
    }

    fn record(&mut self, delta_seconds: f32) {
        let _span = tracing::trace_span!("forward_recording").entered();
        let window_seconds = self.config.recorded_window_seconds;

        for (&entity, tracked) in &mut self.entities {
            if !tracked.is_valid(&self.accessor, entity) {
                continue;
            }
            let motion = match self.accessor.read_motion(entity) {
                Some(motion) => motion,
                None => {
                    tracing::warn!("entity {} has no root transform to record", entity);
                    continue;
                }
            };
            let pose = self.accessor.read_pose(entity);
            let snapshot = match FrameSnapshot::new(motion, delta_seconds, pose) {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    tracing::warn!("skipping frame for entity {}: {}", entity, error);
                    continue;
                }
            };

            let history = tracked.history.get_or_insert_with(EntityHistory::new);
            history.reset_playback();
            self.stats.frames_evicted += history.append(snapshot, window_seconds);
            self.stats.frames_recorded += 1;
        }
    }

    fn play_back(&mut self, delta_seconds: f32) {
        let _span = tracing::trace_span!("reverse_playback").entered();

        // Exhausted and emptied histories count as zero frames left
        let mut histories = 0usize;
        let mut frames_left = 0usize;

        for (&entity, tracked) in &mut self.entities {
            if !tracked.is_valid(&self.accessor, entity) {
                continue;
            }
            let history = match &mut tracked.history {
                Some(history) => history,
                None => continue,
            };
            histories += 1;
            if history.is_empty() || history.is_exhausted() {
                continue;
            }

            let speed = self.config.speed_at(history.playback_cursor_seconds());
            let step = history.step_playback(delta_seconds * speed);
            self.stats.frames_consumed += step.consumed;
            if !history.is_exhausted() {
                frames_left += history.len();
            }

            let frame = match step.frame {
                Some(frame) => frame,
                None => continue,
            };
            self.accessor.write_motion(entity, &frame.motion);
            match frame.pose {
                Some(Ok(pose)) => {
                    self.accessor.write_pose(entity, &pose);
                    tracked.target_pose = Some(pose);
                }
                Some(Err(error)) => {
                    tracing::warn!("not applying pose to entity {}: {}", entity, error);
                }
                None => {}
            }
        }

        let average_frames_left = if histories > 0 {
            frames_left as f32 / histories as f32
        } else {
            0.0
        };
        if average_frames_left < self.config.min_average_frames {
            tracing::debug!(
                "average of {:.2} frames left across {} histories",
                average_frames_left,
                histories
            );
            self.finish_reverse(EndReason::HistoryExhausted);
        }
    }
}
