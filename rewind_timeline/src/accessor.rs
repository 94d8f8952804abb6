use std::fmt;

use rewind_types::{MotionState, Pose};

/// A generational handle to an entity owned by the host simulation.
///
/// A destroyed entity's index may be reused with a new generation, so stale handles never
/// alias a live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Construct a handle.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index of the entity.
    pub fn index(self) -> u32 {
        self.index
    }

    /// The generation of the slot when this handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A handle to the host-side controller (e.g. a component) that registered an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerId(pub u64);

/// Reads and writes the live state of entities on behalf of the rewind engine.
///
/// This is the only way the engine touches the host simulation. All methods are called
/// from the thread that ticks the engine.
pub trait EntityAccessor {
    /// True if the entity still exists.
    fn is_alive(&self, entity: EntityId) -> bool;

    /// True if the controller that registered an entity still exists.
    fn is_controller_alive(&self, _controller: ControllerId) -> bool {
        true
    }

    /// Read the current rigid-body state.
    ///
    /// Returns None if the entity has no root transform to record.
    fn read_motion(&self, entity: EntityId) -> Option<MotionState>;

    /// Read the current skeletal pose for posed entities.
    fn read_pose(&self, _entity: EntityId) -> Option<Pose> {
        None
    }

    /// Overwrite the entity's position, rotation and velocities.
    fn write_motion(&mut self, entity: EntityId, motion: &MotionState);

    /// Hand a target pose to the animation system.
    fn write_pose(&mut self, _entity: EntityId, _pose: &Pose) {}
}
