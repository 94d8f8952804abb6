//! A small deterministic world of falling bodies used to drive the rewind engine.

use rewind_timeline::{ControllerId, EntityAccessor, EntityId};
use rewind_types::{Bone, MotionState, Pose, Rotor3, Transform, Vec3};

const GRAVITY: f32 = -9.81;
const RESTITUTION: f32 = 0.8;

/// A three-bone skeleton that sways as its body moves.
#[derive(Debug, Clone)]
struct Skeleton {
    phase: f32,
    /// The last pose handed back by the rewind engine.
    target_pose: Option<Pose>,
}

impl Skeleton {
    fn pose(&self) -> Pose {
        let sway = self.phase.sin() * 0.3;
        Pose::new(vec![
            Bone::new("hips", Transform::identity()),
            Bone::new(
                "spine",
                Transform {
                    translation: Vec3::new(0.0, 0.5, 0.0),
                    rotation: Rotor3::from_rotation_yz(sway),
                    scale: Vec3::one(),
                },
            ),
            Bone::new(
                "head",
                Transform {
                    translation: Vec3::new(0.0, 0.4, 0.0),
                    rotation: Rotor3::from_rotation_xy(-sway * 0.5),
                    scale: Vec3::one(),
                },
            ),
        ])
    }
}

#[derive(Debug, Clone)]
struct Body {
    motion: MotionState,
    skeleton: Option<Skeleton>,
    controller: ControllerId,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Rigid bodies under gravity bouncing on the plane y = 0.
#[derive(Debug, Default)]
pub struct DemoWorld {
    slots: Vec<Slot>,
    next_controller: u64,
}

impl DemoWorld {
    /// An empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body, returning its entity handle and the controller that owns it.
    pub fn spawn(
        &mut self,
        position: Vec3,
        velocity: Vec3,
        spin: f32,
        skeletal: bool,
    ) -> (EntityId, ControllerId) {
        let controller = ControllerId(self.next_controller);
        self.next_controller += 1;

        let body = Body {
            motion: MotionState {
                position,
                rotation: Rotor3::identity(),
                linear_velocity: velocity,
                angular_velocity: Vec3::new(0.0, spin, 0.0),
            },
            skeleton: skeletal.then(|| Skeleton {
                phase: 0.0,
                target_pose: None,
            }),
            controller,
        };

        let index = match self.slots.iter().position(|slot| slot.body.is_none()) {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.body = Some(body);
        (EntityId::new(index as u32, slot.generation), controller)
    }

    /// Remove a body. Its handle becomes stale.
    pub fn despawn(&mut self, entity: EntityId) {
        if let Some(slot) = self.slot_mut(entity) {
            slot.body = None;
            slot.generation += 1;
        }
    }

    /// Integrate every body forward by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        for body in self.slots.iter_mut().filter_map(|slot| slot.body.as_mut()) {
            let motion = &mut body.motion;
            motion.linear_velocity.y += GRAVITY * dt;
            motion.position += motion.linear_velocity * dt;
            if motion.position.y < 0.0 {
                motion.position.y = -motion.position.y;
                motion.linear_velocity.y = -motion.linear_velocity.y * RESTITUTION;
            }

            let turn = Rotor3::from_rotation_xz(motion.angular_velocity.y * dt);
            motion.rotation = (turn * motion.rotation).normalized();

            if let Some(skeleton) = &mut body.skeleton {
                skeleton.phase += motion.linear_velocity.mag() * dt;
            }
        }
    }

    /// The current position of a body.
    pub fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.body(entity).map(|body| body.motion.position)
    }

    /// The pose most recently applied to a skeletal body by the rewind engine.
    pub fn applied_pose(&self, entity: EntityId) -> Option<&Pose> {
        self.body(entity)
            .and_then(|body| body.skeleton.as_ref())
            .and_then(|skeleton| skeleton.target_pose.as_ref())
    }

    fn slot_mut(&mut self, entity: EntityId) -> Option<&mut Slot> {
        self.slots
            .get_mut(entity.index() as usize)
            .filter(|slot| slot.generation == entity.generation() && slot.body.is_some())
    }

    fn body(&self, entity: EntityId) -> Option<&Body> {
        self.slots
            .get(entity.index() as usize)
            .filter(|slot| slot.generation == entity.generation())
            .and_then(|slot| slot.body.as_ref())
    }

    fn body_mut(&mut self, entity: EntityId) -> Option<&mut Body> {
        self.slot_mut(entity).and_then(|slot| slot.body.as_mut())
    }
}

impl EntityAccessor for DemoWorld {
    fn is_alive(&self, entity: EntityId) -> bool {
        self.body(entity).is_some()
    }

    fn is_controller_alive(&self, controller: ControllerId) -> bool {
        self.slots
            .iter()
            .filter_map(|slot| slot.body.as_ref())
            .any(|body| body.controller == controller)
    }

    fn read_motion(&self, entity: EntityId) -> Option<MotionState> {
        self.body(entity).map(|body| body.motion)
    }

    fn read_pose(&self, entity: EntityId) -> Option<Pose> {
        self.body(entity)
            .and_then(|body| body.skeleton.as_ref())
            .map(Skeleton::pose)
    }

    fn write_motion(&mut self, entity: EntityId, motion: &MotionState) {
        if let Some(body) = self.body_mut(entity) {
            body.motion = *motion;
        }
    }

    fn write_pose(&mut self, entity: EntityId, pose: &Pose) {
        if let Some(skeleton) = self.body_mut(entity).and_then(|body| body.skeleton.as_mut()) {
            skeleton.target_pose = Some(pose.clone());
        }
    }
}
