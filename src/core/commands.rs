use crate::bodies::PhysicsBody;
use crate::core::BodyHandle;

use std::collections::{HashSet, VecDeque};

/// A structural mutation staged for the next flush point.
///
/// Body and contact collections are never mutated while a pass iterates
/// them; collision behaviors and controllers stage requests here instead,
/// and the world replays them in FIFO order at the two designated
/// checkpoints of the step.
pub enum PhysicsCommand {
    /// Insert a new body into the world
    AddBody(Box<PhysicsBody>),

    /// Remove a body, its fixtures, contacts and joints
    RemoveBody(BodyHandle),

    /// Wake a body up
    Wake(BodyHandle),

    /// Put a body to sleep
    Sleep(BodyHandle),
}

/// The deferred mutation queue for a physics world
#[derive(Default)]
pub struct PhysicsCommands {
    queue: VecDeque<PhysicsCommand>,
    removals: HashSet<BodyHandle>,
}

impl PhysicsCommands {
    /// Creates a new empty command queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a body for insertion at the next flush point
    pub fn add_body(&mut self, body: PhysicsBody) {
        self.queue.push_back(PhysicsCommand::AddBody(Box::new(body)));
    }

    /// Stages a body for removal at the next flush point
    pub fn remove_body(&mut self, handle: BodyHandle) {
        if self.removals.insert(handle) {
            self.queue.push_back(PhysicsCommand::RemoveBody(handle));
        }
    }

    /// Stages a wake request for the next flush point
    pub fn wake(&mut self, handle: BodyHandle) {
        self.queue.push_back(PhysicsCommand::Wake(handle));
    }

    /// Stages a sleep request for the next flush point
    pub fn sleep(&mut self, handle: BodyHandle) {
        self.queue.push_back(PhysicsCommand::Sleep(handle));
    }

    /// Returns whether a removal has been staged for the body. Passes that
    /// iterate contacts use this to skip the deleted side mid-tick.
    pub fn removal_queued(&self, handle: BodyHandle) -> bool {
        self.removals.contains(&handle)
    }

    /// Returns whether any commands are staged
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drains the staged commands in FIFO order
    pub(crate) fn drain(&mut self) -> Vec<PhysicsCommand> {
        self.removals.clear();
        self.queue.drain(..).collect()
    }
}
