use crate::core::{BodyHandle, PhysicsCommands, PhysicsWorld};

/// A per-step hook run before and after island solving.
///
/// Controllers are registered as an explicit list at world setup; they are
/// taken out of the world for the duration of each call so they may freely
/// mutate it.
pub trait Controller: Send {
    /// Called after new contacts have been found, before narrow phase
    fn pre_update(&mut self, world: &mut PhysicsWorld, dt: f32);

    /// Called after all islands have been solved
    fn post_update(&mut self, world: &mut PhysicsWorld, dt: f32);
}

/// A collision response hook attached to a single body.
///
/// `on_collide` runs once per touching contact per tick; `post_collide` runs
/// once per tick with the number of contacts the behavior saw. Structural
/// changes go through the command queue, never directly into the world.
pub trait CollisionBehavior: Send {
    /// Called for every touching, enabled contact involving the owning body
    fn on_collide(
        &mut self,
        ours: BodyHandle,
        other: BodyHandle,
        dt: f32,
        commands: &mut PhysicsCommands,
    );

    /// Called once per tick with the number of `on_collide` invocations
    fn post_collide(&mut self, _hit_count: u32, _dt: f32, _commands: &mut PhysicsCommands) {}
}
