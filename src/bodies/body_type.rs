/// Type of body, determining how it behaves in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Dynamic bodies are fully simulated (affected by forces and collisions)
    Dynamic,

    /// Kinematic bodies move by velocity but never accelerate
    Kinematic,

    /// Static bodies never move, never sleep, never wake
    Static,
}

impl BodyType {
    /// Returns whether this body type participates in velocity integration
    #[inline]
    pub fn is_mobile(&self) -> bool {
        !matches!(self, BodyType::Static)
    }
}
