pub mod broad_phase;
pub mod contact;
pub mod contact_manager;
pub mod contact_solver;
pub mod manifold;
pub mod narrow_phase;

pub use self::broad_phase::{BroadPhase, BruteForceBroadPhase, ProxyPair};
pub use self::contact::{Contact, ContactId};
pub use self::contact_manager::ContactManager;
pub use self::contact_solver::{ContactSolver, SolverBody};
pub use self::manifold::{Manifold, ManifoldPoint, MAX_MANIFOLD_POINTS};
pub use self::narrow_phase::{CircleNarrowPhase, NarrowPhase};
