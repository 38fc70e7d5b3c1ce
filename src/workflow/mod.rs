pub mod actor_ctx;
pub mod status_machine;

pub use actor_ctx::ActorCtx;
pub use status_machine::{permitted_roles, Action, StatusMachine};
