//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! the session loop can stay focused on orchestration.

pub mod errors;
pub mod handle;
pub mod providers;
pub mod registry;

pub use errors::{Result, RuntimeError};
pub use handle::SessionHandle;
pub use providers::{
    Aftermath, Decision, DecisionProvider, PassProvider, ScriptedProvider, TurnContext,
};
pub use registry::ProviderRegistry;
