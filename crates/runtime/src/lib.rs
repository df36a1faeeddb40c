//! Async battle-flow control on top of `battle-core`.
//!
//! The core scheduler is synchronous and never waits. This crate supplies
//! the waiting: a [`BattleSession`] awaits each acting combatant's decision
//! from a pluggable [`DecisionProvider`], races it against cancellation, and
//! republishes queue changes on a topic-based [`EventBus`] so a rendering
//! task can follow along.
//!
//! Modules are organized by responsibility:
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`session`] hosts the controller loop
pub mod api;
pub mod events;
pub mod session;

pub use api::{
    Aftermath, Decision, DecisionProvider, PassProvider, ProviderRegistry, Result,
    RuntimeError, ScriptedProvider, SessionHandle, TurnContext,
};
pub use events::{BattleEvent, BusObserver, Event, EventBus, QueueChange, Topic};
pub use session::{BattleSession, BattleSummary, SessionConfig};
