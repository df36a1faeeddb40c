//! Speed model: from combatant stats to queue priority.
//!
//! ```text
//! [ base agility ] → [ equipment ] → [ status ] → [ action speed ] → [ jitter ]
//! ```
//!
//! Every layer is a pure function; nothing here reads or writes scheduler
//! state.

pub mod bonus;
pub mod jitter;
pub mod speed;

pub use bonus::{Bonus, BonusStack, StatBounds};
pub use jitter::{JitterKind, JitterPolicy, PcgRng, RngOracle, compute_seed};
pub use speed::{Priority, SpeedModel};
