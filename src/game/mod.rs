//! Game model and request dispatch
//!
//! `session` holds the typed per-session state (difficulty tiers, notes,
//! guess counters); `handler` routes request envelopes through the
//! per-intent handlers.

mod handler;
mod session;

pub use handler::{SkillHandler, SkillIntent};
pub use session::{Difficulty, Note, SessionAttributes};
