//! note-trainer: request handler for a note-guessing voice skill
//!
//! The skill plays a piano note and the user names it. This crate provides:
//! - Wire envelope types matching the platform's request/response records
//! - Typed session state over difficulty tiers and target notes
//! - Plain-text and audio-annotated (SSML) response building
//! - A Unix-socket harness for exercising the handler locally
//!
//! Session state travels inside each envelope's attributes; nothing is held
//! in process memory between turns. Host-platform delivery, caller
//! authentication, and audio hosting are external collaborators.

pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod ipc;
pub mod lifecycle;
pub mod speech;

pub use error::HandlerError;
pub use game::{Difficulty, Note, SessionAttributes, SkillHandler, SkillIntent};
pub use ipc::{RequestEnvelope, ResponseEnvelope};
