//! Observability events emitted by the skill handlers
//!
//! The handler publishes one event per state-changing turn on a broadcast
//! channel; the daemon subscribes and logs them.

use serde::{Deserialize, Serialize};

use crate::game::Difficulty;

/// Events emitted as the game state changes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A difficulty tier was chosen and a first target note drawn
    DifficultySelected { difficulty: Difficulty },

    /// A guess was evaluated against the target note
    NoteGuessed { correct: bool },

    /// The user ended the game; accuracy is an integer percentage
    SessionSummary { accuracy: u32 },
}

impl std::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameEvent::DifficultySelected { difficulty } => {
                write!(f, "DIFFICULTY_SELECTED ({difficulty})")
            }
            GameEvent::NoteGuessed { correct } => {
                write!(f, "NOTE_GUESSED (correct={correct})")
            }
            GameEvent::SessionSummary { accuracy } => {
                write!(f, "SESSION_SUMMARY ({accuracy}%)")
            }
        }
    }
}
