//! Session-scoped game state: difficulty tiers, notes, and guess counters
//!
//! State travels in the `sessionAttributes` mapping the platform hands back
//! with every turn; nothing is held in process memory between turns.

use serde::{Deserialize, Serialize};

/// The three difficulty tiers, each with its own allowed note set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Three notes: C, D, E
    Easy,
    /// Five notes: C through G
    Medium,
    /// The full octave letters: A through G
    Hard,
}

impl Difficulty {
    /// The notes a target may be drawn from at this tier
    pub fn notes(self) -> &'static [Note] {
        use Note::*;
        match self {
            Difficulty::Easy => &[C, D, E],
            Difficulty::Medium => &[C, D, E, F, G],
            Difficulty::Hard => &[A, B, C, D, E, F, G],
        }
    }

    /// Parse a `Difficulty` slot value. Tier names arrive lowercase from
    /// the interaction model's custom slot; anything else is unrecognized.
    pub fn from_slot(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A musical note, one of the seven letter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Note {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Note {
    /// Parse a `Note` slot value: a single letter A-G, either case
    pub fn from_slot(value: &str) -> Option<Self> {
        let mut chars = value.chars();
        let letter = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        match letter.to_ascii_uppercase() {
            'A' => Some(Note::A),
            'B' => Some(Note::B),
            'C' => Some(Note::C),
            'D' => Some(Note::D),
            'E' => Some(Note::E),
            'F' => Some(Note::F),
            'G' => Some(Note::G),
            _ => None,
        }
    }

    /// Uppercase letter name
    pub fn letter(self) -> char {
        match self {
            Note::A => 'A',
            Note::B => 'B',
            Note::C => 'C',
            Note::D => 'D',
            Note::E => 'E',
            Note::F => 'F',
            Note::G => 'G',
        }
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Per-session attributes, round-tripped through the response envelope
///
/// The note, when present, is always a member of the stored tier's note
/// set: both are only ever written together by the difficulty and guess
/// handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub total: u32,
}

impl SessionAttributes {
    /// Accuracy as an integer percentage; 0 before any guess was made
    pub fn accuracy(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            self.correct * 100 / self.total
        }
    }
}
