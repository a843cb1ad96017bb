//! Request dispatch and the per-intent handlers
//!
//! One envelope in, at most one envelope out. Session state rides in the
//! envelope's attributes and is returned wholesale for the caller to
//! persist; the handler itself owns nothing but its RNG.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::HandlerError;
use crate::events::GameEvent;
use crate::game::session::{Difficulty, Note, SessionAttributes};
use crate::ipc::protocol::{Intent, RequestBody, RequestEnvelope, ResponseEnvelope};
use crate::speech;

const WELCOME_PROMPT: &str = "Do you want to play Easy, Medium, or Hard?";
const DIFFICULTY_REPROMPT: &str = "Difficulties are Easy, Medium, or Hard. Please try again.";
const GUESS_REPROMPT: &str = "Guess the note.";

/// Typed view of an incoming intent, validated at the boundary
///
/// Slot values that are absent or outside the expected range surface as
/// `None`; the handlers recover those with re-prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillIntent {
    StartGame,
    Help,
    SelectDifficulty { difficulty: Option<Difficulty> },
    GuessNote { note: Option<Note> },
    EndSession,
}

impl SkillIntent {
    /// Map a wire intent onto the interaction model
    pub fn from_wire(intent: &Intent) -> Result<Self, HandlerError> {
        match intent.name.as_str() {
            "StartGame" => Ok(SkillIntent::StartGame),
            "AMAZON.HelpIntent" => Ok(SkillIntent::Help),
            "SelectDifficulty" => Ok(SkillIntent::SelectDifficulty {
                difficulty: intent
                    .slot_value("Difficulty")
                    .and_then(Difficulty::from_slot),
            }),
            "GuessNote" => Ok(SkillIntent::GuessNote {
                note: intent.slot_value("Note").and_then(Note::from_slot),
            }),
            "AMAZON.CancelIntent" | "AMAZON.StopIntent" => Ok(SkillIntent::EndSession),
            other => Err(HandlerError::UnsupportedIntent(other.to_string())),
        }
    }
}

/// The skill's request handler: dispatcher plus per-intent handlers
pub struct SkillHandler<R: Rng> {
    rng: R,
    expected_application_id: Option<String>,
    event_tx: Option<broadcast::Sender<GameEvent>>,
}

impl SkillHandler<StdRng> {
    /// Production handler over an OS-seeded RNG
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> SkillHandler<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            expected_application_id: None,
            event_tx: None,
        }
    }

    /// Reject envelopes whose application id differs from `id`
    pub fn with_application_id(mut self, id: impl Into<String>) -> Self {
        self.expected_application_id = Some(id.into());
        self
    }

    /// Emit a [`GameEvent`] on `tx` whenever the game state changes
    pub fn with_events(mut self, tx: broadcast::Sender<GameEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Route one envelope to its handler
    ///
    /// `SessionEndedRequest` is a notification: it yields no response.
    pub fn handle(
        &mut self,
        envelope: &RequestEnvelope,
    ) -> Result<Option<ResponseEnvelope>, HandlerError> {
        if let Some(expected) = &self.expected_application_id {
            let got = &envelope.session.application.application_id;
            if got != expected {
                return Err(HandlerError::ApplicationIdMismatch(got.clone()));
            }
        }

        let session = &envelope.session;
        if session.new {
            info!(
                request_id = %envelope.request.request_id(),
                session_id = %session.session_id,
                "session started"
            );
        }

        match &envelope.request {
            RequestBody::LaunchRequest { request_id } => {
                info!(%request_id, session_id = %session.session_id, "launch request");
                Ok(Some(self.welcome()))
            }
            RequestBody::IntentRequest { request_id, intent } => {
                info!(
                    %request_id,
                    session_id = %session.session_id,
                    intent = %intent.name,
                    "intent request"
                );
                self.on_intent(intent, &session.attributes).map(Some)
            }
            RequestBody::SessionEndedRequest { request_id } => {
                info!(%request_id, session_id = %session.session_id, "session ended");
                Ok(None)
            }
        }
    }

    fn on_intent(
        &mut self,
        intent: &Intent,
        attributes: &Option<SessionAttributes>,
    ) -> Result<ResponseEnvelope, HandlerError> {
        match SkillIntent::from_wire(intent)? {
            SkillIntent::StartGame | SkillIntent::Help => Ok(self.welcome()),
            SkillIntent::SelectDifficulty { difficulty } => Ok(self.select_difficulty(difficulty)),
            SkillIntent::GuessNote { note } => Ok(self.guess_note(note, attributes)),
            SkillIntent::EndSession => Ok(self.end_session(attributes)),
        }
    }

    /// Welcome prompt with fresh attributes; also the fallback whenever a
    /// guess arrives without game state
    fn welcome(&self) -> ResponseEnvelope {
        speech::envelope(
            SessionAttributes::default(),
            speech::plain_response("Welcome", WELCOME_PROMPT, Some(WELCOME_PROMPT), false),
        )
    }

    fn select_difficulty(&mut self, difficulty: Option<Difficulty>) -> ResponseEnvelope {
        let Some(difficulty) = difficulty else {
            // Absent or unrecognized tier: re-prompt, never an error
            return speech::envelope(
                SessionAttributes::default(),
                speech::plain_response(
                    "SelectDifficulty",
                    DIFFICULTY_REPROMPT,
                    Some(DIFFICULTY_REPROMPT),
                    false,
                ),
            );
        };

        let note = self.draw_note(difficulty);
        let attributes = SessionAttributes {
            difficulty: Some(difficulty),
            note: Some(note),
            correct: 0,
            total: 0,
        };
        self.emit(GameEvent::DifficultySelected { difficulty });

        let output = format!("You have chosen {difficulty}.");
        speech::envelope(
            attributes,
            speech::note_response("SelectDifficulty", &output, &output, false, note),
        )
    }

    fn guess_note(
        &mut self,
        guess: Option<Note>,
        attributes: &Option<SessionAttributes>,
    ) -> ResponseEnvelope {
        // A guess before any difficulty was chosen restarts the welcome flow
        let Some(attributes) = attributes else {
            return self.welcome();
        };
        let (Some(difficulty), Some(target)) = (attributes.difficulty, attributes.note) else {
            return self.welcome();
        };

        let Some(guess) = guess else {
            return speech::envelope(
                attributes.clone(),
                speech::note_response("GuessNote", GUESS_REPROMPT, GUESS_REPROMPT, false, target),
            );
        };

        let mut attributes = attributes.clone();
        attributes.total += 1;

        let correct = guess == target;
        // On a match the target is replaced; the clip for the note now in
        // play is what the response carries, so a correct guess reveals the
        // next target's sound but not its name.
        let current = if correct {
            attributes.correct += 1;
            let next = self.draw_note(difficulty);
            attributes.note = Some(next);
            next
        } else {
            target
        };
        self.emit(GameEvent::NoteGuessed { correct });

        let output = if correct {
            "Correct!"
        } else {
            "Incorrect. Guess again."
        };
        speech::envelope(
            attributes,
            speech::note_response("GuessNote", output, GUESS_REPROMPT, false, current),
        )
    }

    fn end_session(&self, attributes: &Option<SessionAttributes>) -> ResponseEnvelope {
        let stats = attributes.clone().unwrap_or_default();
        let accuracy = stats.accuracy();
        self.emit(GameEvent::SessionSummary { accuracy });

        let output = format!(
            "Your accuracy is {accuracy}% with {} out of {}",
            stats.correct, stats.total
        );
        speech::envelope(
            SessionAttributes::default(),
            speech::plain_response("Session Ended", &output, None, true),
        )
    }

    /// Uniform draw from the tier's note set
    fn draw_note(&mut self, difficulty: Difficulty) -> Note {
        let set = difficulty.notes();
        set[self.rng.gen_range(0..set.len())]
    }

    fn emit(&self, event: GameEvent) {
        debug!(%event, "game event");
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::protocol::{Application, OutputSpeech, Session, Slot};

    fn handler() -> SkillHandler<StdRng> {
        SkillHandler::new(StdRng::seed_from_u64(42))
    }

    fn envelope_with(
        request: RequestBody,
        attributes: Option<SessionAttributes>,
    ) -> RequestEnvelope {
        RequestEnvelope {
            session: Session {
                new: false,
                session_id: "session-1".to_string(),
                application: Application {
                    application_id: "app-1".to_string(),
                },
                attributes,
            },
            request,
        }
    }

    fn intent_request(name: &str, slots: &[(&str, &str)]) -> RequestBody {
        RequestBody::IntentRequest {
            request_id: "request-1".to_string(),
            intent: Intent {
                name: name.to_string(),
                slots: slots
                    .iter()
                    .map(|(name, value)| {
                        (
                            name.to_string(),
                            Slot {
                                value: Some(value.to_string()),
                            },
                        )
                    })
                    .collect(),
            },
        }
    }

    fn playing(difficulty: Difficulty, note: Note, correct: u32, total: u32) -> SessionAttributes {
        SessionAttributes {
            difficulty: Some(difficulty),
            note: Some(note),
            correct,
            total,
        }
    }

    fn speech_text(envelope: &ResponseEnvelope) -> &str {
        match &envelope.response.output_speech {
            OutputSpeech::PlainText { text } => text,
            OutputSpeech::Ssml { ssml } => ssml,
        }
    }

    fn must_respond(outcome: Result<Option<ResponseEnvelope>, HandlerError>) -> ResponseEnvelope {
        outcome.unwrap().expect("handler should produce a response")
    }

    #[test]
    fn test_launch_produces_welcome() {
        let mut handler = handler();
        let response = must_respond(handler.handle(&envelope_with(
            RequestBody::LaunchRequest {
                request_id: "request-1".to_string(),
            },
            None,
        )));

        assert_eq!(speech_text(&response), WELCOME_PROMPT);
        assert!(!response.response.should_end_session);
        assert_eq!(response.session_attributes, SessionAttributes::default());
    }

    #[test]
    fn test_start_game_and_help_match_launch_welcome() {
        let mut handler = handler();
        let launch = must_respond(handler.handle(&envelope_with(
            RequestBody::LaunchRequest {
                request_id: "request-1".to_string(),
            },
            None,
        )));
        let start = must_respond(handler.handle(&envelope_with(
            intent_request("StartGame", &[]),
            None,
        )));
        let help = must_respond(handler.handle(&envelope_with(
            intent_request("AMAZON.HelpIntent", &[]),
            None,
        )));

        assert_eq!(speech_text(&launch), speech_text(&start));
        assert_eq!(speech_text(&start), speech_text(&help));
        assert!(!start.response.should_end_session);
        assert!(!help.response.should_end_session);
    }

    #[test]
    fn test_select_difficulty_stores_note_from_tier() {
        for (slot, difficulty) in [
            ("easy", Difficulty::Easy),
            ("medium", Difficulty::Medium),
            ("hard", Difficulty::Hard),
        ] {
            let mut handler = handler();
            let response = must_respond(handler.handle(&envelope_with(
                intent_request("SelectDifficulty", &[("Difficulty", slot)]),
                None,
            )));

            let attrs = &response.session_attributes;
            assert_eq!(attrs.difficulty, Some(difficulty));
            let note = attrs.note.expect("a target note is drawn");
            assert!(difficulty.notes().contains(&note));
            assert_eq!(attrs.correct, 0);
            assert_eq!(attrs.total, 0);

            let ssml = speech_text(&response);
            assert!(ssml.contains(&format!("You have chosen {difficulty}.")));
            assert!(ssml.contains(&format!(
                "piano_{}5.mp3",
                note.letter().to_ascii_lowercase()
            )));
            assert!(!response.response.should_end_session);
        }
    }

    #[test]
    fn test_select_difficulty_without_slot_reprompts() {
        let mut handler = handler();
        let response = must_respond(handler.handle(&envelope_with(
            intent_request("SelectDifficulty", &[]),
            None,
        )));

        assert_eq!(speech_text(&response), DIFFICULTY_REPROMPT);
        assert!(response.session_attributes.note.is_none());
        assert!(!response.response.should_end_session);
    }

    #[test]
    fn test_select_difficulty_unrecognized_value_reprompts() {
        let mut handler = handler();
        let response = must_respond(handler.handle(&envelope_with(
            intent_request("SelectDifficulty", &[("Difficulty", "expert")]),
            None,
        )));

        assert_eq!(speech_text(&response), DIFFICULTY_REPROMPT);
        assert!(response.session_attributes.difficulty.is_none());
        assert!(response.session_attributes.note.is_none());
    }

    #[test]
    fn test_correct_guess_is_case_insensitive() {
        let mut handler = handler();
        let response = must_respond(handler.handle(&envelope_with(
            intent_request("GuessNote", &[("Note", "c")]),
            Some(playing(Difficulty::Easy, Note::C, 0, 0)),
        )));

        assert!(speech_text(&response).contains("Correct!"));
        let attrs = &response.session_attributes;
        assert_eq!(attrs.correct, 1);
        assert_eq!(attrs.total, 1);
        let next = attrs.note.expect("a replacement note is drawn");
        assert!(Difficulty::Easy.notes().contains(&next));
        assert!(!response.response.should_end_session);
    }

    #[test]
    fn test_correct_guess_plays_replacement_note() {
        let mut handler = handler();
        let response = must_respond(handler.handle(&envelope_with(
            intent_request("GuessNote", &[("Note", "D")]),
            Some(playing(Difficulty::Medium, Note::D, 0, 0)),
        )));

        // The audio cue is for the note now in play, not the one guessed
        let next = response.session_attributes.note.unwrap();
        assert!(speech_text(&response).contains(&format!(
            "piano_{}5.mp3",
            next.letter().to_ascii_lowercase()
        )));
    }

    #[test]
    fn test_incorrect_guess_keeps_target() {
        let mut handler = handler();
        let response = must_respond(handler.handle(&envelope_with(
            intent_request("GuessNote", &[("Note", "d")]),
            Some(playing(Difficulty::Easy, Note::C, 2, 3)),
        )));

        assert!(speech_text(&response).contains("Incorrect. Guess again."));
        let attrs = &response.session_attributes;
        assert_eq!(attrs.note, Some(Note::C));
        assert_eq!(attrs.correct, 2);
        assert_eq!(attrs.total, 4);
        // The unchanged target's clip still plays
        assert!(speech_text(&response).contains("piano_c5.mp3"));
    }

    #[test]
    fn test_guess_without_state_restarts_welcome() {
        let mut handler = handler();
        let response = must_respond(handler.handle(&envelope_with(
            intent_request("GuessNote", &[("Note", "c")]),
            None,
        )));

        assert_eq!(speech_text(&response), WELCOME_PROMPT);
        assert!(!response.response.should_end_session);
    }

    #[test]
    fn test_guess_with_invalid_slot_reprompts() {
        let mut handler = handler();
        let response = must_respond(handler.handle(&envelope_with(
            intent_request("GuessNote", &[("Note", "h")]),
            Some(playing(Difficulty::Hard, Note::B, 1, 2)),
        )));

        assert!(speech_text(&response).contains(GUESS_REPROMPT));
        let attrs = &response.session_attributes;
        assert_eq!(attrs.note, Some(Note::B));
        assert_eq!(attrs.correct, 1);
        assert_eq!(attrs.total, 2);
    }

    #[test]
    fn test_cancel_reports_accuracy() {
        let mut handler = handler();
        let response = must_respond(handler.handle(&envelope_with(
            intent_request("AMAZON.CancelIntent", &[]),
            Some(playing(Difficulty::Medium, Note::F, 3, 4)),
        )));

        assert_eq!(
            speech_text(&response),
            "Your accuracy is 75% with 3 out of 4"
        );
        assert!(response.response.should_end_session);
        assert_eq!(response.session_attributes, SessionAttributes::default());
    }

    #[test]
    fn test_stop_with_no_guesses_reports_zero() {
        let mut handler = handler();
        let response = must_respond(handler.handle(&envelope_with(
            intent_request("AMAZON.StopIntent", &[]),
            None,
        )));

        assert_eq!(
            speech_text(&response),
            "Your accuracy is 0% with 0 out of 0"
        );
        assert!(response.response.should_end_session);
    }

    #[test]
    fn test_session_ended_request_has_no_response() {
        let mut handler = handler();
        let outcome = handler.handle(&envelope_with(
            RequestBody::SessionEndedRequest {
                request_id: "request-1".to_string(),
            },
            Some(playing(Difficulty::Easy, Note::C, 1, 1)),
        ));
        assert!(outcome.unwrap().is_none());
    }

    #[test]
    fn test_unsupported_intent_fails() {
        let mut handler = handler();
        let outcome = handler.handle(&envelope_with(intent_request("OrderPizza", &[]), None));
        assert!(matches!(
            outcome,
            Err(HandlerError::UnsupportedIntent(name)) if name == "OrderPizza"
        ));
    }

    #[test]
    fn test_application_id_check() {
        let mut handler = handler().with_application_id("app-1");
        let accepted = handler.handle(&envelope_with(
            RequestBody::LaunchRequest {
                request_id: "request-1".to_string(),
            },
            None,
        ));
        assert!(accepted.is_ok());

        let mut strict = SkillHandler::new(StdRng::seed_from_u64(42)).with_application_id("other");
        let rejected = strict.handle(&envelope_with(
            RequestBody::LaunchRequest {
                request_id: "request-1".to_string(),
            },
            None,
        ));
        assert!(matches!(
            rejected,
            Err(HandlerError::ApplicationIdMismatch(id)) if id == "app-1"
        ));
    }

    #[test]
    fn test_seeded_draws_are_deterministic() {
        let request = intent_request("SelectDifficulty", &[("Difficulty", "hard")]);

        let mut first = SkillHandler::new(StdRng::seed_from_u64(7));
        let mut second = SkillHandler::new(StdRng::seed_from_u64(7));

        let a = must_respond(first.handle(&envelope_with(request.clone(), None)));
        let b = must_respond(second.handle(&envelope_with(request, None)));
        assert_eq!(a.session_attributes.note, b.session_attributes.note);
    }

    #[test]
    fn test_handler_emits_game_events() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut handler = SkillHandler::new(StdRng::seed_from_u64(42)).with_events(tx);

        must_respond(handler.handle(&envelope_with(
            intent_request("SelectDifficulty", &[("Difficulty", "easy")]),
            None,
        )));
        assert!(matches!(
            rx.try_recv().unwrap(),
            GameEvent::DifficultySelected {
                difficulty: Difficulty::Easy
            }
        ));

        must_respond(handler.handle(&envelope_with(
            intent_request("GuessNote", &[("Note", "a")]),
            Some(playing(Difficulty::Hard, Note::B, 0, 0)),
        )));
        assert!(matches!(
            rx.try_recv().unwrap(),
            GameEvent::NoteGuessed { correct: false }
        ));
    }
}
