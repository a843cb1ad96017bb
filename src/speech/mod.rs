//! Response building: plain-text and audio-annotated variants
//!
//! The audio variant embeds the clip for a note in SSML markup, in both the
//! primary and reprompt speech, so the user always hears the note in play.

use crate::game::{Note, SessionAttributes};
use crate::ipc::protocol::{Card, OutputSpeech, Reprompt, ResponseEnvelope, SkillResponse};

/// Placeholder origin for the note recordings. Point this at the real clip
/// host before deployment.
pub const AUDIO_HOST: &str = "HOSTNAME_HERE";

const VERSION: &str = "1.0";

/// Resolve the clip URL for a note: `<host>/piano_<letter>5.mp3`
pub fn audio_url(note: Note) -> String {
    format!(
        "{}/piano_{}5.mp3",
        AUDIO_HOST,
        note.letter().to_ascii_lowercase()
    )
}

fn ssml(text: &str, note: Note) -> String {
    format!(r#"<speak>{} <audio src="{}" /></speak>"#, text, audio_url(note))
}

/// Plain-text speechlet response with the standard card shape
pub fn plain_response(
    title: &str,
    output: &str,
    reprompt: Option<&str>,
    should_end_session: bool,
) -> SkillResponse {
    SkillResponse {
        output_speech: OutputSpeech::PlainText {
            text: output.to_string(),
        },
        card: Some(Card::simple(title, output)),
        reprompt: reprompt.map(|text| Reprompt {
            output_speech: OutputSpeech::PlainText {
                text: text.to_string(),
            },
        }),
        should_end_session,
    }
}

/// Audio-annotated speechlet response carrying `note`'s clip
pub fn note_response(
    title: &str,
    output: &str,
    reprompt: &str,
    should_end_session: bool,
    note: Note,
) -> SkillResponse {
    SkillResponse {
        output_speech: OutputSpeech::Ssml {
            ssml: ssml(output, note),
        },
        card: Some(Card::simple(title, output)),
        reprompt: Some(Reprompt {
            output_speech: OutputSpeech::Ssml {
                ssml: ssml(reprompt, note),
            },
        }),
        should_end_session,
    }
}

/// Wrap a speechlet response with the attributes the caller should persist
pub fn envelope(attributes: SessionAttributes, response: SkillResponse) -> ResponseEnvelope {
    ResponseEnvelope {
        version: VERSION.to_string(),
        session_attributes: attributes,
        response,
    }
}
