//! Reflection domain models.

use chrono::{DateTime, Datelike, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::emotion::Emotion;

/// Prefix of the synthetic persona message inserted when a chat turn fails.
pub const AI_ERROR_PREFIX: &str = "죄송합니다, 메시지를 처리하는 중 오류가 발생했습니다.";

/// What the user recorded in the five-step input wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Situation {
    pub what_happened: String,
    pub emotions: Vec<Emotion>,
    /// Intensity on a 1-10 scale
    pub emotion_intensity: u8,
    pub what_you_did: String,
    pub how_you_wish_it_had_gone: String,
    pub persona_name: String,
    pub persona_tone: String,
    pub persona_personality: String,
}

impl Default for Situation {
    fn default() -> Self {
        Self {
            what_happened: String::new(),
            emotions: Vec::new(),
            emotion_intensity: 5,
            what_you_did: String::new(),
            how_you_wish_it_had_gone: String::new(),
            persona_name: String::new(),
            persona_tone: String::new(),
            persona_personality: String::new(),
        }
    }
}

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// A single turn in the simulated conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            text: text.into(),
        }
    }

    /// Persona-side message standing in for a failed reply.
    pub fn ai_error(detail: &str) -> Self {
        if detail.trim().is_empty() {
            Self::ai(AI_ERROR_PREFIX)
        } else {
            Self::ai(format!("{} ({})", AI_ERROR_PREFIX, detail))
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Retrospective report produced by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub suggested_phrases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counselor_advice: Option<Vec<String>>,
}

/// A situation together with its conversation and (eventually) its report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    /// Creation timestamp (RFC 3339), doubles as the backend session id
    pub id: String,
    /// Human-readable creation date
    pub date: String,
    #[serde(flatten)]
    pub situation: Situation,
    #[serde(default)]
    pub conversation: Vec<Message>,
    #[serde(default)]
    pub report: Option<Report>,
}

impl Reflection {
    /// Starts a reflection from a submitted situation.
    ///
    /// The conversation is empty and the report is absent until generation
    /// completes.
    pub fn new(situation: Situation, created_at: DateTime<Local>) -> Self {
        Self {
            id: created_at
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            date: format_korean_date(&created_at),
            situation,
            conversation: Vec::new(),
            report: None,
        }
    }

    /// Parsed creation time, used for recency ordering.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.id)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn has_emotion(&self, emotion: Emotion) -> bool {
        self.situation.emotions.contains(&emotion)
    }

    pub fn user_turns(&self) -> usize {
        self.conversation.iter().filter(|m| m.is_user()).count()
    }
}

/// `2024년 5월 3일` style date.
pub fn format_korean_date<Tz: chrono::TimeZone>(at: &DateTime<Tz>) -> String {
    format!("{}년 {}월 {}일", at.year(), at.month(), at.day())
}

/// One line per turn, `User:` / `AI:` prefixed.
pub fn format_transcript(conversation: &[Message]) -> String {
    conversation
        .iter()
        .map(|msg| {
            let who = match msg.sender {
                Sender::User => "User",
                Sender::Ai => "AI",
            };
            format!("{}: {}", who, msg.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
