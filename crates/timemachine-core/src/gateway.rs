//! Backend gateway contract.
//!
//! The reflection backend is an opaque JSON service. This module defines the
//! request/response shapes the client exchanges with it and the
//! [`ReflectionGateway`] trait the HTTP implementation satisfies.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reflection::{Emotion, Message, Reflection, Report, Situation, format_korean_date, format_transcript};
use crate::user::Credentials;

/// Fallback shown when the backend gives no readable detail.
pub const GENERIC_ERROR_MESSAGE: &str = "요청 처리 중 오류가 발생했습니다.";

/// Fallback when report generation did not finish and gave no reason.
pub const REPORT_NOT_GENERATED_MESSAGE: &str = "보고서를 생성하지 못했습니다.";

/// Report status value meaning the report is ready.
pub const REPORT_STATUS_FINISHED: &str = "finished";

/// Tagged gateway failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered 401; the stored session is no longer valid.
    #[error("session expired")]
    Unauthorized,

    /// Any other non-success status.
    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    /// The request was rejected before being sent.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The backend accepted the request but did not produce a report.
    #[error("report not generated: {0}")]
    ReportNotReady(String),
}

impl GatewayError {
    pub fn http(status: u16, detail: impl Into<String>) -> Self {
        Self::Http {
            status,
            detail: detail.into(),
        }
    }

    /// Raw detail without the kind prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Network(detail)
            | Self::Validation(detail)
            | Self::Decode(detail)
            | Self::ReportNotReady(detail) => detail.clone(),
            Self::Http { detail, .. } => detail.clone(),
            Self::Unauthorized => "세션이 만료되었습니다. 다시 로그인해주세요.".to_string(),
        }
    }

    /// Detail suitable for display, falling back to the generic message.
    pub fn user_message(&self) -> String {
        let detail = self.detail();
        if detail.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            detail
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

// ============================================================================
// Authentication contracts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub login_id: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginIdAvailability {
    pub login_id: String,
    pub available: bool,
}

/// Response of the current-profile endpoint; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub login_id: Option<String>,
}

// ============================================================================
// Reflection contracts
// ============================================================================

/// Chat-turn request: the situation, the persona, the prior conversation and
/// the new user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReplyRequest {
    pub what_happened: String,
    pub emotions: Vec<Emotion>,
    pub what_you_did: String,
    pub how_you_wish_it_had_gone: String,
    pub persona_name: String,
    pub persona_tone: String,
    pub persona_personality: String,
    pub conversation: Vec<Message>,
    pub message: String,
}

impl ChatReplyRequest {
    pub fn new(situation: &Situation, conversation: Vec<Message>, message: impl Into<String>) -> Self {
        Self {
            what_happened: situation.what_happened.clone(),
            emotions: situation.emotions.clone(),
            what_you_did: situation.what_you_did.clone(),
            how_you_wish_it_had_gone: situation.how_you_wish_it_had_gone.clone(),
            persona_name: situation.persona_name.clone(),
            persona_tone: situation.persona_tone.clone(),
            persona_personality: situation.persona_personality.clone(),
            conversation,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReplyResponse {
    #[serde(default)]
    pub reply: String,
}

/// Report-generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub session_id: String,
    pub conversation_context: String,
}

impl ReportRequest {
    /// Builds the request for a finished reflection.
    pub fn for_reflection(reflection: &Reflection) -> Self {
        Self {
            session_id: reflection.id.clone(),
            conversation_context: build_conversation_context(reflection),
        }
    }
}

/// Situation fields followed by the transcript, one section per line.
pub fn build_conversation_context(reflection: &Reflection) -> String {
    let situation = &reflection.situation;
    let emotions = situation
        .emotions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let mut sections = vec![
        format!("What Happened: {}", situation.what_happened),
        format!("Emotions: {}", emotions),
        format!("What You Did: {}", situation.what_you_did),
        format!("Desired Outcome: {}", situation.how_you_wish_it_had_gone),
    ];
    let transcript = format_transcript(&reflection.conversation);
    if !transcript.is_empty() {
        sections.push("Conversation:".to_string());
        sections.push(transcript);
    }
    sections.join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportJson {
    pub summary: Option<String>,
    pub key_insights: Option<Vec<String>>,
    pub suggested_phrases: Option<Vec<String>>,
    pub counselor_advice: Option<Vec<String>>,
}

impl From<ReportJson> for Report {
    fn from(json: ReportJson) -> Self {
        Report {
            summary: json.summary.unwrap_or_default(),
            key_insights: json.key_insights.unwrap_or_default(),
            suggested_phrases: json.suggested_phrases.unwrap_or_default(),
            counselor_advice: json.counselor_advice,
        }
    }
}

/// A report record as returned by generation and history endpoints.
///
/// History entries may also carry the situation fields the report was built
/// from; they are optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportRecord {
    #[serde(default)]
    pub report_id: Option<i64>,
    pub session_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub report_json: Option<ReportJson>,
    #[serde(default)]
    pub report_md: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub situation: Situation,
    #[serde(default)]
    pub conversation: Vec<Message>,
}

impl ReportRecord {
    pub fn is_finished(&self) -> bool {
        self.status == REPORT_STATUS_FINISHED
    }

    /// The finished report, or why there is none.
    pub fn into_report(self) -> GatewayResult<Report> {
        if !self.is_finished() {
            return Err(GatewayError::ReportNotReady(
                self.failure_reason
                    .filter(|reason| !reason.trim().is_empty())
                    .unwrap_or_else(|| REPORT_NOT_GENERATED_MESSAGE.to_string()),
            ));
        }
        match (self.report_json, self.report_md) {
            (Some(json), _) => Ok(json.into()),
            (None, Some(markdown)) => Ok(Report {
                summary: markdown,
                ..Report::default()
            }),
            (None, None) => Err(GatewayError::ReportNotReady(
                self.failure_reason
                    .unwrap_or_else(|| REPORT_NOT_GENERATED_MESSAGE.to_string()),
            )),
        }
    }

    /// Diary entry for a finished history record; `None` for unfinished ones.
    pub fn into_reflection(self) -> Option<Reflection> {
        let id = self.session_id.clone();
        let date = self
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| format_korean_date(&dt.with_timezone(&Local)))
            .or_else(|| self.created_at.clone())
            .unwrap_or_default();
        let situation = self.situation.clone();
        let conversation = self.conversation.clone();
        let report = self.into_report().ok()?;
        Some(Reflection {
            id,
            date,
            situation,
            conversation,
            report: Some(report),
        })
    }
}

/// Decodes a history listing record by record.
///
/// A record that does not match [`ReportRecord`] (an unknown emotion tag,
/// say) is logged and skipped; the rest of the listing is kept.
pub fn decode_history(records: Vec<serde_json::Value>) -> Vec<ReportRecord> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<ReportRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping undecodable history record #{}: {}", index, e);
                None
            }
        })
        .collect()
}

// ============================================================================
// Gateway trait
// ============================================================================

/// Request/response access to the reflection backend.
///
/// Authenticated calls take explicit credentials; the gateway holds no
/// session state of its own.
#[async_trait]
pub trait ReflectionGateway: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> GatewayResult<LoginResponse>;

    async fn sign_up(&self, request: &SignUpRequest) -> GatewayResult<()>;

    async fn check_login_id(&self, login_id: &str) -> GatewayResult<LoginIdAvailability>;

    async fn fetch_profile(&self, credentials: &Credentials) -> GatewayResult<Profile>;

    /// Returns the persona's reply text.
    async fn chat_reply(
        &self,
        credentials: &Credentials,
        request: &ChatReplyRequest,
    ) -> GatewayResult<String>;

    async fn generate_report(
        &self,
        credentials: &Credentials,
        request: &ReportRequest,
    ) -> GatewayResult<Report>;

    async fn report_history(&self, credentials: &Credentials) -> GatewayResult<Vec<ReportRecord>>;

    async fn delete_reflection(&self, credentials: &Credentials, session_id: &str)
    -> GatewayResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reflection_with_conversation() -> Reflection {
        let situation = Situation {
            what_happened: "동생과 말다툼을 했다".to_string(),
            emotions: vec![Emotion::Anger],
            emotion_intensity: 8,
            what_you_did: "문을 세게 닫았다".to_string(),
            how_you_wish_it_had_gone: "차분히 대화하고 싶었다".to_string(),
            persona_name: "동생".to_string(),
            persona_tone: "퉁명스러운".to_string(),
            persona_personality: "고집 센".to_string(),
        };
        let at = Local.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let mut reflection = Reflection::new(situation, at);
        reflection.conversation = vec![Message::user("미안해"), Message::ai("뭐가?")];
        reflection
    }

    #[test]
    fn test_conversation_context_layout() {
        let context = build_conversation_context(&reflection_with_conversation());
        let lines: Vec<&str> = context.lines().collect();
        assert_eq!(lines[0], "What Happened: 동생과 말다툼을 했다");
        assert_eq!(lines[1], "Emotions: 분노");
        assert_eq!(lines[2], "What You Did: 문을 세게 닫았다");
        assert_eq!(lines[3], "Desired Outcome: 차분히 대화하고 싶었다");
        assert_eq!(lines[4], "Conversation:");
        assert_eq!(lines[5], "User: 미안해");
        assert_eq!(lines[6], "AI: 뭐가?");
    }

    #[test]
    fn test_context_without_conversation_has_no_transcript_section() {
        let mut reflection = reflection_with_conversation();
        reflection.conversation.clear();
        let context = build_conversation_context(&reflection);
        assert!(!context.contains("Conversation:"));
        assert_eq!(context.lines().count(), 4);
    }

    #[test]
    fn test_chat_request_serializes_camel_case() {
        let reflection = reflection_with_conversation();
        let request = ChatReplyRequest::new(
            &reflection.situation,
            reflection.conversation.clone(),
            "다시 얘기해볼래?",
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["personaName"], "동생");
        assert_eq!(value["howYouWishItHadGone"], "차분히 대화하고 싶었다");
        assert_eq!(value["conversation"][0]["sender"], "user");
        assert_eq!(value["message"], "다시 얘기해볼래?");
    }

    #[test]
    fn test_finished_record_becomes_report() {
        let record: ReportRecord = serde_json::from_str(
            r#"{
                "report_id": 3,
                "session_id": "2024-01-02T00:00:00.000Z",
                "status": "finished",
                "report_json": {
                    "summary": "요약",
                    "keyInsights": ["a", "b"],
                    "suggestedPhrases": ["c"],
                    "counselorAdvice": ["d"]
                }
            }"#,
        )
        .unwrap();
        let report = record.into_report().unwrap();
        assert_eq!(report.summary, "요약");
        assert_eq!(report.key_insights, vec!["a", "b"]);
        assert_eq!(report.counselor_advice, Some(vec!["d".to_string()]));
    }

    #[test]
    fn test_failed_record_reports_reason() {
        let record: ReportRecord = serde_json::from_str(
            r#"{"session_id": "s", "status": "failed", "failure_reason": "quota"}"#,
        )
        .unwrap();
        assert_eq!(
            record.into_report(),
            Err(GatewayError::ReportNotReady("quota".to_string()))
        );

        let record: ReportRecord =
            serde_json::from_str(r#"{"session_id": "s", "status": "pending"}"#).unwrap();
        assert_eq!(
            record.into_report(),
            Err(GatewayError::ReportNotReady(REPORT_NOT_GENERATED_MESSAGE.to_string()))
        );
    }

    #[test]
    fn test_history_record_with_markdown_becomes_reflection() {
        let record: ReportRecord = serde_json::from_str(
            r#"{
                "session_id": "2024-03-01T10:00:00.000Z",
                "status": "finished",
                "report_md": "마크다운 요약",
                "created_at": "2024-03-01T10:00:05Z",
                "whatHappened": "발표를 망쳤다",
                "emotions": ["수치심"]
            }"#,
        )
        .unwrap();
        let reflection = record.into_reflection().unwrap();
        assert_eq!(reflection.id, "2024-03-01T10:00:00.000Z");
        assert!(reflection.date.contains("2024년"));
        assert_eq!(reflection.situation.what_happened, "발표를 망쳤다");
        assert!(reflection.has_emotion(Emotion::Shame));
        assert_eq!(reflection.report.unwrap().summary, "마크다운 요약");
    }

    #[test]
    fn test_bad_history_record_does_not_sink_the_listing() {
        let records = vec![
            serde_json::json!({
                "session_id": "2024-01-01T00:00:00.000Z",
                "status": "finished",
                "report_md": "첫번째",
                "emotions": ["기쁨"],
            }),
            serde_json::json!({
                "session_id": "2024-02-01T00:00:00.000Z",
                "status": "finished",
                "report_md": "두번째",
                "emotions": ["unknown-tag"],
            }),
            serde_json::json!({ "status": "finished" }),
            serde_json::json!({
                "session_id": "2024-03-01T00:00:00.000Z",
                "status": "finished",
                "report_md": "세번째",
            }),
        ];

        let decoded = decode_history(records);
        let ids: Vec<&str> = decoded.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, ["2024-01-01T00:00:00.000Z", "2024-03-01T00:00:00.000Z"]);
    }

    #[test]
    fn test_unfinished_history_record_is_skipped() {
        let record: ReportRecord =
            serde_json::from_str(r#"{"session_id": "s", "status": "processing"}"#).unwrap();
        assert!(record.into_reflection().is_none());
    }

    #[test]
    fn test_user_message_falls_back_to_generic() {
        assert_eq!(GatewayError::http(500, "  ").user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(GatewayError::http(400, "bad").user_message(), "bad");
        assert_eq!(GatewayError::Unauthorized.status(), Some(401));
        assert!(GatewayError::Network("down".into()).is_network());
    }
}
