#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use timemachine_application::{LocalDiary, ReflectionApp, RemoteDiary};
use timemachine_core::gateway::{
    ChatReplyRequest, GatewayError, GatewayResult, LoginIdAvailability, LoginRequest,
    LoginResponse, Profile, ReflectionGateway, ReportRecord, ReportRequest, SignUpRequest,
};
use timemachine_core::reflection::{Emotion, Report, Situation};
use timemachine_core::session_store::SessionStore;
use timemachine_core::simulation::TurnPolicy;
use timemachine_core::user::{Credentials, Identity};
use timemachine_infrastructure::MemoryKeyValueStore;

/// Scripted gateway recording what it was asked.
#[derive(Default)]
pub struct FakeGateway {
    pub chat_replies: Mutex<VecDeque<GatewayResult<String>>>,
    pub chat_requests: Mutex<Vec<ChatReplyRequest>>,
    pub report: Mutex<Option<GatewayResult<Report>>>,
    pub report_requests: Mutex<Vec<ReportRequest>>,
    pub history: Mutex<Vec<ReportRecord>>,
    pub history_calls: Mutex<usize>,
    pub history_error: Mutex<Option<GatewayError>>,
    pub delete_error: Mutex<Option<GatewayError>>,
    pub deleted: Mutex<Vec<String>>,
    pub login_result: Mutex<Option<GatewayResult<LoginResponse>>>,
    pub profile: Mutex<Option<GatewayResult<Profile>>>,
    pub login_id_available: Mutex<Option<GatewayResult<bool>>>,
    pub sign_up_error: Mutex<Option<GatewayError>>,
    pub sign_ups: Mutex<Vec<SignUpRequest>>,
}

impl FakeGateway {
    pub fn push_chat_reply(&self, reply: GatewayResult<String>) {
        self.chat_replies.lock().unwrap().push_back(reply);
    }

    pub fn set_report(&self, report: GatewayResult<Report>) {
        *self.report.lock().unwrap() = Some(report);
    }

    pub fn set_history(&self, records: Vec<ReportRecord>) {
        *self.history.lock().unwrap() = records;
    }

    pub fn fail_delete(&self, err: GatewayError) {
        *self.delete_error.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl ReflectionGateway for FakeGateway {
    async fn login(&self, _request: &LoginRequest) -> GatewayResult<LoginResponse> {
        self.login_result.lock().unwrap().clone().unwrap_or_else(|| {
            Ok(LoginResponse {
                access_token: "token".to_string(),
                token_type: "bearer".to_string(),
            })
        })
    }

    async fn sign_up(&self, request: &SignUpRequest) -> GatewayResult<()> {
        self.sign_ups.lock().unwrap().push(request.clone());
        match self.sign_up_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn check_login_id(&self, login_id: &str) -> GatewayResult<LoginIdAvailability> {
        let available = self
            .login_id_available
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Ok(true))?;
        Ok(LoginIdAvailability {
            login_id: login_id.to_string(),
            available,
        })
    }

    async fn fetch_profile(&self, _credentials: &Credentials) -> GatewayResult<Profile> {
        self.profile
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Profile::default()))
    }

    async fn chat_reply(
        &self,
        _credentials: &Credentials,
        request: &ChatReplyRequest,
    ) -> GatewayResult<String> {
        self.chat_requests.lock().unwrap().push(request.clone());
        self.chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("reply to {}", request.message)))
    }

    async fn generate_report(
        &self,
        _credentials: &Credentials,
        request: &ReportRequest,
    ) -> GatewayResult<Report> {
        self.report_requests.lock().unwrap().push(request.clone());
        self.report
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(sample_report()))
    }

    async fn report_history(&self, _credentials: &Credentials) -> GatewayResult<Vec<ReportRecord>> {
        *self.history_calls.lock().unwrap() += 1;
        if let Some(err) = self.history_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn delete_reflection(
        &self,
        _credentials: &Credentials,
        session_id: &str,
    ) -> GatewayResult<()> {
        if let Some(err) = self.delete_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.deleted.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}

pub fn sample_report() -> Report {
    Report {
        summary: "차분하게 마음을 전했습니다.".to_string(),
        key_insights: vec!["감정을 먼저 인정했다".to_string()],
        suggested_phrases: vec!["그때 서운했어".to_string()],
        counselor_advice: None,
    }
}

pub fn sample_situation() -> Situation {
    Situation {
        what_happened: "친구가 약속에 늦었다".to_string(),
        emotions: vec![Emotion::Disappointment],
        emotion_intensity: 6,
        what_you_did: "화를 내고 돌아왔다".to_string(),
        how_you_wish_it_had_gone: "솔직하게 서운함을 말하고 싶었다".to_string(),
        persona_name: "민지".to_string(),
        persona_tone: "미안해하는".to_string(),
        persona_personality: "활발한".to_string(),
    }
}

pub fn finished_record(session_id: &str, what_happened: &str) -> ReportRecord {
    serde_json::from_value(serde_json::json!({
        "report_id": 1,
        "session_id": session_id,
        "status": "finished",
        "report_json": { "summary": "요약" },
        "created_at": session_id,
        "whatHappened": what_happened,
        "emotions": ["기쁨"],
    }))
    .unwrap()
}

pub fn identity() -> Identity {
    let mut identity = Identity::new("jisu", "token", "Bearer");
    identity.id = Some(1);
    identity
}

pub struct Harness {
    pub app: ReflectionApp,
    pub gateway: Arc<FakeGateway>,
    pub store: SessionStore,
}

/// Server-authoritative app, already logged in and on Home.
pub async fn remote_app() -> Harness {
    let gateway = Arc::new(FakeGateway::default());
    let store = SessionStore::new(Arc::new(MemoryKeyValueStore::new()));
    let mut app = ReflectionApp::new(
        gateway.clone(),
        store.clone(),
        Arc::new(RemoteDiary::new(gateway.clone())),
        TurnPolicy::default(),
    );
    app.login(identity()).await.unwrap();
    Harness { app, gateway, store }
}

/// Client-authoritative app, already logged in and on Home.
pub async fn local_app() -> Harness {
    let gateway = Arc::new(FakeGateway::default());
    let store = SessionStore::new(Arc::new(MemoryKeyValueStore::new()));
    let mut app = ReflectionApp::new(
        gateway.clone(),
        store.clone(),
        Arc::new(LocalDiary::new(store.clone())),
        TurnPolicy::default(),
    );
    app.login(identity()).await.unwrap();
    Harness { app, gateway, store }
}
