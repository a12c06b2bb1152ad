//! Application layer for TimeMachine.
//!
//! Coordinates the domain types with the gateway and storage seams: the
//! reflection lifecycle controller, the auth use case and the diary
//! strategies.

pub mod auth;
pub mod diary;
pub mod lifecycle;

pub use auth::{AuthFailure, AuthForm, AuthMode, AuthUseCase};
pub use diary::{DiaryStrategy, LocalDiary, RemoteDiary};
pub use lifecycle::{AppEvent, ChatOutcome, DeleteOutcome, ReflectionApp, ReportTicket};

use std::sync::Arc;

use timemachine_core::config::DiaryMode;
use timemachine_core::gateway::ReflectionGateway;
use timemachine_core::session_store::SessionStore;

/// Diary strategy for the configured mode.
pub fn diary_strategy_for(
    mode: DiaryMode,
    gateway: Arc<dyn ReflectionGateway>,
    store: SessionStore,
) -> Arc<dyn DiaryStrategy> {
    match mode {
        DiaryMode::Server => Arc::new(RemoteDiary::new(gateway)),
        DiaryMode::Local => Arc::new(LocalDiary::new(store)),
    }
}
