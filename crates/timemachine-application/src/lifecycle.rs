//! Reflection lifecycle controller.
//!
//! `ReflectionApp` owns the [`AppState`] and exposes one handler per user
//! intent. Handlers update state synchronously; backend work is either
//! awaited in place (chat turns, diary mutations) or handed out as a ticket
//! whose result comes back through [`ReflectionApp::apply_event`] (report
//! generation, diary refresh).
//!
//! Every ticket records the generation it was issued under. The generation
//! is bumped whenever the tracked reflection is replaced or discarded, so a
//! late response for an abandoned reflection never touches the new one.

use std::sync::Arc;

use chrono::Local;
use timemachine_core::diary::{EmotionFilter, filter_by_emotion, sort_by_recency};
use timemachine_core::error::{Result, TimeMachineError};
use timemachine_core::gateway::{
    ChatReplyRequest, GatewayError, GatewayResult, ReflectionGateway, ReportRequest,
};
use timemachine_core::reflection::{Reflection, Report, Situation};
use timemachine_core::session_store::SessionStore;
use timemachine_core::simulation::{BeginSend, SimulationSession, TurnPolicy};
use timemachine_core::state::{AppState, Screen};
use timemachine_core::user::{Credentials, Identity};
use timemachine_core::wizard::{SituationWizard, WizardBack};
use tokio::sync::mpsc;

use crate::diary::DiaryStrategy;

/// Alert shown when a diary entry could not be deleted.
pub const DELETE_FAILED_MESSAGE: &str = "회고 삭제에 실패했습니다.";

/// In-flight chat turn.
#[derive(Debug, Clone)]
pub struct ChatTicket {
    pub generation: u64,
    pub reflection_id: String,
    pub credentials: Credentials,
    pub request: ChatReplyRequest,
}

/// In-flight report generation.
#[derive(Debug, Clone)]
pub struct ReportTicket {
    pub generation: u64,
    pub reflection_id: String,
    pub credentials: Credentials,
    pub request: ReportRequest,
}

/// In-flight diary refresh; `epoch` is the login it belongs to.
#[derive(Debug, Clone)]
pub struct DiaryTicket {
    pub epoch: u64,
    pub identity: Identity,
}

/// Completion of background work.
#[derive(Debug)]
pub enum AppEvent {
    ReportReady {
        ticket: ReportTicket,
        result: GatewayResult<Report>,
    },
    DiaryLoaded {
        ticket: DiaryTicket,
        result: Result<Vec<Reflection>>,
    },
}

/// What happened to a chat send request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Nothing to send, or a send is not allowed right now.
    Ignored,
    /// Turn cap reached; extend or end.
    ExtendPromptRaised,
    /// Reply (or the synthetic error reply) appended.
    Replied,
    /// The backend rejected the session; now on the Auth screen.
    SessionExpired,
}

/// Outcome of a confirmed delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Failed,
    NothingPending,
}

pub struct ReflectionApp {
    state: AppState,
    gateway: Arc<dyn ReflectionGateway>,
    session_store: SessionStore,
    diary_strategy: Arc<dyn DiaryStrategy>,
    policy: TurnPolicy,
    wizard: Option<SituationWizard>,
    simulation: Option<SimulationSession>,
    generation: u64,
    epoch: u64,
    pending_delete: Option<String>,
    alert: Option<String>,
    diary_refresh_in_flight: bool,
}

impl ReflectionApp {
    pub fn new(
        gateway: Arc<dyn ReflectionGateway>,
        session_store: SessionStore,
        diary_strategy: Arc<dyn DiaryStrategy>,
        policy: TurnPolicy,
    ) -> Self {
        Self {
            state: AppState::new(),
            gateway,
            session_store,
            diary_strategy,
            policy,
            wizard: None,
            simulation: None,
            generation: 0,
            epoch: 0,
            pending_delete: None,
            alert: None,
            diary_refresh_in_flight: false,
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn screen(&self) -> Screen {
        self.state.screen
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity.as_ref()
    }

    pub fn wizard(&self) -> Option<&SituationWizard> {
        self.wizard.as_ref()
    }

    pub fn wizard_mut(&mut self) -> Option<&mut SituationWizard> {
        self.wizard.as_mut()
    }

    pub fn simulation(&self) -> Option<&SimulationSession> {
        self.simulation.as_ref()
    }

    pub fn simulation_mut(&mut self) -> Option<&mut SimulationSession> {
        self.simulation.as_mut()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn is_diary_refresh_in_flight(&self) -> bool {
        self.diary_refresh_in_flight
    }

    /// Takes the pending blocking alert, if any.
    pub fn take_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    /// Diary as shown on the Diary screen: filtered, newest first.
    pub fn diary_view(&self, filter: EmotionFilter) -> Vec<Reflection> {
        let mut view = filter_by_emotion(&self.state.diary, filter);
        sort_by_recency(&mut view);
        view
    }

    // ============================================================================
    // Session
    // ============================================================================

    /// Restores a stored identity at startup.
    ///
    /// Lands on Home when one is found (the caller should refresh the diary),
    /// on Auth otherwise.
    pub async fn restore(&mut self) -> Result<bool> {
        match self.session_store.load_identity().await? {
            Some(identity) => {
                tracing::info!("Restored session for '{}'", identity.login_id);
                self.epoch += 1;
                self.state.identity = Some(identity);
                self.state.screen = Screen::Home;
                Ok(true)
            }
            None => {
                self.state.screen = Screen::Auth;
                Ok(false)
            }
        }
    }

    /// Stores the identity and enters Home. The diary still has to be
    /// refreshed.
    pub async fn login(&mut self, identity: Identity) -> Result<()> {
        self.session_store.save_identity(&identity).await?;
        self.epoch += 1;
        self.reset_session_state();
        self.state.identity = Some(identity);
        self.state.screen = Screen::Home;
        Ok(())
    }

    /// Forgets the identity and all per-user state.
    pub async fn logout(&mut self) -> Result<()> {
        tracing::info!("Logging out");
        self.clear_session();
        self.session_store.clear_identity().await
    }

    /// Logout triggered by a 401 from any authenticated call.
    pub async fn force_logout(&mut self) {
        tracing::warn!("Session expired; returning to login");
        self.clear_session();
        if let Err(e) = self.session_store.clear_identity().await {
            tracing::warn!("Failed to clear stored identity: {}", e);
        }
        self.alert = Some(GatewayError::Unauthorized.detail());
    }

    fn clear_session(&mut self) {
        self.epoch += 1;
        self.reset_session_state();
        self.state.identity = None;
        self.state.screen = Screen::Auth;
    }

    fn reset_session_state(&mut self) {
        self.generation += 1;
        self.state.diary.clear();
        self.state.current_reflection = None;
        self.state.viewing_reflection = None;
        self.wizard = None;
        self.simulation = None;
        self.pending_delete = None;
        self.diary_refresh_in_flight = false;
    }

    fn require_identity(&mut self) -> Result<Identity> {
        match self.state.identity.clone() {
            Some(identity) => Ok(identity),
            None => {
                self.state.screen = Screen::Auth;
                Err(TimeMachineError::Unauthenticated)
            }
        }
    }

    // ============================================================================
    // Navigation
    // ============================================================================

    /// Moves to `screen`, or to Auth when it needs an identity and there is
    /// none. Returns the screen actually entered.
    ///
    /// Leaving the wizard, a running simulation or an unsaved report this way
    /// abandons it, the same as backing out.
    pub fn navigate(&mut self, screen: Screen) -> Screen {
        if screen.requires_identity() && !self.state.is_logged_in() {
            self.state.screen = Screen::Auth;
            return Screen::Auth;
        }
        if screen != self.state.screen {
            self.leave_screen();
        }
        self.state.screen = screen;
        screen
    }

    fn leave_screen(&mut self) {
        match self.state.screen {
            Screen::Input => self.wizard = None,
            Screen::Simulation => self.discard_current(),
            Screen::Report if self.state.is_viewing_history() => {
                self.state.viewing_reflection = None;
            }
            Screen::Report => self.discard_current(),
            Screen::Diary => self.pending_delete = None,
            Screen::Home | Screen::Auth => {}
        }
    }

    /// Drops the in-progress reflection; late responses for it are ignored.
    fn discard_current(&mut self) {
        self.generation += 1;
        self.simulation = None;
        self.state.current_reflection = None;
    }

    /// Enters the wizard with a fresh draft; any current or viewed
    /// reflection is dropped.
    pub fn start_new_reflection(&mut self) -> Result<()> {
        self.require_identity()?;
        self.generation += 1;
        self.state.current_reflection = None;
        self.state.viewing_reflection = None;
        self.simulation = None;
        self.wizard = Some(SituationWizard::new());
        self.state.screen = Screen::Input;
        Ok(())
    }

    /// Back navigation for the current screen.
    pub fn back(&mut self) {
        match self.state.screen {
            Screen::Input => self.wizard_back(),
            Screen::Simulation => self.back_from_simulation(),
            Screen::Report if self.state.is_viewing_history() => {
                self.state.viewing_reflection = None;
                self.state.screen = Screen::Diary;
            }
            Screen::Report => self.back_from_report_to_home(),
            Screen::Diary => {
                self.pending_delete = None;
                self.state.screen = Screen::Home;
            }
            Screen::Home | Screen::Auth => {}
        }
    }

    fn wizard_back(&mut self) {
        let cancelled = match self.wizard.as_mut() {
            Some(wizard) => wizard.back() == WizardBack::Cancelled,
            None => true,
        };
        if cancelled {
            self.wizard = None;
            self.state.screen = Screen::Home;
        }
    }

    fn back_from_simulation(&mut self) {
        self.discard_current();
        self.state.screen = Screen::Home;
    }

    /// Leaves an unsaved report; the reflection is discarded.
    pub fn back_from_report_to_home(&mut self) {
        self.discard_current();
        self.state.viewing_reflection = None;
        self.state.screen = Screen::Home;
    }

    // ============================================================================
    // Wizard and simulation
    // ============================================================================

    /// Submits the wizard; `Ok(false)` when the last step is not complete.
    pub fn submit_wizard(&mut self) -> Result<bool> {
        let Some(situation) = self.wizard.as_ref().and_then(SituationWizard::submit) else {
            return Ok(false);
        };
        self.start_simulation(situation)?;
        Ok(true)
    }

    /// Creates the reflection and enters Simulation.
    pub fn start_simulation(&mut self, situation: Situation) -> Result<()> {
        self.require_identity()?;
        let reflection = Reflection::new(situation, Local::now());
        tracing::info!("Starting simulation {}", reflection.id);
        self.generation += 1;
        self.simulation = Some(SimulationSession::new(reflection.id.clone(), self.policy));
        self.state.current_reflection = Some(reflection);
        self.state.viewing_reflection = None;
        self.wizard = None;
        self.state.screen = Screen::Simulation;
        Ok(())
    }

    /// First half of a chat turn: appends the user message and returns the
    /// request to send.
    pub fn begin_chat_turn(&mut self) -> std::result::Result<ChatTicket, ChatOutcome> {
        let Some(identity) = self.state.identity.as_ref() else {
            self.state.screen = Screen::Auth;
            return Err(ChatOutcome::Ignored);
        };
        let credentials = identity.credentials();
        let (Some(simulation), Some(reflection)) =
            (self.simulation.as_mut(), self.state.current_reflection.as_ref())
        else {
            return Err(ChatOutcome::Ignored);
        };

        match simulation.begin_send() {
            BeginSend::Ignored => Err(ChatOutcome::Ignored),
            BeginSend::ExtendPromptRaised => Err(ChatOutcome::ExtendPromptRaised),
            BeginSend::Dispatched(pending) => Ok(ChatTicket {
                generation: self.generation,
                reflection_id: reflection.id.clone(),
                credentials,
                request: ChatReplyRequest::new(&reflection.situation, pending.history, pending.message),
            }),
        }
    }

    /// Second half of a chat turn. Stale tickets are dropped.
    pub async fn complete_chat_turn(
        &mut self,
        ticket: ChatTicket,
        result: GatewayResult<String>,
    ) -> ChatOutcome {
        if matches!(result, Err(GatewayError::Unauthorized)) {
            self.force_logout().await;
            return ChatOutcome::SessionExpired;
        }
        match self.simulation.as_mut() {
            Some(simulation)
                if ticket.generation == self.generation
                    && simulation.reflection_id() == ticket.reflection_id =>
            {
                simulation.complete_send(result);
                if simulation.is_extend_prompt_showing() {
                    ChatOutcome::ExtendPromptRaised
                } else {
                    ChatOutcome::Replied
                }
            }
            _ => {
                tracing::debug!("Discarding stale chat reply for {}", ticket.reflection_id);
                ChatOutcome::Ignored
            }
        }
    }

    /// Sends `text` as the next user turn and waits for the reply.
    pub async fn send_chat_message(&mut self, text: &str) -> ChatOutcome {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_input(text);
        }
        let ticket = match self.begin_chat_turn() {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };
        let result = self
            .gateway
            .chat_reply(&ticket.credentials, &ticket.request)
            .await;
        self.complete_chat_turn(ticket, result).await
    }

    /// Extends the turn cap of the running simulation; refused unless the
    /// extend prompt is showing.
    pub fn extend_simulation(&mut self) -> bool {
        self.state.screen == Screen::Simulation
            && self.simulation.as_mut().is_some_and(SimulationSession::extend)
    }

    /// Freezes the conversation into the reflection, enters Report and
    /// returns the generation request to issue.
    pub fn end_simulation(&mut self) -> Option<ReportTicket> {
        if self.state.screen != Screen::Simulation {
            return None;
        }
        let credentials = self.state.identity.as_ref()?.credentials();
        let simulation = self.simulation.take()?;
        let reflection = self.state.current_reflection.as_mut()?;
        if reflection.id != simulation.reflection_id() {
            return None;
        }
        reflection.conversation = simulation.finish();
        reflection.report = None;
        let request = ReportRequest::for_reflection(reflection);
        let reflection_id = reflection.id.clone();

        self.state.viewing_reflection = None;
        self.state.screen = Screen::Report;
        tracing::info!(
            "Simulation {} ended after {} turns",
            reflection_id,
            reflection.user_turns()
        );
        Some(ReportTicket {
            generation: self.generation,
            reflection_id,
            credentials,
            request,
        })
    }

    // ============================================================================
    // Background work
    // ============================================================================

    /// Runs a report request to completion.
    pub async fn request_report(
        gateway: Arc<dyn ReflectionGateway>,
        ticket: ReportTicket,
    ) -> AppEvent {
        let result = gateway
            .generate_report(&ticket.credentials, &ticket.request)
            .await;
        AppEvent::ReportReady { ticket, result }
    }

    /// Issues report generation on a background task; the result arrives
    /// on `events`.
    pub fn spawn_report(&self, ticket: ReportTicket, events: mpsc::UnboundedSender<AppEvent>) {
        let gateway = Arc::clone(&self.gateway);
        tokio::spawn(async move {
            let event = Self::request_report(gateway, ticket).await;
            if events.send(event).is_err() {
                tracing::debug!("Event receiver dropped before report arrived");
            }
        });
    }

    /// Applies a background completion.
    pub async fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ReportReady { ticket, result } => self.apply_report(ticket, result).await,
            AppEvent::DiaryLoaded { ticket, result } => {
                self.apply_diary_refresh(ticket, result).await
            }
        }
    }

    /// Merges a generated report into the tracked reflection if the ticket
    /// still matches; failures are logged and the report stays pending.
    pub async fn apply_report(&mut self, ticket: ReportTicket, result: GatewayResult<Report>) {
        let report = match result {
            Ok(report) => report,
            Err(GatewayError::Unauthorized) => {
                self.force_logout().await;
                return;
            }
            Err(e) => {
                tracing::error!("Failed to generate report for {}: {}", ticket.reflection_id, e);
                return;
            }
        };

        if ticket.generation != self.generation {
            tracing::debug!("Discarding stale report for {}", ticket.reflection_id);
            return;
        }
        match self.state.current_reflection.as_mut() {
            Some(reflection) if reflection.id == ticket.reflection_id => {
                tracing::info!("Report ready for {}", reflection.id);
                reflection.report = Some(report);
            }
            _ => tracing::debug!("Discarding report for untracked {}", ticket.reflection_id),
        }
    }

    // ============================================================================
    // Diary
    // ============================================================================

    /// Starts a diary refresh unless one is already running.
    pub fn begin_diary_refresh(&mut self) -> Option<DiaryTicket> {
        if self.diary_refresh_in_flight {
            tracing::debug!("Diary refresh already in flight");
            return None;
        }
        let identity = self.state.identity.clone()?;
        self.diary_refresh_in_flight = true;
        Some(DiaryTicket {
            epoch: self.epoch,
            identity,
        })
    }

    /// Refreshes the diary in place.
    pub async fn refresh_diary(&mut self) {
        let Some(ticket) = self.begin_diary_refresh() else {
            return;
        };
        let result = self.diary_strategy.load(&ticket.identity).await;
        self.apply_diary_refresh(ticket, result).await;
    }

    /// Refreshes the diary on a background task.
    pub fn spawn_diary_refresh(&mut self, events: mpsc::UnboundedSender<AppEvent>) {
        let Some(ticket) = self.begin_diary_refresh() else {
            return;
        };
        let strategy = Arc::clone(&self.diary_strategy);
        tokio::spawn(async move {
            let result = strategy.load(&ticket.identity).await;
            if events.send(AppEvent::DiaryLoaded { ticket, result }).is_err() {
                tracing::debug!("Event receiver dropped before diary arrived");
            }
        });
    }

    pub async fn apply_diary_refresh(
        &mut self,
        ticket: DiaryTicket,
        result: Result<Vec<Reflection>>,
    ) {
        if ticket.epoch != self.epoch {
            tracing::debug!("Discarding diary loaded for a previous login");
            return;
        }
        self.diary_refresh_in_flight = false;
        match result {
            Ok(diary) => self.state.diary = diary,
            Err(e) if e.is_session_expired() => self.force_logout().await,
            Err(e) => tracing::error!("Failed to load diary: {}", e),
        }
    }

    /// Saves the freshly completed reflection and enters Diary.
    ///
    /// Only possible on the Report screen for a fresh reflection; returns
    /// `Ok(false)` otherwise. The report may still be pending, in which case
    /// the entry is saved without one.
    pub async fn save_to_diary(&mut self) -> Result<bool> {
        let identity = self.require_identity()?;
        if self.state.screen != Screen::Report || self.state.is_viewing_history() {
            return Ok(false);
        }
        let Some(reflection) = self.state.current_reflection.clone() else {
            return Ok(false);
        };
        if reflection.report.is_none() {
            tracing::info!("Saving {} before its report arrived", reflection.id);
        }

        let reflection_id = reflection.id.clone();
        match self
            .diary_strategy
            .save(&identity, &self.state.diary, reflection)
            .await
        {
            Ok(diary) => self.state.diary = diary,
            Err(e) if e.is_session_expired() => {
                self.force_logout().await;
                return Err(e);
            }
            Err(e) => {
                tracing::error!("Failed to save {} to diary: {}", reflection_id, e);
                return Err(e);
            }
        }
        tracing::info!(
            "Saved {} to the {} diary",
            reflection_id,
            self.diary_strategy.mode()
        );
        self.generation += 1;
        self.state.current_reflection = None;
        self.state.screen = Screen::Diary;
        Ok(true)
    }

    /// Opens a diary entry read-only.
    pub fn view_report(&mut self, reflection_id: &str) -> Result<()> {
        self.require_identity()?;
        let reflection = self
            .state
            .diary
            .iter()
            .find(|r| r.id == reflection_id)
            .cloned()
            .ok_or_else(|| TimeMachineError::not_found("reflection", reflection_id))?;
        self.state.viewing_reflection = Some(reflection);
        self.state.screen = Screen::Report;
        Ok(())
    }

    /// First step of deletion; nothing changes until confirmed.
    pub fn request_delete(&mut self, reflection_id: &str) -> Result<()> {
        if !self.state.diary.iter().any(|r| r.id == reflection_id) {
            return Err(TimeMachineError::not_found("reflection", reflection_id));
        }
        self.pending_delete = Some(reflection_id.to_string());
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes the pending entry. On failure the diary is left as it was and
    /// an alert is raised.
    pub async fn confirm_delete(&mut self) -> DeleteOutcome {
        let Some(reflection_id) = self.pending_delete.take() else {
            return DeleteOutcome::NothingPending;
        };
        let Some(identity) = self.state.identity.clone() else {
            self.state.screen = Screen::Auth;
            return DeleteOutcome::NothingPending;
        };

        match self
            .diary_strategy
            .delete(&identity, &self.state.diary, &reflection_id)
            .await
        {
            Ok(diary) => {
                tracing::info!("Deleted {}", reflection_id);
                self.state.diary = diary;
                DeleteOutcome::Deleted
            }
            Err(e) if e.is_session_expired() => {
                self.force_logout().await;
                DeleteOutcome::Failed
            }
            Err(e) => {
                tracing::error!("Failed to delete {}: {}", reflection_id, e);
                self.alert = Some(DELETE_FAILED_MESSAGE.to_string());
                DeleteOutcome::Failed
            }
        }
    }
}
