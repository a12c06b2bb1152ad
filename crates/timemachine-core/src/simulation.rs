//! Turn-limited conversation with the simulated persona.
//!
//! A send is split in two halves so the caller can render the optimistic
//! user message before the reply arrives: [`SimulationSession::begin_send`]
//! appends the user turn and hands back the request payload,
//! [`SimulationSession::complete_send`] appends the reply (or a synthetic
//! error message) and clears the in-flight flag.

use serde::{Deserialize, Serialize};

use crate::gateway::GatewayError;
use crate::reflection::Message;

pub const DEFAULT_TURN_CAP: u32 = 10;
pub const DEFAULT_TURN_EXTENSION: u32 = 5;

/// How many user turns a simulation starts with and how many each
/// extension adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPolicy {
    pub initial_cap: u32,
    pub extension: u32,
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self {
            initial_cap: DEFAULT_TURN_CAP,
            extension: DEFAULT_TURN_EXTENSION,
        }
    }
}

/// Payload of a dispatched chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    /// Conversation before the new user message
    pub history: Vec<Message>,
    /// The new user message
    pub message: String,
}

/// What `begin_send` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginSend {
    /// Blank input, a reply already pending, or the extend prompt showing.
    Ignored,
    /// Turn cap reached: the extend-or-end prompt is now showing.
    ExtendPromptRaised,
    /// The user message was appended; the reply must be requested.
    Dispatched(PendingTurn),
}

/// Per-simulation chat state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSession {
    reflection_id: String,
    conversation: Vec<Message>,
    input: String,
    in_flight: bool,
    turn_cap: u32,
    extension: u32,
    show_extend_prompt: bool,
}

impl SimulationSession {
    pub fn new(reflection_id: impl Into<String>, policy: TurnPolicy) -> Self {
        Self {
            reflection_id: reflection_id.into(),
            conversation: Vec::new(),
            input: String::new(),
            in_flight: false,
            turn_cap: policy.initial_cap,
            extension: policy.extension,
            show_extend_prompt: false,
        }
    }

    pub fn reflection_id(&self) -> &str {
        &self.reflection_id
    }

    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn turn_cap(&self) -> u32 {
        self.turn_cap
    }

    pub fn is_extend_prompt_showing(&self) -> bool {
        self.show_extend_prompt
    }

    pub fn user_turns(&self) -> u32 {
        self.conversation.iter().filter(|m| m.is_user()).count() as u32
    }

    /// `cap - user turns`; negative only if the cap was never reached
    /// through `begin_send`.
    pub fn turns_left(&self) -> i64 {
        i64::from(self.turn_cap) - i64::from(self.user_turns())
    }

    /// Whether the send control is enabled.
    pub fn can_send(&self) -> bool {
        !self.in_flight && self.turns_left() > 0
    }

    /// Appends the user message and returns the chat request payload.
    pub fn begin_send(&mut self) -> BeginSend {
        if self.input.trim().is_empty() || self.in_flight || self.show_extend_prompt {
            return BeginSend::Ignored;
        }
        if self.user_turns() >= self.turn_cap {
            self.show_extend_prompt = true;
            return BeginSend::ExtendPromptRaised;
        }

        let history = self.conversation.clone();
        let message = std::mem::take(&mut self.input);
        self.conversation.push(Message::user(message.clone()));
        self.in_flight = true;
        BeginSend::Dispatched(PendingTurn { history, message })
    }

    /// Appends the reply, or a persona-side error message on failure.
    ///
    /// Never fails; the in-flight flag is cleared in every case.
    pub fn complete_send(&mut self, result: Result<String, GatewayError>) {
        match result {
            Ok(reply) => {
                self.conversation.push(Message::ai(reply));
                if self.user_turns() >= self.turn_cap {
                    self.show_extend_prompt = true;
                }
            }
            Err(err) => {
                tracing::warn!("Chat reply failed: {}", err);
                self.conversation.push(Message::ai_error(&err.detail()));
            }
        }
        self.in_flight = false;
    }

    /// Adds one extension to the cap and dismisses the prompt.
    ///
    /// Only accepted while the extend prompt is showing.
    pub fn extend(&mut self) -> bool {
        if !self.show_extend_prompt {
            return false;
        }
        self.turn_cap = self.turn_cap.saturating_add(self.extension);
        self.show_extend_prompt = false;
        true
    }

    /// Consumes the session, yielding the final conversation.
    pub fn finish(self) -> Vec<Message> {
        self.conversation
    }
}
