//! One request/response cycle per user action.
//!
//! ```text
//! Idle -> Validating -> AwaitingResponse -> Streaming -> Complete -> Idle
//!                    \                  \            \
//!                     +-> Idle (blank)   +-> Failed   +-> Failed -> Idle
//! ```
//!
//! Only one turn may be in flight per controller; a second `submit` while
//! not idle is rejected with [`ParleyError::Busy`].

use std::sync::{Arc, Mutex};

use strum::Display;
use tracing::{debug, info, warn};

use crate::aggregator::{AggregatedResponse, ResponseAggregator};
use crate::error::ParleyError;
use crate::provider::{Completion, ModelProvider, ProviderRequest};
use crate::render::Renderer;
use crate::session::SessionStore;
use crate::types::{GenerationSettings, Role, Turn};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TurnState {
    Idle,
    Validating,
    AwaitingResponse,
    Streaming,
    Complete,
    Failed,
}

/// How a submitted turn ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Blank input; warned, nothing sent.
    Rejected,
    /// The assistant turn appended to the session.
    Completed(Turn),
    /// The model finished with no text; nothing appended.
    EmptyResponse,
    /// The model call failed. `partial` is what had been rendered.
    Failed { error: ParleyError, partial: String },
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn error(&self) -> Option<&ParleyError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Resets the state cell to `Idle` when the turn ends, including when the
/// submitting future is dropped.
struct InFlight<'a> {
    state: &'a Mutex<TurnState>,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a Mutex<TurnState>) -> Result<Self, ParleyError> {
        let mut current = state.lock().map_err(|_| ParleyError::Busy)?;
        if *current != TurnState::Idle {
            return Err(ParleyError::Busy);
        }
        *current = TurnState::Validating;
        Ok(Self { state })
    }

    fn set(&self, next: TurnState) {
        if let Ok(mut current) = self.state.lock() {
            let previous = *current;
            debug!(from = %previous, to = %next, "turn state");
            *current = next;
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set(TurnState::Idle);
    }
}

/// Drives a turn from user text to a stored assistant reply.
pub struct TurnController {
    provider: Arc<dyn ModelProvider>,
    aggregator: ResponseAggregator,
    settings: GenerationSettings,
    stream: bool,
    record_user_turns: bool,
    state: Mutex<TurnState>,
}

impl TurnController {
    /// Streaming controller with default settings.
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            aggregator: ResponseAggregator::new(),
            settings: GenerationSettings::default(),
            stream: true,
            record_user_turns: false,
            state: Mutex::new(TurnState::Idle),
        }
    }

    /// Request whole answers instead of fragments.
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Also store the user's prompt before each completed assistant reply.
    pub fn with_user_turns(mut self, record: bool) -> Self {
        self.record_user_turns = record;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.stream
    }

    pub fn state(&self) -> TurnState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(TurnState::Failed)
    }

    /// Handle one user submission.
    ///
    /// Returns `Err(ParleyError::Busy)` if another turn is in flight; every
    /// other failure is reported through `renderer` and returned as
    /// [`TurnOutcome::Failed`] with the session left unchanged.
    pub async fn submit(
        &self,
        session: &mut SessionStore,
        text: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnOutcome, ParleyError> {
        let turn = InFlight::begin(&self.state)?;

        let prompt = text.trim();
        if prompt.is_empty() {
            debug!(session = %session.id(), "blank input rejected");
            renderer.warn(&ParleyError::EmptyInput.to_string());
            return Ok(TurnOutcome::Rejected);
        }

        renderer.render(Role::User, text);
        renderer.end_message();

        turn.set(TurnState::AwaitingResponse);
        let request = ProviderRequest {
            messages: vec![Turn::user(text)],
            settings: self.settings.clone(),
        };
        let response = match self.provider.complete_request(&request, self.stream).await {
            Ok(Completion::Stream(stream)) => {
                turn.set(TurnState::Streaming);
                self.aggregator
                    .aggregate_stream(stream, |accumulated| {
                        renderer.render(Role::Assistant, accumulated)
                    })
                    .await
            }
            Ok(Completion::Text(text)) => {
                let response = self.aggregator.aggregate_text(Ok(text));
                if !response.text.is_empty() {
                    renderer.render(Role::Assistant, &response.text);
                }
                response
            }
            Err(err) => self.aggregator.aggregate_text(Err(err)),
        };

        let AggregatedResponse { text: answer, error, fragments } = response;
        if let Some(error) = error {
            turn.set(TurnState::Failed);
            warn!(session = %session.id(), fragments, error = %error, "turn failed");
            renderer.error(&format!("Model error: {error}"));
            return Ok(TurnOutcome::Failed {
                error,
                partial: answer,
            });
        }

        turn.set(TurnState::Complete);
        renderer.end_message();
        if answer.is_empty() {
            info!(session = %session.id(), "model returned no text");
            return Ok(TurnOutcome::EmptyResponse);
        }

        if self.record_user_turns {
            session.append(Turn::user(text));
        }
        let reply = Turn::assistant(answer);
        session.append(reply.clone());
        debug!(session = %session.id(), turns = session.len(), "turn stored");
        Ok(TurnOutcome::Completed(reply))
    }
}
