//! Multi-step chat prompts backed by the conversation-state store.
//!
//! A prompt records what the next free-text message means (a task
//! description, a comment, a deadline). [`ConversationFlow::handle_text`]
//! turns that message into a dispatcher action and returns the user to idle.

use super::dispatch::{
    DispatchError, DispatchOutcome, TaskAction, TaskActionDispatcher, TaskActionRequest,
};
use super::lifecycle::FailureKind;
use crate::task::{
    domain::{ChatId, ConversationKey, ConversationState, TaskId},
    ports::{ConversationStateError, ConversationStateRepository, TaskRepository},
};
use chrono::NaiveDate;
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const CHAT_ID_KEY: &str = "chat_id";
const TASK_ID_KEY: &str = "task_id";
const DEADLINE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%y", "%d.%m.%Y"];

/// Errors raised while handling a conversation step.
#[derive(Debug, Error)]
pub enum ConversationFlowError {
    /// The dispatched action failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Conversation state could not be read or written.
    #[error(transparent)]
    State(#[from] ConversationStateError),

    /// The reply to a deadline prompt is not a date.
    #[error("'{0}' is not a date")]
    InvalidDeadline(String),

    /// The stored state lacks the context its mode needs.
    #[error("conversation state '{mode}' is missing '{field}'")]
    CorruptState {
        /// Stored mode.
        mode: String,
        /// Missing or malformed data key.
        field: &'static str,
    },
}

impl ConversationFlowError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Dispatch(err) => err.kind(),
            Self::State(_) => FailureKind::StorageUnavailable,
            Self::InvalidDeadline(_) | Self::CorruptState { .. } => FailureKind::InvalidInput,
        }
    }
}

/// Result type for conversation flow operations.
pub type ConversationFlowResult<T> = Result<T, ConversationFlowError>;

/// Drives prompts that span more than one chat message.
pub struct ConversationFlow<R, C, S>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
    S: ConversationStateRepository,
{
    dispatcher: TaskActionDispatcher<R, C>,
    states: Arc<S>,
}

impl<R, C, S> Clone for ConversationFlow<R, C, S>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
    S: ConversationStateRepository,
{
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            states: Arc::clone(&self.states),
        }
    }
}

impl<R, C, S> ConversationFlow<R, C, S>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
    S: ConversationStateRepository,
{
    /// Creates a flow over `dispatcher` and the state store.
    #[must_use]
    pub const fn new(dispatcher: TaskActionDispatcher<R, C>, states: Arc<S>) -> Self {
        Self { dispatcher, states }
    }

    /// Waits for the description of a new task in `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationFlowError::State`] when the state cannot be
    /// saved.
    pub async fn prompt_task_description(
        &self,
        key: ConversationKey,
        chat_id: ChatId,
    ) -> ConversationFlowResult<()> {
        let mut state = ConversationState::new(ConversationState::AWAITING_TASK_DESCRIPTION);
        state.insert(CHAT_ID_KEY, chat_id.value());
        self.states.save(key, &state).await?;
        Ok(())
    }

    /// Waits for a comment on `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationFlowError::State`] when the state cannot be
    /// saved.
    pub async fn prompt_comment(
        &self,
        key: ConversationKey,
        task_id: TaskId,
    ) -> ConversationFlowResult<()> {
        self.await_task_reply(key, ConversationState::AWAITING_COMMENT, task_id)
            .await
    }

    /// Waits for a deadline for `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationFlowError::State`] when the state cannot be
    /// saved.
    pub async fn prompt_deadline(
        &self,
        key: ConversationKey,
        task_id: TaskId,
    ) -> ConversationFlowResult<()> {
        self.await_task_reply(key, ConversationState::AWAITING_DEADLINE, task_id)
            .await
    }

    /// Abandons any pending prompt. Returns `false` when none was pending.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationFlowError::State`] when the store fails.
    pub async fn cancel(&self, key: ConversationKey) -> ConversationFlowResult<bool> {
        Ok(self.states.clear(key).await?)
    }

    /// Returns the pending state, or idle when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationFlowError::State`] when the store fails.
    pub async fn current(&self, key: ConversationKey) -> ConversationFlowResult<ConversationState> {
        Ok(self.states.load(key).await?.unwrap_or_default())
    }

    /// Interprets a free-text message according to the pending prompt.
    ///
    /// Returns `Ok(None)` when no prompt is pending. The prompt is cleared
    /// once the action succeeds or its task has disappeared; other failures
    /// keep it so the user can answer again.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationFlowError`] when the reply is unusable, the
    /// stored state is malformed or the dispatched action fails.
    pub async fn handle_text(
        &self,
        key: ConversationKey,
        text: &str,
        requester: &str,
    ) -> ConversationFlowResult<Option<DispatchOutcome>> {
        let state = self.current(key).await?;
        let Some(request) = build_request(&state, text)? else {
            debug!(conversation = %key, mode = state.mode(), "no pending prompt");
            return Ok(None);
        };

        match self
            .dispatcher
            .dispatch(request.with_requester(requester))
            .await
        {
            Ok(outcome) => {
                self.states.clear(key).await?;
                Ok(Some(outcome))
            }
            Err(err) => {
                if err.kind() == FailureKind::NotFound {
                    self.states.clear(key).await?;
                }
                Err(err.into())
            }
        }
    }

    async fn await_task_reply(
        &self,
        key: ConversationKey,
        mode: &str,
        task_id: TaskId,
    ) -> ConversationFlowResult<()> {
        let mut state = ConversationState::new(mode);
        state.insert(TASK_ID_KEY, task_id.to_string());
        self.states.save(key, &state).await?;
        Ok(())
    }
}

fn build_request(
    state: &ConversationState,
    text: &str,
) -> ConversationFlowResult<Option<TaskActionRequest>> {
    let request = match state.mode() {
        ConversationState::AWAITING_TASK_DESCRIPTION => {
            let chat_id = state
                .get(CHAT_ID_KEY)
                .and_then(Value::as_i64)
                .ok_or_else(|| corrupt(state, CHAT_ID_KEY))?;
            TaskActionRequest::new(TaskAction::Create)
                .with_chat_id(ChatId::new(chat_id))
                .with_text(text)
        }
        ConversationState::AWAITING_COMMENT => TaskActionRequest::new(TaskAction::AddComment)
            .with_task_id(stored_task_id(state)?)
            .with_comment_text(text),
        ConversationState::AWAITING_DEADLINE => {
            let deadline = parse_deadline(text)?;
            TaskActionRequest::new(TaskAction::SetDeadline)
                .with_task_id(stored_task_id(state)?)
                .with_deadline(deadline)
        }
        _ => return Ok(None),
    };
    Ok(Some(request))
}

fn stored_task_id(state: &ConversationState) -> ConversationFlowResult<TaskId> {
    state
        .get(TASK_ID_KEY)
        .and_then(Value::as_str)
        .and_then(|raw| TaskId::try_from(raw).ok())
        .ok_or_else(|| corrupt(state, TASK_ID_KEY))
}

fn corrupt(state: &ConversationState, field: &'static str) -> ConversationFlowError {
    ConversationFlowError::CorruptState {
        mode: state.mode().to_owned(),
        field,
    }
}

/// Parses `2026-10-31`, `31.10.2026` or `31.10.26`.
fn parse_deadline(text: &str) -> ConversationFlowResult<NaiveDate> {
    let trimmed = text.trim();
    DEADLINE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ConversationFlowError::InvalidDeadline(trimmed.to_owned()))
}
