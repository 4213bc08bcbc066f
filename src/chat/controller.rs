//! Input handling for the chat client.
//!
//! The controller is a two-state machine.  In [`ControllerState::Idle`] a non-blank
//! submission appends the user message and a placeholder, disables the controls, and
//! moves to [`ControllerState::AwaitingResponse`].  Settling the outstanding request
//! replaces the placeholder in place, re-enables the controls, and returns to idle.
//! Submissions while awaiting are refused, so at most one request is ever in flight.

use tracing::debug;

use crate::chat::lifecycle::{
    ChatTransport, ErrorKind, PendingRequest, RequestLifecycle, SendError,
};
use crate::chat::timeline::{AppendOptions, MessageRef, PLACEHOLDER_TEXT, TimelineStore};
use crate::types::Role;

/// Shown when the relay answered with an error status or could not be reached.
pub const SERVER_ERROR_REPLY: &str = "Failed to get response from server.";

/// Shown when the request deadline passed.
pub const TIMEOUT_REPLY: &str = "Request timed out. Failed to get response from server.";

/// Shown when the relay answered without usable text.
pub const EMPTY_REPLY: &str = "Sorry, no response received.";

/// Text that replaces the placeholder for a settled request.
pub fn reply_text(outcome: &Result<String, SendError>) -> &str {
    match outcome {
        Ok(text) => text.as_str(),
        Err(err) => match err.kind() {
            ErrorKind::Timeout => TIMEOUT_REPLY,
            ErrorKind::EmptyResponse => EMPTY_REPLY,
            ErrorKind::NetworkError | ErrorKind::ServerError => SERVER_ERROR_REPLY,
        },
    }
}

/// Whether input is accepted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ControllerState {
    /// Controls enabled; a submission starts a request.
    Idle,
    /// A request is in flight; controls disabled.
    AwaitingResponse,
}

/// The visible input area and timeline the controller drives.
pub trait InputSurface {
    /// Enable or disable the input field and send control.
    fn set_controls_disabled(&mut self, disabled: bool);

    /// Empty the input field.
    fn clear_input(&mut self);

    /// Give the input field focus.
    fn focus_input(&mut self);

    /// The referenced message was appended or rewritten.
    fn timeline_changed(&mut self, timeline: &TimelineStore, message: MessageRef);
}

/// Conversation state owned by one client: the timeline and the request in flight.
#[derive(Debug, Default)]
pub struct ChatSession {
    timeline: TimelineStore,
    pending: Option<PendingRequest>,
}

impl ChatSession {
    /// An empty session.
    pub fn new() -> Self {
        Self::with_timeline(TimelineStore::new())
    }

    /// A session around an existing timeline.
    pub fn with_timeline(timeline: TimelineStore) -> Self {
        Self {
            timeline,
            pending: None,
        }
    }

    /// The conversation so far.
    pub fn timeline(&self) -> &TimelineStore {
        &self.timeline
    }

    /// The request in flight, if any.
    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    /// Current controller state.
    pub fn state(&self) -> ControllerState {
        if self.pending.is_some() {
            ControllerState::AwaitingResponse
        } else {
            ControllerState::Idle
        }
    }

    /// Empty the timeline.
    ///
    /// A request still in flight settles normally; its placeholder is gone, so the
    /// replacement is skipped.
    pub fn clear(&mut self) {
        self.timeline.clear();
    }
}

/// Drives a [`ChatSession`] through submissions and settlements.
pub struct InputController<T: ChatTransport> {
    lifecycle: RequestLifecycle<T>,
}

impl<T: ChatTransport> InputController<T> {
    /// Create a controller sending through `lifecycle`.
    pub fn new(lifecycle: RequestLifecycle<T>) -> Self {
        Self { lifecycle }
    }

    /// The lifecycle requests are sent through.
    pub fn lifecycle(&self) -> &RequestLifecycle<T> {
        &self.lifecycle
    }

    /// Handle a submission.
    ///
    /// Blank text (after trimming) and submissions while a request is in flight are
    /// ignored.  Otherwise the trimmed text is appended as a user message, the input is
    /// cleared and focused, a placeholder is appended, the controls are disabled, and
    /// the session moves to [`ControllerState::AwaitingResponse`].  Returns whether a
    /// request was started.
    pub fn begin(
        &self,
        session: &mut ChatSession,
        surface: &mut dyn InputSurface,
        text: &str,
    ) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        if session.pending.is_some() {
            debug!("submission refused while awaiting a response");
            return false;
        }

        let user = session
            .timeline
            .append(Role::User, text, AppendOptions::default());
        surface.timeline_changed(&session.timeline, user);
        surface.clear_input();
        surface.focus_input();

        let placeholder =
            session
                .timeline
                .append(Role::Bot, PLACEHOLDER_TEXT, AppendOptions::placeholder());
        surface.timeline_changed(&session.timeline, placeholder);
        surface.set_controls_disabled(true);

        session.pending = Some(PendingRequest::new(
            text,
            placeholder,
            self.lifecycle.timeout(),
        ));
        true
    }

    /// Wait for the request in flight, if any.
    pub async fn await_response(
        &self,
        session: &ChatSession,
    ) -> Option<Result<String, SendError>> {
        let pending = session.pending.as_ref()?;
        Some(self.lifecycle.send_pending(pending).await)
    }

    /// Settle the request in flight with `outcome`.
    ///
    /// The placeholder is replaced in place by the reply or the matching fixed error
    /// text, the controls are re-enabled and focused, and the session returns to
    /// [`ControllerState::Idle`].  Returns false if no request was in flight.
    pub fn settle(
        &self,
        session: &mut ChatSession,
        surface: &mut dyn InputSurface,
        outcome: &Result<String, SendError>,
    ) -> bool {
        let Some(pending) = session.pending.take() else {
            return false;
        };
        let placeholder = pending.placeholder();
        if session
            .timeline
            .replace(placeholder, Role::Bot, reply_text(outcome))
        {
            surface.timeline_changed(&session.timeline, placeholder);
        } else {
            debug!("placeholder no longer in timeline; reply dropped");
        }
        surface.set_controls_disabled(false);
        surface.focus_input();
        true
    }

    /// Submit `text` and wait for it to settle.
    ///
    /// Returns the request outcome, or `None` if the submission was ignored.
    pub async fn submit(
        &self,
        session: &mut ChatSession,
        surface: &mut dyn InputSurface,
        text: &str,
    ) -> Option<Result<String, SendError>> {
        if !self.begin(session, surface, text) {
            return None;
        }
        let outcome = self.await_response(session).await?;
        self.settle(session, surface, &outcome);
        Some(outcome)
    }
}
