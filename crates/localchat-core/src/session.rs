//! Chat session controller.
//!
//! Holds the transcript of the current conversation and the state of the
//! single in-flight request. The controller never performs I/O: a send
//! returns a [`SendTicket`] describing the request to perform, and the front
//! end reports fragments, completion, or failure back by request id.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::chat::{Message, Role};
use crate::error::SessionError;
use crate::model::{ChatRequest, ChatResponse};
use crate::settings::ChatSettings;

/// How the assistant reply is fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendMode {
    /// `POST /chat/stream`, appending fragments to a placeholder.
    #[default]
    Streaming,
    /// `POST /chat`, appending the reply once complete.
    Blocking,
}

/// A request the front end must perform on behalf of the session.
#[derive(Debug, Clone)]
pub struct SendTicket {
    pub id: u64,
    pub request: ChatRequest,
    pub mode: SendMode,
    /// Cancelled when the user stops generation or the transcript is replaced.
    pub cancel: CancellationToken,
}

#[derive(Debug)]
struct ActiveRequest {
    id: u64,
    cancel: CancellationToken,
}

/// State of one chat transcript and its in-flight request.
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
    is_loading: bool,
    is_streaming: bool,
    active: Option<ActiveRequest>,
    next_request_id: u64,
    revision: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    /// Id of the request whose results are still accepted.
    pub fn active_request_id(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.id)
    }

    /// Counter bumped on every transcript mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a user message and start a request for the reply.
    pub fn send_message(
        &mut self,
        content: &str,
        settings: &ChatSettings,
        mode: SendMode,
    ) -> Result<SendTicket, SessionError> {
        if self.is_loading {
            return Err(SessionError::Busy);
        }
        if content.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.messages.push(Message::user(content));
        let request = ChatRequest::from_settings(self.messages.clone(), settings);

        self.is_loading = true;
        if mode == SendMode::Streaming {
            self.is_streaming = true;
            self.messages.push(Message::assistant(""));
        }
        self.touch();

        self.next_request_id += 1;
        let id = self.next_request_id;
        let cancel = CancellationToken::new();
        self.active = Some(ActiveRequest {
            id,
            cancel: cancel.clone(),
        });
        debug!(request_id = id, ?mode, history = request.messages.len(), "Request started");

        Ok(SendTicket {
            id,
            request,
            mode,
            cancel,
        })
    }

    /// Append a streamed fragment to the assistant placeholder.
    ///
    /// Returns false when the fragment belongs to a request that is no
    /// longer active and was discarded.
    pub fn apply_fragment(&mut self, request_id: u64, fragment: &str) -> bool {
        if !self.is_active(request_id) || !self.is_streaming {
            return false;
        }
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content.push_str(fragment);
                self.touch();
                true
            }
            _ => false,
        }
    }

    /// The stream for `request_id` ended normally.
    pub fn finish_stream(&mut self, request_id: u64) -> bool {
        if !self.is_active(request_id) {
            return false;
        }
        self.settle();
        true
    }

    /// A blocking request finished with `response`.
    pub fn complete(&mut self, request_id: u64, response: ChatResponse) -> bool {
        if !self.is_active(request_id) {
            return false;
        }
        self.messages.push(Message::assistant(response.response));
        self.settle();
        self.touch();
        true
    }

    /// The request failed; the error is reported in the transcript.
    pub fn fail(&mut self, request_id: u64, error: &str) -> bool {
        if !self.is_active(request_id) {
            return false;
        }
        if self.is_streaming
            && matches!(self.messages.last(), Some(m) if m.role == Role::Assistant && m.content.is_empty())
        {
            self.messages.pop();
        }
        self.messages
            .push(Message::assistant(format!("Error: {}", error)));
        self.settle();
        self.touch();
        true
    }

    /// Cancel the in-flight request and accept no more of its output.
    ///
    /// Content already streamed stays in the transcript.
    pub fn stop_generation(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            debug!(request_id = active.id, "Generation stopped");
        }
        self.is_loading = false;
        self.is_streaming = false;
    }

    /// Replay the last user turn.
    ///
    /// Drops the last message, then resends the nearest preceding user
    /// message after truncating the history to just before it. Returns
    /// `Ok(None)` when there are fewer than two messages or no user message.
    pub fn regenerate_last_message(
        &mut self,
        settings: &ChatSettings,
        mode: SendMode,
    ) -> Result<Option<SendTicket>, SessionError> {
        if self.is_loading {
            return Err(SessionError::Busy);
        }
        if self.messages.len() < 2 {
            return Ok(None);
        }

        let truncated = &self.messages[..self.messages.len() - 1];
        let Some(index) = truncated.iter().rposition(|m| m.role == Role::User) else {
            return Ok(None);
        };
        let content = truncated[index].content.clone();
        self.messages.truncate(index);
        self.touch();
        self.send_message(&content, settings, mode).map(Some)
    }

    /// Empty the transcript, cancelling any in-flight request.
    pub fn clear_messages(&mut self) {
        self.set_messages(Vec::new());
    }

    /// Replace the transcript, cancelling any in-flight request.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.stop_generation();
        self.messages = messages;
        self.touch();
    }

    fn is_active(&self, request_id: u64) -> bool {
        self.active_request_id() == Some(request_id)
    }

    fn settle(&mut self) {
        self.active = None;
        self.is_loading = false;
        self.is_streaming = false;
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ChatSettings {
        ChatSettings::default()
    }

    fn contents(session: &ChatSession) -> Vec<(Role, &str)> {
        session
            .messages()
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect()
    }

    #[test]
    fn test_streaming_send_appends_placeholder() {
        let mut session = ChatSession::new();
        let ticket = session
            .send_message("Hello", &settings(), SendMode::Streaming)
            .unwrap();

        assert!(session.is_loading());
        assert!(session.is_streaming());
        assert_eq!(contents(&session), [(Role::User, "Hello"), (Role::Assistant, "")]);
        // The placeholder is never part of the request.
        assert_eq!(ticket.request.messages.len(), 1);
        assert_eq!(ticket.request.model, "llama3.2");
    }

    #[test]
    fn test_fragments_concatenate_in_order() {
        let mut session = ChatSession::new();
        let ticket = session.send_message("Hi", &settings(), SendMode::Streaming).unwrap();
        for fragment in ["Hel", "lo", " wor", "ld"] {
            assert!(session.apply_fragment(ticket.id, fragment));
        }
        assert!(session.finish_stream(ticket.id));

        assert_eq!(session.messages()[1].content, "Hello world");
        assert!(!session.is_loading());
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_blocking_send_appends_reply() {
        let mut session = ChatSession::new();
        let ticket = session.send_message("Hi", &settings(), SendMode::Blocking).unwrap();
        assert!(session.is_loading());
        assert!(!session.is_streaming());
        assert_eq!(session.messages().len(), 1);

        session.complete(
            ticket.id,
            ChatResponse {
                response: "Hey".into(),
                model: "llama3.2".into(),
            },
        );
        assert_eq!(contents(&session), [(Role::User, "Hi"), (Role::Assistant, "Hey")]);
        assert!(!session.is_loading());
    }

    #[test]
    fn test_second_send_while_loading_is_rejected() {
        let mut session = ChatSession::new();
        session.send_message("one", &settings(), SendMode::Streaming).unwrap();
        assert_eq!(
            session.send_message("two", &settings(), SendMode::Streaming).unwrap_err(),
            SessionError::Busy
        );
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_blank_message_is_rejected() {
        let mut session = ChatSession::new();
        assert_eq!(
            session.send_message("  \n", &settings(), SendMode::Streaming).unwrap_err(),
            SessionError::EmptyMessage
        );
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_failure_is_reported_in_transcript() {
        let mut session = ChatSession::new();
        let ticket = session.send_message("Hi", &settings(), SendMode::Streaming).unwrap();
        session.fail(ticket.id, "Failed to start stream: HTTP 500");

        assert_eq!(
            contents(&session),
            [
                (Role::User, "Hi"),
                (Role::Assistant, "Error: Failed to start stream: HTTP 500")
            ]
        );
        assert!(!session.is_loading());
    }

    #[test]
    fn test_failure_mid_stream_keeps_partial_reply() {
        let mut session = ChatSession::new();
        let ticket = session.send_message("Hi", &settings(), SendMode::Streaming).unwrap();
        session.apply_fragment(ticket.id, "partial");
        session.fail(ticket.id, "connection reset");
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[1].content, "partial");
    }

    #[test]
    fn test_stop_cancels_and_discards_late_fragments() {
        let mut session = ChatSession::new();
        let ticket = session.send_message("Hi", &settings(), SendMode::Streaming).unwrap();
        session.apply_fragment(ticket.id, "Hel");
        session.stop_generation();

        assert!(ticket.cancel.is_cancelled());
        assert!(!session.is_loading());
        assert!(!session.is_streaming());
        assert!(!session.apply_fragment(ticket.id, "lo"));
        assert!(!session.finish_stream(ticket.id));
        assert_eq!(session.messages()[1].content, "Hel");

        // A new send can start right away without interleaving.
        let next = session.send_message("Again", &settings(), SendMode::Streaming).unwrap();
        assert_ne!(next.id, ticket.id);
        assert!(!session.apply_fragment(ticket.id, "stale"));
        assert!(session.apply_fragment(next.id, "fresh"));
        assert_eq!(session.messages().last().unwrap().content, "fresh");
    }

    #[test]
    fn test_regenerate_replays_last_turn() {
        let mut session = ChatSession::new();
        session.set_messages(vec![Message::user("A"), Message::assistant("B")]);

        let ticket = session
            .regenerate_last_message(&settings(), SendMode::Streaming)
            .unwrap()
            .unwrap();

        assert_eq!(contents(&session), [(Role::User, "A"), (Role::Assistant, "")]);
        assert_eq!(ticket.request.messages.len(), 1);
        assert_eq!(ticket.request.messages[0].content, "A");
    }

    #[test]
    fn test_regenerate_uses_nearest_user_message() {
        let mut session = ChatSession::new();
        session.set_messages(vec![
            Message::user("first"),
            Message::assistant("one"),
            Message::user("second"),
            Message::assistant("two"),
        ]);
        let ticket = session
            .regenerate_last_message(&settings(), SendMode::Blocking)
            .unwrap()
            .unwrap();
        let history: Vec<_> = ticket.request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(history, ["first", "one", "second"]);
    }

    #[test]
    fn test_regenerate_short_history_is_noop() {
        let mut session = ChatSession::new();
        session.set_messages(vec![Message::user("A")]);
        let revision = session.revision();
        assert!(session
            .regenerate_last_message(&settings(), SendMode::Streaming)
            .unwrap()
            .is_none());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.revision(), revision);
    }

    #[test]
    fn test_clear_cancels_in_flight_request() {
        let mut session = ChatSession::new();
        let ticket = session.send_message("Hi", &settings(), SendMode::Streaming).unwrap();
        session.clear_messages();
        assert!(ticket.cancel.is_cancelled());
        assert!(session.messages().is_empty());
        assert!(!session.apply_fragment(ticket.id, "late"));
    }

    #[test]
    fn test_revision_tracks_transcript_changes() {
        let mut session = ChatSession::new();
        let start = session.revision();
        let ticket = session.send_message("Hi", &settings(), SendMode::Streaming).unwrap();
        let after_send = session.revision();
        assert!(after_send > start);
        session.apply_fragment(ticket.id, "x");
        assert!(session.revision() > after_send);
        let before_stop = session.revision();
        session.stop_generation();
        assert_eq!(session.revision(), before_stop);
    }
}
