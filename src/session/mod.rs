use futures::StreamExt;
use log::{ debug, info, warn };
use thiserror::Error;
use tokio::sync::watch;

use crate::api::{ ApiError, ChatBackend };
use crate::classify::{ classify, ParsedBlock };
use crate::models::chat::ChatMessage;
use crate::models::stream::StreamEvent;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is still streaming")]
    Busy,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Failed,
    Cancelled,
}

pub fn error_notice(message: &str) -> String {
    format!("❌ **Error:** {}\n\nPlease try again.", message)
}

/// Resolves to `true` once cancellation is requested, `false` if it never can be.
async fn cancel_requested(cancel: &mut watch::Receiver<bool>) -> bool {
    cancel.wait_for(|c| *c).await.is_ok()
}

/// The in-memory transcript of one chat session.
///
/// At most one reply streams at a time; its chunks are applied strictly in
/// arrival order and only to that reply.
#[derive(Debug, Clone)]
pub struct ChatSession {
    session_id: String,
    messages: Vec<ChatMessage>,
    active: Option<String>,
}

impl ChatSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            active: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    /// Records the user's message and an empty reply; returns the reply's id.
    pub fn begin_turn(&mut self, text: &str) -> Result<String, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.is_streaming() {
            return Err(SessionError::Busy);
        }
        self.messages.push(ChatMessage::user(text));
        let reply = ChatMessage::assistant();
        let id = reply.id.clone();
        self.messages.push(reply);
        self.active = Some(id.clone());
        Ok(id)
    }

    /// Applies one event to the streaming reply. Events for any other message are
    /// dropped and `false` is returned.
    pub fn apply(&mut self, reply_id: &str, event: &StreamEvent) -> bool {
        if self.active.as_deref() != Some(reply_id) {
            debug!("Ignoring event for inactive reply {}", reply_id);
            return false;
        }
        let Some(reply) = self.messages.iter_mut().find(|m| m.id == reply_id) else {
            self.active = None;
            return false;
        };
        match event {
            StreamEvent::Content(text) => {
                reply.append(text);
            }
            StreamEvent::Done => {
                self.active = None;
            }
            StreamEvent::Error(message) => {
                if !reply.content.is_empty() {
                    reply.append("\n\n");
                }
                reply.append(&error_notice(message));
                self.active = None;
            }
        }
        true
    }

    /// Stops accepting events for the streaming reply. What has arrived stays.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.active = None;
    }

    /// Replaces the transcript with history fetched from the backend.
    pub fn load_history(&mut self, messages: Vec<ChatMessage>) -> Result<(), SessionError> {
        if self.is_streaming() {
            return Err(SessionError::Busy);
        }
        self.messages = messages;
        Ok(())
    }

    /// Clears the server-side session, then the local transcript. The local copy
    /// is kept when the backend call fails.
    pub async fn reset<B: ChatBackend + ?Sized>(&mut self, backend: &B) -> Result<(), SessionError> {
        backend.clear_session(&self.session_id).await?;
        self.clear();
        Ok(())
    }

    /// Display for the most recent assistant message, computed on read.
    pub fn last_block(&self) -> Option<(&ChatMessage, ParsedBlock)> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(|m| (m, classify(m)))
    }

    /// Runs one full turn: sends `text`, applies the streamed reply and returns how
    /// it ended. `on_event` sees the reply after every applied event. Setting the
    /// `cancel` channel to `true` stops the stream.
    pub async fn send<B, F>(
        &mut self,
        backend: &B,
        text: &str,
        cancel: &mut watch::Receiver<bool>,
        mut on_event: F
    ) -> Result<TurnOutcome, SessionError>
        where B: ChatBackend + ?Sized, F: FnMut(&ChatMessage, &StreamEvent)
    {
        let reply_id = self.begin_turn(text)?;
        info!("Sending message in session {}", self.session_id);
        let session_id = self.session_id.clone();
        let mut watching = true;

        // Cancellation also applies while waiting for the response headers.
        let opening = backend.stream_chat(text, &session_id);
        tokio::pin!(opening);
        let mut stream = loop {
            tokio::select! {
                biased;
                cancelled = cancel_requested(cancel), if watching => {
                    if cancelled {
                        self.cancel();
                        info!("Reply {} cancelled before the stream opened", reply_id);
                        return Ok(TurnOutcome::Cancelled);
                    }
                    watching = false;
                }
                stream = &mut opening => break stream,
            }
        };

        let outcome = loop {
            tokio::select! {
                biased;
                cancelled = cancel_requested(cancel), if watching => {
                    if cancelled {
                        stream.cancel();
                        self.cancel();
                        info!("Reply {} cancelled", reply_id);
                        break TurnOutcome::Cancelled;
                    }
                    watching = false;
                }
                next = stream.next() => {
                    let Some(event) = next else {
                        warn!("Reply stream closed without a terminal event");
                        self.cancel();
                        break TurnOutcome::Completed;
                    };
                    self.apply(&reply_id, &event);
                    if let Some(reply) = self.message(&reply_id) {
                        on_event(reply, &event);
                    }
                    match event {
                        StreamEvent::Done => break TurnOutcome::Completed,
                        StreamEvent::Error(_) => break TurnOutcome::Failed,
                        StreamEvent::Content(_) => {}
                    }
                }
            }
        };
        Ok(outcome)
    }
}
