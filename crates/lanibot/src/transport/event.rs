use crate::errors::{ChatError, ChatResult};

/// One step of a streamed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Complete,
    Error(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete | StreamEvent::Error(_))
    }

    pub fn as_delta(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(text) => Some(text),
            _ => None,
        }
    }
}

impl From<ChatError> for StreamEvent {
    fn from(err: ChatError) -> Self {
        StreamEvent::Error(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    AwaitingCredential,
    Streaming,
    Completed,
    Failed,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Completed | StreamState::Failed)
    }
}

/// Tracks one stream invocation and refuses anything after its terminal event
#[derive(Debug)]
pub struct StreamGuard {
    state: StreamState,
}

impl Default for StreamGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamGuard {
    pub fn new() -> Self {
        Self {
            state: StreamState::Idle,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn awaiting_credential(&mut self) {
        if self.state == StreamState::Idle {
            self.state = StreamState::AwaitingCredential;
        }
    }

    pub fn streaming(&mut self) {
        if !self.state.is_terminal() {
            self.state = StreamState::Streaming;
        }
    }

    /// Let `event` through unless the stream already terminated
    pub fn admit(&mut self, event: StreamEvent) -> ChatResult<StreamEvent> {
        if self.state.is_terminal() {
            tracing::warn!("Dropping {:?} delivered after {:?}", event, self.state);
            return Err(ChatError::LateDelivery);
        }
        match event {
            StreamEvent::Complete => self.state = StreamState::Completed,
            StreamEvent::Error(_) => self.state = StreamState::Failed,
            StreamEvent::Delta(_) => {}
        }
        Ok(event)
    }
}
