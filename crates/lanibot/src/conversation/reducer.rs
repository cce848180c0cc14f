use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{debug, warn};

use super::transcript::Transcript;
use crate::errors::ChatResult;
use crate::models::request::{ChatRequest, SessionParams};
use crate::models::turn::Turn;
use crate::transport::{ChatClient, StreamEvent};

/// How a call to [`Conversation::send`] ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Empty input, or another reply is still streaming. Nothing was sent.
    Rejected,
    Completed,
    Failed(String),
    /// The configured stream timeout expired and the reader was dropped
    TimedOut,
    /// The caller dropped the reader, e.g. on Ctrl-C
    Interrupted,
}

/// Conversation state for one session, driven by stream events
#[derive(Debug, Clone)]
pub struct Conversation {
    params: SessionParams,
    transcript: Transcript,
    sending: bool,
}

impl Conversation {
    /// Start a session, seeding the transcript with the greeting
    pub fn new(params: SessionParams) -> Self {
        let greeting = Turn::assistant(greeting_text(&params));
        Self {
            transcript: Transcript::with_greeting(greeting),
            params,
            sending: false,
        }
    }

    /// Start a session with an empty transcript
    pub fn without_greeting(params: SessionParams) -> Self {
        Self {
            params,
            transcript: Transcript::new(),
            sending: false,
        }
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn turns(&self) -> &[Turn] {
        self.transcript.turns()
    }

    /// Whether a reply is still streaming
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Record the user's message and open an empty reply.
    ///
    /// Returns the request to send, or `None` when the input is blank or a
    /// reply is already streaming. The request carries no credential yet.
    pub fn begin_send(&mut self, input: &str) -> Option<ChatRequest> {
        let content = input.trim();
        if content.is_empty() || self.sending {
            return None;
        }

        let user = Turn::user(content);
        let mut messages = self.transcript.history();
        messages.push(user.clone());

        self.transcript.push(user);
        self.transcript.open_reply();
        self.sending = true;

        Some(ChatRequest::new(messages, &self.params))
    }

    /// Fold one stream event into the transcript.
    ///
    /// Events arriving when no reply is open are refused with
    /// [`crate::errors::ChatError::LateDelivery`] and leave the transcript untouched.
    pub fn apply(&mut self, event: StreamEvent) -> ChatResult<()> {
        let result = match &event {
            StreamEvent::Delta(text) => self.transcript.append_delta(text),
            StreamEvent::Complete => self.transcript.complete(),
            StreamEvent::Error(message) => self.transcript.fail(message),
        };

        match result {
            Ok(()) => {
                if event.is_terminal() {
                    self.sending = false;
                }
                Ok(())
            }
            Err(e) => {
                warn!("Dropping {:?}: {}", event, e);
                Err(e)
            }
        }
    }

    /// The reader for the current reply was dropped before a terminal event.
    /// Keeps the partial reply, marks it as interrupted and allows the next send.
    pub fn abandon(&mut self) {
        if self.transcript.interrupt() {
            debug!("Abandoned in-flight reply");
        }
        self.sending = false;
    }

    /// Run one full exchange: record `input`, stream the reply from `client`
    /// and fold it in. `on_delta` sees each delta once it has been applied.
    pub async fn send<F>(&mut self, client: &ChatClient, input: &str, mut on_delta: F) -> SendOutcome
    where
        F: FnMut(&str),
    {
        let Some(request) = self.begin_send(input) else {
            return SendOutcome::Rejected;
        };

        let events = client.stream_chat(request);
        match client.stream_timeout() {
            None => self.drain(events, &mut on_delta).await,
            Some(limit) => {
                let result = tokio::time::timeout(limit, self.drain(events, &mut on_delta)).await;
                match result {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!("Reply did not finish within {:?}", limit);
                        self.abandon();
                        SendOutcome::TimedOut
                    }
                }
            }
        }
    }

    async fn drain<F>(&mut self, mut events: BoxStream<'_, StreamEvent>, on_delta: &mut F) -> SendOutcome
    where
        F: FnMut(&str),
    {
        while let Some(event) = events.next().await {
            let outcome = match &event {
                StreamEvent::Delta(_) => None,
                StreamEvent::Complete => Some(SendOutcome::Completed),
                StreamEvent::Error(message) => Some(SendOutcome::Failed(message.clone())),
            };
            let delta = event.as_delta().map(str::to_string);

            if self.apply(event).is_ok() {
                if let Some(delta) = delta {
                    on_delta(&delta);
                }
            }
            if let Some(outcome) = outcome {
                return outcome;
            }
        }

        // stream_chat always ends with a terminal event, so this only runs if it was cut short
        self.abandon();
        SendOutcome::Failed("Stream ended unexpectedly".to_string())
    }
}

fn greeting_text(params: &SessionParams) -> String {
    format!(
        "Welcome, Cadet! I'm Lani Bot, your study assistant. I'm ready to help you prepare for {}.\n\nSay hello to get started!",
        params.topic_label()
    )
}
