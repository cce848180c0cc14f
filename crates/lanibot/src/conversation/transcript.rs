use crate::errors::{ChatError, ChatResult};
use crate::models::role::Role;
use crate::models::turn::Turn;

/// Prefix shown in place of a reply that failed
pub const ERROR_MARKER: &str = "⚠️ Error: ";

/// Appended to a reply whose stream was abandoned before it finished
pub const INTERRUPTED_MARKER: &str = "[interrupted]";

/// Ordered turns of one session.
///
/// Only the in-flight assistant turn, always the last one, can change. Snapshots
/// handed out by [`Transcript::snapshot`] are copies and never see later updates.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    in_flight: Option<usize>,
    greeting: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript with a greeting that is shown but never sent to the backend
    pub fn with_greeting(greeting: Turn) -> Self {
        Self {
            turns: vec![greeting],
            in_flight: None,
            greeting: true,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn in_flight(&self) -> Option<&Turn> {
        self.in_flight.map(|index| &self.turns[index])
    }

    /// Settled turns to send as conversation history, without the greeting
    pub fn history(&self) -> Vec<Turn> {
        let start = usize::from(self.greeting);
        let end = self.in_flight.unwrap_or(self.turns.len());
        self.turns[start.min(end)..end].to_vec()
    }

    pub fn push(&mut self, turn: Turn) {
        debug_assert!(self.in_flight.is_none(), "turn appended during a reply");
        self.turns.push(turn);
    }

    /// Append the empty assistant turn that will receive the next reply
    pub fn open_reply(&mut self) {
        debug_assert!(self.in_flight.is_none(), "reply already in flight");
        self.turns.push(Turn::assistant(""));
        self.in_flight = Some(self.turns.len() - 1);
    }

    pub fn append_delta(&mut self, delta: &str) -> ChatResult<()> {
        let index = self.in_flight.ok_or(ChatError::LateDelivery)?;
        self.turns[index] = self.turns[index].with_delta(delta);
        Ok(())
    }

    /// The reply finished normally; its content stays as the deltas built it
    pub fn complete(&mut self) -> ChatResult<()> {
        self.in_flight.take().ok_or(ChatError::LateDelivery)?;
        Ok(())
    }

    /// Replace the reply with a visible error message
    pub fn fail(&mut self, message: &str) -> ChatResult<()> {
        let index = self.in_flight.take().ok_or(ChatError::LateDelivery)?;
        self.turns[index] = Turn::new(Role::Assistant, format!("{}{}", ERROR_MARKER, message));
        Ok(())
    }

    /// Close the reply without a terminal event, keeping what arrived so far
    pub fn interrupt(&mut self) -> bool {
        let Some(index) = self.in_flight.take() else {
            return false;
        };
        let turn = &self.turns[index];
        let marker = if turn.content.is_empty() {
            INTERRUPTED_MARKER.to_string()
        } else {
            format!("\n\n{}", INTERRUPTED_MARKER)
        };
        self.turns[index] = turn.with_delta(&marker);
        true
    }
}
