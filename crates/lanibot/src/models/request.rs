use super::turn::Turn;
use crate::errors::{ChatError, ChatResult};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Highest LLAB number offered on the selection screen
pub const MAX_LLAB: u32 = 12;

/// How the backend mixes its fixed question bank with generated questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuizMode {
    #[default]
    Mixed,
    StaticOnly,
    AiOnly,
}

/// Topic selection and quiz mode for one session. Fixed once the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    llab_numbers: Vec<u32>,
    quiz_mode: QuizMode,
}

impl SessionParams {
    pub fn new(llab_numbers: impl IntoIterator<Item = u32>, quiz_mode: QuizMode) -> ChatResult<Self> {
        let mut llab_numbers: Vec<u32> = llab_numbers.into_iter().collect();
        if llab_numbers.is_empty() {
            return Err(ChatError::InvalidSession(
                "Please select at least one LLAB".to_string(),
            ));
        }
        if let Some(bad) = llab_numbers.iter().find(|n| !(1..=MAX_LLAB).contains(*n)) {
            return Err(ChatError::InvalidSession(format!(
                "LLAB {} does not exist (expected 1-{})",
                bad, MAX_LLAB
            )));
        }
        llab_numbers.sort_unstable();
        llab_numbers.dedup();

        Ok(Self {
            llab_numbers,
            quiz_mode,
        })
    }

    pub fn llab_numbers(&self) -> &[u32] {
        &self.llab_numbers
    }

    pub fn quiz_mode(&self) -> QuizMode {
        self.quiz_mode
    }

    /// "LLAB 1, LLAB 3" style label used in the greeting
    pub fn topic_label(&self) -> String {
        self.llab_numbers
            .iter()
            .map(|n| format!("LLAB {}", n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Body posted to the chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Turn>,
    pub llab_numbers: Vec<u32>,
    pub quiz_mode: QuizMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turnstile_token: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Turn>, params: &SessionParams) -> Self {
        Self {
            messages,
            llab_numbers: params.llab_numbers().to_vec(),
            quiz_mode: params.quiz_mode(),
            turnstile_token: None,
        }
    }

    /// Attach the verification credential
    pub fn with_credential<S: Into<String>>(mut self, credential: S) -> Self {
        self.turnstile_token = Some(credential.into());
        self
    }
}
