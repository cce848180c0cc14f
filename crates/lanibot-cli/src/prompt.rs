use anyhow::Result;
use lanibot::models::turn::Turn;

pub mod cliclack;

pub trait Prompt {
    /// Show a whole turn, e.g. the greeting or a failed reply
    fn render(&mut self, turn: &Turn);
    /// Show one streamed piece of the current reply
    fn render_delta(&mut self, delta: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    /// Called once a reply has ended, however it ended
    fn end_reply(&mut self);
    fn close(&self);
}

pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Optional content as sometimes the user may be issuing a command eg. (Exit)
}

impl Input {
    pub fn message<S: Into<String>>(content: S) -> Self {
        Self {
            input_type: InputType::Message,
            content: Some(content.into()),
        }
    }

    pub fn exit() -> Self {
        Self {
            input_type: InputType::Exit,
            content: None,
        }
    }
}

pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Message,  // User sent a message
    Exit,     // User wants to exit the session
}
