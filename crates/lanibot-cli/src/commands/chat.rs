use anyhow::Result;
use lanibot::config::Settings;
use lanibot::conversation::Conversation;
use lanibot::models::request::{QuizMode, SessionParams};

use super::build_client;
use crate::prompt::cliclack::CliclackPrompt;
use crate::session::Session;

pub async fn handle_chat(settings: Settings, llabs: Vec<u32>, mode: QuizMode) -> Result<()> {
    let params = SessionParams::new(llabs, mode)?;
    let client = build_client(settings)?;
    let conversation = Conversation::new(params);

    let mut session = Session::new(conversation, client, Box::new(CliclackPrompt::new()));
    session.start().await
}
