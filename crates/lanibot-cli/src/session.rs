use anyhow::Result;
use lanibot::conversation::{Conversation, SendOutcome};
use lanibot::transport::ChatClient;

use crate::prompt::{InputType, Prompt};

pub struct Session<'a> {
    conversation: Conversation,
    client: ChatClient,
    prompt: Box<dyn Prompt + 'a>,
}

impl<'a> Session<'a> {
    pub fn new(conversation: Conversation, client: ChatClient, prompt: Box<dyn Prompt + 'a>) -> Self {
        Session {
            conversation,
            client,
            prompt,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        for turn in self.conversation.turns() {
            self.prompt.render(turn);
        }

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = &input.content {
                        self.exchange(content).await;
                    }
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }
        }
        self.prompt.close();
        Ok(())
    }

    async fn exchange(&mut self, content: &str) -> SendOutcome {
        self.prompt.show_busy();

        let prompt = &mut self.prompt;
        let outcome = tokio::select! {
            outcome = self.conversation.send(&self.client, content, |delta| prompt.render_delta(delta)) => outcome,
            _ = tokio::signal::ctrl_c() => {
                // the send future, and with it the reader, is already dropped here
                self.conversation.abandon();
                SendOutcome::Interrupted
            }
        };

        self.prompt.hide_busy();
        self.prompt.end_reply();
        match &outcome {
            SendOutcome::Completed | SendOutcome::Rejected => {}
            SendOutcome::Failed(_) | SendOutcome::TimedOut | SendOutcome::Interrupted => {
                if let Some(turn) = self.conversation.turns().last() {
                    self.prompt.render(turn);
                }
            }
        }
        outcome
    }
}
