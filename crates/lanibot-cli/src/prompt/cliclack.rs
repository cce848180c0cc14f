use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::{input, spinner};
use console::style;
use lanibot::conversation::transcript::ERROR_MARKER;
use lanibot::models::role::Role;
use lanibot::models::turn::Turn;

use super::{Input, InputType, Prompt};

pub struct CliclackPrompt {
    spinner: Option<cliclack::ProgressBar>,
}

impl CliclackPrompt {
    pub fn new() -> Self {
        CliclackPrompt { spinner: None }
    }
}

fn print_markdown(content: &str) {
    let printed = bat::PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("Markdown")
        .theme("zenburn")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if printed.is_err() {
        println!("{}", content);
    }
}

impl Prompt for CliclackPrompt {
    fn render(&mut self, turn: &Turn) {
        match turn.role {
            Role::Assistant if turn.content.starts_with(ERROR_MARKER) => {
                println!("{}", style(&turn.content).red());
            }
            Role::Assistant => {
                println!("{}", style("🪽 Lani Bot").cyan().bold());
                print_markdown(&turn.content);
            }
            Role::User => println!("{}", style(&turn.content).bold()),
            Role::System => println!("{}", style(&turn.content).dim()),
        }
        println!();
    }

    fn render_delta(&mut self, delta: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop("");
            println!("{}", style("🪽 Lani Bot").cyan().bold());
        }
        print!("{}", delta);
        let _ = io::stdout().flush();
    }

    fn get_input(&mut self) -> Result<Input> {
        let message: String = input("Message:").placeholder("").multiline().interact()?;

        if message.trim().eq_ignore_ascii_case("exit") {
            return Ok(Input::exit());
        }
        if message.trim().is_empty() {
            return Ok(Input {
                input_type: InputType::AskAgain,
                content: None,
            });
        }
        Ok(Input::message(message))
    }

    fn show_busy(&mut self) {
        let spin = spinner();
        spin.start("awaiting reply");
        self.spinner = Some(spin);
    }

    fn hide_busy(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop("");
        }
    }

    fn end_reply(&mut self) {
        println!("\n");
    }

    fn close(&self) {
        println!("{}", style("Session closed. Reload to change LLAB focus.").dim());
    }
}
