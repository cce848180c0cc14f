use anyhow::{anyhow, bail, Result};
use bat::WrappingMode;
use lanibot::config::Settings;
use lanibot::models::question::StaticQuestion;
use lanibot::models::request::{QuizMode, SessionParams};

use super::build_client;

pub async fn handle_question(settings: Settings, llabs: Vec<u32>) -> Result<()> {
    let params = SessionParams::new(llabs, QuizMode::StaticOnly)?;
    let client = build_client(settings)?;

    let Some(question) = client.static_question(params.llab_numbers()).await else {
        bail!("No question available for {}", params.topic_label());
    };

    let markdown = to_markdown(&question);
    bat::PrettyPrinter::new()
        .input_from_bytes(markdown.as_bytes())
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|e| anyhow!("Failed to render question: {}", e))?;
    Ok(())
}

fn to_markdown(question: &StaticQuestion) -> String {
    let mut markdown = format!("## {}\n\n{}\n", question.kind, question.question);
    if let Some(options) = &question.options {
        markdown.push('\n');
        for (letter, option) in ('A'..='Z').zip(options) {
            markdown.push_str(&format!("- **{}.** {}\n", letter, option));
        }
    }
    if let Some(aircraft) = &question.aircraft {
        markdown.push_str(&format!("\n_Aircraft: {}_\n", aircraft));
    }
    markdown.push_str(&format!("\n> Answer: {}\n", question.correct_answer));
    markdown
}
