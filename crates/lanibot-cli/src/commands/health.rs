use anyhow::{bail, Result};
use console::style;
use lanibot::config::Settings;

use super::build_client;

pub async fn handle_health(settings: Settings) -> Result<()> {
    let base_url = settings.api.base_url.clone();
    let client = build_client(settings)?;

    if client.check_health().await {
        println!("{} {}", style("✔").green(), base_url);
        Ok(())
    } else {
        bail!("Backend at {} is not healthy", base_url)
    }
}
