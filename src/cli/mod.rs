pub mod chat;
pub mod facts;
pub mod search;
pub mod stats;
pub mod subgraphs;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use gauzmem::api::ApiClient;
use gauzmem::config::GauzConfig;
use gauzmem::graph::truncate;
use gauzmem::summary::Language;

/// Build a backend client from the effective config.
pub fn api_client(config: &GauzConfig) -> Result<ApiClient> {
    let client = ApiClient::new(
        config.api_config(),
        Duration::from_secs(config.api.request_timeout_secs),
    )
    .context("failed to build HTTP client")?;
    Ok(client.with_user_id(config.chat.user_id.clone()))
}

/// Spinner on stderr for requests that may take a while.
fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Single-line preview of `text`, at most `max` characters.
fn preview(text: &str, max: usize) -> String {
    truncate(&text.replace('\n', " "), max)
}

/// Persist the display language.
pub fn lang(path: &Path, language: Language) -> Result<()> {
    GauzConfig::save_language(path, language)?;
    println!("Display language set to {language}.");
    Ok(())
}
