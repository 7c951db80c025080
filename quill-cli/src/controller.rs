//! The generate workflow: one user trigger, one sequential cycle.
//!
//! Validate credential → classify the tab URL → probe the page → capture →
//! load instructions → relay → inject. Every step is awaited before the next
//! begins, every failure is terminal for the cycle, and nothing is retried.

use quill_core::{
    classify_url, PromptSet, QuillConfig, QuillError, RelayClient, RelayConfig, SettingsStore,
};

use crate::browser::PageChannel;

/// Run one screenshot-and-draft cycle against the attached page.
///
/// Returns the injected comment text. On an injection failure the draft has
/// already been echoed to stderr so the user can paste it by hand.
pub async fn run_generate(
    settings: &SettingsStore,
    config: &QuillConfig,
    page: &dyn PageChannel,
) -> Result<String, QuillError> {
    let api_key = settings.api_key();
    if api_key.trim().is_empty() {
        return Err(QuillError::MissingCredential);
    }
    // Advisory only: unusual keys still get sent.
    if !api_key.starts_with("sk-") {
        tracing::warn!("API key does not start with \"sk-\" — it may not be an OpenAI key");
    }

    let url = page.current_url().await?;
    let platform = classify_url(&url).ok_or(QuillError::UnsupportedPage { url })?;

    if !page.probe().await {
        return Err(QuillError::InjectorNotReady);
    }

    eprintln!("Taking screenshot and generating comment...");
    let screenshot = page.capture().await?;

    eprintln!("Analyzing with AI vision...");
    let instructions = settings.instructions_or_default();
    let relay = RelayClient::new(
        RelayConfig {
            api_key,
            model: config.relay.model.clone(),
            base_url: config.relay.base_url.clone(),
            max_tokens: config.relay.max_tokens,
            temperature: config.relay.temperature,
        },
        PromptSet::from_config(&config.prompt),
    )?;
    let comment = relay.generate(&screenshot, &instructions, platform).await?;

    eprintln!("Comment generated! Injecting...");
    match page.inject(&comment, platform).await {
        Ok(()) => {
            eprintln!("✅ Comment injected successfully!");
            Ok(comment)
        }
        Err(err) => {
            // The draft survived even though the page write did not.
            eprintln!("Generated comment (paste manually): {comment}");
            Err(err)
        }
    }
}
