//! Prompt assembly for the drafting request.
//!
//! The system message is always the fixed drafting-assistant context prefix
//! followed by the user's saved instructions. The per-platform instruction
//! sentence in the user message is configuration, not code: defaults below,
//! overridable via the `[prompt]` config section.

use crate::config::PromptSection;
use crate::platform::Platform;

/// Fixed clarification prepended to the user's instructions. Frames the call
/// as human-reviewed drafting, which measurably reduces model refusals.
pub const CONTEXT_PREFIX: &str = "**Context:** The user owns this account and is asking you to help them draft a reply. They will decide whether to post it. You are a writing assistant, not automating their account. The user always controls what gets posted. Generate the draft reply as requested.\n\n---\n\n";

/// Bundled fallback/reset instructions, compiled into the binary.
pub const DEFAULT_INSTRUCTIONS: &str = include_str!("../assets/default_instructions.txt");

const INSTAGRAM_INSTRUCTION: &str = "The user owns this account and is asking for help drafting their comment. This screenshot shows an Instagram post they want to respond to. Please read the post caption, then write a draft comment using the system instructions. The user will review and post it themselves. Output only the comment text (or \"skip\" if irrelevant).";

const X_INSTRUCTION: &str = "The user owns this account and is asking for help drafting their reply. This screenshot shows a tweet they want to respond to. Please read the tweet text, then write a draft reply using the system instructions. The user will review and post it themselves. Output only the reply text (or \"skip\" if irrelevant). Keep under 280 characters.";

/// The per-platform user-message instruction sentences.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub instagram: String,
    pub x: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            instagram: INSTAGRAM_INSTRUCTION.to_string(),
            x: X_INSTRUCTION.to_string(),
        }
    }
}

impl PromptSet {
    /// Build the prompt set, applying any configured overrides.
    pub fn from_config(section: &PromptSection) -> Self {
        let defaults = Self::default();
        Self {
            instagram: section
                .instagram_instruction
                .clone()
                .unwrap_or(defaults.instagram),
            x: section.x_instruction.clone().unwrap_or(defaults.x),
        }
    }

    pub fn instruction_for(&self, platform: Platform) -> &str {
        match platform {
            Platform::Instagram => &self.instagram,
            Platform::X => &self.x,
        }
    }

    /// The full system-message content for a given instructions string.
    pub fn system_content(instructions: &str) -> String {
        format!("{CONTEXT_PREFIX}{instructions}")
    }
}
