use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct QuillConfig {
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub browser: BrowserSection,
    #[serde(default)]
    pub injector: InjectorSection,
    #[serde(default)]
    pub prompt: PromptSection,
    #[serde(default)]
    pub settings: SettingsSection,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RelaySection {
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 150,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BrowserSection {
    pub debugger_host: String,
    pub debugger_port: u16,
    pub probe_timeout_ms: u64,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            debugger_host: "127.0.0.1".to_string(),
            debugger_port: 9222,
            probe_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InjectorSection {
    /// When the declared platform's selectors all miss, also try the other
    /// platform's list before giving up. Off by default.
    pub fallback_across_platforms: bool,
}

impl Default for InjectorSection {
    fn default() -> Self {
        Self {
            fallback_across_platforms: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PromptSection {
    pub instagram_instruction: Option<String>,
    pub x_instruction: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SettingsSection {
    /// Settings file location; `~` is expanded by the CLI.
    pub path: String,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            path: "~/.config/quill/settings.json".to_string(),
        }
    }
}

impl QuillConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }

    /// Load the config file if it exists; otherwise run on defaults. Every
    /// section has serde defaults, so a partial file is also fine.
    pub fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_api_contract() {
        let config = QuillConfig::default();
        assert_eq!(config.relay.model, "gpt-4o");
        assert_eq!(config.relay.max_tokens, 150);
        assert_eq!(config.relay.temperature, 0.7);
        assert_eq!(config.browser.debugger_port, 9222);
        assert!(!config.injector.fallback_across_platforms);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = QuillConfig::load_or_default("/nonexistent/quill.toml").unwrap();
        assert_eq!(config.relay.base_url, "https://api.openai.com/v1");
    }
}
