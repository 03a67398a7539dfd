use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::summary::Language;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct GauzConfig {
    pub api: ApiSection,
    pub llm: LlmConfig,
    pub summary: SummaryConfig,
    pub chat: ChatConfig,
    pub console: ConsoleConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub project_id: String,
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SummaryConfig {
    pub max_facts: usize,
    pub max_relations: usize,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub temperature: f64,
    pub max_tokens: u32,
    pub history_window: usize,
    pub user_id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ConsoleConfig {
    pub page_size: u32,
    pub log_level: String,
    pub language: Language,
    pub render_delay_ms: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            project_id: "claude_code_memory".into(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".into(),
            model: "qwen3-next-80b-a3b-instruct".into(),
            api_key: String::new(),
            timeout_secs: 45,
        }
    }
}

// The API key must never end up in logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_facts: 40,
            max_relations: 80,
            temperature: 0.2,
            max_tokens: 320,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            history_window: 20,
            user_id: "playground".into(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            log_level: "info".into(),
            language: Language::En,
            render_delay_ms: 50,
        }
    }
}

/// Returns `~/.gauzmem/`
pub fn default_gauzmem_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gauzmem")
}

/// Returns the default config file path: `~/.gauzmem/config.toml`
pub fn default_config_path() -> PathBuf {
    default_gauzmem_dir().join("config.toml")
}

impl GauzConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::read_file(path.as_ref())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse the file alone, without env overrides.
    fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config file at {}, using defaults", path.display());
            return Ok(GauzConfig::default());
        }
        let contents = std::fs::read_to_string(path).context("failed to read config file")?;
        toml::from_str(&contents).context("failed to parse config TOML")
    }

    /// Persist the display language to the file at `path`.
    ///
    /// Starts from the file's own contents, so env overrides (including the
    /// API key) are never written out.
    pub fn save_language(path: impl AsRef<Path>, language: Language) -> Result<()> {
        let path = path.as_ref();
        let mut config = Self::read_file(path)?;
        config.console.language = language;
        config.save_to(path)
    }

    /// Write the config as TOML, creating the parent directory if needed.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        info!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Apply environment variable overrides (GAUZMEM_API_BASE, GAUZMEM_PROJECT,
    /// GAUZMEM_LLM_BASE, GAUZMEM_LLM_MODEL, GAUZMEM_LLM_API_KEY, GAUZMEM_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GAUZMEM_API_BASE") {
            self.api.base_url = val;
        }
        if let Ok(val) = std::env::var("GAUZMEM_PROJECT") {
            self.api.project_id = val;
        }
        if let Ok(val) = std::env::var("GAUZMEM_LLM_BASE") {
            self.llm.base_url = val;
        }
        if let Ok(val) = std::env::var("GAUZMEM_LLM_MODEL") {
            self.llm.model = val;
        }
        if let Ok(val) = std::env::var("GAUZMEM_LLM_API_KEY") {
            self.llm.api_key = val;
        }
        if let Ok(val) = std::env::var("GAUZMEM_LOG_LEVEL") {
            self.console.log_level = val;
        }
    }

    /// The backend connection settings as an explicit value for [`crate::api::ApiClient`].
    pub fn api_config(&self) -> crate::api::ApiConfig {
        crate::api::ApiConfig::new(&self.api.base_url, &self.api.project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GauzConfig::default();
        assert_eq!(config.api.project_id, "claude_code_memory");
        assert_eq!(config.llm.timeout_secs, 45);
        assert_eq!(config.summary.max_facts, 40);
        assert_eq!(config.summary.max_relations, 80);
        assert_eq!(config.console.page_size, 10);
        assert_eq!(config.console.language, Language::En);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[api]
base_url = "http://memory.internal:9000/"
project_id = "writer"

[console]
log_level = "debug"
language = "zh"
"#;
        let config: GauzConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "http://memory.internal:9000/");
        assert_eq!(config.api.project_id, "writer");
        assert_eq!(config.console.log_level, "debug");
        assert_eq!(config.console.language, Language::Zh);
        // defaults still apply for unset fields
        assert_eq!(config.console.page_size, 10);
        assert_eq!(config.chat.history_window, 20);
    }

    #[test]
    fn api_config_strips_trailing_slashes() {
        let mut config = GauzConfig::default();
        config.api.base_url = "http://memory.internal:9000///".into();
        assert_eq!(config.api_config().base_url, "http://memory.internal:9000");
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut llm = LlmConfig::default();
        llm.api_key = "sk-secret".into();
        let rendered = format!("{llm:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = GauzConfig::default();
        std::env::set_var("GAUZMEM_API_BASE", "http://override:1234");
        std::env::set_var("GAUZMEM_PROJECT", "env-project");
        std::env::set_var("GAUZMEM_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.api.base_url, "http://override:1234");
        assert_eq!(config.api.project_id, "env-project");
        assert_eq!(config.console.log_level, "trace");

        // Clean up
        std::env::remove_var("GAUZMEM_API_BASE");
        std::env::remove_var("GAUZMEM_PROJECT");
        std::env::remove_var("GAUZMEM_LOG_LEVEL");
    }
}
