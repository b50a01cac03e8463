//! Configuration management for aacbridge

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::types::SessionStyle;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub dispatcher: DispatcherConfig,
    pub llm: LlmConfig,
    pub commands: CommandsConfig,
    pub chat_context: ChatContextConfig,
    pub speech: SpeechConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

/// Filesystem layout
///
/// Every directory is optional; unset entries are derived from `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: Option<PathBuf>,
    /// Directory the input device drops marker files into
    pub comm_dir: Option<PathBuf>,
    pub artifacts_dir: Option<PathBuf>,
    pub chats_dir: Option<PathBuf>,
}

impl PathsConfig {
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "aacbridge")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("aacbridge-data"))
    }

    pub fn comm_dir(&self) -> PathBuf {
        self.comm_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("comm"))
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.artifacts_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("artifacts"))
    }

    pub fn chats_dir(&self) -> PathBuf {
        self.chats_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("chats"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Sleep between two marker scans
    pub poll_interval_ms: u64,
    /// Pause between a clipboard write and the notifier ping
    pub notify_delay_ms: u64,
    /// Style of the session created at startup
    pub initial_style: SessionStyle,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            notify_delay_ms: 100,
            initial_style: SessionStyle::default(),
        }
    }
}

/// Model identifier plus generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ModelConfig {
    fn new(model: &str, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            temperature,
            max_tokens,
        }
    }

    fn is_valid(&self) -> bool {
        !self.model.trim().is_empty() && self.max_tokens > 0
    }
}

pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
const WRITING_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Temperature used when a style has no usable entry
pub const FALLBACK_TEMPERATURE: f32 = 0.7;
/// Output budget used when a style has no usable entry
pub const FALLBACK_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Model used when a style has no usable entry in `models`
    pub default_model: String,
    /// Most recent history entries sent with each request
    pub max_history_messages: usize,
    /// Language replies are expected in ("it", "en"); other values skip the check
    pub language: String,
    /// Per-style model table, keyed by style identifier
    pub models: BTreeMap<String, ModelConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let models = [
            (SessionStyle::Exploration, ModelConfig::new(WRITING_MODEL, 0.7, 1000)),
            (SessionStyle::CreativeWriting, ModelConfig::new(WRITING_MODEL, 0.9, 2000)),
            (SessionStyle::ArticleWriting, ModelConfig::new(WRITING_MODEL, 0.6, 3000)),
            (SessionStyle::Translation, ModelConfig::new(DEFAULT_MODEL, 0.3, 500)),
            (SessionStyle::Chat, ModelConfig::new(DEFAULT_MODEL, 0.8, 800)),
        ]
        .into_iter()
        .map(|(style, cfg)| (style.as_str().to_string(), cfg))
        .collect();

        Self {
            provider: "claude".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            max_history_messages: 10,
            language: "it".to_string(),
            models,
        }
    }
}

/// Resolve the model configuration for `style`
///
/// Precedence:
/// 1. `llm.models[style]` when present and valid (non-empty model, `max_tokens > 0`)
/// 2. `llm.default_model` with temperature 0.7 and 1000 max tokens, logged as a warning
///
/// Never fails.
pub fn resolve_model_config(style: SessionStyle, llm: &LlmConfig) -> ModelConfig {
    match llm.models.get(style.as_str()) {
        Some(cfg) if cfg.is_valid() => cfg.clone(),
        Some(_) => {
            tracing::warn!(
                "Invalid model configuration for style {}, using default parameters",
                style
            );
            fallback_model_config(llm)
        }
        None => {
            tracing::warn!(
                "No model configuration for style {}, using default parameters",
                style
            );
            fallback_model_config(llm)
        }
    }
}

fn fallback_model_config(llm: &LlmConfig) -> ModelConfig {
    let model = if llm.default_model.trim().is_empty() {
        DEFAULT_MODEL
    } else {
        llm.default_model.as_str()
    };
    ModelConfig::new(model, FALLBACK_TEMPERATURE, FALLBACK_MAX_TOKENS)
}

/// Literal control tokens recognised in the clipboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Ask for an alternative to the last answer
    pub retry: String,
    /// Ask for the final polished content of the session
    pub emit_final: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            retry: "RIPROVA".to_string(),
            emit_final: "STAMPA".to_string(),
        }
    }
}

/// Run-time parameters for the conversational style
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatContextConfig {
    /// Messaging platform replies are meant for (whatsapp, telegram, facebook, ...)
    pub platform: String,
    pub participants: Vec<String>,
    /// informal, formal or friendly
    pub tone: String,
    /// Target reply length in characters
    pub max_length: usize,
}

impl Default for ChatContextConfig {
    fn default() -> Self {
        Self {
            platform: "whatsapp".to_string(),
            participants: Vec::new(),
            tone: "informal".to_string(),
            max_length: 200,
        }
    }
}

/// External speech synthesiser
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SpeechConfig {
    /// Program and arguments; the text is appended as the last argument.
    /// When empty, speech is only logged.
    pub command: Vec<String>,
}

/// Command run after each clipboard write so the input device reloads it
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotifyConfig {
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also append logs to this file
    pub file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, or the default location when `None`
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "aacbridge") {
            let config_dir = proj_dirs.config_dir();
            std::fs::create_dir_all(config_dir)?;
            Ok(config_dir.join("config.toml"))
        } else {
            Ok(PathBuf::from("config.toml"))
        }
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// API key read from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_every_style_has_a_default_entry() {
        let llm = LlmConfig::default();
        for style in SessionStyle::ALL {
            assert!(llm.models.contains_key(style.as_str()), "{style}");
        }
    }

    #[test]
    fn test_resolve_uses_table_entry() {
        let llm = LlmConfig::default();
        let cfg = resolve_model_config(SessionStyle::CreativeWriting, &llm);
        assert_eq!(cfg.max_tokens, 2000);
        assert!((cfg.temperature - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_resolve_falls_back_when_missing() {
        let mut llm = LlmConfig::default();
        llm.models.remove("chat");
        llm.default_model = "my-model".to_string();

        let cfg = resolve_model_config(SessionStyle::Chat, &llm);
        assert_eq!(cfg.model, "my-model");
        assert_eq!(cfg.max_tokens, FALLBACK_MAX_TOKENS);
    }

    #[test]
    fn test_resolve_falls_back_when_invalid() {
        let mut llm = LlmConfig::default();
        llm.models
            .insert("translation".into(), ModelConfig::new("", 0.3, 500));

        let cfg = resolve_model_config(SessionStyle::Translation, &llm);
        assert_eq!(cfg.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let content = r#"
            [dispatcher]
            poll_interval_ms = 250

            [llm.models.chat]
            model = "custom"
            temperature = 1.0
            max_tokens = 64
        "#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.dispatcher.poll_interval_ms, 250);
        assert_eq!(config.dispatcher.notify_delay_ms, 100);
        assert_eq!(config.commands.retry, "RIPROVA");

        // A user table replaces the built-in one, so missing styles fall back
        let chat = resolve_model_config(SessionStyle::Chat, &config.llm);
        assert_eq!(chat.model, "custom");
        let explore = resolve_model_config(SessionStyle::Exploration, &config.llm);
        assert_eq!(explore.max_tokens, FALLBACK_MAX_TOKENS);
    }

    #[test]
    fn test_config_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.paths.data_dir = Some(temp.path().to_path_buf());
        config.speech.command = vec!["espeak".into(), "-v".into(), "it".into()];
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.speech.command, config.speech.command);
        assert_eq!(loaded.paths.comm_dir(), temp.path().join("comm"));
        assert_eq!(loaded.llm.models.len(), 5);
    }

    #[test]
    fn test_missing_file_yields_default() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(Some(&temp.path().join("absent.toml"))).unwrap();
        assert_eq!(config.llm.max_history_messages, 10);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[llm\nprovider = ").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
