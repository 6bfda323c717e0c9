use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::framework::Framework;
use crate::provider::Provider;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    pub default_framework: Option<String>,
    pub gemini_api_key: Option<String>,
    pub claude_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Chat-completions compatible endpoint used instead of api.openai.com.
    pub openai_base_url: Option<String>,
    /// Gemini API root used instead of generativelanguage.googleapis.com.
    pub gemini_base_url: Option<String>,
    pub ollama_url: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::default().as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Loads the stored config, applies `update`, and writes it back.
    pub fn update(update: impl FnOnce(&mut Config)) -> Result<()> {
        Self::update_at(&Self::get_config_path()?, update)
    }

    /// A file that fails to parse is left untouched and the error is returned.
    pub fn update_at(path: &Path, update: impl FnOnce(&mut Config)) -> Result<()> {
        let mut config = Self::load_from(path)?;
        update(&mut config);
        config.save_to(path)
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or_default()
    }

    pub fn framework(&self) -> Framework {
        self.default_framework
            .as_deref()
            .and_then(Framework::from_str)
            .unwrap_or_default()
    }

    pub fn ollama_url(&self) -> String {
        std::env::var("OLLAMA_HOST")
            .ok()
            .or_else(|| self.ollama_url.clone())
            .unwrap_or_else(|| crate::ai::ollama::DEFAULT_OLLAMA_URL.to_string())
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Environment first, then the config file.
    pub fn api_key(&self, provider: Provider) -> Option<String> {
        let from_env = provider
            .api_key_env()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.trim().is_empty());
        from_env.or_else(|| self.stored_api_key(provider).map(str::to_string))
    }

    /// Returns where the key for `provider` comes from: "env", "config", "local", or None.
    pub fn key_source(&self, provider: Provider) -> Option<&'static str> {
        match provider.api_key_env() {
            None => Some("local"),
            Some(var) if std::env::var(var).map(|k| !k.trim().is_empty()).unwrap_or(false) => {
                Some("env")
            }
            Some(_) if self.stored_api_key(provider).is_some() => Some("config"),
            Some(_) => None,
        }
    }

    pub fn set_api_key(&mut self, provider: Provider, key: &str) {
        let key = Some(key.trim().to_string());
        match provider {
            Provider::Gemini => self.gemini_api_key = key,
            Provider::Claude => self.claude_api_key = key,
            Provider::OpenAI => self.openai_api_key = key,
            Provider::Ollama => {}
        }
    }

    fn stored_api_key(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::Claude => self.claude_api_key.as_deref(),
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Ollama => None,
        };
        key.filter(|k| !k.trim().is_empty())
    }

    /// Directory exported files are written to.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("genui").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.provider(), Provider::Gemini);
        assert_eq!(config.framework(), Framework::HtmlCss);
        assert_eq!(config.request_timeout().as_secs(), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.provider = Some("claude".to_string());
        config.default_framework = Some("html-tailwind".to_string());
        config.set_api_key(Provider::Claude, "  sk-test  ");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.provider(), Provider::Claude);
        assert_eq!(loaded.framework(), Framework::HtmlTailwind);
        assert_eq!(loaded.claude_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"default_model":"gemini-2.5-pro"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(loaded.provider(), Provider::Gemini);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_update_keeps_unparseable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"claude_api_key": "sk-keep""#).unwrap();

        let result = Config::update_at(&path, |c| c.default_model = Some("m".to_string()));
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"claude_api_key": "sk-keep""#);
    }

    #[test]
    fn test_update_preserves_other_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::new();
        config.set_api_key(Provider::OpenAI, "sk-open");
        config.save_to(&path).unwrap();

        Config::update_at(&path, |c| c.default_model = Some("gpt-4o".to_string())).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.openai_api_key.as_deref(), Some("sk-open"));
        assert_eq!(loaded.default_model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = Config::new();
        assert_eq!(config.key_source(Provider::Ollama), Some("local"));
        assert_eq!(config.api_key(Provider::Ollama), None);
    }

    #[test]
    fn test_blank_stored_key_is_ignored() {
        let mut config = Config::new();
        config.openai_api_key = Some("   ".to_string());
        assert_eq!(config.stored_api_key(Provider::OpenAI), None);
    }

    #[test]
    fn test_explicit_export_dir() {
        let mut config = Config::new();
        config.export_dir = Some(PathBuf::from("/tmp/genui-out"));
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/genui-out"));
    }
}
