// src/config/recipe.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

pub const ENV_RECIPE_CONFIG_PATH: &str = "RECIPE_CONFIG_PATH";
pub const DEFAULT_RECIPE_CONFIG_PATH: &str = "config/recipe.json";

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeConfig {
    pub enabled: bool,
    /// "openai" | "gemini" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider default when absent.
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from OPENAI_API_KEY / GEMINI_API_KEY (by provider)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: None,
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RecipeConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: RecipeConfig = serde_json::from_str(&data)?;

        // Normalize provider
        cfg.provider = cfg.provider.trim().to_lowercase();

        // Resolve api key if "ENV"; a disabled generator never needs one.
        if !cfg.enabled {
            cfg.api_key.clear();
        } else if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "openai" => env::var("OPENAI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("Missing OPENAI_API_KEY env var"))?,
                "gemini" => env::var("GEMINI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("Missing GEMINI_API_KEY env var"))?,
                "mock" => String::new(),
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
        }

        if cfg.timeout_secs == 0 {
            cfg.timeout_secs = default_timeout_secs();
        }

        Ok(cfg)
    }

    /// `$RECIPE_CONFIG_PATH`, else `config/recipe.json`. No file means disabled.
    pub fn load_default() -> anyhow::Result<Self> {
        let path = env::var(ENV_RECIPE_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_RECIPE_CONFIG_PATH));
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_key_is_resolved_per_provider() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("recipe.json");
        fs::write(&p, r#"{"enabled": true, "provider": " OpenAI ", "api_key": "ENV"}"#).unwrap();

        env::set_var("OPENAI_API_KEY", "sk-test");
        let cfg = RecipeConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.provider, "openai");
        assert_eq!(cfg.api_key, "sk-test");
        assert_eq!(cfg.timeout_secs, 30);

        env::remove_var("OPENAI_API_KEY");
        assert!(RecipeConfig::load_from_file(&p).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn disabled_config_loads_without_provider_key() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("recipe.json");
        fs::write(
            &p,
            r#"{"enabled": false, "provider": "gemini", "api_key": "ENV"}"#,
        )
        .unwrap();

        env::remove_var("GEMINI_API_KEY");
        let cfg = RecipeConfig::load_from_file(&p).unwrap();
        assert!(!cfg.enabled);
        assert!(cfg.api_key.is_empty());
    }

    #[test]
    fn unknown_provider_with_env_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("recipe.json");
        fs::write(&p, r#"{"enabled": true, "provider": "claude"}"#).unwrap();
        assert!(RecipeConfig::load_from_file(&p).is_err());
    }
}
