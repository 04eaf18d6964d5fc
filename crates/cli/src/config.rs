use anyhow::{Context, Result};
use homemap_manifest::AssemblerConfig;
use homemap_search::ReasonerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "homemap.toml";

/// Names of the three assets a source publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetNames {
    pub index: String,
    pub tags: String,
    pub content: String,
}

impl Default for AssetNames {
    fn default() -> Self {
        Self {
            index: "home.index.bin".to_string(),
            tags: "home.tags.bin".to_string(),
            content: "home.content.bin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    pub enabled: bool,
    pub dir: PathBuf,
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".homemap/cache"),
            ttl_seconds: 86_400,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// `homemap.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HomeMapConfig {
    /// Directory or http(s) base URL holding the source's assets.
    pub source: Option<String>,
    pub assets: AssetNames,
    pub fetch: AssemblerConfig,
    pub cache: CacheSettings,
    pub reasoner: ReasonerConfig,
}

impl HomeMapConfig {
    /// Load `explicit`, else `./homemap.toml` when present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default().finish());
                }
                default
            }
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        let config = Self::parse(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.reasoner.validate()?;
        Ok(config.finish())
    }

    fn finish(mut self) -> Self {
        self.fetch = self.fetch.overlay_env().normalized();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = HomeMapConfig::parse("").unwrap();
        assert_eq!(config.source, None);
        assert_eq!(config.assets, AssetNames::default());
        assert_eq!(config.cache.ttl(), Duration::from_secs(86_400));
        assert_eq!(config.reasoner, ReasonerConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = HomeMapConfig::parse(
            r#"
source = "https://example.org/data"

[assets]
index = "custom.index.bin"

[cache]
enabled = false

[reasoner]
synthesis_docs = 1
"#,
        )
        .unwrap();
        assert_eq!(config.source.as_deref(), Some("https://example.org/data"));
        assert_eq!(config.assets.index, "custom.index.bin");
        assert_eq!(config.assets.tags, "home.tags.bin");
        assert!(!config.cache.enabled);
        assert_eq!(config.reasoner.synthesis_docs, 1);
    }

    #[test]
    fn unknown_keys_and_invalid_values_are_rejected() {
        assert!(HomeMapConfig::parse("sorce = \"typo\"").is_err());
        assert!(HomeMapConfig::parse("[assets]\nmap = \"x\"").is_err());
        assert!(HomeMapConfig::parse("[reasoner]\ncandidate_limit = 0").is_err());
    }
}
