use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub store_timeout_ms: Option<u64>,

    pub recommendation: Option<RecommendationConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RecommendationConfig {
    pub default_limit: Option<usize>,
    pub max_limit: Option<usize>,
    pub affinity_top_k: Option<usize>,
    /// "allow-repeats" or "return-fewer"
    pub exhausted_catalog_policy: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
