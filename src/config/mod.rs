mod file_config;

pub use file_config::{FileConfig, RecommendationConfig};

use crate::recommendation::{
    ExhaustedCatalogPolicy, RecommendationSettings, DEFAULT_AFFINITY_TOP_K,
    DEFAULT_MAX_RECOMMENDATION_LIMIT, DEFAULT_RECOMMENDATION_LIMIT,
};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

/// CLI arguments that can be used for config resolution.
/// Every field can be overridden by the TOML config file.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub store_timeout_ms: u64,
    pub default_limit: usize,
    pub max_limit: usize,
    pub affinity_top_k: usize,
    pub exhausted_catalog_policy: ExhaustedCatalogPolicy,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            default_limit: DEFAULT_RECOMMENDATION_LIMIT,
            max_limit: DEFAULT_MAX_RECOMMENDATION_LIMIT,
            affinity_top_k: DEFAULT_AFFINITY_TOP_K,
            exhausted_catalog_policy: ExhaustedCatalogPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub store_timeout_ms: u64,
    pub recommendation: RecommendationSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db or in config file")
            })?;
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let store_timeout_ms = file.store_timeout_ms.unwrap_or(cli.store_timeout_ms);

        let rec_file = file.recommendation.unwrap_or_default();
        let exhausted_catalog_policy = match rec_file.exhausted_catalog_policy {
            Some(s) => match parse_exhausted_catalog_policy(&s) {
                Some(policy) => policy,
                None => bail!("Unknown exhausted_catalog_policy: {}", s),
            },
            None => cli.exhausted_catalog_policy,
        };
        let recommendation = RecommendationSettings {
            default_limit: rec_file.default_limit.unwrap_or(cli.default_limit),
            max_limit: rec_file.max_limit.unwrap_or(cli.max_limit),
            affinity_top_k: rec_file.affinity_top_k.unwrap_or(cli.affinity_top_k),
            exhausted_catalog_policy,
        };

        if recommendation.default_limit > recommendation.max_limit {
            bail!(
                "default_limit {} exceeds max_limit {}",
                recommendation.default_limit,
                recommendation.max_limit
            );
        }
        if recommendation.affinity_top_k == 0 {
            bail!("affinity_top_k must be at least 1");
        }

        Ok(Self {
            db_path,
            store_timeout_ms,
            recommendation,
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Uses clap's ValueEnum trait for parsing, case insensitive.
fn parse_exhausted_catalog_policy(s: &str) -> Option<ExhaustedCatalogPolicy> {
    ExhaustedCatalogPolicy::from_str(s, true).ok()
}
