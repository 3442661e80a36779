//! Pipeline configuration. Every field is optional and falls back to a sane
//! default, so an empty TOML document is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_DEPTH, HARD_MAX_DEPTH};

/// Top-level configuration recognized by the (external) CLI and consumed by the core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SentinelConfig {
    pub kernel_root: Option<PathBuf>,
    pub graph_store: GraphStoreConfig,
    pub preprocessing: PreprocessingConfig,
    pub analysis: AnalysisConfig,
    pub parallelism: ParallelismConfig,
    pub batch_size: Option<usize>,
}

impl SentinelConfig {
    /// Parse a TOML configuration document. YAML loading and CLI-side error
    /// coloring are handled by the external CLI front-end, not this crate.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GraphStoreConfig {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PreprocessingConfig {
    pub enabled: Option<bool>,
    pub include_paths: Vec<PathBuf>,
    pub defines: Vec<String>,
}

impl PreprocessingConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub max_depth: Option<usize>,
    pub syscall_regex: Option<String>,
}

impl AnalysisConfig {
    /// `max_depth` clamped to `1..=10`.
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth
            .unwrap_or(DEFAULT_MAX_DEPTH)
            .clamp(1, HARD_MAX_DEPTH)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ParallelismConfig {
    pub workers: Option<usize>,
}

impl ParallelismConfig {
    /// 0 (or unset) means auto-detect via the number of physical cores.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            Some(0) | None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            Some(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let cfg = SentinelConfig::from_toml("").unwrap();
        assert_eq!(cfg.effective_batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(cfg.analysis.effective_max_depth(), DEFAULT_MAX_DEPTH);
        assert!(!cfg.preprocessing.is_enabled());
    }

    #[test]
    fn max_depth_clamps_to_hard_maximum() {
        let cfg = SentinelConfig::from_toml("[analysis]\nmax_depth = 999\n").unwrap();
        assert_eq!(cfg.analysis.effective_max_depth(), HARD_MAX_DEPTH);
    }

    #[test]
    fn max_depth_clamps_to_one() {
        let cfg = SentinelConfig::from_toml("[analysis]\nmax_depth = 0\n").unwrap();
        assert_eq!(cfg.analysis.effective_max_depth(), 1);
    }

    #[test]
    fn parses_all_documented_keys() {
        let toml_text = r#"
            kernel_root = "/kernel"
            batch_size = 250

            [graph_store]
            url = "sqlite:///tmp/sentinel.db"
            user = "ci"
            password = "secret"

            [preprocessing]
            enabled = true
            include_paths = ["/usr/include"]
            defines = ["CONFIG_FOO=1"]

            [analysis]
            max_depth = 5
            syscall_regex = "^sys_"

            [parallelism]
            workers = 4
        "#;
        let cfg = SentinelConfig::from_toml(toml_text).unwrap();
        assert_eq!(cfg.kernel_root, Some(PathBuf::from("/kernel")));
        assert_eq!(cfg.effective_batch_size(), 250);
        assert_eq!(cfg.graph_store.url.as_deref(), Some("sqlite:///tmp/sentinel.db"));
        assert!(cfg.preprocessing.is_enabled());
        assert_eq!(cfg.analysis.effective_max_depth(), 5);
        assert_eq!(cfg.parallelism.effective_workers(), 4);
    }
}
