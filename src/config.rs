//! YAML configuration file support for docsim.
//!
//! One file describes every stage of a build (shingling and signatures,
//! banding, exact matching) and converts into a [`PipelineConfig`].
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # docsim configuration
//! version: "1.0"
//! name: "demo"
//!
//! perceptual:
//!   k: 3
//!   num_hashes: 100
//!   seed: 42
//!
//! index:
//!   num_bands: 20
//!   truncate_remainder: false
//!
//! matcher:
//!   threshold: 0.3
//!   top_n: 5
//! ```
//!
//! Every section and field is optional; omitted values take the library
//! defaults. Omitting `perceptual.seed` draws a fresh hash family on every
//! build.

use std::fs;
use std::path::Path;

use index::IndexConfig;
use matcher::MatchConfig;
use perceptual::PerceptualConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PipelineConfig;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocsimConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub perceptual: PerceptualYamlConfig,

    #[serde(default)]
    pub index: IndexYamlConfig,

    #[serde(default)]
    pub matcher: MatchYamlConfig,
}

impl DocsimConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DocsimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.perceptual.validate()?;
        self.index.validate()?;
        self.matcher.validate()?;
        Ok(())
    }

    /// Stage configuration for [`crate::Session::process`].
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            perceptual: self.perceptual.to_perceptual_config(),
            index: self.index.to_index_config(),
            matcher: self.matcher.to_match_config(),
        }
    }
}

impl Default for DocsimConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            perceptual: PerceptualYamlConfig::default(),
            index: IndexYamlConfig::default(),
            matcher: MatchYamlConfig::default(),
        }
    }
}

/// Shingling and signature YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerceptualYamlConfig {
    #[serde(default = "default_k")]
    pub k: usize,

    #[serde(default = "default_num_hashes")]
    pub num_hashes: usize,

    #[serde(default)]
    pub seed: Option<u64>,
}

impl PerceptualYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.k < 1 {
            return Err(ConfigLoadError::Validation(
                "perceptual.k must be >= 1".to_string(),
            ));
        }
        if self.num_hashes < 1 {
            return Err(ConfigLoadError::Validation(
                "perceptual.num_hashes must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_perceptual_config(&self) -> PerceptualConfig {
        PerceptualConfig {
            k: self.k,
            num_hashes: self.num_hashes,
            seed: self.seed,
        }
    }
}

impl Default for PerceptualYamlConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            num_hashes: default_num_hashes(),
            seed: None,
        }
    }
}

/// Band index YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexYamlConfig {
    #[serde(default = "default_num_bands")]
    pub num_bands: usize,

    #[serde(default)]
    pub truncate_remainder: bool,
}

impl IndexYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.num_bands < 1 {
            return Err(ConfigLoadError::Validation(
                "index.num_bands must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_index_config(&self) -> IndexConfig {
        IndexConfig {
            num_bands: self.num_bands,
            truncate_remainder: self.truncate_remainder,
        }
    }
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        Self {
            num_bands: default_num_bands(),
            truncate_remainder: false,
        }
    }
}

/// Exact matching YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchYamlConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl MatchYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigLoadError::Validation(format!(
                "matcher.threshold must be within [0, 1] (got {})",
                self.threshold
            )));
        }
        if self.top_n < 1 {
            return Err(ConfigLoadError::Validation(
                "matcher.top_n must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_match_config(&self) -> MatchConfig {
        MatchConfig {
            threshold: self.threshold,
            top_n: self.top_n,
        }
    }
}

impl Default for MatchYamlConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            top_n: default_top_n(),
        }
    }
}

fn default_k() -> usize {
    PerceptualConfig::default().k
}
fn default_num_hashes() -> usize {
    PerceptualConfig::default().num_hashes
}
fn default_num_bands() -> usize {
    IndexConfig::default().num_bands
}
fn default_threshold() -> f64 {
    MatchConfig::default().threshold
}
fn default_top_n() -> usize {
    MatchConfig::default().top_n
}
