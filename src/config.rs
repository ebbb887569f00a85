// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration for the analysis pipeline

use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure. Every field has a default so an empty
/// config file (or none at all) yields a working setup.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Input limits
    #[serde(default)]
    pub limits: LimitConfig,

    /// Generative capability settings
    #[serde(default)]
    pub ai: AiConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Config> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitConfig {
    /// Largest document accepted for analysis, in pages
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// Chat-completions endpoint base URL
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Issues requested concurrently per enhancement batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pages sampled per augmentation pass
    #[serde(default = "default_sample_pages")]
    pub sample_pages: usize,

    /// Confidence assumed when a response does not state one
    #[serde(default = "default_confidence")]
    pub default_confidence: u8,

    /// Scale used when rendering pages for visual analysis
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
            sample_pages: default_sample_pages(),
            default_confidence: default_confidence(),
            render_scale: default_render_scale(),
        }
    }
}

fn default_max_pages() -> u32 {
    50
}

fn default_model() -> String {
    "grok-beta".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    5
}

fn default_sample_pages() -> usize {
    5
}

fn default_confidence() -> u8 {
    85
}

fn default_render_scale() -> f32 {
    1.5
}
