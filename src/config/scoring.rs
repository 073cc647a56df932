//! `config/scoring.toml` loader.
//!
//! ```toml
//! [scoring]
//! rules = "v2"            # or "v1"
//! default_mode = "predict" # or "rules"
//!
//! [models]
//! geological = "models/geological.json"
//! climatic = "models/climatic.json"
//!
//! [derive]
//! min_trend_points = 2
//! min_cv_points = 3
//!
//! [[fields]]
//! name = "Elevation"
//! default_on_missing = 0.0
//! ```

use crate::combine::Dimension;
use crate::normalize::{FieldOverride, FieldResolutionPolicy};
use crate::rules::RuleVersion;
use crate::stats::DeriveSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const ENV_SCORING_CONFIG_PATH: &str = "DAM_SCORING_CONFIG_PATH";
pub const DEFAULT_SCORING_CONFIG_PATH: &str = "config/scoring.toml";
pub const ENV_GEO_BUNDLE_PATH: &str = "DAM_GEO_BUNDLE_PATH";
pub const ENV_CLIM_BUNDLE_PATH: &str = "DAM_CLIM_BUNDLE_PATH";
pub const ENV_RULES_VERSION: &str = "DAM_RULES_VERSION";

/// Which pipeline a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Rules,
    #[default]
    Predict,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Rules => "rules",
            Mode::Predict => "predict",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" | "score" => Ok(Mode::Rules),
            "predict" | "model" => Ok(Mode::Predict),
            other => anyhow::bail!("unknown mode: {other} (expected rules|predict)"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    pub rules: RuleVersion,
    pub default_mode: Mode,
}

/// Optional bundle path per dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub geological: Option<PathBuf>,
    pub climatic: Option<PathBuf>,
}

impl ModelsConfig {
    pub fn path(&self, dim: Dimension) -> Option<&Path> {
        match dim {
            Dimension::Geological => self.geological.as_deref(),
            Dimension::Climatic => self.climatic.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub scoring: ScoringSection,
    pub models: ModelsConfig,
    pub derive: DeriveSettings,
    pub fields: Vec<FieldOverride>,
}

impl ScoringConfig {
    /// Load from `$DAM_SCORING_CONFIG_PATH` or `config/scoring.toml`, then
    /// apply env overrides. A missing file means built-in defaults.
    pub fn from_toml() -> Result<Self> {
        let path = std::env::var(ENV_SCORING_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCORING_CONFIG_PATH));

        let mut cfg = if path.exists() {
            Self::from_toml_path(&path)?
        } else {
            Self::default()
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_toml_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scoring config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing scoring config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: ScoringConfig = toml::from_str(s)?;
        Ok(cfg)
    }

    /// Env wins over file. An unparsable rules version is ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Some(p) = non_empty_env(ENV_GEO_BUNDLE_PATH) {
            self.models.geological = Some(PathBuf::from(p));
        }
        if let Some(p) = non_empty_env(ENV_CLIM_BUNDLE_PATH) {
            self.models.climatic = Some(PathBuf::from(p));
        }
        if let Some(v) = non_empty_env(ENV_RULES_VERSION) {
            match v.parse::<RuleVersion>() {
                Ok(r) => self.scoring.rules = r,
                Err(e) => warn!(error = %e, "ignoring {ENV_RULES_VERSION}"),
            }
        }
    }

    /// Built-in policy with the `[[fields]]` overrides applied.
    pub fn policy(&self) -> FieldResolutionPolicy {
        FieldResolutionPolicy::default().with_overrides(&self.fields)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
