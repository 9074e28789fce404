use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};

/// Thresholds deciding when a capability gets flagged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditThresholds {
    /// How much worse (in quality points) the cheaper option may be and still count as comparable.
    pub min_quality_difference_for_flag: f64,
    /// Minimum relative cost premium over the cheapest option, e.g. 0.2 = 20%.
    pub min_cost_saving_ratio_for_flag: f64,
}

impl Default for AuditThresholds {
    fn default() -> Self {
        Self {
            min_quality_difference_for_flag: 0.05,
            min_cost_saving_ratio_for_flag: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditConfig {
    /// Monthly call volume assumed for a tag when a capability reports none.
    #[serde(default)]
    pub default_monthly_calls_per_tag: BTreeMap<String, u64>,
    /// Display label only; amounts are never converted.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub audit: AuditThresholds,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_monthly_calls_per_tag: BTreeMap::new(),
            currency: default_currency(),
            audit: AuditThresholds::default(),
        }
    }
}

impl AuditConfig {
    pub fn default_calls_for(&self, tag: &str) -> Option<u64> {
        self.default_monthly_calls_per_tag
            .get(tag)
            .copied()
            .filter(|&n| n > 0)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.audit;
        for (name, v) in [
            ("min_quality_difference_for_flag", t.min_quality_difference_for_flag),
            ("min_cost_saving_ratio_for_flag", t.min_cost_saving_ratio_for_flag),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(AuditError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {v}"
                )));
            }
        }
        if let Some((tag, _)) = self
            .default_monthly_calls_per_tag
            .iter()
            .find(|(_, n)| **n == 0)
        {
            return Err(AuditError::InvalidConfig(format!(
                "default_monthly_calls_per_tag.{tag} must be positive"
            )));
        }
        Ok(())
    }
}

/// Load an audit config from a TOML file.
pub fn load_config(path: &std::path::Path) -> Result<AuditConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AuditError::Io(format!("{}: {e}", path.display())))?;
    parse_config(&content)
}

/// Parse and validate an audit config from a TOML string.
pub fn parse_config(toml_str: &str) -> Result<AuditConfig> {
    let cfg: AuditConfig = toml::from_str(toml_str).map_err(|e| AuditError::parse("config", e))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load the bundled config.toml from the data/ directory.
pub fn load_bundled_config() -> Result<AuditConfig> {
    let toml_str = include_str!("../../../data/config.toml");
    parse_config(toml_str)
}

/// Path of the user's config override, e.g. `~/.config/capaudit/config.toml`.
#[cfg(feature = "fs")]
pub fn user_config_path() -> Option<std::path::PathBuf> {
    Some(dirs::config_dir()?.join("capaudit").join("config.toml"))
}

/// Load the user's config if present and valid, otherwise the bundled one.
#[cfg(feature = "fs")]
pub fn load_config_cached() -> Result<AuditConfig> {
    load_config_or_bundled(user_config_path().as_deref())
}

/// Load `path` if it exists and parses, otherwise fall back to the bundled config.
pub fn load_config_or_bundled(path: Option<&std::path::Path>) -> Result<AuditConfig> {
    if let Some(path) = path.filter(|p| p.exists()) {
        match load_config(path) {
            Ok(cfg) => {
                tracing::debug!(path = %path.display(), "using user config");
                return Ok(cfg);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring user config");
            }
        }
    }
    load_bundled_config()
}
