use crate::config::StrategyArg;
use crate::utils::error::{EtlError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Optional TOML settings file: shared store path plus one section per
/// region key (`mb`, `mn`, `mt`, `mb-daily`).
#[derive(Debug, Clone, Deserialize)]
pub struct RegionsConfig {
    pub store: Option<StoreSection>,
    #[serde(default)]
    pub regions: HashMap<String, RegionSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionSection {
    pub url: Option<String>,
    pub worksheet: Option<String>,
    pub strategy: Option<String>,
    pub batch_size: Option<usize>,
    pub batch_delay_ms: Option<u64>,
}

impl RegionSection {
    pub fn strategy_arg(&self) -> Result<Option<StrategyArg>> {
        match self.strategy.as_deref() {
            None => Ok(None),
            Some("prepend") => Ok(Some(StrategyArg::Prepend)),
            Some("rebuild") => Ok(Some(StrategyArg::Rebuild)),
            Some(other) => Err(EtlError::InvalidConfigValueError {
                field: "strategy".to_string(),
                value: other.to_string(),
                reason: "expected 'prepend' or 'rebuild'".to_string(),
            }),
        }
    }
}

impl RegionsConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn region(&self, key: &str) -> Option<&RegionSection> {
        self.regions.get(key)
    }
}

/// Replace `${VAR}` with the environment value; unknown variables are left
/// as-is.
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}
