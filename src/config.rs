use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{Limit, SearchTerm, Year};
use crate::error::ExplorerError;
use crate::nfz;

pub const CONFIG_FILE: &str = "nfz-explorer.json";

/// Optional on-disk defaults for the query parameters. Every field may be
/// omitted; absent values fall back to the built-in defaults.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub benefit: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub limit: Option<u16>,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub term: SearchTerm,
    pub year: Year,
    pub limit: Limit,
    pub base_url: String,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            term: SearchTerm::default(),
            year: Year::default(),
            limit: Limit::default(),
            base_url: nfz::DEFAULT_BASE_URL.to_string(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolves the config file at `path`, or `nfz-explorer.json` in the
    /// working directory. A missing implicit file is not an error.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ExplorerError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ExplorerError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ExplorerError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ExplorerError> {
        let defaults = ResolvedConfig::default();
        Ok(ResolvedConfig {
            term: match config.benefit {
                Some(value) => value.parse()?,
                None => defaults.term,
            },
            year: match config.year {
                Some(value) => Year::new(value)?,
                None => defaults.year,
            },
            limit: match config.limit {
                Some(value) => Limit::new(value)?,
                None => defaults.limit,
            },
            base_url: config.api_base_url.unwrap_or(defaults.base_url),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_match_the_dashboard() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.term.as_str(), "rozrodcz");
        assert_eq!(resolved.year.get(), 2019);
        assert_eq!(resolved.limit.get(), 25);
        assert_eq!(resolved.base_url, nfz::DEFAULT_BASE_URL);
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let config = Config {
            benefit: Some("kardio".to_string()),
            year: None,
            limit: Some(50),
            api_base_url: None,
        };
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.term.as_str(), "kardio");
        assert_eq!(resolved.year.get(), 2019);
        assert_eq!(resolved.limit.get(), 50);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let config = Config {
            year: Some(1999),
            ..Config::default()
        };
        assert_matches!(
            ConfigLoader::resolve_config(config),
            Err(ExplorerError::YearOutOfRange(_))
        );
    }
}
