use crate::{Error, Result};
use alert_request::custom_rule::DEFAULT_QUERY_FREQUENCY_SECS;
use alert_request::NotificationTargets;
use alert_verify::VerifyConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CommServe under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommServe {
    pub hostname: String,
    /// Installation directory of the CommServe software, as a Windows path.
    pub install_directory: String,
}

/// Config of an alert session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub commserve: CommServe,
    /// Directory holding custom rule documents.
    #[serde(default = "default_rule_directory")]
    pub rule_directory: PathBuf,
    /// Query frequency given to imported custom rules.
    #[serde(default = "default_query_frequency", with = "humantime_serde")]
    pub query_frequency: Duration,
    #[serde(default)]
    pub verify: VerifyConfig,
}

fn default_rule_directory() -> PathBuf {
    PathBuf::from("CustomAlertXml")
}
fn default_query_frequency() -> Duration {
    Duration::from_secs(DEFAULT_QUERY_FREQUENCY_SECS)
}

impl Config {
    pub fn new(commserve: CommServe) -> Self {
        Self {
            commserve,
            rule_directory: default_rule_directory(),
            query_frequency: default_query_frequency(),
            verify: VerifyConfig::default(),
        }
    }

    /// Load config from a JSON (`.json`) or YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_inner(path).map_err(|source| Error::Config {
            path: path.to_owned(),
            source,
        })
    }

    fn load_inner(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read(path).context("reading config")?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_slice(&content).context("parsing JSON config")?,
            _ => serde_yaml::from_slice(&content).context("parsing YAML config")?,
        };
        Ok(config)
    }

    pub fn targets(&self) -> NotificationTargets {
        NotificationTargets {
            commserve_hostname: self.commserve.hostname.clone(),
            install_directory: self.commserve.install_directory.clone(),
        }
    }
}
