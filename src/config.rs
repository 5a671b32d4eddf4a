use std::{fs, path::PathBuf, time::Duration};

use serde::Deserialize;
use anyhow::{anyhow, Result};

use crate::downloader::DEFAULT_WORKERS;
use crate::gallery::DEFAULT_DOMAIN;

/// Everything a run needs. Built from defaults, then an optional YAML file, then command line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub domain: String,
    /// history file, or a directory holding `db.json`
    pub data_path: PathBuf,
    pub save_dir: PathBuf,
    pub workers: usize,
    pub retries: u8,
    #[serde(deserialize_with = "duration_parser")]
    pub retry_interval: Duration,
    #[serde(deserialize_with = "duration_parser")]
    pub timeout: Duration,
    /// run again every `interval`; a single run when absent
    #[serde(deserialize_with = "optional_duration_parser")]
    pub interval: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            data_path: PathBuf::from("./"),
            save_dir: PathBuf::from("./"),
            workers: DEFAULT_WORKERS,
            retries: 0,
            retry_interval: Duration::new(1, 0),
            timeout: Duration::new(30, 0),
            interval: None,
        }
    }
}

impl Settings {
    pub fn from_file(file_path: &str) -> Result<Self> {
        let yaml = fs::read_to_string(file_path).map_err(|e| anyhow!("could not read config file {}: {}", file_path, e))?;
        Self::from_yaml(&yaml).map_err(|e| anyhow!("{}: {}", file_path, e))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // an empty document is a null, not a mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| anyhow!("could not parse config correctly: {}", e))
    }
}

fn optional_duration_parser<'de, D>(deserializer: D) -> Result<Option<std::time::Duration>, D::Error>
where D: serde::Deserializer<'de> {
    let buf = String::deserialize(deserializer)?;
    Ok(Some(parse_duration::parse(&buf).map_err(serde::de::Error::custom)?))
}

fn duration_parser<'de, D>(deserializer: D) -> Result<std::time::Duration, D::Error>
where D: serde::Deserializer<'de> {
    let buf = String::deserialize(deserializer)?;
    parse_duration::parse(&buf).map_err(serde::de::Error::custom)
}
