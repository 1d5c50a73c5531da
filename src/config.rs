use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

/// World Bank indicator downloads. Each endpoint serves a ZIP whose data file
/// is a CSV named `API_<indicator>_...`.
const POPULATION_URL: &str =
    "https://api.worldbank.org/v2/en/indicator/SP.POP.TOTL?downloadformat=csv";
const CO2_URL: &str =
    "https://api.worldbank.org/v2/en/indicator/EN.ATM.CO2E.KT?downloadformat=csv";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub population_url: String,
    pub emissions_url: String,
    /// Cadence of the background refresh loop, in seconds.
    pub update_interval_secs: u64,
    /// A year column qualifies as the reference year only if both tables have
    /// fewer than this many missing cells in it.
    pub missing_value_threshold: usize,
    /// Upper bound on any single indicator download.
    pub request_timeout_secs: u64,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            population_url: POPULATION_URL.to_string(),
            emissions_url: CO2_URL.to_string(),
            update_interval_secs: 3600,
            missing_value_threshold: 20,
            request_timeout_secs: 30,
            port: 8080,
        }
    }
}

impl Config {
    /// Load from a YAML file; absent keys fall back to the defaults above.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config `{}`", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("parsing config `{}`", path.display()))
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
