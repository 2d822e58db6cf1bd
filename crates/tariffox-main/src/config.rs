// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of TariffOx.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::info;

use tariffox_core::OrchestratorConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Octopus Energy tariff access
    pub octopus: OctopusConfig,

    /// FoxESS cloud device access
    pub foxess: FoxConfig,

    /// Planning and monitoring behaviour
    #[serde(default)]
    pub planner: PlannerConfig,
}

/// Octopus Energy API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OctopusConfig {
    #[serde(default = "default_octopus_base_url")]
    pub base_url: String,

    /// Account API key, also overridable via OCTOPUS_API_KEY
    #[serde(default)]
    pub api_key: String,

    /// Agile product code (e.g. "AGILE-24-10-01")
    pub product_code: String,

    /// Regional tariff code (e.g. "E-1R-AGILE-24-10-01-G")
    pub tariff_code: String,
}

/// FoxESS Open API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FoxConfig {
    #[serde(default = "default_foxess_base_url")]
    pub base_url: String,

    /// Open API key, also overridable via FOXESS_API_KEY
    #[serde(default)]
    pub api_key: String,

    /// Inverter serial number, also overridable via FOXESS_DEVICE_SN
    #[serde(default)]
    pub device_sn: String,
}

/// Planner configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    /// Tariff's local time zone (IANA name)
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Local hour of the nightly planning trigger
    #[serde(default = "default_planning_hour")]
    pub planning_hour: u32,

    /// Battery level poll period inside the expensive window (seconds)
    #[serde(default = "default_monitor_poll_secs")]
    pub monitor_poll_secs: u64,

    /// Battery SoC (%) above which the expensive window is cut short
    #[serde(default = "default_soc_stop_threshold")]
    pub soc_stop_threshold: f32,
}

fn default_octopus_base_url() -> String {
    "https://api.octopus.energy".to_owned()
}

fn default_foxess_base_url() -> String {
    "https://www.foxesscloud.com".to_owned()
}

fn default_timezone() -> String {
    "Europe/London".to_owned()
}

fn default_planning_hour() -> u32 {
    23
}

fn default_monitor_poll_secs() -> u64 {
    5
}

fn default_soc_stop_threshold() -> f32 {
    80.0
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            planning_hour: default_planning_hour(),
            monitor_poll_secs: default_monitor_poll_secs(),
            soc_stop_threshold: default_soc_stop_threshold(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TARIFFOX_CONFIG, falling back to ./config.toml
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("TARIFFOX_CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        let mut config = Self::from_path(Path::new(&path))?;
        info!("loaded configuration from {}", path);
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&config_str)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Secrets may come from the environment instead of the config file
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("OCTOPUS_API_KEY") {
            self.octopus.api_key = key;
        }
        if let Ok(key) = std::env::var("FOXESS_API_KEY") {
            self.foxess.api_key = key;
        }
        if let Ok(sn) = std::env::var("FOXESS_DEVICE_SN") {
            self.foxess.device_sn = sn;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.octopus.api_key.is_empty() {
            bail!("octopus.api_key is not set (config file or OCTOPUS_API_KEY)");
        }
        if self.octopus.product_code.is_empty() {
            bail!("octopus.product_code cannot be empty");
        }
        if self.octopus.tariff_code.is_empty() {
            bail!("octopus.tariff_code cannot be empty");
        }
        if self.foxess.api_key.is_empty() {
            bail!("foxess.api_key is not set (config file or FOXESS_API_KEY)");
        }
        if self.foxess.device_sn.is_empty() {
            bail!("foxess.device_sn is not set (config file or FOXESS_DEVICE_SN)");
        }
        if self.planner.planning_hour > 23 {
            bail!(
                "planner.planning_hour must be 0-23, got {}",
                self.planner.planning_hour
            );
        }
        if self.planner.monitor_poll_secs == 0 {
            bail!("planner.monitor_poll_secs must be at least 1");
        }
        if !(0.0..=100.0).contains(&self.planner.soc_stop_threshold) {
            bail!(
                "planner.soc_stop_threshold must be 0-100, got {}",
                self.planner.soc_stop_threshold
            );
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.planner
            .timezone
            .parse::<Tz>()
            .map_err(|_| anyhow::anyhow!("unknown time zone '{}'", self.planner.timezone))
    }

    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig> {
        Ok(OrchestratorConfig {
            planning_hour: self.planner.planning_hour,
            timezone: self.timezone()?,
            monitor_poll: Duration::from_secs(self.planner.monitor_poll_secs),
            soc_stop_threshold: self.planner.soc_stop_threshold,
            ..OrchestratorConfig::default()
        })
    }
}
