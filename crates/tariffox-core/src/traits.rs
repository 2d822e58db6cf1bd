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

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tariffox_types::{ChargeSchedule, PriceSeries};

/// Source of per-slot unit prices for one calendar day.
/// The orchestrator never knows which tariff API sits behind this.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the full half-hourly series for `date` (the source's local day)
    async fn day_rates(&self, date: NaiveDate) -> Result<PriceSeries>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// The battery device behind the cloud control API.
/// All schedule writes are full replacements, never partial patches.
#[async_trait]
pub trait BatteryDevice: Send + Sync {
    /// Read current battery state of charge (0-100%)
    async fn battery_soc(&self) -> Result<f32>;

    /// Read back the device's current force-charge schedule (diagnostics)
    async fn charge_schedule(&self) -> Result<ChargeSchedule>;

    /// Replace the device's force-charge schedule
    async fn set_charge_schedule(&self, schedule: &ChargeSchedule) -> Result<()>;

    /// Get device name for logging
    fn name(&self) -> &str;
}
