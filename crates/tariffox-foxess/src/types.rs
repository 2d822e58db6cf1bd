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

use serde::{Deserialize, Serialize};
use tariffox_types::ChargeSchedule;

/// Envelope every Open API endpoint wraps its payload in
#[derive(Debug, Deserialize)]
pub struct FoxEnvelope<T> {
    pub errno: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
}

/// One device's real-time readings
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRealTime {
    #[serde(default)]
    pub datas: Vec<RealTimeDatum>,
}

/// A single named real-time variable
#[derive(Debug, Clone, Deserialize)]
pub struct RealTimeDatum {
    pub variable: String,
    pub value: f32,
}

/// Body of the real-time query endpoint
#[derive(Debug, Serialize)]
pub struct RealTimeQuery<'a> {
    pub sn: &'a str,
    pub variables: &'a [&'a str],
}

/// Body of the force-charge schedule write: serial number plus the full
/// schedule payload, flattened to the device's field names
#[derive(Debug, Serialize)]
pub struct SetChargeTimeBody<'a> {
    pub sn: &'a str,
    #[serde(flatten)]
    pub schedule: &'a ChargeSchedule,
}
