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
use md5::{Digest, Md5};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};

use tariffox_core::BatteryDevice;
use tariffox_types::ChargeSchedule;

use crate::errors::{FoxError, FoxResult};
use crate::types::{DeviceRealTime, FoxEnvelope, RealTimeQuery, SetChargeTimeBody};

const REAL_QUERY_PATH: &str = "/op/v0/device/real/query";
const CHARGE_TIME_GET_PATH: &str = "/op/v0/device/battery/forceChargeTime/get";
const CHARGE_TIME_SET_PATH: &str = "/op/v0/device/battery/forceChargeTime/set";

// Open API errnos for a rejected token or signature
const ERRNO_SIGN_CHECK: i64 = 40256;
const ERRNO_TOKEN_INVALID: i64 = 41809;

/// FoxESS cloud client bound to a single inverter serial number
#[derive(Clone)]
pub struct FoxCloudClient {
    base_url: String,
    api_key: String,
    device_sn: String,
    client: Client,
}

impl FoxCloudClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        device_sn: impl Into<String>,
    ) -> FoxResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FoxError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            device_sn: device_sn.into(),
            client,
        })
    }

    /// Read the battery's current state of charge (0-100%)
    pub async fn get_battery_soc(&self) -> FoxResult<f32> {
        let body = RealTimeQuery {
            sn: &self.device_sn,
            variables: &["SoC"],
        };
        let request = self
            .signed(self.client.post(self.url(REAL_QUERY_PATH)), REAL_QUERY_PATH)
            .json(&body);

        let devices: Vec<DeviceRealTime> = self.execute(request).await?;
        let soc = devices
            .first()
            .and_then(|device| {
                device
                    .datas
                    .iter()
                    .find(|datum| datum.variable == "SoC")
                    .map(|datum| datum.value)
            })
            .ok_or_else(|| {
                FoxError::InvalidResponse("no SoC variable in real-time result".to_string())
            })?;

        debug!("device {} reports SoC {:.1}%", self.device_sn, soc);
        Ok(soc)
    }

    /// Read back the force-charge schedule currently on the device
    pub async fn get_charge_schedule(&self) -> FoxResult<ChargeSchedule> {
        let request = self
            .signed(
                self.client.get(self.url(CHARGE_TIME_GET_PATH)),
                CHARGE_TIME_GET_PATH,
            )
            .query(&[("sn", &self.device_sn)]);

        self.execute(request).await
    }

    /// Replace the device's force-charge schedule in full
    pub async fn set_charge_schedule(&self, schedule: &ChargeSchedule) -> FoxResult<()> {
        let body = SetChargeTimeBody {
            sn: &self.device_sn,
            schedule,
        };
        let request = self
            .signed(
                self.client.post(self.url(CHARGE_TIME_SET_PATH)),
                CHARGE_TIME_SET_PATH,
            )
            .json(&body);

        // The set endpoint returns an empty result object; only errno matters
        let _: serde_json::Value = self.execute(request).await?;
        info!(
            sn = %self.device_sn,
            enable1 = schedule.enable1,
            enable2 = schedule.enable2,
            "charge schedule updated"
        );
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the Open API auth headers: token, millisecond timestamp and the
    /// MD5 signature over path, key and timestamp
    fn signed(&self, request: RequestBuilder, path: &str) -> RequestBuilder {
        let timestamp = chrono::Utc::now().timestamp_millis();
        request
            .header("token", &self.api_key)
            .header("timestamp", timestamp.to_string())
            .header("signature", signature(path, &self.api_key, timestamp))
            .header("lang", "en")
    }

    /// Send a signed request and unwrap the `{errno, result}` envelope
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> FoxResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FoxError::HttpStatus {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let envelope = response.json::<FoxEnvelope<T>>().await?;
        match envelope.errno {
            0 => envelope.result.ok_or_else(|| {
                FoxError::InvalidResponse("errno 0 but result missing".to_string())
            }),
            ERRNO_SIGN_CHECK | ERRNO_TOKEN_INVALID => {
                error!("FoxESS rejected credentials (errno {})", envelope.errno);
                Err(FoxError::AuthenticationFailed(envelope.errno))
            }
            errno => Err(FoxError::ApiError {
                errno,
                message: envelope.msg.unwrap_or_default(),
            }),
        }
    }
}

/// MD5 over `path\r\napi_key\r\ntimestamp` — with the *literal* backslash
/// sequences, not CRLF bytes, as the Open API signing contract requires
fn signature(path: &str, api_key: &str, timestamp_ms: i64) -> String {
    let plain = format!("{path}\\r\\n{api_key}\\r\\n{timestamp_ms}");
    hex::encode(Md5::digest(plain.as_bytes()))
}

#[async_trait]
impl BatteryDevice for FoxCloudClient {
    async fn battery_soc(&self) -> Result<f32> {
        Ok(self.get_battery_soc().await?)
    }

    async fn charge_schedule(&self) -> Result<ChargeSchedule> {
        Ok(self.get_charge_schedule().await?)
    }

    async fn set_charge_schedule(&self, schedule: &ChargeSchedule) -> Result<()> {
        Ok(FoxCloudClient::set_charge_schedule(self, schedule).await?)
    }

    fn name(&self) -> &str {
        "foxess-cloud"
    }
}
