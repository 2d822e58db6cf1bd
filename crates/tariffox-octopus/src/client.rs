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
use chrono::{Days, NaiveDate};
use chrono_tz::Tz;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use tariffox_core::PriceSource;
use tariffox_types::PriceSeries;

use crate::errors::{OctopusError, OctopusResult};
use crate::types::{AgileRatesPage, KrakenTokenEnvelope};

/// Octopus Energy REST client for one Agile product/tariff pair
#[derive(Clone)]
pub struct OctopusClient {
    base_url: String,
    api_key: String,
    product_code: String,
    tariff_code: String,
    timezone: Tz,
    client: Client,
}

impl OctopusClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        product_code: impl Into<String>,
        tariff_code: impl Into<String>,
        timezone: Tz,
    ) -> OctopusResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                OctopusError::ConfigError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            product_code: product_code.into(),
            tariff_code: tariff_code.into(),
            timezone,
            client,
        })
    }

    /// Fetch all half-hourly unit rates for one calendar day of the tariff's
    /// local time zone
    pub async fn get_day_rates(&self, date: NaiveDate) -> OctopusResult<AgileRatesPage> {
        let period_from = self.local_midnight_utc(date)?;
        let period_to = self.local_midnight_utc(
            date.checked_add_days(Days::new(1))
                .ok_or_else(|| OctopusError::InvalidResponse("date overflow".to_string()))?,
        )?;

        let url = format!(
            "{}/v1/products/{}/electricity-tariffs/{}/standard-unit-rates/",
            self.base_url, self.product_code, self.tariff_code
        );
        debug!("fetching Agile rates for {} from {}", date, url);

        let response = self
            .client
            .get(&url)
            .query(&[("period_from", &period_from), ("period_to", &period_to)])
            .header("Authorization", format!("Token {}", self.api_key))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let page = response.json::<AgileRatesPage>().await?;
                info!("retrieved {} Agile rates for {}", page.results.len(), date);
                Ok(page)
            }
            StatusCode::NOT_FOUND => Err(OctopusError::TariffNotFound(format!(
                "{}/{}",
                self.product_code, self.tariff_code
            ))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(OctopusError::AuthenticationFailed)
            }
            status => Err(OctopusError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Exchange the API key for a short-lived Kraken token
    pub async fn obtain_kraken_token(&self) -> OctopusResult<String> {
        let body = json!({
            "query": "mutation krakenTokenAuthentication($api: String!) { obtainKrakenToken(input: {APIKey: $api}) { token } }",
            "variables": { "api": self.api_key },
        });

        let response = self
            .client
            .post(format!("{}/v1/graphql/", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OctopusError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let envelope = response.json::<KrakenTokenEnvelope>().await?;
        envelope
            .data
            .and_then(|data| data.obtain_kraken_token)
            .map(|token| token.token)
            .ok_or(OctopusError::AuthenticationFailed)
    }

    /// Look up the account's current electricity tariff code (diagnostics;
    /// planning uses the configured code)
    pub async fn get_account_tariff_code(&self, account_number: &str) -> OctopusResult<String> {
        let url = format!("{}/v1/accounts/{}/", self.base_url, account_number);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.json::<serde_json::Value>().await?;
                body["properties"][0]["electricity_meter_points"][0]["agreements"]
                    .as_array()
                    .and_then(|agreements| agreements.last())
                    .and_then(|agreement| agreement["tariff_code"].as_str())
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        OctopusError::InvalidResponse(
                            "no electricity agreement on account".to_string(),
                        )
                    })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(OctopusError::AuthenticationFailed)
            }
            status => Err(OctopusError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// RFC 3339 UTC instant of local midnight on `date`
    fn local_midnight_utc(&self, date: NaiveDate) -> OctopusResult<String> {
        date.and_hms_opt(0, 0, 0)
            .and_then(|naive| naive.and_local_timezone(self.timezone).earliest())
            .map(|local| local.with_timezone(&chrono::Utc).to_rfc3339())
            .ok_or_else(|| {
                OctopusError::InvalidResponse(format!("no local midnight for {date}"))
            })
    }
}

#[async_trait]
impl PriceSource for OctopusClient {
    async fn day_rates(&self, date: NaiveDate) -> Result<PriceSeries> {
        let page = self.get_day_rates(date).await?;
        Ok(page.into_series())
    }

    fn name(&self) -> &str {
        "octopus-agile"
    }
}
