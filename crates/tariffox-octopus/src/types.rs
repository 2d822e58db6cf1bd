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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tariffox_types::{PriceSeries, PriceSlot};

/// One half-hourly unit rate as the Agile API returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgileRate {
    pub value_exc_vat: f32,
    pub value_inc_vat: f32,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

/// Paged rate listing; one day of Agile rates fits a single page.
/// The API returns results newest-first.
#[derive(Debug, Clone, Deserialize)]
pub struct AgileRatesPage {
    pub results: Vec<AgileRate>,
}

impl AgileRatesPage {
    /// Flatten the page into a chronological price series keyed by slot start
    pub fn into_series(self) -> PriceSeries {
        PriceSeries::from_slots(
            self.results
                .into_iter()
                .map(|rate| PriceSlot {
                    start_at: rate.valid_from,
                    price_inc_vat: rate.value_inc_vat,
                    price_exc_vat: rate.value_exc_vat,
                })
                .collect(),
        )
    }
}

// Kraken GraphQL token exchange envelope

#[derive(Debug, Deserialize)]
pub(crate) struct KrakenTokenEnvelope {
    pub data: Option<KrakenTokenData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KrakenTokenData {
    #[serde(rename = "obtainKrakenToken")]
    pub obtain_kraken_token: Option<KrakenToken>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KrakenToken {
    pub token: String,
}
