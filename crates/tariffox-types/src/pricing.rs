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

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Width of one tariff slot in minutes (Agile publishes half-hourly rates)
pub const SLOT_MINUTES: i64 = 30;

/// One half-hour tariff slot, identified by its start timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSlot {
    /// Start of the slot (UTC)
    pub start_at: DateTime<Utc>,

    /// Unit price including VAT (p/kWh, may be negative)
    pub price_inc_vat: f32,

    /// Unit price excluding VAT (p/kWh)
    pub price_exc_vat: f32,
}

impl PriceSlot {
    /// End of the slot (start plus one slot interval)
    pub fn end_at(&self) -> DateTime<Utc> {
        self.start_at + Duration::minutes(SLOT_MINUTES)
    }

    /// Whether `other` is the slot immediately following this one
    pub fn is_followed_by(&self, other: &PriceSlot) -> bool {
        other.start_at == self.end_at()
    }
}

/// Chronologically ordered, gap-tolerant series of tariff slots for one day.
///
/// Built once per planning cycle and never mutated afterwards. Construction
/// sorts by slot start and drops duplicate timestamps, so downstream code can
/// rely on strictly increasing keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    slots: Vec<PriceSlot>,
}

impl PriceSeries {
    /// Build a series from raw slots, sorting chronologically and dropping
    /// duplicate slot starts
    pub fn from_slots(mut slots: Vec<PriceSlot>) -> Self {
        slots.sort_by_key(|slot| slot.start_at);
        slots.dedup_by_key(|slot| slot.start_at);
        Self { slots }
    }

    pub fn slots(&self) -> &[PriceSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PriceSlot> {
        self.slots.iter()
    }

    /// First slot start, if the series is non-empty
    pub fn first_start(&self) -> Option<DateTime<Utc>> {
        self.slots.first().map(|slot| slot.start_at)
    }

    /// End of the last slot, if the series is non-empty
    pub fn last_end(&self) -> Option<DateTime<Utc>> {
        self.slots.last().map(PriceSlot::end_at)
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PriceSlot;
    type IntoIter = std::slice::Iter<'a, PriceSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

/// Descriptive statistics over one price series snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Population standard deviation (not sample-corrected)
    pub std_dev: f32,
}
