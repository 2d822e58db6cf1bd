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

use tariffox_types::{PriceSeries, SeriesStats};

use crate::errors::PlanError;

/// Compute min/max/mean/standard deviation over one day of prices.
///
/// Standard deviation is the population form: the run-finder's relaxation
/// math treats the day as the whole population, not a sample of one.
pub fn series_stats(series: &PriceSeries) -> Result<SeriesStats, PlanError> {
    if series.is_empty() {
        return Err(PlanError::EmptySeries);
    }

    let count = series.len() as f32;
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0_f32;

    for slot in series {
        min = min.min(slot.price_inc_vat);
        max = max.max(slot.price_inc_vat);
        sum += slot.price_inc_vat;
    }

    let mean = sum / count;
    let variance = series
        .iter()
        .map(|slot| {
            let d = slot.price_inc_vat - mean;
            d * d
        })
        .sum::<f32>()
        / count;

    Ok(SeriesStats {
        min,
        max,
        mean,
        std_dev: variance.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tariffox_types::{PriceSlot, SLOT_MINUTES};

    fn series_of(prices: &[f32]) -> PriceSeries {
        let day = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        PriceSeries::from_slots(
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| PriceSlot {
                    start_at: day + Duration::minutes(SLOT_MINUTES * i as i64),
                    price_inc_vat: p,
                    price_exc_vat: p,
                })
                .collect(),
        )
    }

    #[test]
    fn test_empty_series_is_an_error() {
        let result = series_stats(&PriceSeries::from_slots(Vec::new()));
        assert_eq!(result, Err(PlanError::EmptySeries));
    }

    #[test]
    fn test_mean_lies_within_min_max() {
        let stats = series_stats(&series_of(&[4.0, 9.5, -2.0, 30.0, 12.25])).unwrap();
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert_eq!(stats.min, -2.0);
        assert_eq!(stats.max, 30.0);
    }

    #[test]
    fn test_population_std_dev() {
        // Population variance of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 4
        let stats = series_stats(&series_of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert!((stats.std_dev - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_series_has_zero_std_dev() {
        let stats = series_stats(&series_of(&[7.5; 48])).unwrap();
        assert_eq!(stats.mean, 7.5);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_single_slot_series() {
        let stats = series_stats(&series_of(&[-1.5])).unwrap();
        assert_eq!(stats.min, -1.5);
        assert_eq!(stats.max, -1.5);
        assert_eq!(stats.mean, -1.5);
        assert_eq!(stats.std_dev, 0.0);
    }
}
