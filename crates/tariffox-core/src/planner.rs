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
use chrono_tz::Tz;
use tariffox_types::{ChargeSchedule, HourMin, PriceSeries, TimeRange};

use crate::errors::PlanError;
use crate::runs::{RelaxationParams, Run, RunKind, find_longest_run};
use crate::stats::series_stats;

/// The output of one planning cycle: the two windows and the payload that
/// encodes them for the device
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    /// Window 1: cheapest contiguous stretch, expected overnight
    pub cheap_window: TimeRange,
    /// Window 2: most expensive contiguous stretch, expected at the evening peak
    pub expensive_window: TimeRange,
    pub schedule: ChargeSchedule,
}

/// Convert a detected run into its calendar window.
///
/// Cheap runs are already in natural temporal order and stretch forward from
/// their first slot. Expensive runs keep the tail-anchored reconstruction
/// contract: reference slot + slot count, walked backwards.
pub fn window_for_run(run: &Run) -> TimeRange {
    match run.kind() {
        RunKind::Cheap => TimeRange::forward_from(run.first_start(), run.len()),
        RunKind::Expensive => TimeRange::backwards_from(run.last_start(), run.len()),
    }
}

/// Build the device payload for the two windows, starting from the
/// all-disabled default so the result is always fully specified.
pub fn schedule_for_windows(cheap: TimeRange, expensive: TimeRange, tz: Tz) -> ChargeSchedule {
    ChargeSchedule::with_windows(
        (local_hour_min(cheap.start, tz), local_hour_min(cheap.end, tz)),
        (
            local_hour_min(expensive.start, tz),
            local_hour_min(expensive.end, tz),
        ),
    )
}

fn local_hour_min(t: DateTime<Utc>, tz: Tz) -> HourMin {
    HourMin::from(t.with_timezone(&tz).time())
}

/// Run the full planning pipeline over one day of prices:
/// statistics → cheap and expensive runs → windows → schedule payload.
pub fn plan_day(
    series: &PriceSeries,
    params: RelaxationParams,
    tz: Tz,
) -> Result<DayPlan, PlanError> {
    let stats = series_stats(series)?;

    let cheap = find_longest_run(series, &stats, RunKind::Cheap, params)?;
    let expensive = find_longest_run(series, &stats, RunKind::Expensive, params)?;

    let cheap_window = window_for_run(&cheap);
    let expensive_window = window_for_run(&expensive);

    Ok(DayPlan {
        cheap_window,
        expensive_window,
        schedule: schedule_for_windows(cheap_window, expensive_window, tz),
    })
}
