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

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing::SLOT_MINUTES;

/// Half-open calendar window `[start, end)` covering whole tariff slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Window spanning `slot_count` slots forward from `first_slot_start`
    pub fn forward_from(first_slot_start: DateTime<Utc>, slot_count: usize) -> Self {
        Self {
            start: first_slot_start,
            end: first_slot_start + Duration::minutes(SLOT_MINUTES * slot_count as i64),
        }
    }

    /// Window spanning `slot_count` slots, reconstructed backwards from the
    /// start of its chronologically last slot.
    ///
    /// This is the contract the expensive-window detection relies on: the run
    /// is anchored at its tail, so the true window is recovered by stepping
    /// back `slot_count` slots and ending one interval after the reference.
    pub fn backwards_from(last_slot_start: DateTime<Utc>, slot_count: usize) -> Self {
        let end = last_slot_start + Duration::minutes(SLOT_MINUTES);
        Self {
            start: end - Duration::minutes(SLOT_MINUTES * slot_count as i64),
            end,
        }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }

    /// Number of whole slots covered by this window
    pub fn slot_count(&self) -> usize {
        let minutes = (self.end - self.start).num_minutes().max(0);
        (minutes / SLOT_MINUTES) as usize
    }
}

/// Local wall-clock hour/minute pair, as the inverter schedule API expects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourMin {
    pub hour: u8,
    pub minute: u8,
}

impl From<NaiveTime> for HourMin {
    fn from(t: NaiveTime) -> Self {
        Self {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
        }
    }
}

/// Full force-charge schedule payload for the inverter's two windows.
///
/// Every write is a full replacement: the `Default` value is both windows
/// disabled with zeroed times, and the planner only ever builds payloads on
/// top of that default. Field names follow the FoxESS wire format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeSchedule {
    pub enable1: bool,
    pub enable2: bool,
    pub start_time1: HourMin,
    pub end_time1: HourMin,
    pub start_time2: HourMin,
    pub end_time2: HourMin,
}

impl ChargeSchedule {
    /// The safe all-disabled payload pushed to stop a window early
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Payload with both windows enabled at the given local times
    pub fn with_windows(
        window1: (HourMin, HourMin),
        window2: (HourMin, HourMin),
    ) -> Self {
        Self {
            enable1: true,
            enable2: true,
            start_time1: window1.0,
            end_time1: window1.1,
            start_time2: window2.0,
            end_time2: window2.1,
        }
    }

    pub fn is_disabled(&self) -> bool {
        !self.enable1 && !self.enable2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_forward_range_covers_whole_slots() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 1, 0, 0).unwrap();
        let range = TimeRange::forward_from(start, 8);

        assert_eq!(range.start, start);
        assert_eq!(range.end, Utc.with_ymd_and_hms(2025, 3, 10, 5, 0, 0).unwrap());
        assert_eq!(range.slot_count(), 8);
    }

    #[test]
    fn test_backwards_range_recovers_window() {
        // A 6-slot run ending with the 17:30 slot covers 15:00-18:00
        let last = Utc.with_ymd_and_hms(2025, 3, 10, 17, 30, 0).unwrap();
        let range = TimeRange::backwards_from(last, 6);

        assert_eq!(range.start, Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap());
        assert_eq!(range.slot_count(), 6);
    }

    #[test]
    fn test_range_contains_is_half_open() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 1, 0, 0).unwrap();
        let range = TimeRange::forward_from(start, 2);

        assert!(range.contains(range.start));
        assert!(range.contains(range.end - chrono::Duration::seconds(1)));
        assert!(!range.contains(range.end));
    }

    #[test]
    fn test_schedule_default_is_fully_disabled() {
        let schedule = ChargeSchedule::default();
        assert!(schedule.is_disabled());
        assert_eq!(schedule.start_time1, HourMin::default());
        assert_eq!(schedule.end_time2, HourMin::default());
    }

    #[test]
    fn test_schedule_wire_field_names() {
        let schedule = ChargeSchedule::with_windows(
            (HourMin { hour: 1, minute: 30 }, HourMin { hour: 5, minute: 0 }),
            (HourMin { hour: 16, minute: 0 }, HourMin { hour: 19, minute: 0 }),
        );

        let json = serde_json::to_value(schedule).unwrap();
        assert_eq!(json["enable1"], true);
        assert_eq!(json["enable2"], true);
        assert_eq!(json["startTime1"]["hour"], 1);
        assert_eq!(json["startTime1"]["minute"], 30);
        assert_eq!(json["endTime2"]["hour"], 19);
    }
}
