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

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use tariffox_types::{ChargeSchedule, TimeRange};

use crate::planner::plan_day;
use crate::runs::RelaxationParams;
use crate::traits::{BatteryDevice, PriceSource};

/// Daemon timing and decision thresholds
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Local wall-clock hour of the nightly planning trigger
    pub planning_hour: u32,
    /// Tariff's local time zone (trigger time and schedule hour/minute conversion)
    pub timezone: Tz,
    /// Poll period of the reactive monitor inside the expensive window
    pub monitor_poll: StdDuration,
    /// Battery SoC (%) above which the expensive window is cut short
    pub soc_stop_threshold: f32,
    pub relaxation: RelaxationParams,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            planning_hour: 23,
            timezone: chrono_tz::Europe::London,
            monitor_poll: StdDuration::from_secs(5),
            soc_stop_threshold: 80.0,
            relaxation: RelaxationParams::default(),
        }
    }
}

struct MonitorHandle {
    window: TimeRange,
    handle: JoinHandle<()>,
}

/// The daily state machine: idle between triggers, one planning cycle per
/// night, at most one reactive monitor task bound to the expensive window.
///
/// Cycle errors are logged and swallowed here; a missed night of
/// optimisation is preferable to a crash loop, and the device simply keeps
/// its previous schedule until the next trigger.
pub struct Orchestrator {
    prices: Arc<dyn PriceSource>,
    device: Arc<dyn BatteryDevice>,
    config: OrchestratorConfig,
    monitor: Option<MonitorHandle>,
}

impl Orchestrator {
    pub fn new(
        prices: Arc<dyn PriceSource>,
        device: Arc<dyn BatteryDevice>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            prices,
            device,
            config,
            monitor: None,
        }
    }

    /// Run the daemon loop forever: sleep until the nightly trigger, then
    /// plan the next calendar day
    pub async fn run(mut self) -> Result<()> {
        info!(
            source = self.prices.name(),
            device = self.device.name(),
            planning_hour = self.config.planning_hour,
            "starting daily planning loop"
        );

        loop {
            let now = Utc::now();
            let trigger = self.next_trigger(now);
            info!("next planning trigger at {}", trigger);
            sleep((trigger - now).to_std().unwrap_or(StdDuration::ZERO)).await;

            let target_day = (trigger.with_timezone(&self.config.timezone) + Duration::days(1))
                .date_naive();
            if let Err(e) = self.run_planning_cycle(target_day).await {
                error!("planning cycle for {} failed: {:#}", target_day, e);
            }
        }
    }

    /// First planning-trigger instant strictly after `now`
    fn next_trigger(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let tz = self.config.timezone;
        let mut date = now.with_timezone(&tz).date_naive();

        // A couple of day steps cover today-already-past and a DST-skipped hour
        for _ in 0..3 {
            let candidate = date
                .and_hms_opt(self.config.planning_hour, 0, 0)
                .and_then(|naive| tz.from_local_datetime(&naive).earliest())
                .map(|local| local.with_timezone(&Utc));
            if let Some(candidate) = candidate {
                if candidate > now {
                    return candidate;
                }
            }
            date = date.succ_opt().unwrap_or(date);
        }

        now + Duration::days(1)
    }

    /// One planning cycle for `date`: fetch prices, compute both windows,
    /// push the schedule, and arm the monitor if the expensive window is
    /// still ahead.
    ///
    /// Any collaborator failure aborts the cycle before the device write, so
    /// a partial plan is never pushed.
    pub async fn run_planning_cycle(&mut self, date: NaiveDate) -> Result<()> {
        info!(source = self.prices.name(), "planning charge windows for {}", date);

        let series = self
            .prices
            .day_rates(date)
            .await
            .with_context(|| format!("fetching day rates for {date}"))?;
        let plan = plan_day(&series, self.config.relaxation, self.config.timezone)?;

        info!(
            cheap_start = %plan.cheap_window.start,
            cheap_end = %plan.cheap_window.end,
            expensive_start = %plan.expensive_window.start,
            expensive_end = %plan.expensive_window.end,
            "computed charge windows"
        );

        self.device
            .set_charge_schedule(&plan.schedule)
            .await
            .context("pushing charge schedule")?;

        self.arm_monitor(plan.expensive_window);
        Ok(())
    }

    /// Window of the currently armed monitor task, if one is still live
    pub fn active_monitor_window(&self) -> Option<TimeRange> {
        self.monitor
            .as_ref()
            .filter(|m| !m.handle.is_finished())
            .map(|m| m.window)
    }

    /// Bind the single monitor slot to `window`, superseding any task a
    /// previous cycle left behind
    fn arm_monitor(&mut self, window: TimeRange) {
        if let Some(previous) = self.monitor.take() {
            if !previous.handle.is_finished() {
                warn!(
                    start = %previous.window.start,
                    end = %previous.window.end,
                    "superseding still-active monitor task"
                );
            }
            previous.handle.abort();
        }

        if window.end <= Utc::now() {
            debug!("expensive window already elapsed, monitor not armed");
            return;
        }

        let handle = tokio::spawn(monitor_window(
            Arc::clone(&self.device),
            window,
            self.config.monitor_poll,
            self.config.soc_stop_threshold,
        ));
        self.monitor = Some(MonitorHandle { window, handle });
    }
}

/// The reactive monitor: poll battery SoC inside `[window.start, window.end)`
/// and push the all-disabled schedule once the battery is full enough, ending
/// the discharge window early.
///
/// Failed reads are logged and skipped; the next tick retries. A successful
/// disable ends the task (pushing again would be a no-op, the window is off).
pub async fn monitor_window(
    device: Arc<dyn BatteryDevice>,
    window: TimeRange,
    poll: StdDuration,
    soc_stop_threshold: f32,
) {
    let now = Utc::now();
    if now >= window.end {
        debug!("monitor window already over, nothing to do");
        return;
    }
    if now < window.start {
        if let Ok(wait) = (window.start - now).to_std() {
            sleep(wait).await;
        }
    }

    info!(
        device = device.name(),
        end = %window.end,
        threshold = soc_stop_threshold,
        "monitoring battery level during expensive window"
    );

    let remaining = (window.end - Utc::now())
        .to_std()
        .unwrap_or(StdDuration::ZERO);
    let outcome = timeout(remaining, async {
        let mut ticker = tokio::time::interval(poll);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match device.battery_soc().await {
                Ok(soc) => {
                    debug!("current battery level {:.1}%", soc);
                    if soc > soc_stop_threshold {
                        info!(
                            soc,
                            "battery sufficiently full, stopping expensive window early"
                        );
                        match device.set_charge_schedule(&ChargeSchedule::disabled()).await {
                            Ok(()) => break,
                            Err(e) => warn!("failed to disable charge schedule: {:#}", e),
                        }
                    }
                }
                Err(e) => warn!("failed to read battery SoC, skipping tick: {:#}", e),
            }
        }
    })
    .await;

    if outcome.is_err() {
        debug!("expensive window elapsed without early stop");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Days;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tariffox_types::{PriceSeries, PriceSlot, SLOT_MINUTES};

    struct FixedPrices {
        series: Option<PriceSeries>,
    }

    #[async_trait]
    impl PriceSource for FixedPrices {
        async fn day_rates(&self, _date: NaiveDate) -> Result<PriceSeries> {
            self.series
                .clone()
                .ok_or_else(|| anyhow!("tariff API returned HTTP 502"))
        }

        fn name(&self) -> &str {
            "fixed-prices"
        }
    }

    #[derive(Default)]
    struct FakeDevice {
        soc_responses: Mutex<VecDeque<Result<f32>>>,
        soc_reads: Mutex<u32>,
        writes: Mutex<Vec<ChargeSchedule>>,
    }

    impl FakeDevice {
        fn with_soc(responses: Vec<Result<f32>>) -> Self {
            Self {
                soc_responses: Mutex::new(responses.into_iter().collect()),
                ..Default::default()
            }
        }

        fn writes(&self) -> Vec<ChargeSchedule> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BatteryDevice for FakeDevice {
        async fn battery_soc(&self) -> Result<f32> {
            *self.soc_reads.lock().unwrap() += 1;
            self.soc_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(50.0))
        }

        async fn charge_schedule(&self) -> Result<ChargeSchedule> {
            Ok(ChargeSchedule::default())
        }

        async fn set_charge_schedule(&self, schedule: &ChargeSchedule) -> Result<()> {
            self.writes.lock().unwrap().push(*schedule);
            Ok(())
        }

        fn name(&self) -> &str {
            "fake-device"
        }
    }

    /// A well-shaped day starting at `day_start`: cheap slots 2..=10,
    /// expensive slots 34..=40
    fn shaped_series(day_start: DateTime<Utc>) -> PriceSeries {
        let mut prices = vec![15.0_f32; 48];
        for p in prices.iter_mut().skip(2).take(9) {
            *p = 3.0;
        }
        for p in prices.iter_mut().skip(34).take(7) {
            *p = 38.0;
        }
        PriceSeries::from_slots(
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| PriceSlot {
                    start_at: day_start + Duration::minutes(SLOT_MINUTES * i as i64),
                    price_inc_vat: p,
                    price_exc_vat: p,
                })
                .collect(),
        )
    }

    fn future_window(hours_from_now: i64, slots: usize) -> TimeRange {
        TimeRange::forward_from(Utc::now() + Duration::hours(hours_from_now), slots)
    }

    #[test]
    fn test_next_trigger_is_tonight_or_tomorrow_local() {
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPrices { series: None }),
            Arc::new(FakeDevice::default()),
            OrchestratorConfig::default(),
        );

        // June: London is UTC+1, so the 23:00 local trigger is 22:00 UTC
        let morning = Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap();
        assert_eq!(
            orchestrator.next_trigger(morning),
            Utc.with_ymd_and_hms(2025, 6, 15, 22, 0, 0).unwrap()
        );

        // Past tonight's trigger: roll over to tomorrow's
        let late = Utc.with_ymd_and_hms(2025, 6, 15, 22, 30, 0).unwrap();
        assert_eq!(
            orchestrator.next_trigger(late),
            Utc.with_ymd_and_hms(2025, 6, 16, 22, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_price_failure_means_no_device_write() {
        let device = Arc::new(FakeDevice::default());
        let mut orchestrator = Orchestrator::new(
            Arc::new(FixedPrices { series: None }),
            device.clone(),
            OrchestratorConfig::default(),
        );

        let result = orchestrator
            .run_planning_cycle(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap())
            .await;

        assert!(result.is_err());
        assert!(device.writes().is_empty());
        assert!(orchestrator.active_monitor_window().is_none());
    }

    #[tokio::test]
    async fn test_planning_pushes_schedule_and_arms_monitor() {
        let tomorrow = (Utc::now() + Duration::days(1))
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let device = Arc::new(FakeDevice::default());
        let mut orchestrator = Orchestrator::new(
            Arc::new(FixedPrices {
                series: Some(shaped_series(tomorrow)),
            }),
            device.clone(),
            OrchestratorConfig::default(),
        );

        orchestrator
            .run_planning_cycle(tomorrow.date_naive())
            .await
            .unwrap();

        let writes = device.writes();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].enable1 && writes[0].enable2);

        let window = orchestrator.active_monitor_window().unwrap();
        assert_eq!(window.start, tomorrow + Duration::hours(17));
        assert_eq!(window.slot_count(), 7);
    }

    #[tokio::test]
    async fn test_past_expensive_window_returns_to_idle() {
        let last_week = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(7))
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let device = Arc::new(FakeDevice::default());
        let mut orchestrator = Orchestrator::new(
            Arc::new(FixedPrices {
                series: Some(shaped_series(last_week)),
            }),
            device.clone(),
            OrchestratorConfig::default(),
        );

        orchestrator
            .run_planning_cycle(last_week.date_naive())
            .await
            .unwrap();

        // Schedule still pushed, but no monitor for an elapsed window
        assert_eq!(device.writes().len(), 1);
        assert!(orchestrator.active_monitor_window().is_none());
    }

    #[tokio::test]
    async fn test_new_cycle_supersedes_previous_monitor() {
        let day_one = (Utc::now() + Duration::days(1))
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let day_two = day_one + Duration::days(1);
        let device = Arc::new(FakeDevice::default());

        let mut orchestrator = Orchestrator::new(
            Arc::new(FixedPrices {
                series: Some(shaped_series(day_one)),
            }),
            device.clone(),
            OrchestratorConfig::default(),
        );
        orchestrator
            .run_planning_cycle(day_one.date_naive())
            .await
            .unwrap();
        let first_window = orchestrator.active_monitor_window().unwrap();

        orchestrator.prices = Arc::new(FixedPrices {
            series: Some(shaped_series(day_two)),
        });
        orchestrator
            .run_planning_cycle(day_two.date_naive())
            .await
            .unwrap();

        let second_window = orchestrator.active_monitor_window().unwrap();
        assert_ne!(first_window, second_window);
        assert_eq!(second_window.start, day_two + Duration::hours(17));
        assert_eq!(device.writes().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_disables_exactly_once_when_battery_full() {
        let device = Arc::new(FakeDevice::with_soc(vec![Ok(85.0), Ok(90.0), Ok(95.0)]));

        monitor_window(
            device.clone(),
            future_window(0, 6),
            StdDuration::from_secs(5),
            80.0,
        )
        .await;

        let writes = device.writes();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].is_disabled());
        // Self-cancelled after the first successful disable
        assert_eq!(*device.soc_reads.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_skips_failed_read_and_retries_next_tick() {
        let device = Arc::new(FakeDevice::with_soc(vec![
            Err(anyhow!("cloud API timeout")),
            Ok(86.0),
        ]));

        monitor_window(
            device.clone(),
            future_window(0, 6),
            StdDuration::from_secs(5),
            80.0,
        )
        .await;

        assert_eq!(*device.soc_reads.lock().unwrap(), 2);
        assert_eq!(device.writes().len(), 1);
        assert!(device.writes()[0].is_disabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_below_threshold_keeps_polling_until_window_end() {
        // SoC never crosses the threshold: the monitor must tick the whole
        // window through and never write
        let device = Arc::new(FakeDevice::default());

        monitor_window(
            device.clone(),
            future_window(0, 1),
            StdDuration::from_secs(60),
            80.0,
        )
        .await;

        assert!(device.writes().is_empty());
        assert!(*device.soc_reads.lock().unwrap() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_is_inert_outside_its_window() {
        let device = Arc::new(FakeDevice::with_soc(vec![Ok(95.0)]));
        let elapsed = TimeRange::forward_from(Utc::now() - Duration::hours(4), 6);

        monitor_window(
            device.clone(),
            elapsed,
            StdDuration::from_secs(5),
            80.0,
        )
        .await;

        assert_eq!(*device.soc_reads.lock().unwrap(), 0);
        assert!(device.writes().is_empty());
    }
}
