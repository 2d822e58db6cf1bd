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

use std::fmt;

use chrono::{DateTime, Utc};
use tariffox_types::{PriceSeries, PriceSlot, SeriesStats};

use crate::errors::PlanError;

/// Which side of the price band a run is detected on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Slots below `mean - k * std`: overnight protection charging
    Cheap,
    /// Slots above `mean + k * std`: peak-price discharge window
    Expensive,
}

impl RunKind {
    /// Minimum acceptable run length in slots (4h cheap, 3h expensive at
    /// half-hour slots)
    pub fn min_slots(self) -> usize {
        match self {
            Self::Cheap => 8,
            Self::Expensive => 6,
        }
    }

    fn admits(self, price: f32, stats: &SeriesStats, k: f32) -> bool {
        match self {
            Self::Cheap => price < stats.mean - k * stats.std_dev,
            Self::Expensive => price > stats.mean + k * stats.std_dev,
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cheap => write!(f, "cheap"),
            Self::Expensive => write!(f, "expensive"),
        }
    }
}

/// A maximal contiguous sequence of slots all inside the band at the k the
/// relaxation settled on. Non-empty by construction; slots are adjacent in
/// the source series (no gaps).
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    slots: Vec<PriceSlot>,
    kind: RunKind,
    settled_k: f32,
}

impl Run {
    pub fn slots(&self) -> &[PriceSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn kind(&self) -> RunKind {
        self.kind
    }

    /// The relaxation factor the scan settled on
    pub fn settled_k(&self) -> f32 {
        self.settled_k
    }

    /// Start of the run's first slot
    pub fn first_start(&self) -> DateTime<Utc> {
        self.slots[0].start_at
    }

    /// Start of the run's chronologically last slot — the reference slot for
    /// backward window reconstruction
    pub fn last_start(&self) -> DateTime<Utc> {
        self.slots[self.slots.len() - 1].start_at
    }
}

/// Tuning for the adaptive threshold relaxation.
///
/// Relaxation *widens* the band: each rescan multiplies `k` by `decay`, so
/// fewer standard deviations from the mean count as extreme. The floor and
/// iteration cap guarantee termination on flat or degenerate series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationParams {
    /// Starting band width in standard deviations
    pub initial_k: f32,
    /// Multiplier applied to `k` on each too-short rescan
    pub decay: f32,
    /// Give up once `k` drops below this
    pub k_floor: f32,
    /// Hard cap on rescans
    pub max_iterations: u32,
}

impl Default for RelaxationParams {
    fn default() -> Self {
        Self {
            initial_k: 1.0,
            decay: 0.95,
            k_floor: 0.05,
            max_iterations: 200,
        }
    }
}

/// Find the longest contiguous run of slots beyond the mean±k·std band,
/// relaxing the band until the run is long enough for its kind.
///
/// Pure function of its inputs. Relaxation only continues while a too-short
/// run exists: a scan with no qualifying slot at all fails immediately, and
/// bottoming out the floor or iteration cap with only short runs is also
/// `NoQualifyingRun`. Widening past an empty scan would start admitting
/// ordinary slots as extreme.
pub fn find_longest_run(
    series: &PriceSeries,
    stats: &SeriesStats,
    kind: RunKind,
    params: RelaxationParams,
) -> Result<Run, PlanError> {
    if series.is_empty() {
        return Err(PlanError::EmptySeries);
    }

    // Zero variance means no price is strictly beyond the mean at any k;
    // rescanning cannot change that.
    if stats.std_dev <= 0.0 {
        return Err(PlanError::NoQualifyingRun {
            kind,
            settled_k: params.initial_k,
            iterations: 0,
        });
    }

    let mut k = params.initial_k;
    let mut iterations = 0_u32;

    while iterations < params.max_iterations && k >= params.k_floor {
        iterations += 1;

        let Some(longest) = scan_longest(series, stats, kind, k) else {
            return Err(PlanError::NoQualifyingRun {
                kind,
                settled_k: k,
                iterations,
            });
        };

        if longest.len() >= kind.min_slots() {
            return Ok(Run {
                slots: longest,
                kind,
                settled_k: k,
            });
        }

        k *= params.decay;
    }

    Err(PlanError::NoQualifyingRun {
        kind,
        settled_k: k,
        iterations,
    })
}

/// One chronological pass: extend the open run while the predicate holds and
/// slots stay adjacent, close it otherwise, keep the longest (earliest on
/// ties).
fn scan_longest(
    series: &PriceSeries,
    stats: &SeriesStats,
    kind: RunKind,
    k: f32,
) -> Option<Vec<PriceSlot>> {
    let mut best: Option<Vec<PriceSlot>> = None;
    let mut open: Vec<PriceSlot> = Vec::new();

    let close = |open: &mut Vec<PriceSlot>, best: &mut Option<Vec<PriceSlot>>| {
        if !open.is_empty() {
            let candidate = std::mem::take(open);
            let better = best
                .as_ref()
                .map(|b| candidate.len() > b.len())
                .unwrap_or(true);
            if better {
                *best = Some(candidate);
            }
        }
    };

    for slot in series {
        let contiguous = open
            .last()
            .map(|prev| prev.is_followed_by(slot))
            .unwrap_or(true);

        if kind.admits(slot.price_inc_vat, stats, k) {
            if !contiguous {
                close(&mut open, &mut best);
            }
            open.push(*slot);
        } else {
            close(&mut open, &mut best);
        }
    }
    close(&mut open, &mut best);

    best
}
