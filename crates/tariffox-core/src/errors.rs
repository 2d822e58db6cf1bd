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

use thiserror::Error;

use crate::runs::RunKind;

/// Planning failure taxonomy. Every variant aborts the current cycle only;
/// the daemon keeps running and the device keeps its prior schedule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("no price data for the requested day")]
    EmptySeries,

    #[error(
        "no qualifying {kind} run found (k settled at {settled_k:.3} after {iterations} scans)"
    )]
    NoQualifyingRun {
        kind: RunKind,
        settled_k: f32,
        iterations: u32,
    },
}
