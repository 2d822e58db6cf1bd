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

pub mod errors;
pub mod orchestrator;
pub mod planner;
pub mod runs;
pub mod stats;
pub mod traits;

pub use errors::PlanError;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use planner::{DayPlan, plan_day};
pub use runs::{RelaxationParams, Run, RunKind, find_longest_run};
pub use stats::series_stats;
pub use traits::{BatteryDevice, PriceSource};
