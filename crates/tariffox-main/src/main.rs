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

mod config;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use tariffox_core::Orchestrator;
use tariffox_foxess::FoxCloudClient;
use tariffox_octopus::OctopusClient;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Handle command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                println!("TariffOx - Agile Tariff Battery Scheduler");
                println!("Version: {}", VERSION);
                println!();
                println!("Usage: tariffox [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help    Print this help message");
                println!("  -v, --version Print version");
                return Ok(());
            }
            "--version" | "-v" => {
                println!("{}", VERSION);
                return Ok(());
            }
            _ => {}
        }
    }

    // Initialize tracing with env filter support
    // Respects RUST_LOG environment variable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = config::AppConfig::load()?;

    info!("🚀 Starting TariffOx - Agile Tariff Battery Scheduler v{}", VERSION);
    info!("📋 Configuration Summary:");
    info!("   Tariff: {} / {}", config.octopus.product_code, config.octopus.tariff_code);
    info!("   Device: {}", config.foxess.device_sn);
    info!("   Timezone: {}", config.planner.timezone);
    info!("   Planning trigger: {:02}:00 local", config.planner.planning_hour);
    info!(
        "   Monitor: every {}s, stop above {}% SoC",
        config.planner.monitor_poll_secs, config.planner.soc_stop_threshold
    );

    let prices = Arc::new(OctopusClient::new(
        config.octopus.base_url.clone(),
        config.octopus.api_key.clone(),
        config.octopus.product_code.clone(),
        config.octopus.tariff_code.clone(),
        config.timezone()?,
    )?);

    let device = Arc::new(FoxCloudClient::new(
        config.foxess.base_url.clone(),
        config.foxess.api_key.clone(),
        config.foxess.device_sn.clone(),
    )?);

    Orchestrator::new(prices, device, config.orchestrator_config()?)
        .run()
        .await
}
