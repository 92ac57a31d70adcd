//! One-shot evaluation cycle runner.
//!
//! Loads configuration from the environment, wires the collaborators (live
//! exchange or forward tester), runs exactly one cycle, and exits with the
//! cycle outcome.

use dotenvy::dotenv;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use perpguard::config::{ExchangeMode, RunConfig};
use perpguard::events::TracingSink;
use perpguard::logging;
use perpguard::models::CycleOutcome;
use perpguard::services::exchange::{BitunixFutures, ExchangeClient, ForwardTester};
use perpguard::services::market_data::{BinanceCandleSource, CandleSource};
use perpguard::services::opinion::{OpinionClient, OpinionSource};
use perpguard::trading::TradeCycle;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.run_name);
    info!(run = %config.run_name, "=== Run Started ===");

    let candles: Arc<dyn CandleSource> = Arc::new(BinanceCandleSource::new());
    let opinion: Arc<dyn OpinionSource> = Arc::new(OpinionClient::new(config.llm_api_key.clone()));
    let exchange: Arc<dyn ExchangeClient> = match &config.exchange {
        ExchangeMode::ForwardTesting(ft_config) => {
            info!("forward testing mode enabled");
            Arc::new(ForwardTester::new(ft_config.clone(), candles.clone()))
        }
        ExchangeMode::Live {
            api_key,
            api_secret,
        } => {
            info!("live trading mode enabled");
            Arc::new(BitunixFutures::new(api_key.clone(), api_secret.clone()))
        }
    };

    let cycle = TradeCycle::new(
        config.cycle_config(),
        candles,
        opinion,
        exchange,
        Arc::new(TracingSink),
    );

    match cycle.run().await {
        outcome @ (CycleOutcome::Completed | CycleOutcome::CompletedWithFallback) => {
            info!(outcome = ?outcome, "=== Run Completed ===");
            ExitCode::SUCCESS
        }
        outcome => {
            error!(outcome = ?outcome, "=== Run Failed ===");
            ExitCode::FAILURE
        }
    }
}
