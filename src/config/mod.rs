//! Run configuration loaded from the environment.
//!
//! One process runs one evaluation cycle; everything that varies between
//! runs comes in through environment variables (a `.env` file is honored by
//! the binary before this module reads anything).

use std::env;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::services::exchange::{ForwardTesterConfig, MarginMode};
use crate::signals::FusionConfig;
use crate::trading::cycle::CycleConfig;
use crate::trading::sizing::SizingSpec;

/// Deployment environment, used to pick the log format.
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

/// Which exchange implementation the cycle trades against.
#[derive(Debug, Clone)]
pub enum ExchangeMode {
    Live {
        api_key: String,
        api_secret: String,
    },
    ForwardTesting(ForwardTesterConfig),
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub run_name: String,
    pub crypto: String,
    pub symbol: String,
    pub interval: String,
    pub candle_limit: usize,
    pub leverage: u32,
    pub margin_mode: MarginMode,
    pub position_size: SizingSpec,
    /// `None` disables stop-loss placement. Defaults to 10% from entry;
    /// set STOP_LOSS_PERCENT to "none" to disable.
    pub stop_loss_percent: Option<f64>,
    pub fusion: FusionConfig,
    pub quote_asset: String,
    pub llm_api_key: String,
    pub exchange: ExchangeMode,
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_name = env_or("RUN_NAME", "run_btc_daily");
        let forward_testing = matches!(
            env_or("FORWARD_TESTING", "0").trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        );

        let exchange = if forward_testing {
            ExchangeMode::ForwardTesting(ForwardTesterConfig {
                run_name: run_name.clone(),
                initial_capital: parse_env("INITIAL_CAPITAL", 10_000.0)?,
                fee_rate: parse_env("TAKER_FEE_RATE", 0.0006)?,
            })
        } else {
            // Live trading requires both exchange credentials.
            ExchangeMode::Live {
                api_key: require_env("EXCHANGE_API_KEY")?,
                api_secret: require_env("EXCHANGE_API_SECRET")?,
            }
        };

        Ok(Self {
            run_name,
            crypto: env_or("CRYPTO", "Bitcoin"),
            symbol: env_or("SYMBOL", "BTCUSDT"),
            interval: env_or("MARKET_DATA_INTERVAL", "15m"),
            candle_limit: parse_env("CANDLE_LIMIT", 200)?,
            leverage: parse_env("LEVERAGE", 1)?,
            margin_mode: MarginMode::from_str(&env_or("MARGIN_MODE", "ISOLATION"))?,
            position_size: SizingSpec::from_str(&env_or("POSITION_SIZE", "20"))?,
            stop_loss_percent: stop_loss_from_env()?,
            fusion: FusionConfig {
                neutral_tiebreak_confidence: parse_env("NEUTRAL_TIEBREAK_CONFIDENCE", 0.55)?,
                conflict_confidence: parse_env("CONFLICT_CONFIDENCE", 0.75)?,
            },
            quote_asset: env_or("QUOTE_ASSET", "USDT"),
            llm_api_key: require_env("LLM_API_KEY")?,
            exchange,
        })
    }

    pub fn cycle_config(&self) -> CycleConfig {
        CycleConfig {
            run_name: self.run_name.clone(),
            crypto: self.crypto.clone(),
            symbol: self.symbol.clone(),
            interval: self.interval.clone(),
            candle_limit: self.candle_limit,
            leverage: self.leverage,
            margin_mode: self.margin_mode,
            position_size: self.position_size,
            stop_loss_percent: self.stop_loss_percent,
            fusion: self.fusion,
            quote_asset: self.quote_asset.clone(),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnv(name))
}

fn parse_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::BadValue { name, value }),
    }
}

fn stop_loss_from_env() -> Result<Option<f64>, ConfigError> {
    let raw = env_or("STOP_LOSS_PERCENT", "10");
    let cleaned = raw.trim().to_ascii_lowercase();
    if matches!(cleaned.as_str(), "none" | "off" | "") {
        return Ok(None);
    }
    let value: f64 = cleaned.parse().map_err(|_| ConfigError::BadValue {
        name: "STOP_LOSS_PERCENT",
        value: raw.clone(),
    })?;
    if value < 0.0 {
        return Err(ConfigError::BadValue {
            name: "STOP_LOSS_PERCENT",
            value: raw,
        });
    }
    Ok(Some(value))
}
