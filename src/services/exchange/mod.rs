//! Exchange/account client boundary.
//!
//! The decision engine talks to one `ExchangeClient`, live or simulated.
//! Stop-loss support is an explicit construction-time capability rather
//! than a runtime probe.

pub mod bitunix;
pub mod forward_tester;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bitunix::BitunixFutures;
pub use forward_tester::{ForwardTester, ForwardTesterConfig};

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("exchange request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("exchange rejected request: {code} {message}")]
    Rejected { code: i64, message: String },
    #[error("malformed exchange response: {0}")]
    Malformed(String),
    #[error("price feed unavailable: {0}")]
    PriceFeed(String),
}

/// An open position as reported by the exchange.
///
/// `side` keeps the venue's raw label; `PositionSide::from_label` maps it
/// onto the internal side domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub position_id: String,
    pub symbol: String,
    pub side: String,
    pub avg_open_price: f64,
    pub qty: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

/// Whether an order opens new exposure or reduces existing exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Open,
    Close,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Open => "OPEN",
            TradeSide::Close => "CLOSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarginMode {
    Isolation,
    Cross,
}

impl MarginMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarginMode::Isolation => "ISOLATION",
            MarginMode::Cross => "CROSS",
        }
    }
}

impl std::str::FromStr for MarginMode {
    type Err = crate::error::ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ISOLATION" | "ISOLATED" => Ok(MarginMode::Isolation),
            "CROSS" => Ok(MarginMode::Cross),
            _ => Err(crate::error::ConfigError::BadValue {
                name: "margin mode",
                value: raw.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: f64,
    pub side: OrderSide,
    pub trade_side: TradeSide,
    pub order_type: OrderType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: String,
}

/// Whether the client can attach a position-level stop-loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopLossSupport {
    Supported,
    Unsupported,
}

#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Construction-time capability; fixed for the lifetime of the client.
    fn stop_loss_support(&self) -> StopLossSupport;

    async fn get_account_balance(&self, asset: &str) -> Result<f64, ExchangeError>;

    async fn get_current_price(&self, symbol: &str) -> Result<f64, ExchangeError>;

    /// The open position for the symbol, if any. Queried fresh each cycle.
    async fn get_pending_positions(&self, symbol: &str) -> Result<Option<Position>, ExchangeError>;

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderConfirmation, ExchangeError>;

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError>;

    async fn set_margin_mode(&self, symbol: &str, mode: MarginMode) -> Result<(), ExchangeError>;

    /// Immediately close the position at market.
    async fn flash_close_position(&self, position_id: &str) -> Result<(), ExchangeError>;

    /// Attach a position-level stop. Clients reporting
    /// `StopLossSupport::Unsupported` reject the call.
    async fn place_position_tpsl(
        &self,
        symbol: &str,
        position_id: &str,
        sl_price: f64,
    ) -> Result<(), ExchangeError>;
}
