//! Paper-trading exchange simulator driven through the live client
//! interface.
//!
//! Holds an in-memory balance and at most one open position, marks orders
//! to the latest traded price from the candle source, and charges a taker
//! fee on every fill. Leverage and margin-mode calls are accepted and
//! recorded but do not change the fill model.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::PositionSide;
use crate::services::market_data::CandleSource;

use super::{
    ExchangeClient, ExchangeError, MarginMode, OrderConfirmation, OrderRequest, Position,
    StopLossSupport, TradeSide,
};

#[derive(Debug, Clone)]
pub struct ForwardTesterConfig {
    pub run_name: String,
    pub initial_capital: f64,
    /// Taker fee charged on every fill (0.0006 = 0.06%).
    pub fee_rate: f64,
}

struct AccountState {
    balance: f64,
    position: Option<Position>,
}

pub struct ForwardTester {
    config: ForwardTesterConfig,
    source: Arc<dyn CandleSource>,
    state: RwLock<AccountState>,
    next_position_id: AtomicU64,
}

/// Interval used to mark orders to the most recent trade.
const MARK_PRICE_INTERVAL: &str = "1m";

impl ForwardTester {
    pub fn new(config: ForwardTesterConfig, source: Arc<dyn CandleSource>) -> Self {
        let balance = config.initial_capital;
        Self {
            config,
            source,
            state: RwLock::new(AccountState {
                balance,
                position: None,
            }),
            next_position_id: AtomicU64::new(1),
        }
    }

    async fn mark_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let candles = self
            .source
            .fetch_candles(symbol, MARK_PRICE_INTERVAL, 1)
            .await
            .map_err(|e| ExchangeError::PriceFeed(e.to_string()))?;
        candles
            .last()
            .map(|c| c.close)
            .ok_or_else(|| ExchangeError::PriceFeed(format!("no recent trades for {symbol}")))
    }

    /// Quote-asset value returned to the balance when a position closes at
    /// `price`: entry value plus realized pnl, minus the closing fee.
    fn close_proceeds(&self, position: &Position, price: f64) -> f64 {
        let entry_value = position.qty * position.avg_open_price;
        let pnl = match PositionSide::from_label(&position.side) {
            Some(PositionSide::Long) => (price - position.avg_open_price) * position.qty,
            Some(PositionSide::Short) => (position.avg_open_price - price) * position.qty,
            None => 0.0,
        };
        let fee = position.qty * price * self.config.fee_rate;
        entry_value + pnl - fee
    }

    fn open(
        &self,
        state: &mut AccountState,
        order: &OrderRequest,
        price: f64,
    ) -> Result<OrderConfirmation, ExchangeError> {
        if state.position.is_some() {
            return Err(ExchangeError::Rejected {
                code: -1,
                message: "a position is already open".to_string(),
            });
        }
        let cost = order.qty * price;
        let fee = cost * self.config.fee_rate;
        if cost + fee > state.balance {
            return Err(ExchangeError::Rejected {
                code: -2,
                message: format!(
                    "insufficient balance: need {:.2}, have {:.2}",
                    cost + fee,
                    state.balance
                ),
            });
        }
        state.balance -= cost + fee;
        let position_id = format!(
            "ft-{}",
            self.next_position_id.fetch_add(1, Ordering::Relaxed)
        );
        state.position = Some(Position {
            position_id: position_id.clone(),
            symbol: order.symbol.clone(),
            side: order.side.as_str().to_string(),
            avg_open_price: price,
            qty: order.qty,
        });
        debug!(
            run = %self.config.run_name,
            side = order.side.as_str(),
            qty = order.qty,
            price,
            "forward tester filled open order"
        );
        Ok(OrderConfirmation {
            order_id: position_id,
        })
    }

    fn close(
        &self,
        state: &mut AccountState,
        price: f64,
    ) -> Result<OrderConfirmation, ExchangeError> {
        let Some(position) = state.position.take() else {
            return Err(ExchangeError::Rejected {
                code: -3,
                message: "no open position to close".to_string(),
            });
        };
        state.balance += self.close_proceeds(&position, price);
        debug!(
            run = %self.config.run_name,
            position_id = %position.position_id,
            price,
            balance = state.balance,
            "forward tester closed position"
        );
        Ok(OrderConfirmation {
            order_id: position.position_id,
        })
    }
}

#[async_trait]
impl ExchangeClient for ForwardTester {
    fn stop_loss_support(&self) -> StopLossSupport {
        StopLossSupport::Unsupported
    }

    async fn get_account_balance(&self, _asset: &str) -> Result<f64, ExchangeError> {
        Ok(self.state.read().await.balance)
    }

    async fn get_current_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        self.mark_price(symbol).await
    }

    async fn get_pending_positions(&self, symbol: &str) -> Result<Option<Position>, ExchangeError> {
        let state = self.state.read().await;
        Ok(state
            .position
            .as_ref()
            .filter(|p| p.symbol == symbol)
            .cloned())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderConfirmation, ExchangeError> {
        let price = self.mark_price(&order.symbol).await?;
        let mut state = self.state.write().await;
        match order.trade_side {
            TradeSide::Open => self.open(&mut state, order, price),
            TradeSide::Close => self.close(&mut state, price),
        }
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError> {
        debug!(symbol, leverage, "forward tester accepted leverage");
        Ok(())
    }

    async fn set_margin_mode(&self, symbol: &str, mode: MarginMode) -> Result<(), ExchangeError> {
        debug!(symbol, mode = mode.as_str(), "forward tester accepted margin mode");
        Ok(())
    }

    async fn flash_close_position(&self, position_id: &str) -> Result<(), ExchangeError> {
        let symbol = {
            let state = self.state.read().await;
            match &state.position {
                Some(position) if position.position_id == position_id => position.symbol.clone(),
                Some(position) => {
                    return Err(ExchangeError::Rejected {
                        code: -4,
                        message: format!(
                            "unknown position id {position_id}, open position is {}",
                            position.position_id
                        ),
                    })
                }
                None => {
                    return Err(ExchangeError::Rejected {
                        code: -3,
                        message: "no open position to close".to_string(),
                    })
                }
            }
        };
        let price = self.mark_price(&symbol).await?;
        let mut state = self.state.write().await;
        self.close(&mut state, price).map(|_| ())
    }

    async fn place_position_tpsl(
        &self,
        _symbol: &str,
        _position_id: &str,
        _sl_price: f64,
    ) -> Result<(), ExchangeError> {
        Err(ExchangeError::Rejected {
            code: -5,
            message: "stop-loss orders are not supported in forward testing".to_string(),
        })
    }
}

impl std::fmt::Debug for ForwardTester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardTester")
            .field("run_name", &self.config.run_name)
            .field("fee_rate", &self.config.fee_rate)
            .finish()
    }
}
