//! One evaluation cycle: market context, opinion, fusion, decision,
//! execution.
//!
//! The pipeline is strictly sequential. Indicator and opinion failures are
//! recoverable fallbacks; any failure on the exchange path after the
//! decision starts is caught once at the top and triggers an unconditional
//! emergency flatten of whatever exposure remains.

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::error::{ConfigError, SizingError};
use crate::events::{DecisionEvent, EventSink};
use crate::indicators::build_snapshot;
use crate::models::{
    CycleOutcome, MarketSnapshot, PositionSide, SignalDirection, TechnicalSignal, TradeAction,
};
use crate::services::exchange::{
    ExchangeClient, ExchangeError, MarginMode, OrderRequest, OrderSide, OrderType, Position,
    StopLossSupport, TradeSide,
};
use crate::services::market_data::{CandleSource, MarketDataError};
use crate::services::opinion::OpinionSource;
use crate::signals::{derive_signal, format_market_context, fuse, FusionConfig};
use crate::trading::decision::decide;
use crate::trading::risk::stop_loss_price;
use crate::trading::sizing::{volatility_scale, SizingSpec};

/// Context handed to the analyst when no live market data is available.
const FALLBACK_CONTEXT: &str =
    "Real-time market context unavailable; fall back to general knowledge.";

const PROMPT_TEMPLATE: &str = "\
You are a cryptocurrency market analyst AI.

You are helping a systematic trader that executes {crypto} futures trades once per day.

Use both the structured market context below (which contains live indicators) and your wider knowledge of macro/crypto flows to recommend an outlook for the next 24 hours (Bullish, Bearish, Neutral).

Explain only the highest-signal factors in 2 short paragraphs (~120 words total). Avoid repeating the provided stats verbatim; interpret them.

Market context:
{market_context}

Always return your answer by calling the supplied function with the outlook and your reasoning.";

fn render_prompt(crypto: &str, market_context: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{crypto}", crypto)
        .replace("{market_context}", market_context)
}

#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub run_name: String,
    /// Asset name used in the analyst prompt, e.g. "Bitcoin".
    pub crypto: String,
    pub symbol: String,
    pub interval: String,
    pub candle_limit: usize,
    pub leverage: u32,
    pub margin_mode: MarginMode,
    pub position_size: SizingSpec,
    /// Percent offset from entry; `None` disables stop-loss placement.
    pub stop_loss_percent: Option<f64>,
    pub fusion: FusionConfig,
    pub quote_asset: String,
}

/// Failure that aborts the decision path and hands control to the failsafe.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    Sizing(#[from] SizingError),
}

#[derive(Debug, Error)]
enum MarketViewError {
    #[error(transparent)]
    Fetch(#[from] MarketDataError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub struct TradeCycle {
    config: CycleConfig,
    candles: Arc<dyn CandleSource>,
    opinion: Arc<dyn OpinionSource>,
    exchange: Arc<dyn ExchangeClient>,
    events: Arc<dyn EventSink>,
}

impl TradeCycle {
    pub fn new(
        config: CycleConfig,
        candles: Arc<dyn CandleSource>,
        opinion: Arc<dyn OpinionSource>,
        exchange: Arc<dyn ExchangeClient>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            candles,
            opinion,
            exchange,
            events,
        }
    }

    /// Run one evaluation cycle to completion or to its failsafe branch.
    pub async fn run(&self) -> CycleOutcome {
        let mut fallback_used = false;

        // Market context and guardrail. Recoverable: the cycle continues on
        // a degraded context with no guardrail.
        let mut market_context = FALLBACK_CONTEXT.to_string();
        let mut guardrail: Option<TechnicalSignal> = None;
        let mut position_size = self.config.position_size;
        match self.build_market_view().await {
            Ok((snapshot, signal)) => {
                market_context = format_market_context(&snapshot, &signal);
                position_size = self.scale_position_size(&snapshot);
                info!(
                    signal = %signal.signal,
                    confidence_pct = (signal.confidence * 100.0).round(),
                    "market context ready, guardrail signal derived"
                );
                guardrail = Some(signal);
            }
            Err(e) => {
                fallback_used = true;
                warn!(error = %e, "failed to build market context");
                self.events.emit(DecisionEvent::SnapshotFallback {
                    reason: e.to_string(),
                });
            }
        }
        info!(context = %market_context, "market context snapshot");

        // Primary opinion. Recoverable: defaults to Neutral.
        let prompt = render_prompt(&self.config.crypto, &market_context);
        let (interpretation, outlook) = match self
            .opinion
            .request_outlook(&prompt, &self.config.crypto)
            .await
        {
            Ok(outlook) => {
                info!(interpretation = %outlook.interpretation, "primary outlook received");
                (outlook.interpretation.clone(), Some(outlook))
            }
            Err(e) => {
                fallback_used = true;
                warn!(error = %e, "opinion request failed, defaulting to Neutral");
                self.events.emit(DecisionEvent::OpinionFallback {
                    reason: e.to_string(),
                });
                ("Neutral".to_string(), None)
            }
        };

        let final_signal = fuse(
            &interpretation,
            guardrail.as_ref(),
            &self.config.fusion,
            self.events.as_ref(),
        );
        let primary = SignalDirection::normalize(&interpretation).unwrap_or(SignalDirection::Neutral);
        if final_signal != primary {
            info!(from = %primary, to = %final_signal, "signal adjusted after guardrail check");
            self.events.emit(DecisionEvent::SignalAdjusted {
                from: primary,
                to: final_signal,
            });
        }

        if let Some(outlook) = &outlook {
            if let Err(e) = self.opinion.save_response(outlook, &self.config.run_name).await {
                warn!(error = %e, "failed to persist opinion response");
            }
        }

        // Decision path. Any failure from here on is caught once and routed
        // through the emergency flatten.
        match self.execute_decision(final_signal, position_size).await {
            Ok(()) => {
                if fallback_used {
                    CycleOutcome::CompletedWithFallback
                } else {
                    CycleOutcome::Completed
                }
            }
            Err(e) => {
                warn!(error = %e, "exchange operation failed, stopping execution");
                self.events.emit(DecisionEvent::EmergencyTriggered {
                    error: e.to_string(),
                });
                self.emergency_flatten().await
            }
        }
    }

    async fn build_market_view(
        &self,
    ) -> Result<(MarketSnapshot, TechnicalSignal), MarketViewError> {
        let candles = self
            .candles
            .fetch_candles(
                &self.config.symbol,
                &self.config.interval,
                self.config.candle_limit,
            )
            .await?;
        let snapshot = build_snapshot(&self.config.symbol, &self.config.interval, &candles)?;
        let signal = derive_signal(&snapshot);
        Ok((snapshot, signal))
    }

    fn scale_position_size(&self, snapshot: &MarketSnapshot) -> SizingSpec {
        let scale = volatility_scale(snapshot.atr_pct);
        if scale == 1.0 {
            return self.config.position_size;
        }
        let scaled = self.config.position_size.scaled(scale);
        info!(
            atr_pct = snapshot.atr_pct,
            scale,
            spec = %scaled,
            "position size rescaled by volatility"
        );
        self.events.emit(DecisionEvent::VolatilityScaled {
            atr_pct: snapshot.atr_pct,
            scale,
            spec: scaled.to_string(),
        });
        scaled
    }

    async fn execute_decision(
        &self,
        signal: SignalDirection,
        position_size: SizingSpec,
    ) -> Result<(), CycleError> {
        let position = self
            .exchange
            .get_pending_positions(&self.config.symbol)
            .await?;
        let side = position.as_ref().and_then(|p| self.normalize_side(p));
        info!(side = ?side, "current position");

        let balance = self
            .exchange
            .get_account_balance(&self.config.quote_asset)
            .await?;
        info!(balance, asset = %self.config.quote_asset, "available capital");

        self.exchange
            .set_margin_mode(&self.config.symbol, self.config.margin_mode)
            .await?;
        self.exchange
            .set_leverage(&self.config.symbol, self.config.leverage)
            .await?;

        let action = decide(signal, side);
        self.events
            .emit(DecisionEvent::ActionChosen { action, signal });

        match action {
            TradeAction::OpenLong => {
                info!("bullish signal: opening long position");
                self.open_position(OrderSide::Buy, position_size).await?;
            }
            TradeAction::OpenShort => {
                info!("bearish signal: opening short position");
                self.open_position(OrderSide::Sell, position_size).await?;
            }
            TradeAction::FlipToLong => {
                info!("bullish signal: closing short, opening long");
                if let Some(position) = &position {
                    self.exchange
                        .flash_close_position(&position.position_id)
                        .await?;
                }
                self.open_position(OrderSide::Buy, position_size).await?;
            }
            TradeAction::FlipToShort => {
                info!("bearish signal: closing long, opening short");
                if let Some(position) = &position {
                    self.exchange
                        .flash_close_position(&position.position_id)
                        .await?;
                }
                self.open_position(OrderSide::Sell, position_size).await?;
            }
            TradeAction::Hold => {
                info!("already positioned with the signal, holding");
            }
            TradeAction::Close | TradeAction::EmergencyClose => {
                if let Some(position) = &position {
                    info!(side = ?side, "neutral signal: closing open position");
                    self.exchange
                        .flash_close_position(&position.position_id)
                        .await?;
                }
            }
            TradeAction::NoOp => {
                info!("neutral signal: no position open, doing nothing");
            }
        }
        Ok(())
    }

    fn normalize_side(&self, position: &Position) -> Option<PositionSide> {
        let side = PositionSide::from_label(&position.side);
        if side.is_none() && !position.side.trim().is_empty() {
            self.events.emit(DecisionEvent::UnrecognizedPositionSide {
                raw: position.side.clone(),
            });
        }
        side
    }

    /// Size and submit a market open order, then attach the configured
    /// stop-loss best-effort.
    async fn open_position(
        &self,
        direction: OrderSide,
        position_size: SizingSpec,
    ) -> Result<(), CycleError> {
        let capital = self
            .exchange
            .get_account_balance(&self.config.quote_asset)
            .await?;
        let price = self
            .exchange
            .get_current_price(&self.config.symbol)
            .await?;
        let qty = position_size.quantity(capital, price)?;
        info!(qty, price, "position size computed");

        self.exchange
            .place_order(&OrderRequest {
                symbol: self.config.symbol.clone(),
                qty,
                side: direction,
                trade_side: TradeSide::Open,
                order_type: OrderType::Market,
            })
            .await?;

        self.attach_stop_loss(direction).await;
        Ok(())
    }

    /// Attach the configured stop to the freshly opened position. Failure is
    /// reported, never propagated: the position is already open.
    async fn attach_stop_loss(&self, direction: OrderSide) {
        let Some(sl_percent) = self.config.stop_loss_percent else {
            return;
        };
        if self.exchange.stop_loss_support() == StopLossSupport::Unsupported {
            info!("stop-loss not supported for this exchange");
            self.events.emit(DecisionEvent::StopLossSkipped {
                reason: "exchange does not support position stop-loss".to_string(),
            });
            return;
        }
        match self.try_attach_stop_loss(direction, sl_percent).await {
            Ok(Some(sl_price)) => {
                info!(sl_price, sl_percent, "position stop-loss attached");
            }
            Ok(None) => {
                warn!("could not attach stop-loss: position not found");
                self.events.emit(DecisionEvent::StopLossSkipped {
                    reason: "position not found after open".to_string(),
                });
            }
            Err(e) => {
                warn!(error = %e, "failed to attach position stop-loss");
                self.events.emit(DecisionEvent::StopLossSkipped {
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn try_attach_stop_loss(
        &self,
        direction: OrderSide,
        sl_percent: f64,
    ) -> Result<Option<f64>, ExchangeError> {
        let Some(position) = self
            .exchange
            .get_pending_positions(&self.config.symbol)
            .await?
        else {
            return Ok(None);
        };
        let side = match direction {
            OrderSide::Buy => PositionSide::Long,
            OrderSide::Sell => PositionSide::Short,
        };
        let sl_price = stop_loss_price(position.avg_open_price, side, sl_percent);
        self.exchange
            .place_position_tpsl(&self.config.symbol, &position.position_id, sl_price)
            .await?;
        Ok(Some(sl_price))
    }

    /// Failsafe: re-query the position and flash-close whatever is open.
    /// Runs only after the main decision path has failed.
    async fn emergency_flatten(&self) -> CycleOutcome {
        match self
            .exchange
            .get_pending_positions(&self.config.symbol)
            .await
        {
            Ok(Some(position)) => {
                warn!(position_id = %position.position_id, "emergency flash close triggered");
                match self
                    .exchange
                    .flash_close_position(&position.position_id)
                    .await
                {
                    Ok(()) => {
                        info!("emergency flash close completed");
                        CycleOutcome::FailedFlattened
                    }
                    Err(e) => {
                        error!(error = %e, "failed to flash close position");
                        self.events.emit(DecisionEvent::EmergencyCloseFailed {
                            error: e.to_string(),
                        });
                        CycleOutcome::FailedUnflattened
                    }
                }
            }
            Ok(None) => {
                info!("no open position, nothing to flatten");
                CycleOutcome::FailedFlattened
            }
            Err(e) => {
                error!(error = %e, "could not query position during emergency flatten");
                self.events.emit(DecisionEvent::EmergencyCloseFailed {
                    error: e.to_string(),
                });
                CycleOutcome::FailedUnflattened
            }
        }
    }
}
