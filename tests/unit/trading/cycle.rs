//! Unit tests for the evaluation cycle and its emergency failsafe

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::test_utils::{candles_from_closes, uptrend_closes};
use perpguard::events::{DecisionEvent, RecordingSink};
use perpguard::models::{Candle, CycleOutcome};
use perpguard::services::exchange::{
    ExchangeClient, ExchangeError, MarginMode, OrderConfirmation, OrderRequest, Position,
    StopLossSupport,
};
use perpguard::services::market_data::{CandleSource, MarketDataError};
use perpguard::services::opinion::{Outlook, OpinionError, OpinionSource};
use perpguard::signals::FusionConfig;
use perpguard::trading::cycle::{CycleConfig, TradeCycle};
use perpguard::trading::SizingSpec;

struct StubCandles {
    closes: Option<Vec<f64>>,
}

impl StubCandles {
    fn with_closes(closes: Vec<f64>) -> Self {
        Self {
            closes: Some(closes),
        }
    }

    fn failing() -> Self {
        Self { closes: None }
    }
}

#[async_trait]
impl CandleSource for StubCandles {
    async fn fetch_candles(
        &self,
        symbol: &str,
        _interval: &str,
        _limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        match &self.closes {
            Some(closes) => Ok(candles_from_closes(closes)),
            None => Err(MarketDataError::Empty(symbol.to_string())),
        }
    }
}

struct StubOpinion {
    interpretation: Option<String>,
}

impl StubOpinion {
    fn saying(interpretation: &str) -> Self {
        Self {
            interpretation: Some(interpretation.to_string()),
        }
    }

    fn failing() -> Self {
        Self {
            interpretation: None,
        }
    }
}

#[async_trait]
impl OpinionSource for StubOpinion {
    async fn request_outlook(&self, _prompt: &str, _topic: &str) -> Result<Outlook, OpinionError> {
        match &self.interpretation {
            Some(interpretation) => Ok(Outlook {
                interpretation: interpretation.clone(),
                reasoning: "test outlook".to_string(),
                raw: serde_json::Value::Null,
            }),
            None => Err(OpinionError::Malformed("stubbed failure".to_string())),
        }
    }

    async fn save_response(&self, _outlook: &Outlook, _run_name: &str) -> Result<(), OpinionError> {
        Ok(())
    }
}

#[derive(Default)]
struct StubExchange {
    position: Mutex<Option<Position>>,
    fail_place_order: bool,
    fail_set_leverage: bool,
    fail_flash_close: bool,
    place_order_calls: AtomicUsize,
    flash_close_calls: AtomicUsize,
    tpsl_calls: AtomicUsize,
}

fn open_position(side: &str) -> Position {
    Position {
        position_id: "p-1".to_string(),
        symbol: "BTCUSDT".to_string(),
        side: side.to_string(),
        avg_open_price: 100.0,
        qty: 1.0,
    }
}

impl StubExchange {
    fn flat() -> Self {
        Self::default()
    }

    fn holding(side: &str) -> Self {
        Self {
            position: Mutex::new(Some(open_position(side))),
            ..Self::default()
        }
    }
}

fn reject(message: &str) -> ExchangeError {
    ExchangeError::Rejected {
        code: -1,
        message: message.to_string(),
    }
}

#[async_trait]
impl ExchangeClient for StubExchange {
    fn stop_loss_support(&self) -> StopLossSupport {
        StopLossSupport::Supported
    }

    async fn get_account_balance(&self, _asset: &str) -> Result<f64, ExchangeError> {
        Ok(10_000.0)
    }

    async fn get_current_price(&self, _symbol: &str) -> Result<f64, ExchangeError> {
        Ok(100.0)
    }

    async fn get_pending_positions(&self, _symbol: &str) -> Result<Option<Position>, ExchangeError> {
        Ok(self.position.lock().unwrap().clone())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderConfirmation, ExchangeError> {
        self.place_order_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_place_order {
            return Err(reject("order rejected"));
        }
        *self.position.lock().unwrap() = Some(Position {
            position_id: "p-2".to_string(),
            symbol: order.symbol.clone(),
            side: order.side.as_str().to_string(),
            avg_open_price: 100.0,
            qty: order.qty,
        });
        Ok(OrderConfirmation {
            order_id: "o-1".to_string(),
        })
    }

    async fn set_leverage(&self, _symbol: &str, _leverage: u32) -> Result<(), ExchangeError> {
        if self.fail_set_leverage {
            return Err(reject("leverage rejected"));
        }
        Ok(())
    }

    async fn set_margin_mode(&self, _symbol: &str, _mode: MarginMode) -> Result<(), ExchangeError> {
        Ok(())
    }

    async fn flash_close_position(&self, _position_id: &str) -> Result<(), ExchangeError> {
        self.flash_close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_flash_close {
            return Err(reject("close rejected"));
        }
        *self.position.lock().unwrap() = None;
        Ok(())
    }

    async fn place_position_tpsl(
        &self,
        _symbol: &str,
        _position_id: &str,
        _sl_price: f64,
    ) -> Result<(), ExchangeError> {
        self.tpsl_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn config() -> CycleConfig {
    CycleConfig {
        run_name: "test_run".to_string(),
        crypto: "Bitcoin".to_string(),
        symbol: "BTCUSDT".to_string(),
        interval: "15m".to_string(),
        candle_limit: 200,
        leverage: 1,
        margin_mode: MarginMode::Isolation,
        position_size: SizingSpec::PercentOfCapital(10.0),
        stop_loss_percent: Some(10.0),
        fusion: FusionConfig::default(),
        quote_asset: "USDT".to_string(),
    }
}

fn cycle(
    candles: StubCandles,
    opinion: StubOpinion,
    exchange: Arc<StubExchange>,
    sink: Arc<RecordingSink>,
) -> TradeCycle {
    TradeCycle::new(
        config(),
        Arc::new(candles),
        Arc::new(opinion),
        exchange,
        sink,
    )
}

#[tokio::test]
async fn bullish_agreement_opens_a_long_with_stop_loss() {
    let exchange = Arc::new(StubExchange::flat());
    let sink = Arc::new(RecordingSink::new());
    let outcome = cycle(
        StubCandles::with_closes(uptrend_closes(200, 100.0, 0.5)),
        StubOpinion::saying("Bullish"),
        exchange.clone(),
        sink.clone(),
    )
    .run()
    .await;

    assert_eq!(outcome, CycleOutcome::Completed);
    assert_eq!(exchange.place_order_calls.load(Ordering::SeqCst), 1);
    assert_eq!(exchange.flash_close_calls.load(Ordering::SeqCst), 0);
    assert_eq!(exchange.tpsl_calls.load(Ordering::SeqCst), 1);
    let position = exchange.position.lock().unwrap().clone().unwrap();
    assert_eq!(position.side, "BUY");
}

#[tokio::test]
async fn opinion_failure_degrades_to_a_neutral_noop() {
    // No guardrail, no opinion: the fused signal is Neutral and the flat
    // book stays untouched
    let exchange = Arc::new(StubExchange::flat());
    let sink = Arc::new(RecordingSink::new());
    let outcome = cycle(
        StubCandles::failing(),
        StubOpinion::failing(),
        exchange.clone(),
        sink.clone(),
    )
    .run()
    .await;

    assert_eq!(outcome, CycleOutcome::CompletedWithFallback);
    assert_eq!(exchange.place_order_calls.load(Ordering::SeqCst), 0);
    let events = sink.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, DecisionEvent::SnapshotFallback { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, DecisionEvent::OpinionFallback { .. })));
}

#[tokio::test]
async fn neutral_signal_closes_an_open_position() {
    let exchange = Arc::new(StubExchange::holding("BUY"));
    let sink = Arc::new(RecordingSink::new());
    let outcome = cycle(
        StubCandles::failing(),
        StubOpinion::saying("Neutral"),
        exchange.clone(),
        sink.clone(),
    )
    .run()
    .await;

    assert_eq!(outcome, CycleOutcome::CompletedWithFallback);
    assert_eq!(exchange.flash_close_calls.load(Ordering::SeqCst), 1);
    assert!(exchange.position.lock().unwrap().is_none());
}

#[tokio::test]
async fn failure_with_open_position_triggers_exactly_one_flash_close() {
    let exchange = Arc::new(StubExchange {
        fail_set_leverage: true,
        ..StubExchange::holding("BUY")
    });
    let sink = Arc::new(RecordingSink::new());
    let outcome = cycle(
        StubCandles::failing(),
        StubOpinion::saying("Bullish"),
        exchange.clone(),
        sink.clone(),
    )
    .run()
    .await;

    assert_eq!(outcome, CycleOutcome::FailedFlattened);
    assert_eq!(exchange.flash_close_calls.load(Ordering::SeqCst), 1);
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, DecisionEvent::EmergencyTriggered { .. })));
}

#[tokio::test]
async fn failure_with_no_position_issues_no_flash_close() {
    let exchange = Arc::new(StubExchange {
        fail_place_order: true,
        ..StubExchange::flat()
    });
    let sink = Arc::new(RecordingSink::new());
    let outcome = cycle(
        StubCandles::failing(),
        StubOpinion::saying("Bullish"),
        exchange.clone(),
        sink.clone(),
    )
    .run()
    .await;

    assert_eq!(outcome, CycleOutcome::FailedFlattened);
    assert_eq!(exchange.flash_close_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn half_completed_flip_ends_flat_and_flattened() {
    // The flip's close succeeds, the re-open fails: the failsafe re-queries,
    // finds nothing open, and ends the cycle flat without another close
    let exchange = Arc::new(StubExchange {
        fail_place_order: true,
        ..StubExchange::holding("SELL")
    });
    let sink = Arc::new(RecordingSink::new());
    let outcome = cycle(
        StubCandles::failing(),
        StubOpinion::saying("Bullish"),
        exchange.clone(),
        sink.clone(),
    )
    .run()
    .await;

    assert_eq!(outcome, CycleOutcome::FailedFlattened);
    assert_eq!(exchange.flash_close_calls.load(Ordering::SeqCst), 1);
    assert!(exchange.position.lock().unwrap().is_none());
}

#[tokio::test]
async fn emergency_close_failure_is_terminal() {
    let exchange = Arc::new(StubExchange {
        fail_set_leverage: true,
        fail_flash_close: true,
        ..StubExchange::holding("BUY")
    });
    let sink = Arc::new(RecordingSink::new());
    let outcome = cycle(
        StubCandles::failing(),
        StubOpinion::saying("Bearish"),
        exchange.clone(),
        sink.clone(),
    )
    .run()
    .await;

    assert_eq!(outcome, CycleOutcome::FailedUnflattened);
    assert_eq!(exchange.flash_close_calls.load(Ordering::SeqCst), 1);
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, DecisionEvent::EmergencyCloseFailed { .. })));
}

#[tokio::test]
async fn guardrail_conflict_suppresses_a_confident_llm_bet() {
    // A strong downtrend produces a high-confidence Bearish guardrail; the
    // Bullish opinion is flattened to Neutral and the flat book stays flat
    let closes: Vec<f64> = (0..200).map(|i| 200.0 - i as f64 * 0.5).collect();
    let exchange = Arc::new(StubExchange::flat());
    let sink = Arc::new(RecordingSink::new());
    let outcome = cycle(
        StubCandles::with_closes(closes),
        StubOpinion::saying("Bullish"),
        exchange.clone(),
        sink.clone(),
    )
    .run()
    .await;

    assert_eq!(outcome, CycleOutcome::Completed);
    assert_eq!(exchange.place_order_calls.load(Ordering::SeqCst), 0);
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, DecisionEvent::SignalAdjusted { .. })));
}
