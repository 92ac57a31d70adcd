//! One full evaluation cycle against mock collaborators and the forward
//! tester

use std::sync::Arc;

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::test_utils::{chat_tool_response, klines_from_closes, mock_klines};
use perpguard::events::{DecisionEvent, RecordingSink};
use perpguard::models::{CycleOutcome, TradeAction};
use perpguard::services::exchange::{
    ExchangeClient, ForwardTester, ForwardTesterConfig, MarginMode,
};
use perpguard::services::market_data::BinanceCandleSource;
use perpguard::services::opinion::OpinionClient;
use perpguard::signals::FusionConfig;
use perpguard::trading::cycle::{CycleConfig, TradeCycle};
use perpguard::trading::SizingSpec;

fn config() -> CycleConfig {
    CycleConfig {
        run_name: "itest_cycle".to_string(),
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

async fn mock_opinion(server: &MockServer, outlook: &str) {
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_tool_response(outlook, "itest")),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn bullish_run_opens_a_long_on_the_forward_tester() {
    let binance = MockServer::start().await;
    let llm = MockServer::start().await;

    // A steady uptrend: the guardrail agrees with the Bullish opinion
    let closes: Vec<f64> = (0..200).map(|i| 100.0 + i as f64 * 0.5).collect();
    mock_klines(&binance, klines_from_closes(&closes)).await;
    mock_opinion(&llm, "Bullish").await;

    let candles = Arc::new(BinanceCandleSource::with_client(
        binance.uri(),
        reqwest::Client::new(),
    ));
    let responses_dir =
        std::env::temp_dir().join(format!("perpguard-cycle-{}", std::process::id()));
    let opinion = Arc::new(
        OpinionClient::with_client(llm.uri(), "test-key", reqwest::Client::new())
            .with_responses_dir(&responses_dir),
    );
    let exchange = Arc::new(ForwardTester::new(
        ForwardTesterConfig {
            run_name: "itest_cycle".to_string(),
            initial_capital: 10_000.0,
            fee_rate: 0.0006,
        },
        candles.clone(),
    ));
    let sink = Arc::new(RecordingSink::new());

    let outcome = TradeCycle::new(
        config(),
        candles,
        opinion,
        exchange.clone(),
        sink.clone(),
    )
    .run()
    .await;

    assert_eq!(outcome, CycleOutcome::Completed);

    let position = exchange
        .get_pending_positions("BTCUSDT")
        .await
        .unwrap()
        .expect("a long position should be open");
    assert_eq!(position.side, "BUY");
    // The quiet-market ATR boosts the 10% spec to 11%: 1_100 of capital at
    // the latest close of 199.5
    assert!((position.qty - 1_100.0 / 199.5).abs() < 1e-9);

    // 10_000 - 1_100 notional - 0.66 fee
    let balance = exchange.get_account_balance("USDT").await.unwrap();
    assert!((balance - 8_899.34).abs() < 1e-6, "got {balance}");

    let events = sink.events();
    assert!(events.iter().any(|e| matches!(
        e,
        DecisionEvent::ActionChosen {
            action: TradeAction::OpenLong,
            ..
        }
    )));
    // The forward tester cannot attach stops; the skip is reported, not fatal
    assert!(events
        .iter()
        .any(|e| matches!(e, DecisionEvent::StopLossSkipped { .. })));

    tokio::fs::remove_dir_all(&responses_dir).await.ok();
}

#[tokio::test]
async fn neutral_run_on_a_flat_book_is_a_noop() {
    let binance = MockServer::start().await;
    let llm = MockServer::start().await;

    // A barely-settled series: the latest close sits just above the slow
    // average while the fast average sits just below it, so the two trend
    // terms nearly cancel and the score stays inside the neutral band
    let mut closes = vec![100.06; 200];
    for close in closes.iter_mut().take(199).skip(180) {
        *close = 100.0;
    }
    closes[199] = 100.05;
    mock_klines(&binance, klines_from_closes(&closes)).await;
    mock_opinion(&llm, "Neutral").await;

    let candles = Arc::new(BinanceCandleSource::with_client(
        binance.uri(),
        reqwest::Client::new(),
    ));
    let responses_dir =
        std::env::temp_dir().join(format!("perpguard-noop-{}", std::process::id()));
    let opinion = Arc::new(
        OpinionClient::with_client(llm.uri(), "test-key", reqwest::Client::new())
            .with_responses_dir(&responses_dir),
    );
    let exchange = Arc::new(ForwardTester::new(
        ForwardTesterConfig {
            run_name: "itest_noop".to_string(),
            initial_capital: 10_000.0,
            fee_rate: 0.0006,
        },
        candles.clone(),
    ));
    let sink = Arc::new(RecordingSink::new());

    let outcome = TradeCycle::new(
        config(),
        candles,
        opinion,
        exchange.clone(),
        sink.clone(),
    )
    .run()
    .await;

    assert_eq!(outcome, CycleOutcome::Completed);
    assert!(exchange
        .get_pending_positions("BTCUSDT")
        .await
        .unwrap()
        .is_none());
    let balance = exchange.get_account_balance("USDT").await.unwrap();
    assert_eq!(balance, 10_000.0);

    tokio::fs::remove_dir_all(&responses_dir).await.ok();
}
