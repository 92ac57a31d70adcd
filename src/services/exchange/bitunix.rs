//! Bitunix perpetual futures REST client.
//!
//! Covers the account and trade endpoints the decision engine needs. Every
//! response arrives in a `{code, msg, data}` envelope with string-encoded
//! decimals; a nonzero code is a rejection.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    ExchangeClient, ExchangeError, MarginMode, OrderConfirmation, OrderRequest, Position,
    StopLossSupport,
};

pub const BITUNIX_BASE_URL: &str = "https://fapi.bitunix.com";

pub struct BitunixFutures {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountData {
    available: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerData {
    symbol: String,
    last_price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionData {
    position_id: String,
    symbol: String,
    side: String,
    avg_open_price: String,
    qty: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderData {
    order_id: String,
}

impl BitunixFutures {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self::with_client(BITUNIX_BASE_URL, api_key, api_secret, reqwest::Client::new())
    }

    /// Build against a custom endpoint, used by tests to point at a mock
    /// server.
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("api-key", &self.api_key)
            .header("api-secret", &self.api_secret)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        unwrap_envelope(response.json().await?)
    }

    async fn post_data<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, ExchangeError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("api-key", &self.api_key)
            .header("api-secret", &self.api_secret)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        unwrap_envelope(response.json().await?)
    }

    /// POST where only the envelope code matters.
    async fn post_ack(&self, path: &str, body: &Value) -> Result<(), ExchangeError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("api-key", &self.api_key)
            .header("api-secret", &self.api_secret)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        let envelope: ApiEnvelope<Value> = response.json().await?;
        if envelope.code != 0 {
            return Err(ExchangeError::Rejected {
                code: envelope.code,
                message: envelope.msg,
            });
        }
        Ok(())
    }
}

fn unwrap_envelope<T>(envelope: ApiEnvelope<T>) -> Result<T, ExchangeError> {
    if envelope.code != 0 {
        return Err(ExchangeError::Rejected {
            code: envelope.code,
            message: envelope.msg,
        });
    }
    envelope
        .data
        .ok_or_else(|| ExchangeError::Malformed("envelope carries no data".to_string()))
}

fn parse_decimal(value: &str, field: &'static str) -> Result<f64, ExchangeError> {
    value
        .trim()
        .parse()
        .map_err(|_| ExchangeError::Malformed(format!("non-numeric {field}: '{value}'")))
}

impl TryFrom<PositionData> for Position {
    type Error = ExchangeError;

    fn try_from(data: PositionData) -> Result<Self, Self::Error> {
        Ok(Position {
            avg_open_price: parse_decimal(&data.avg_open_price, "avgOpenPrice")?,
            qty: parse_decimal(&data.qty, "qty")?,
            position_id: data.position_id,
            symbol: data.symbol,
            side: data.side,
        })
    }
}

#[async_trait]
impl ExchangeClient for BitunixFutures {
    fn stop_loss_support(&self) -> StopLossSupport {
        StopLossSupport::Supported
    }

    async fn get_account_balance(&self, asset: &str) -> Result<f64, ExchangeError> {
        let account: AccountData = self
            .get_data("/api/v1/futures/account", &[("marginCoin", asset)])
            .await?;
        parse_decimal(&account.available, "available")
    }

    async fn get_current_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let tickers: Vec<TickerData> = self
            .get_data("/api/v1/futures/market/tickers", &[("symbols", symbol)])
            .await?;
        let ticker = tickers
            .into_iter()
            .find(|t| t.symbol == symbol)
            .ok_or_else(|| ExchangeError::Malformed(format!("no ticker for {symbol}")))?;
        parse_decimal(&ticker.last_price, "lastPrice")
    }

    async fn get_pending_positions(&self, symbol: &str) -> Result<Option<Position>, ExchangeError> {
        let positions: Vec<PositionData> = self
            .get_data(
                "/api/v1/futures/position/get_pending_positions",
                &[("symbol", symbol)],
            )
            .await?;
        positions.into_iter().next().map(Position::try_from).transpose()
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderConfirmation, ExchangeError> {
        let data: OrderData = self
            .post_data(
                "/api/v1/futures/trade/place_order",
                &json!({
                    "symbol": order.symbol,
                    "qty": order.qty.to_string(),
                    "side": order.side.as_str(),
                    "tradeSide": order.trade_side.as_str(),
                    "orderType": order.order_type.as_str(),
                }),
            )
            .await?;
        Ok(OrderConfirmation {
            order_id: data.order_id,
        })
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError> {
        self.post_ack(
            "/api/v1/futures/account/set_leverage",
            &json!({ "symbol": symbol, "leverage": leverage }),
        )
        .await
    }

    async fn set_margin_mode(&self, symbol: &str, mode: MarginMode) -> Result<(), ExchangeError> {
        self.post_ack(
            "/api/v1/futures/account/change_margin_mode",
            &json!({ "symbol": symbol, "marginMode": mode.as_str() }),
        )
        .await
    }

    async fn flash_close_position(&self, position_id: &str) -> Result<(), ExchangeError> {
        self.post_ack(
            "/api/v1/futures/trade/flash_close_position",
            &json!({ "positionId": position_id }),
        )
        .await
    }

    async fn place_position_tpsl(
        &self,
        symbol: &str,
        position_id: &str,
        sl_price: f64,
    ) -> Result<(), ExchangeError> {
        self.post_ack(
            "/api/v1/futures/tpsl/place_order",
            &json!({
                "symbol": symbol,
                "positionId": position_id,
                "slPrice": sl_price.to_string(),
            }),
        )
        .await
    }
}
