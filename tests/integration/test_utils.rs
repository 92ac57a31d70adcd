//! Shared fixtures for the mock Binance and chat-completions servers.

use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const BAR_MILLIS: i64 = 15 * 60 * 1000;

/// One kline row in Binance's positional array encoding.
pub fn kline_row(index: i64, close: f64) -> Value {
    let open_time = index * BAR_MILLIS;
    json!([
        open_time,
        format!("{close}"),
        format!("{}", close + 0.5),
        format!("{}", close - 0.5),
        format!("{close}"),
        "1000",
        open_time + BAR_MILLIS - 1,
        "100000",
        100,
        "500",
        "50000",
        "0"
    ])
}

pub fn klines_from_closes(closes: &[f64]) -> Value {
    Value::Array(
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| kline_row(i as i64, close))
            .collect(),
    )
}

/// Mount a kline response for every GET against the server.
pub async fn mock_klines(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// A chat-completions response whose forced tool call carries the outlook.
pub fn chat_tool_response(outlook: &str, reasoning: &str) -> Value {
    let arguments =
        serde_json::to_string(&json!({ "outlook": outlook, "reasoning": reasoning })).unwrap();
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "finish_reason": "tool_calls",
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "record_outlook",
                        "arguments": arguments
                    }
                }]
            }
        }]
    })
}
