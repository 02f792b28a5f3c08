//! `getStockPrice`: latest quote from Alpha Vantage's GLOBAL_QUOTE endpoint.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use toolchat_core::tool::catalog::Tool;
use toolchat_types::error::ToolError;
use toolchat_types::tool::{ToolDefinition, ToolOutput};

use super::parse_args;

pub const STOCK_TOOL_NAME: &str = "getStockPrice";

#[derive(Debug, Deserialize)]
struct StockArgs {
    symbol: String,
}

pub struct StockPriceTool {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    definition: ToolDefinition,
}

impl StockPriceTool {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            definition: ToolDefinition {
                name: STOCK_TOOL_NAME.to_string(),
                description: "Get the current stock price for a given stock symbol/ticker. Use \
                              this when a user asks about stock prices, market data, or share \
                              prices."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "symbol": {
                            "type": "string",
                            "description": "The stock ticker symbol, e.g. 'AAPL', 'GOOGL', 'MSFT', 'TSLA'"
                        }
                    },
                    "required": ["symbol"],
                    "additionalProperties": false
                }),
            },
        }
    }
}

impl Tool for StockPriceTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let StockArgs { symbol } = parse_args(STOCK_TOOL_NAME, arguments)?;

        let Some(api_key) = &self.api_key else {
            return Ok(ToolOutput::failure("Stock API key is not configured."));
        };

        let ticker = symbol.to_uppercase();
        let response = match self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", ticker.as_str()),
                ("apikey", api_key.expose_secret()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Stock quote request failed");
                return Ok(connect_failure());
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), %symbol, "Stock quote rejected");
            return Ok(ToolOutput::failure(format!(
                "Could not fetch stock data for \"{symbol}\"."
            )));
        }

        match response.json::<Value>().await {
            Ok(body) => Ok(quote_output(&body, &symbol)),
            Err(e) => {
                tracing::warn!(error = %e, "Stock quote response was not JSON");
                Ok(connect_failure())
            }
        }
    }
}

fn connect_failure() -> ToolOutput {
    ToolOutput::failure("Failed to connect to stock data service.")
}

/// Map a GLOBAL_QUOTE body to the tool result.
///
/// Alpha Vantage answers unknown symbols (and exhausted quotas) with an
/// empty or absent `"Global Quote"` object rather than an HTTP error.
fn quote_output(body: &Value, symbol: &str) -> ToolOutput {
    let quote = match body.get("Global Quote").and_then(Value::as_object) {
        Some(quote) if !quote.is_empty() => quote,
        _ => {
            return ToolOutput::failure(format!(
                "No stock data found for symbol \"{symbol}\". Please check the ticker symbol."
            ));
        }
    };

    let field = |key: &str| quote.get(key).and_then(Value::as_str).unwrap_or_default();
    let fixed2 = |key: &str| format!("{:.2}", parse_decimal(field(key)));

    let volume = field("06. volume")
        .trim()
        .parse::<i64>()
        .map(group_thousands)
        .unwrap_or_else(|_| "NaN".to_string());

    ToolOutput::Success(json!({
        "error": false,
        "symbol": quote.get("01. symbol"),
        "price": fixed2("05. price"),
        "change": fixed2("09. change"),
        "changePercent": quote.get("10. change percent"),
        "previousClose": fixed2("08. previous close"),
        "open": fixed2("02. open"),
        "high": fixed2("03. high"),
        "low": fixed2("04. low"),
        "volume": volume,
        "latestTradingDay": quote.get("07. latest trading day"),
    }))
}

/// Unparseable prices format as `NaN`, the same as the upstream client did.
fn parse_decimal(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

/// `1234567` -> `"1,234,567"`.
fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
