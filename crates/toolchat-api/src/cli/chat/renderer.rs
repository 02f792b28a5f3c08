//! Terminal rendering of conversations.
//!
//! `TerminalRenderer` observes a live stream: it prints text deltas raw as
//! they arrive, a progress line when a tool starts and a one-line summary
//! when it returns. The same summaries are used when printing stored
//! history.

use std::io::Write;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use toolchat_core::stream::aggregator::StreamAggregator;
use toolchat_core::stream::driver::StreamObserver;
use toolchat_types::chat::MessageRole;
use toolchat_types::message::{Part, RichMessage, ToolCallPart};
use toolchat_types::stream::InferenceEvent;

/// Shown whenever a reply ends in the errored state.
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

/// Prints one assistant reply as it streams.
pub struct TerminalRenderer {
    spinner: Option<ProgressBar>,
    at_line_start: bool,
    printed_label: bool,
}

impl TerminalRenderer {
    /// Start a reply: show a thinking spinner until the first event.
    pub fn start() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
            spinner.set_style(spinner_style);
        }
        spinner.set_message("thinking...");
        spinner.enable_steady_tick(Duration::from_millis(80));

        Self {
            spinner: Some(spinner),
            at_line_start: true,
            printed_label: false,
        }
    }

    /// Clear the spinner and end the current line.
    pub fn finish(&mut self) {
        self.clear_spinner();
        if !self.at_line_start {
            println!();
            self.at_line_start = true;
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn ensure_label(&mut self) {
        if !self.printed_label {
            print!("  {} ", style("Assistant >").cyan().bold());
            self.printed_label = true;
            self.at_line_start = false;
        }
    }

    fn print_line(&mut self, line: &str) {
        if !self.at_line_start {
            println!();
        }
        println!("    {line}");
        self.at_line_start = true;
        self.printed_label = false;
    }
}

impl StreamObserver for TerminalRenderer {
    fn on_event(&mut self, event: &InferenceEvent, _state: &StreamAggregator) {
        match event {
            InferenceEvent::MessageStart { .. } => {}
            InferenceEvent::TextDelta { text } => {
                self.clear_spinner();
                self.ensure_label();
                print!("{text}");
                self.at_line_start = text.ends_with('\n');
                let _ = std::io::stdout().flush();
            }
            InferenceEvent::ToolCallStart {
                tool_name,
                arguments,
                ..
            } => {
                if let Some(spinner) = &self.spinner {
                    spinner.set_message(progress_label(tool_name, arguments));
                } else {
                    let line = style(progress_label(tool_name, arguments)).dim().to_string();
                    self.print_line(&line);
                }
            }
            InferenceEvent::ToolCallResult {
                tool_name, result, ..
            } => {
                self.clear_spinner();
                let line = styled_summary(tool_name, result);
                self.print_line(&line);
            }
            InferenceEvent::Finish | InferenceEvent::Error { .. } => self.finish(),
        }
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        self.clear_spinner();
    }
}

/// Progress text while a tool runs.
pub fn progress_label(tool_name: &str, arguments: &Value) -> String {
    let arg = |key: &str| arguments.get(key).and_then(Value::as_str).unwrap_or("?");
    match tool_name {
        "getWeather" => format!("Fetching weather for {}...", arg("location")),
        "getF1Matches" => "Fetching F1 race data...".to_string(),
        "getStockPrice" => format!("Fetching stock price for {}...", arg("symbol")),
        other => format!("Running {other}..."),
    }
}

/// One-line summary of a tool result.
pub fn summarize_tool_result(tool_name: &str, result: &Value) -> String {
    if result.get("error").and_then(Value::as_bool) == Some(true) {
        return result
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Tool failed.")
            .to_string();
    }

    let text = |v: &Value, key: &str| -> String {
        match v.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "?".to_string(),
            Some(other) => other.to_string(),
        }
    };

    match tool_name {
        "getWeather" => {
            let place = match result.get("country").and_then(Value::as_str) {
                Some(country) => format!("{}, {country}", text(result, "location")),
                None => text(result, "location"),
            };
            format!(
                "{place} \u{00b7} {}\u{00b0}C (feels like {}\u{00b0}C) \u{00b7} {} \u{00b7} humidity {}% \u{00b7} wind {} m/s",
                text(result, "temperature"),
                text(result, "feelsLike"),
                text(result, "description"),
                text(result, "humidity"),
                text(result, "windSpeed"),
            )
        }
        "getF1Matches" => {
            let race = result.get("nextRace").unwrap_or(&Value::Null);
            let heading = if result.get("isUpcoming").and_then(Value::as_bool) == Some(true) {
                "Next race"
            } else {
                "Season finished, last race"
            };
            format!(
                "{heading}: {} (round {}) \u{00b7} {}, {} \u{00b7} {} {}",
                text(race, "name"),
                text(race, "round"),
                text(race, "location"),
                text(race, "country"),
                text(race, "date"),
                text(race, "time"),
            )
        }
        "getStockPrice" => {
            let change = text(result, "change");
            let arrow = if change.starts_with('-') { "\u{25bc}" } else { "\u{25b2}" };
            format!(
                "{} ${} {arrow} {change} ({}) \u{00b7} volume {} \u{00b7} {}",
                text(result, "symbol"),
                text(result, "price"),
                text(result, "changePercent"),
                text(result, "volume"),
                text(result, "latestTradingDay"),
            )
        }
        _ => result.to_string(),
    }
}

fn styled_summary(tool_name: &str, result: &Value) -> String {
    let summary = summarize_tool_result(tool_name, result);
    if result.get("error").and_then(Value::as_bool) == Some(true) {
        format!("{} {}", style("!").red().bold(), style(summary).red())
    } else {
        format!("{} {}", style("*").cyan().bold(), summary)
    }
}

/// Print a stored or finished message with its tool calls.
pub fn print_message(message: &RichMessage) {
    let label = match message.role {
        MessageRole::User => style("You >").green().bold(),
        MessageRole::Assistant => style("Assistant >").cyan().bold(),
    };

    let mut printed_label = false;
    for part in &message.parts {
        match part {
            Part::Text { text } if !text.trim().is_empty() => {
                if printed_label {
                    println!("    {}", text.trim());
                } else {
                    println!("  {label} {}", text.trim());
                    printed_label = true;
                }
            }
            Part::ToolCall(call) => {
                if !printed_label {
                    println!("  {label}");
                    printed_label = true;
                }
                println!("    {}", tool_call_line(call));
            }
            Part::Text { .. } | Part::Reasoning { .. } => {}
        }
    }
    if !printed_label {
        println!("  {label} {}", style("(empty)").dim());
    }
}

fn tool_call_line(call: &ToolCallPart) -> String {
    match &call.result {
        Some(result) if call.is_completed() => styled_summary(&call.tool_name, result),
        _ => style(format!(
            "{} (no result)",
            progress_label(&call.tool_name, &call.arguments).trim_end_matches("...")
        ))
        .dim()
        .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progress_labels() {
        assert_eq!(
            progress_label("getWeather", &json!({"location": "Tokyo"})),
            "Fetching weather for Tokyo..."
        );
        assert_eq!(progress_label("getF1Matches", &json!({})), "Fetching F1 race data...");
        assert_eq!(
            progress_label("getStockPrice", &json!({"symbol": "AAPL"})),
            "Fetching stock price for AAPL..."
        );
        assert_eq!(progress_label("lookup", &json!({})), "Running lookup...");
    }

    #[test]
    fn test_error_result_summarizes_to_message() {
        let result = json!({"error": true, "message": "Weather API key is not configured."});
        assert_eq!(
            summarize_tool_result("getWeather", &result),
            "Weather API key is not configured."
        );
    }

    #[test]
    fn test_weather_summary() {
        let result = json!({
            "error": false, "location": "Tokyo", "country": "JP", "temperature": 22,
            "feelsLike": 21, "description": "light rain", "humidity": 64, "windSpeed": 3.6
        });
        let summary = summarize_tool_result("getWeather", &result);
        assert!(summary.starts_with("Tokyo, JP"));
        assert!(summary.contains("22\u{00b0}C"));
        assert!(summary.contains("light rain"));
        assert!(summary.contains("3.6 m/s"));
    }

    #[test]
    fn test_f1_summary_season_over() {
        let result = json!({
            "error": false, "isUpcoming": false,
            "nextRace": {"name": "Abu Dhabi Grand Prix", "round": "24", "location": "Yas Marina",
                         "country": "UAE", "date": "2026-12-06", "time": "13:00:00Z"}
        });
        let summary = summarize_tool_result("getF1Matches", &result);
        assert!(summary.starts_with("Season finished, last race: Abu Dhabi Grand Prix (round 24)"));
    }

    #[test]
    fn test_stock_summary_direction() {
        let down = json!({"error": false, "symbol": "TSLA", "price": "201.10", "change": "-3.05",
                          "changePercent": "-1.49%", "volume": "1,000", "latestTradingDay": "2026-10-15"});
        assert!(summarize_tool_result("getStockPrice", &down).contains("\u{25bc} -3.05"));
    }

    #[test]
    fn test_unknown_tool_prints_json() {
        let result = json!({"x": 1});
        assert_eq!(summarize_tool_result("other", &result), r#"{"x":1}"#);
    }
}
