//! `getWeather`: current conditions from OpenWeatherMap.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use toolchat_core::tool::catalog::Tool;
use toolchat_types::error::ToolError;
use toolchat_types::tool::{ToolDefinition, ToolOutput};

use super::parse_args;

pub const WEATHER_TOOL_NAME: &str = "getWeather";

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    location: String,
}

pub struct WeatherTool {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    definition: ToolDefinition,
}

impl WeatherTool {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            definition: ToolDefinition {
                name: WEATHER_TOOL_NAME.to_string(),
                description: "Get the current weather for a given location. Use this when a user \
                              asks about weather conditions, temperature, humidity, etc."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "description": "The city name to get weather for, e.g. 'London', 'New York', 'Tokyo'"
                        }
                    },
                    "required": ["location"],
                    "additionalProperties": false
                }),
            },
        }
    }
}

impl Tool for WeatherTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let WeatherArgs { location } = parse_args(WEATHER_TOOL_NAME, arguments)?;

        let Some(api_key) = &self.api_key else {
            return Ok(ToolOutput::failure("Weather API key is not configured."));
        };

        let response = match self
            .client
            .get(format!("{}/weather", self.base_url))
            .query(&[
                ("q", location.as_str()),
                ("appid", api_key.expose_secret()),
                ("units", "metric"),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Weather request failed");
                return Ok(connect_failure());
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), %location, "Weather lookup rejected");
            return Ok(ToolOutput::failure(format!(
                "Could not fetch weather data for \"{location}\". Please check the location name."
            )));
        }

        match response.json::<Value>().await {
            Ok(body) => Ok(weather_output(&body).unwrap_or_else(connect_failure)),
            Err(e) => {
                tracing::warn!(error = %e, "Weather response was not JSON");
                Ok(connect_failure())
            }
        }
    }
}

fn connect_failure() -> ToolOutput {
    ToolOutput::failure("Failed to connect to weather service.")
}

/// Map an OpenWeatherMap `/weather` body to the tool result.
///
/// `None` when the body lacks the `main` block.
fn weather_output(body: &Value) -> Option<ToolOutput> {
    let main = body.get("main")?;
    let rounded = |key: &str| main.get(key).and_then(Value::as_f64).map(round_half_up);
    let condition = body.get("weather").and_then(|w| w.get(0));

    Some(ToolOutput::Success(json!({
        "error": false,
        "location": body.get("name"),
        "country": body.pointer("/sys/country"),
        "temperature": rounded("temp"),
        "feelsLike": rounded("feels_like"),
        "tempMin": rounded("temp_min"),
        "tempMax": rounded("temp_max"),
        "humidity": main.get("humidity"),
        "description": condition.and_then(|c| c.get("description")),
        "icon": condition.and_then(|c| c.get("icon")),
        "windSpeed": body.pointer("/wind/speed"),
        "pressure": main.get("pressure"),
    })))
}

/// Halves round toward positive infinity (-2.5 becomes -2).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
