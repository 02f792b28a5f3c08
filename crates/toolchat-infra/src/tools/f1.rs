//! `getF1Matches`: next race of the current Formula 1 season (Jolpica/Ergast).

use chrono::{DateTime, Datelike, Utc};
use serde_json::{Value, json};
use toolchat_core::tool::catalog::Tool;
use toolchat_types::error::ToolError;
use toolchat_types::tool::{ToolDefinition, ToolOutput};

pub const F1_TOOL_NAME: &str = "getF1Matches";

pub struct F1ScheduleTool {
    client: reqwest::Client,
    base_url: String,
    definition: ToolDefinition,
}

impl F1ScheduleTool {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            definition: ToolDefinition {
                name: F1_TOOL_NAME.to_string(),
                description: "Get information about the next upcoming Formula 1 race or the \
                              current F1 season schedule. Use this when a user asks about F1 \
                              races, Grand Prix, or Formula 1."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {},
                    "additionalProperties": false
                }),
            },
        }
    }
}

impl Tool for F1ScheduleTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolOutput, ToolError> {
        let now = Utc::now();
        let season = now.year();

        let response = match self
            .client
            .get(format!("{}/{season}.json", self.base_url))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "F1 schedule request failed");
                return Ok(connect_failure());
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "F1 schedule lookup rejected");
            return Ok(ToolOutput::failure("Could not fetch F1 race data."));
        }

        match response.json::<Value>().await {
            Ok(body) => Ok(schedule_output(&body, season, now)),
            Err(e) => {
                tracing::warn!(error = %e, "F1 schedule response was not JSON");
                Ok(connect_failure())
            }
        }
    }
}

fn connect_failure() -> ToolOutput {
    ToolOutput::failure("Failed to connect to F1 data service.")
}

/// Start of a race; a missing time means midnight UTC.
///
/// `None` for dates that do not parse, which never count as upcoming.
fn race_start(race: &Value) -> Option<DateTime<Utc>> {
    let date = race.get("date")?.as_str()?;
    let time = race
        .get("time")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or("00:00:00Z");
    DateTime::parse_from_rfc3339(&format!("{date}T{time}"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Pick the next race after `now`, or the season's last race once all
/// have run.
fn schedule_output(body: &Value, season: i32, now: DateTime<Utc>) -> ToolOutput {
    let races = match body.pointer("/MRData/RaceTable/Races").and_then(Value::as_array) {
        Some(races) if !races.is_empty() => races,
        _ => return ToolOutput::failure("No F1 races found for the current season."),
    };

    let upcoming: Vec<&Value> = races
        .iter()
        .filter(|race| race_start(race).is_some_and(|start| start > now))
        .collect();
    let is_upcoming = !upcoming.is_empty();
    let next = match upcoming.first() {
        Some(race) => *race,
        None => &races[races.len() - 1],
    };

    let time = next
        .get("time")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or("TBD");

    ToolOutput::Success(json!({
        "error": false,
        "season": season,
        "totalRaces": races.len(),
        "isUpcoming": is_upcoming,
        "nextRace": {
            "name": next.get("raceName"),
            "circuit": next.pointer("/Circuit/circuitName"),
            "location": next.pointer("/Circuit/Location/locality"),
            "country": next.pointer("/Circuit/Location/country"),
            "date": next.get("date"),
            "time": time,
            "round": next.get("round"),
        },
        "upcomingCount": upcoming.len(),
    }))
}
