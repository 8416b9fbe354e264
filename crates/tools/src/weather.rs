//! Weather tool. Returns a fixed reading for any city, with no network access.

use async_trait::async_trait;
use termagent_core::error::ToolError;
use termagent_core::tool::{Tool, ToolId};

/// Fixed temperature reported for every city.
const TEMPERATURE_C: i32 = 30;

pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn id(&self) -> ToolId {
        ToolId::GetWeatherInfo
    }

    fn description(&self) -> &str {
        "getWeatherInfo(cityName: string): string. Takes a city name and returns its current weather."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        Ok(weather_sentence(input.trim()))
    }
}

fn weather_sentence(city: &str) -> String {
    format!("{city} has {TEMPERATURE_C}°C temperature.")
}
