use crate::http::build_short_client;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    ClearSky,
    Cloudy,
    Foggy,
    Rainy,
    Snowy,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    /// Maps a WMO weather code to a coarse condition label.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::ClearSky,
            1..=3 => Self::Cloudy,
            45 | 48 => Self::Foggy,
            51 | 53 | 55 | 61 | 63 | 65 | 80 | 81 | 82 => Self::Rainy,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snowy,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ClearSky => "Clear sky",
            Self::Cloudy => "Cloudy",
            Self::Foggy => "Foggy",
            Self::Rainy => "Rainy",
            Self::Snowy => "Snowy",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSnapshot {
    pub condition: WeatherCondition,
    pub temperature: f64,
}

impl fmt::Display for WeatherSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {:.1}°C", self.condition, self.temperature)
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: Option<f64>,
    weather_code: Option<u32>,
}

/// Best-effort current-weather lookup. Any network error, timeout, or
/// missing field degrades to `None`; weather context is never load-bearing.
pub async fn fetch(lat: f64, lon: f64) -> Option<WeatherSnapshot> {
    let client = build_short_client();
    let response = match client
        .get(FORECAST_URL)
        .query(&[
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current", "temperature_2m,weather_code".to_string()),
            ("timezone", "auto".to_string()),
        ])
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            debug!(target = "stylist.weather", error = %err, "weather_fetch_failed");
            return None;
        }
    };

    if !response.status().is_success() {
        debug!(
            target = "stylist.weather",
            status = %response.status(),
            "weather_fetch_failed"
        );
        return None;
    }

    let payload: ForecastResponse = match response.json().await {
        Ok(payload) => payload,
        Err(err) => {
            debug!(target = "stylist.weather", error = %err, "weather_decode_failed");
            return None;
        }
    };

    let current = payload.current?;
    Some(WeatherSnapshot {
        condition: WeatherCondition::from_code(current.weather_code?),
        temperature: current.temperature_2m?,
    })
}
