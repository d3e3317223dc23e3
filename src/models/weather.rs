//! Weather reading model and receipt formatting

use serde::{Deserialize, Serialize};

/// The four scalars the page cares about, plus the derived delta.
///
/// Either every field is a finite number or there is no reading at all;
/// construct through [`WeatherReading::new`]. Deserializing goes through
/// it too, so a supplied `temp_delta` is ignored and recomputed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(try_from = "ReadingFields")]
pub struct WeatherReading {
    /// Temperature now in Celsius
    pub temp_now: f64,
    /// Temperature yesterday at the same hour in Celsius
    pub temp_yesterday: f64,
    /// `temp_now - temp_yesterday`
    pub temp_delta: f64,
    /// Wind speed now in m/s
    pub wind_now: f64,
    /// Precipitation probability now, 0-100
    pub rain_prob_now: f64,
}

#[derive(Deserialize)]
struct ReadingFields {
    temp_now: f64,
    temp_yesterday: f64,
    wind_now: f64,
    rain_prob_now: f64,
}

impl TryFrom<ReadingFields> for WeatherReading {
    type Error = &'static str;

    fn try_from(fields: ReadingFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.temp_now,
            fields.temp_yesterday,
            fields.wind_now,
            fields.rain_prob_now,
        )
        .ok_or("weather values must be finite numbers")
    }
}

impl WeatherReading {
    /// Build a reading, returning `None` if any input is not finite
    #[must_use]
    pub fn new(temp_now: f64, temp_yesterday: f64, wind_now: f64, rain_prob_now: f64) -> Option<Self> {
        let all_finite = [temp_now, temp_yesterday, wind_now, rain_prob_now]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return None;
        }
        Some(Self {
            temp_now,
            temp_yesterday,
            temp_delta: temp_now - temp_yesterday,
            wind_now,
            rain_prob_now,
        })
    }

    #[must_use]
    pub fn format_temp_now(&self) -> String {
        format!("{:.1} degC", self.temp_now)
    }

    #[must_use]
    pub fn format_temp_yesterday(&self) -> String {
        format!("{:.1} degC", self.temp_yesterday)
    }

    /// Signed delta, `+` when zero or warmer
    #[must_use]
    pub fn format_temp_delta(&self) -> String {
        let sign = if self.temp_delta >= 0.0 { "+" } else { "" };
        format!("{sign}{:.1} degC", self.temp_delta)
    }

    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} m/s", self.wind_now)
    }

    #[must_use]
    pub fn format_rain(&self) -> String {
        format!("{} %", self.rain_prob_now.round())
    }

    /// One-line summary shown under the receipt
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Now {:.1} degC, rain {}%, wind {:.1} m/s.",
            self.temp_now,
            self.rain_prob_now.round(),
            self.wind_now
        )
    }
}

/// Receipt lines ready for display, with placeholders when there is no reading
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub temp_now: String,
    pub temp_yesterday: String,
    pub temp_delta: String,
    pub wind_now: String,
    pub rain_now: String,
    pub summary: String,
}

impl Receipt {
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            temp_now: "-- degC".to_string(),
            temp_yesterday: "-- degC".to_string(),
            temp_delta: "-- degC".to_string(),
            wind_now: "-- m/s".to_string(),
            rain_now: "-- %".to_string(),
            summary: "Weather unavailable right now.".to_string(),
        }
    }
}

impl From<Option<&WeatherReading>> for Receipt {
    fn from(reading: Option<&WeatherReading>) -> Self {
        match reading {
            Some(r) => Self {
                temp_now: r.format_temp_now(),
                temp_yesterday: r.format_temp_yesterday(),
                temp_delta: r.format_temp_delta(),
                wind_now: r.format_wind(),
                rain_now: r.format_rain(),
                summary: r.summary(),
            },
            None => Self::placeholder(),
        }
    }
}
