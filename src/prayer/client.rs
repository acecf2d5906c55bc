//! Blocking client for the AlAdhan daily timings endpoint.
//!
//! One request per call. No retries and no caching: callers own both.

use super::params::CalculationParams;
use super::Prayer;
use crate::night::{self, NightPhases};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.aladhan.com";

/// Prayer-times lookup errors.
#[derive(Debug)]
pub enum TimingsError {
    Network(String),
    InvalidResponse(String),
    /// The API answered with a non-200 `code`.
    Upstream { code: u16, status: String },
}

impl fmt::Display for TimingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid timings response: {}", msg),
            Self::Upstream { code, status } => write!(f, "Timings API error {}: {}", code, status),
        }
    }
}

impl std::error::Error for TimingsError {}

#[derive(Deserialize)]
struct ApiEnvelope {
    code: u16,
    #[serde(default)]
    status: String,
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct ApiData {
    timings: ApiTimings,
    #[serde(default)]
    meta: Option<ApiMeta>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiTimings {
    fajr: String,
    sunrise: String,
    dhuhr: String,
    asr: String,
    maghrib: String,
    isha: String,
}

#[derive(Deserialize)]
struct ApiMeta {
    #[serde(default)]
    timezone: Option<String>,
}

/// One day's timings, as `HH:MM` strings in the location's local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTimings {
    pub date: NaiveDate,
    pub fajr: String,
    pub sunrise: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl DailyTimings {
    pub fn time_of(&self, prayer: Prayer) -> &str {
        match prayer {
            Prayer::Fajr => &self.fajr,
            Prayer::Dhuhr => &self.dhuhr,
            Prayer::Asr => &self.asr,
            Prayer::Maghrib => &self.maghrib,
            Prayer::Isha => &self.isha,
        }
    }

    /// The five daily prayers with their times, in order.
    pub fn pills(&self) -> Vec<(Prayer, &str)> {
        Prayer::ALL.iter().map(|&p| (p, self.time_of(p))).collect()
    }

    /// Night from this day's Maghrib to `next`'s Fajr.
    /// Without `next`, this day's Fajr stands in for tomorrow's.
    pub fn night_phases(&self, next: Option<&DailyTimings>) -> NightPhases {
        let fajr = next.unwrap_or(self).fajr.as_str();
        night::compute(Some(&self.maghrib), Some(fajr))
    }
}

/// Decode a response body for `date`.
pub fn parse_response(date: NaiveDate, body: &str) -> Result<DailyTimings, TimingsError> {
    let envelope: ApiEnvelope = serde_json::from_str(body)
        .map_err(|e| TimingsError::InvalidResponse(e.to_string()))?;

    if envelope.code != 200 {
        let status = match envelope.data {
            serde_json::Value::String(msg) => format!("{} ({})", envelope.status, msg),
            _ => envelope.status,
        };
        return Err(TimingsError::Upstream { code: envelope.code, status });
    }

    let data: ApiData = serde_json::from_value(envelope.data)
        .map_err(|e| TimingsError::InvalidResponse(e.to_string()))?;
    let t = data.timings;

    Ok(DailyTimings {
        date,
        fajr: t.fajr,
        sunrise: t.sunrise,
        dhuhr: t.dhuhr,
        asr: t.asr,
        maghrib: t.maghrib,
        isha: t.isha,
        timezone: data.meta.and_then(|m| m.timezone),
    })
}

/// The timings client.
#[derive(Debug, Clone)]
pub struct TimingsClient {
    base_url: String,
    timeout: Duration,
}

impl Default for TimingsClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl TimingsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{base}/v1/timings/{dd-mm-yyyy}`.
    pub fn endpoint(&self, date: NaiveDate) -> String {
        format!("{}/v1/timings/{}", self.base_url, date.format("%d-%m-%Y"))
    }

    /// Fetch one day's timings for `(longitude, latitude)`.
    pub fn fetch(
        &self,
        date: NaiveDate,
        coords: (f64, f64),
        params: &CalculationParams,
    ) -> Result<DailyTimings, TimingsError> {
        let (lng, lat) = coords;
        let mut request = ureq::get(&self.endpoint(date))
            .set("User-Agent", "nightwatch/0.3")
            .timeout(self.timeout)
            .query("longitude", &lng.to_string())
            .query("latitude", &lat.to_string());
        for (key, value) in params.query_pairs() {
            request = request.query(key, &value);
        }

        let body = match request.call() {
            Ok(response) => response
                .into_string()
                .map_err(|e| TimingsError::InvalidResponse(e.to_string()))?,
            // Error bodies still carry the API's own code/status envelope.
            Err(ureq::Error::Status(code, response)) => match response.into_string() {
                Ok(body) => body,
                Err(_) => {
                    return Err(TimingsError::Upstream { code, status: "no body".into() })
                }
            },
            Err(e) => return Err(TimingsError::Network(e.to_string())),
        };

        parse_response(date, &body)
    }

    /// Fetch `date` plus the following day, for Maghrib → next Fajr.
    pub fn fetch_night(
        &self,
        date: NaiveDate,
        coords: (f64, f64),
        params: &CalculationParams,
    ) -> Result<(DailyTimings, DailyTimings), TimingsError> {
        let today = self.fetch(date, coords, params)?;
        let next_date = date
            .succ_opt()
            .ok_or_else(|| TimingsError::InvalidResponse(format!("no day after {}", date)))?;
        let tomorrow = self.fetch(next_date, coords, params)?;
        Ok((today, tomorrow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"{
        "code": 200,
        "status": "OK",
        "data": {
            "timings": {
                "Fajr": "05:00", "Sunrise": "06:31", "Dhuhr": "12:10",
                "Asr": "15:20", "Sunset": "17:58", "Maghrib": "18:00",
                "Isha": "19:25", "Imsak": "04:50", "Midnight": "23:30"
            },
            "date": { "readable": "14 Feb 2026" },
            "meta": { "latitude": 21.4225, "timezone": "Asia/Riyadh" }
        }
    }"#;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()
    }

    #[test]
    fn test_parse_ok() {
        let t = parse_response(date(), OK_BODY).unwrap();
        assert_eq!(t.fajr, "05:00");
        assert_eq!(t.maghrib, "18:00");
        assert_eq!(t.timezone.as_deref(), Some("Asia/Riyadh"));
    }

    #[test]
    fn test_parse_upstream_error() {
        let body = r#"{
            "code": 400,
            "status": "BAD_REQUEST",
            "data": "Please specify a valid latitude."
        }"#;
        match parse_response(date(), body) {
            Err(TimingsError::Upstream { code, status }) => {
                assert_eq!(code, 400);
                assert!(status.contains("valid latitude"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_response(date(), "<html>"),
            Err(TimingsError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_response(date(), r#"{"code":200,"status":"OK","data":{}}"#),
            Err(TimingsError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_night_from_timings() {
        let today = parse_response(date(), OK_BODY).unwrap();
        let night = today.night_phases(None);
        assert_eq!(night.duration_minutes, Some(660));

        let mut tomorrow = today.clone();
        tomorrow.fajr = "05:06".into();
        let night = today.night_phases(Some(&tomorrow));
        assert_eq!(night.duration_minutes, Some(666));
        assert_eq!(night.midnight.unwrap().format("%H:%M").to_string(), "23:33");
    }

    #[test]
    fn test_pills_order() {
        let t = parse_response(date(), OK_BODY).unwrap();
        let pills = t.pills();
        assert_eq!(pills.len(), 5);
        assert_eq!(pills[0], (Prayer::Fajr, "05:00"));
        assert_eq!(pills[4], (Prayer::Isha, "19:25"));
    }

    #[test]
    fn test_endpoint_format() {
        let client = TimingsClient::new("https://api.example.org/");
        assert_eq!(client.endpoint(date()), "https://api.example.org/v1/timings/14-02-2026");
    }
}
