use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Instant;

use crate::gazetteer::CityRecord;
use crate::night::{self, NightPhases, PhaseEntry};
use crate::prayer::{self, CalculationParams, DailyTimings, ParamCatalogue, Prayer};
use crate::settings::{Settings, SettingsStore};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn lock_settings(state: &AppState) -> MutexGuard<'_, SettingsStore> {
    state.settings.lock().unwrap_or_else(PoisonError::into_inner)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

// ─── GET /api/countries ──────────────────────────────────────────

pub async fn countries(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.index.countries().map(str::to_string).collect())
}

// ─── GET /api/cities ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CitiesQuery {
    pub country: Option<String>,
    pub q: Option<String>,
}

pub async fn cities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CitiesQuery>,
) -> Result<Json<Vec<CityRecord>>, ApiError> {
    let start = Instant::now();

    let country = params.country.as_deref().unwrap_or("").trim();
    if country.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'country' parameter"));
    }
    let needle = params.q.as_deref().unwrap_or("");

    let hits: Vec<CityRecord> = state
        .index
        .filter(country, needle)
        .into_iter()
        .cloned()
        .collect();

    tracing::info!(
        country,
        q = needle,
        hits = hits.len(),
        elapsed_ms = elapsed_ms(start),
        "GET /api/cities"
    );

    Ok(Json(hits))
}

// ─── GET /api/night ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NightQuery {
    pub maghrib: Option<String>,
    pub fajr: Option<String>,
}

#[derive(Serialize)]
pub struct NightResponse {
    pub phases: NightPhases,
    pub entries: Vec<PhaseEntry>,
}

impl From<NightPhases> for NightResponse {
    fn from(phases: NightPhases) -> Self {
        Self { entries: phases.entries(), phases }
    }
}

pub async fn night(Query(params): Query<NightQuery>) -> Json<NightResponse> {
    let phases = night::compute(params.maghrib.as_deref(), params.fajr.as_deref());
    tracing::info!(
        maghrib = params.maghrib.as_deref().unwrap_or(""),
        fajr = params.fajr.as_deref().unwrap_or(""),
        complete = phases.is_complete(),
        "GET /api/night"
    );
    Json(phases.into())
}

// ─── GET /api/times ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesQuery {
    pub country: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub date: Option<String>,
    pub method: Option<u8>,
    pub school: Option<u8>,
    pub latitude_adjustment_method: Option<u8>,
}

#[derive(Serialize)]
pub struct LocationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// `[longitude, latitude]`
    pub coords: [f64; 2],
}

#[derive(Serialize)]
pub struct PrayerPill {
    pub prayer: Prayer,
    pub icon: &'static str,
    pub time: String,
}

#[derive(Serialize)]
pub struct TimesResponse {
    pub location: LocationInfo,
    pub params: CalculationParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_label: Option<&'static str>,
    pub timings: DailyTimings,
    pub prayers: Vec<PrayerPill>,
    pub night: NightResponse,
}

fn resolve_location(
    state: &AppState,
    params: &TimesQuery,
    saved: &Settings,
) -> Result<LocationInfo, ApiError> {
    if let (Some(country), Some(city)) = (&params.country, &params.city) {
        let record = state.index.find(country.trim(), city.trim()).ok_or_else(|| {
            api_error(StatusCode::NOT_FOUND, format!("Unknown city '{}' in '{}'", city, country))
        })?;
        return Ok(LocationInfo {
            country: Some(country.trim().to_string()),
            city: Some(record.name().to_string()),
            coords: [record.longitude(), record.latitude()],
        });
    }

    if let (Some(lat), Some(lon)) = (params.lat, params.lon) {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Invalid coordinates. Lat: -90..90, Lon: -180..180",
            ));
        }
        return Ok(LocationInfo { country: None, city: None, coords: [lon, lat] });
    }

    match &saved.location {
        Some(loc) => Ok(LocationInfo {
            country: Some(loc.country.clone()),
            city: Some(loc.city.name().to_string()),
            coords: [loc.city.longitude(), loc.city.latitude()],
        }),
        None => Err(api_error(
            StatusCode::BAD_REQUEST,
            "Provide 'country'+'city' or 'lat'+'lon', or save a location first",
        )),
    }
}

pub async fn prayer_times(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimesQuery>,
) -> Result<Json<TimesResponse>, ApiError> {
    let start = Instant::now();

    let saved = lock_settings(&state).get().clone();
    let location = resolve_location(&state, &params, &saved)?;

    let calc = CalculationParams {
        method: params.method.unwrap_or(saved.params.method),
        school: params.school.unwrap_or(saved.params.school),
        latitude_adjustment_method: params
            .latitude_adjustment_method
            .unwrap_or(saved.params.latitude_adjustment_method),
    };
    calc.validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let date = match &params.date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|e| {
            api_error(StatusCode::BAD_REQUEST, format!("Invalid date '{}': {}", d, e))
        })?,
        None => Utc::now().date_naive(),
    };

    let client = state.client.clone();
    let coords = (location.coords[0], location.coords[1]);
    let lookup = move || client.fetch_night(date, coords, &calc);
    let (today, tomorrow) = tokio::task::spawn_blocking(lookup)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::warn!(error = %e, "timings lookup failed");
            api_error(StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    let phases = today.night_phases(Some(&tomorrow));
    let prayers = today
        .pills()
        .into_iter()
        .map(|(prayer, time)| PrayerPill { prayer, icon: prayer.icon(), time: time.to_string() })
        .collect();

    tracing::info!(
        city = location.city.as_deref().unwrap_or("-"),
        %date,
        elapsed_ms = elapsed_ms(start),
        "GET /api/times"
    );

    Ok(Json(TimesResponse {
        location,
        params: calc,
        method_label: calc.method_label(),
        timings: today,
        prayers,
        night: phases.into(),
    }))
}

// ─── GET /api/methods ────────────────────────────────────────────

pub async fn methods() -> Json<ParamCatalogue> {
    Json(prayer::catalogue())
}

// ─── /api/settings ───────────────────────────────────────────────

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(lock_settings(&state).get().clone())
}

pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
    settings
        .params
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut store = lock_settings(&state);
    store
        .set(settings)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    tracing::info!(path = %store.path().display(), "PUT /api/settings");
    Ok(Json(store.get().clone()))
}
