//! Daily prayer timings: calculation parameters and the remote timings source.

pub mod client;
pub mod params;

pub use client::{DailyTimings, TimingsClient, TimingsError, DEFAULT_BASE_URL};
pub use params::{catalogue, CalculationParams, InvalidParam, ParamCatalogue};

use serde::Serialize;

/// The five daily prayers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    pub fn icon(self) -> &'static str {
        match self {
            Self::Fajr => "\u{1F304}",
            Self::Dhuhr => "\u{1F324}\u{FE0F}",
            Self::Asr => "\u{26C5}\u{FE0F}",
            Self::Maghrib => "\u{1F305}",
            Self::Isha => "\u{1F319}",
        }
    }
}

impl std::fmt::Display for Prayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prayer::Fajr => write!(f, "Fajr"),
            Prayer::Dhuhr => write!(f, "Dhuhr"),
            Prayer::Asr => write!(f, "Asr"),
            Prayer::Maghrib => write!(f, "Maghrib"),
            Prayer::Isha => write!(f, "Isha"),
        }
    }
}
