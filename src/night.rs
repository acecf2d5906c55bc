//! Night thirds: the equal three-way split of the night between Maghrib and Fajr.
//!
//! The night is the forward interval from sunset to the *next* dawn, so it
//! normally wraps past 00:00. Each interior instant is rounded to the minute
//! on its own; the three points are therefore not always exactly evenly spaced.

use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::{Serialize, Serializer};

/// Clock format for both input and output.
pub const TIME_FMT: &str = "%H:%M";

/// Shown in place of a time that could not be computed.
pub const PLACEHOLDER: &str = "\u{2014}";

const MINUTES_PER_DAY: u32 = 24 * 60;

/// The five instants of the night, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NightPhase {
    Sunset,
    FirstThird,
    Midnight,
    LastThirdStart,
    Dawn,
}

impl NightPhase {
    pub const ALL: [NightPhase; 5] = [
        NightPhase::Sunset,
        NightPhase::FirstThird,
        NightPhase::Midnight,
        NightPhase::LastThirdStart,
        NightPhase::Dawn,
    ];

    /// Dashboard label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sunset => "Maghrib (Night starts)",
            Self::FirstThird => "1/3 of the night",
            Self::Midnight => "Midnight (Nisf al-layl)",
            Self::LastThirdStart => "Last 1/3 begins (2/3)",
            Self::Dawn => "Fajr (next day)",
        }
    }

    fn marker(self) -> char {
        match self {
            Self::Sunset => 'S',
            Self::FirstThird => '1',
            Self::Midnight => 'M',
            Self::LastThirdStart => '2',
            Self::Dawn => 'F',
        }
    }

    /// Minutes after sunset for a night of `duration` minutes.
    fn offset(self, duration: u32) -> u32 {
        let d = f64::from(duration);
        match self {
            Self::Sunset => 0,
            Self::FirstThird => (d / 3.0).round() as u32,
            Self::Midnight => (d / 2.0).round() as u32,
            Self::LastThirdStart => (2.0 * d / 3.0).round() as u32,
            Self::Dawn => duration,
        }
    }
}

impl std::fmt::Display for NightPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The computed night. Either every field is set or none is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NightPhases {
    #[serde(serialize_with = "serialize_hhmm")]
    pub sunset: Option<NaiveTime>,
    #[serde(serialize_with = "serialize_hhmm")]
    pub first_third: Option<NaiveTime>,
    #[serde(serialize_with = "serialize_hhmm")]
    pub midnight: Option<NaiveTime>,
    #[serde(serialize_with = "serialize_hhmm")]
    pub last_third_start: Option<NaiveTime>,
    #[serde(serialize_with = "serialize_hhmm")]
    pub dawn: Option<NaiveTime>,
    /// Length of the night in minutes, 1..=1440.
    pub duration_minutes: Option<u32>,
}

/// One labeled row for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseEntry {
    pub phase: NightPhase,
    pub label: &'static str,
    /// `HH:MM`, or [`PLACEHOLDER`].
    pub time: String,
    /// True when the instant falls after 00:00 following the sunset.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub next_day: bool,
}

/// Parse an `HH:MM` clock time. Missing or malformed input gives `None`.
pub fn parse_hhmm(time: Option<&str>) -> Option<NaiveTime> {
    let time = time?.trim();
    if time.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(time, TIME_FMT).ok()
}

/// Format as `HH:MM`, or the placeholder.
pub fn format_hhmm(time: Option<NaiveTime>) -> String {
    match time {
        Some(t) => t.format(TIME_FMT).to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

fn serialize_hhmm<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
    match time {
        Some(t) => s.collect_str(&t.format(TIME_FMT)),
        None => s.serialize_none(),
    }
}

fn minutes_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Forward length of the night from `sunset` to the next `dawn`, both as minutes
/// since midnight. Equal clock times mean a full day.
pub fn night_duration_minutes(sunset: u32, dawn: u32) -> u32 {
    if dawn > sunset {
        dawn - sunset
    } else {
        (MINUTES_PER_DAY - sunset) + dawn
    }
}

/// Compute the night from two `HH:MM` strings.
pub fn compute(sunset: Option<&str>, dawn: Option<&str>) -> NightPhases {
    match (parse_hhmm(sunset), parse_hhmm(dawn)) {
        (Some(s), Some(d)) => compute_times(s, d),
        _ => NightPhases::default(),
    }
}

/// Compute the night from already-parsed clock times.
pub fn compute_times(sunset: NaiveTime, dawn: NaiveTime) -> NightPhases {
    let duration = night_duration_minutes(minutes_of_day(sunset), minutes_of_day(dawn));
    let at = |phase: NightPhase| {
        let offset = TimeDelta::minutes(i64::from(phase.offset(duration)));
        Some(sunset.overflowing_add_signed(offset).0)
    };

    NightPhases {
        sunset: Some(sunset),
        first_third: at(NightPhase::FirstThird),
        midnight: at(NightPhase::Midnight),
        last_third_start: at(NightPhase::LastThirdStart),
        dawn: Some(dawn),
        duration_minutes: Some(duration),
    }
}

impl NightPhases {
    pub fn is_complete(&self) -> bool {
        self.duration_minutes.is_some()
    }

    pub fn get(&self, phase: NightPhase) -> Option<NaiveTime> {
        match phase {
            NightPhase::Sunset => self.sunset,
            NightPhase::FirstThird => self.first_third,
            NightPhase::Midnight => self.midnight,
            NightPhase::LastThirdStart => self.last_third_start,
            NightPhase::Dawn => self.dawn,
        }
    }

    /// Whether `phase` lands on the calendar day after the sunset.
    pub fn is_next_day(&self, phase: NightPhase) -> bool {
        match (self.sunset, self.duration_minutes) {
            (Some(sunset), Some(d)) => minutes_of_day(sunset) + phase.offset(d) >= MINUTES_PER_DAY,
            _ => false,
        }
    }

    /// The five labeled rows, in order.
    pub fn entries(&self) -> Vec<PhaseEntry> {
        NightPhase::ALL
            .iter()
            .map(|&phase| PhaseEntry {
                phase,
                label: phase.label(),
                time: format_hhmm(self.get(phase)),
                next_day: self.is_next_day(phase),
            })
            .collect()
    }
}

// ─── ASCII timeline ─────────────────────────────────────────────

/// Render the night as a boxed timeline running from sunset to dawn.
pub fn render_night_timeline(night: &NightPhases) -> String {
    let bar_width = 60;
    let mut out = String::new();

    match night.duration_minutes {
        Some(d) => out.push_str(&format!("  Night: {}h {:02}m\n", d / 60, d % 60)),
        None => out.push_str("  Night: unavailable (missing Maghrib or Fajr)\n"),
    }
    out.push_str("  ╔══════════════════════════════════════════════════════════════╗\n");

    if let Some(d) = night.duration_minutes {
        let mut bar = vec!['─'; bar_width];
        let mut labels = vec![' '; bar_width];
        for phase in NightPhase::ALL {
            let pos = (f64::from(phase.offset(d)) / f64::from(d) * (bar_width - 1) as f64) as usize;
            let pos = pos.min(bar_width - 1);
            bar[pos] = '│';
            labels[pos] = phase.marker();
        }
        out.push_str(&format!("  ║ {} ║\n", bar.iter().collect::<String>()));
        out.push_str(&format!("  ║ {} ║\n", labels.iter().collect::<String>()));
        out.push_str("  ╠══════════════════════════════════════════════════════════════╣\n");
    }

    for entry in night.entries() {
        let time = if entry.next_day {
            format!("{} (+1d)", entry.time)
        } else {
            entry.time.clone()
        };
        let line = format!("  {:<26}{}", entry.label, time);
        let pad = 62usize.saturating_sub(line.chars().count()).max(1);
        out.push_str(&format!("  ║{}{}║\n", line, " ".repeat(pad)));
    }

    out.push_str("  ╚══════════════════════════════════════════════════════════════╝\n");
    out
}
