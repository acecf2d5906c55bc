use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use nightwatch::gazetteer::{self, CityRecord, GazetteerIndex, DEFAULT_SOURCE};
use nightwatch::night::{self, render_night_timeline};
use nightwatch::prayer::{CalculationParams, TimingsClient, DEFAULT_BASE_URL};
use nightwatch::server::{self, AppState};
use nightwatch::settings::{SavedLocation, SettingsStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Nightwatch — prayer times and the thirds of the night.
///
/// Examples:
///   nightwatch night 18:00 05:00
///   nightwatch cities --country Japan --search osa
///   nightwatch select --country "Saudi Arabia" --city Medina
///   nightwatch times --date 2026-03-20
///   nightwatch serve --port 3000
#[derive(Parser)]
#[command(name = "nightwatch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split the night between Maghrib and the next Fajr into thirds.
    Night {
        /// Maghrib time (HH:MM).
        maghrib: String,
        /// Fajr time of the following day (HH:MM).
        fajr: String,
    },
    /// List the countries in the dataset.
    Countries(DataArgs),
    /// List a country's cities, most populous first.
    Cities {
        #[arg(long)]
        country: String,
        /// Case-insensitive substring of the city name.
        #[arg(long, short = 's', default_value = "")]
        search: String,
        #[arg(long, short = 'n')]
        limit: Option<usize>,
        #[command(flatten)]
        data: DataArgs,
    },
    /// Save a city as the default location.
    Select {
        #[arg(long)]
        country: String,
        #[arg(long)]
        city: String,
        #[command(flatten)]
        data: DataArgs,
    },
    /// Fetch prayer times and compute the night.
    Times(TimesArgs),
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, short = 'p', default_value_t = 3000)]
        port: u16,
        /// Timings API base URL.
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        api: String,
        #[command(flatten)]
        data: DataArgs,
    },
}

#[derive(Args)]
struct DataArgs {
    /// World-cities CSV: a path or an http(s) URL.
    #[arg(long)]
    data: Option<String>,
}

#[derive(Args)]
struct TimesArgs {
    #[arg(long, requires = "city")]
    country: Option<String>,
    #[arg(long, requires = "country")]
    city: Option<String>,
    /// Latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true, requires = "lon", conflicts_with = "city")]
    lat: Option<f64>,
    /// Longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,
    /// Date (YYYY-MM-DD). Defaults to today.
    #[arg(long, short = 'd')]
    date: Option<String>,
    /// Calculation method id (see `/api/methods`).
    #[arg(long)]
    method: Option<u8>,
    /// Asr school: 0 Shafi'i, 1 Hanafi.
    #[arg(long)]
    school: Option<u8>,
    /// High-latitude rule: 1 middle of night, 2 one seventh, 3 angle based.
    #[arg(long)]
    lat_adjust: Option<u8>,
    /// Timings API base URL.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    api: String,
    #[command(flatten)]
    data: DataArgs,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = SettingsStore::load();

    match cli.command {
        Command::Night { maghrib, fajr } => {
            let phases = night::compute(Some(&maghrib), Some(&fajr));
            eprint!("{}", render_night_timeline(&phases));
            print_json(&phases);
        }
        Command::Countries(data) => {
            let index = load_index(&data, &settings);
            for country in index.countries() {
                println!("{}", country);
            }
        }
        Command::Cities { country, search, limit, data } => {
            let index = load_index(&data, &settings);
            let hits = index.filter(&country, &search);
            if hits.is_empty() {
                eprintln!("  No cities match '{}' in '{}'.", search, country);
            }
            let hits: Vec<&CityRecord> =
                hits.into_iter().take(limit.unwrap_or(usize::MAX)).collect();
            print_json(&hits);
        }
        Command::Select { country, city, data } => {
            let index = load_index(&data, &settings);
            let record = find_city(&index, &country, &city);
            let location = SavedLocation { country, city: record };
            settings.set_location(location.clone()).unwrap_or_else(|e| fail(e));
            eprintln!(
                "  \u{1F4CD} Saved {}, {} to {}",
                location.city,
                location.country,
                settings.path().display()
            );
        }
        Command::Times(args) => run_times(args, &settings),
        Command::Serve { host, port, api, data } => {
            let source = data_source(&data, &settings).to_string();
            let state = Arc::new(AppState::load(&source, settings, TimingsClient::new(api)));
            let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| fail(e));
            runtime
                .block_on(server::start(&host, port, state))
                .unwrap_or_else(|e| fail(format!("Cannot serve on {}:{}: {}", host, port, e)));
        }
    }
}

fn run_times(args: TimesArgs, settings: &SettingsStore) {
    let saved = settings.get();

    // Priority: --country/--city > --lat/--lon > saved location.
    let (label, coords) = if let (Some(country), Some(city)) = (&args.country, &args.city) {
        let index = load_index(&args.data, settings);
        let record = find_city(&index, country, city);
        (format!("{}, {}", record.name(), country), record.coords())
    } else if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            fail("Invalid coordinates. Lat: -90..90, Lon: -180..180");
        }
        (format!("{:.4}, {:.4}", lat, lon), (lon, lat))
    } else if let Some(loc) = &saved.location {
        (format!("{}, {}", loc.city.name(), loc.country), loc.city.coords())
    } else {
        eprintln!("Error: No location specified.");
        eprintln!();
        eprintln!("Usage:");
        eprintln!("  nightwatch times --country Japan --city Tokyo");
        eprintln!("  nightwatch times --lat 21.4225 --lon 39.8262");
        eprintln!("  nightwatch select --country \"Saudi Arabia\" --city Medina");
        std::process::exit(1);
    };

    let params = CalculationParams {
        method: args.method.unwrap_or(saved.params.method),
        school: args.school.unwrap_or(saved.params.school),
        latitude_adjustment_method: args
            .lat_adjust
            .unwrap_or(saved.params.latitude_adjustment_method),
    };
    params.validate().unwrap_or_else(|e| fail(e));

    let date = match &args.date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .unwrap_or_else(|e| fail(format!("Invalid date '{}': {}", d, e))),
        None => Utc::now().date_naive(),
    };

    let client = TimingsClient::new(args.api);
    let (today, tomorrow) = client.fetch_night(date, coords, &params).unwrap_or_else(|e| fail(e));
    let phases = today.night_phases(Some(&tomorrow));

    eprintln!("  \u{1F4CD} {} \u{2014} {}", label, date);
    if let Some(method) = params.method_label() {
        eprintln!("  \u{1F4D0} {}", method);
    }
    for (prayer, time) in today.pills() {
        eprintln!("  {} {:<8} {}", prayer.icon(), prayer, time);
    }
    eprint!("{}", render_night_timeline(&phases));

    print_json(&serde_json::json!({
        "timings": today,
        "night": phases,
        "night_entries": phases.entries(),
    }));
}

fn data_source<'a>(data: &'a DataArgs, settings: &'a SettingsStore) -> &'a str {
    data.data
        .as_deref()
        .or(settings.get().data_source.as_deref())
        .unwrap_or(DEFAULT_SOURCE)
}

fn load_index(data: &DataArgs, settings: &SettingsStore) -> GazetteerIndex {
    let source = data_source(data, settings);
    gazetteer::load(source).unwrap_or_else(|e| fail(e))
}

fn find_city(index: &GazetteerIndex, country: &str, city: &str) -> CityRecord {
    if let Some(record) = index.find(country, city) {
        return record.clone();
    }
    // Fall back to the most populous case-insensitive match.
    match index.filter(country, city).into_iter().find(|c| c.name().eq_ignore_ascii_case(city)) {
        Some(record) => record.clone(),
        None => {
            let suggestions: Vec<&str> =
                index.filter(country, city).iter().take(5).map(|c| c.name()).collect();
            if suggestions.is_empty() {
                fail(format!("Unknown city '{}' in '{}'", city, country));
            }
            fail(format!(
                "Unknown city '{}' in '{}'. Did you mean: {}?",
                city,
                country,
                suggestions.join(", ")
            ));
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}
