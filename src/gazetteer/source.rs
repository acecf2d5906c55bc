//! Fetching the raw dataset: a local file or an HTTP(S) URL.

use super::index::GazetteerIndex;
use std::fmt;
use std::fs;
use std::time::Duration;

/// Where the world-cities CSV is read from when nothing else is configured.
pub const DEFAULT_SOURCE: &str = "worldcities.csv";

/// Dataset fetch errors. Parsing itself never fails.
#[derive(Debug)]
pub enum SourceError {
    Io { path: String, message: String },
    Network(String),
    InvalidResponse(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "Cannot read '{}': {}", path, message),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid dataset response: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Read the raw dataset text.
pub fn fetch_text(location: &str) -> Result<String, SourceError> {
    if is_remote(location) {
        let response = ureq::get(location)
            .set("User-Agent", "nightwatch/0.3 (gazetteer)")
            .timeout(Duration::from_secs(30))
            .call()
            .map_err(|e| SourceError::Network(e.to_string()))?;
        response
            .into_string()
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))
    } else {
        fs::read_to_string(location).map_err(|e| SourceError::Io {
            path: location.to_string(),
            message: e.to_string(),
        })
    }
}

/// Fetch and index the dataset.
pub fn load(location: &str) -> Result<GazetteerIndex, SourceError> {
    let text = fetch_text(location)?;
    let index = GazetteerIndex::build(&text);
    tracing::info!(
        source = location,
        countries = index.country_count(),
        cities = index.city_count(),
        "gazetteer loaded"
    );
    Ok(index)
}

/// Like [`load`], but a failed fetch is logged and yields an empty index.
pub fn load_or_empty(location: &str) -> GazetteerIndex {
    load(location).unwrap_or_else(|e| {
        tracing::warn!(source = location, error = %e, "failed to load gazetteer");
        GazetteerIndex::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cities.csv");
        fs::write(
            &path,
            "city,country,lat,lng,population\r\nMecca,Saudi Arabia,21.4225,39.8262,2385509\r\n",
        )
        .unwrap();

        let index = load(path.to_str().unwrap()).unwrap();
        assert_eq!(index.cities_of("Saudi Arabia").len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.csv");
        let err = load(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn test_load_or_empty_on_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.csv");
        assert!(load_or_empty(path.to_str().unwrap()).is_empty());
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/worldcities.csv"));
        assert!(is_remote("http://localhost/w.csv"));
        assert!(!is_remote("data/worldcities.csv"));
    }
}
