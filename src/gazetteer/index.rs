//! The per-country city index.
//!
//! Stage two of the gazetteer pipeline: rows → grouped, sorted, immutable index.

use super::csv::{self, Row};
use icu_collator::{Collator, CollatorOptions};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A city with its coordinates. Both coordinates are always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCity")]
pub struct CityRecord {
    name: String,
    /// `[longitude, latitude]`, the order map widgets expect.
    coords: [f64; 2],
}

#[derive(Deserialize)]
struct RawCity {
    name: String,
    coords: [f64; 2],
}

impl TryFrom<RawCity> for CityRecord {
    type Error = String;

    fn try_from(raw: RawCity) -> Result<Self, Self::Error> {
        let [lng, lat] = raw.coords;
        CityRecord::new(raw.name, lng, lat)
            .ok_or_else(|| format!("non-finite coordinates [{}, {}]", lng, lat))
    }
}

impl CityRecord {
    /// Build a record, refusing non-finite coordinates.
    pub fn new(name: impl Into<String>, longitude: f64, latitude: f64) -> Option<Self> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return None;
        }
        Some(Self { name: name.into(), coords: [longitude, latitude] })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn longitude(&self) -> f64 {
        self.coords[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coords[1]
    }

    /// `(longitude, latitude)`.
    pub fn coords(&self) -> (f64, f64) {
        (self.coords[0], self.coords[1])
    }
}

impl fmt::Display for CityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.4}, {:.4})", self.name, self.latitude(), self.longitude())
    }
}

/// A city still carrying its population, which only exists to drive ordering.
struct Ranked {
    city: CityRecord,
    population: f64,
}

#[derive(Default)]
struct BuildStats {
    accepted: usize,
    dropped: usize,
}

/// Cities grouped by country, each list ordered by population (desc) then name.
#[derive(Debug, Clone, Default)]
pub struct GazetteerIndex {
    countries: BTreeMap<String, Vec<CityRecord>>,
}

impl GazetteerIndex {
    /// Parse CSV text and build the index. Never fails; bad rows are dropped.
    pub fn build(text: &str) -> Self {
        Self::from_rows(&csv::parse_rows(text))
    }

    /// Build from already-scanned rows.
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut grouped: BTreeMap<String, Vec<Ranked>> = BTreeMap::new();
        let mut stats = BuildStats::default();
        let names = NameOrder::new();

        for row in rows {
            match accept_row(row) {
                Some((country, ranked)) => {
                    stats.accepted += 1;
                    grouped.entry(country).or_default().push(ranked);
                }
                None => stats.dropped += 1,
            }
        }

        let countries = grouped
            .into_iter()
            .map(|(country, mut cities)| {
                // `sort_by` is stable: equal (population, name) pairs keep input order.
                cities.sort_by(|a, b| {
                    b.population
                        .total_cmp(&a.population)
                        .then_with(|| names.compare(&a.city.name, &b.city.name))
                });
                let cities = cities.into_iter().map(|r| r.city).collect();
                (country, cities)
            })
            .collect::<BTreeMap<_, _>>();

        tracing::debug!(
            accepted = stats.accepted,
            dropped = stats.dropped,
            countries = countries.len(),
            "gazetteer index built"
        );

        Self { countries }
    }

    /// Country names, in ascending order.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.countries.keys().map(String::as_str)
    }

    /// Ordered cities of a country. Unknown countries yield an empty slice.
    pub fn cities_of(&self, country: &str) -> &[CityRecord] {
        self.countries.get(country).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cities of a country whose name contains `needle`, ignoring case.
    /// Order is that of [`cities_of`](Self::cities_of); an empty needle keeps everything.
    pub fn filter<'a>(&'a self, country: &str, needle: &str) -> Vec<&'a CityRecord> {
        let needle = needle.to_lowercase();
        self.cities_of(country)
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Exact-name lookup within a country; the most populous match wins.
    pub fn find(&self, country: &str, city: &str) -> Option<&CityRecord> {
        self.cities_of(country).iter().find(|c| c.name == city)
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    pub fn city_count(&self) -> usize {
        self.countries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

/// Name ordering for population ties: root-locale collation, so accents and
/// case sort next to their base letters ("Älmhult" < "aneby" < "Borås").
struct NameOrder(Option<Collator>);

impl NameOrder {
    fn new() -> Self {
        match Collator::try_new(&Default::default(), CollatorOptions::new()) {
            Ok(collator) => Self(Some(collator)),
            Err(e) => {
                tracing::warn!(error = %e, "no collation data, ordering names by code point");
                Self(None)
            }
        }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.0 {
            Some(collator) => collator.compare(a, b),
            None => a.cmp(b),
        }
    }
}

/// Validate one row. Returns the trimmed country and the ranked city, or None.
fn accept_row(row: &Row) -> Option<(String, Ranked)> {
    let field = |key: &str| row.get(key).map(|s| s.trim()).unwrap_or("");

    let country = field("country");
    if country.is_empty() {
        return None;
    }

    let name = match field("city") {
        "" => field("city_ascii"),
        city => city,
    };
    if name.is_empty() {
        return None;
    }

    let lat = parse_finite(field("lat"))?;
    let lng = parse_finite(field("lng"))?;
    let population = parse_finite(field("population")).unwrap_or(0.0);

    let city = CityRecord::new(name, lng, lat)?;
    Some((country.to_string(), Ranked { city, population }))
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const HEADER: &str = "city,city_ascii,country,lat,lng,population";

    fn build(rows: &[&str]) -> GazetteerIndex {
        let mut text = String::from(HEADER);
        for r in rows {
            text.push('\n');
            text.push_str(r);
        }
        GazetteerIndex::build(&text)
    }

    fn names(cities: &[CityRecord]) -> Vec<&str> {
        cities.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn test_quoted_field_keeps_comma() {
        let index = build(&[r#"Tokyo,"Tōkyō, Capital",Japan,35.6870,139.7495,37400068"#]);
        let cities = index.cities_of("Japan");
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name(), "Tokyo");
        assert_relative_eq!(cities[0].latitude(), 35.6870);
        assert_relative_eq!(cities[0].longitude(), 139.7495);
    }

    #[test]
    fn test_population_desc_then_name() {
        let index = build(&[
            "Osaka,Osaka,Japan,34.6939,135.5022,19000000",
            "Tokyo,Tokyo,Japan,35.6870,139.7495,37400068",
            "Nara,Nara,Japan,34.685,135.805,350000",
            "Kobe,Kobe,Japan,34.69,135.19,350000",
            "Aomori,Aomori,Japan,40.82,140.74,",
        ]);
        assert_eq!(
            names(index.cities_of("Japan")),
            vec!["Tokyo", "Osaka", "Kobe", "Nara", "Aomori"]
        );
    }

    #[test]
    fn test_population_ties_use_collation() {
        // Empty population reads as 0, so all three tie.
        let index = build(&[
            "Borås,Boras,Sweden,57.72,12.94,",
            "aneby,Aneby,Sweden,57.84,14.81,",
            "Älmhult,Almhult,Sweden,56.55,14.14,",
        ]);
        assert_eq!(names(index.cities_of("Sweden")), vec!["Älmhult", "aneby", "Borås"]);
    }

    #[test]
    fn test_sort_contract_holds() {
        let index = build(&[
            "b,b,X,1,1,5",
            "a,a,X,1,1,5",
            "Z,Z,X,1,1,5",
            "é,e,X,1,1,5",
            "c,c,X,1,1,9",
            "d,d,X,1,1,junk",
        ]);
        let pop = |n: &str| match n {
            "c" => 9.0,
            "d" => 0.0,
            _ => 5.0,
        };
        let order = NameOrder::new();
        let cities = index.cities_of("X");
        for w in cities.windows(2) {
            let (a, b) = (w[0].name(), w[1].name());
            assert!(
                pop(a) > pop(b)
                    || (pop(a) == pop(b) && order.compare(a, b) != Ordering::Greater)
            );
        }
        assert_eq!(names(cities), vec!["c", "a", "b", "é", "Z", "d"]);
    }

    #[test]
    fn test_duplicates_pass_through_in_input_order() {
        let index = build(&["Same,Same,X,1,2,10", "Same,Same,X,3,4,10"]);
        let cities = index.cities_of("X");
        assert_eq!(cities.len(), 2);
        assert_relative_eq!(cities[0].latitude(), 1.0);
        assert_relative_eq!(cities[1].latitude(), 3.0);
    }

    #[test]
    fn test_row_rejection() {
        let index = build(&[
            ",,Japan,35,139,1",              // no city and no city_ascii
            "Nowhere,Nowhere,,35,139,1",     // no country
            "Bad,Bad,Japan,north,139,1",     // non-numeric lat
            "Bad2,Bad2,Japan,35,,1",         // missing lng
            "Inf,Inf,Japan,inf,139,1",       // non-finite lat
            "Kyoto,Kyoto,Japan,35.01,135.76,1500000",
        ]);
        assert_eq!(names(index.cities_of("Japan")), vec!["Kyoto"]);
        assert_eq!(index.country_count(), 1);
        assert_eq!(index.city_count(), 1);
    }

    #[test]
    fn test_city_ascii_fallback() {
        let index = build(&[" ,Sao Paulo,Brazil,-23.55,-46.63,22000000"]);
        assert_eq!(names(index.cities_of("Brazil")), vec!["Sao Paulo"]);

        let no_city = GazetteerIndex::build("city_ascii,country,lat,lng\nMalmo,Sweden,55.6,13.0\n");
        assert_eq!(names(no_city.cities_of("Sweden")), vec!["Malmo"]);
    }

    #[test]
    fn test_country_and_name_trimmed() {
        let index = build(&["  Bergen ,Bergen,  Norway  , 60.39 , 5.32 ,285000"]);
        let cities = index.cities_of("Norway");
        assert_eq!(names(cities), vec!["Bergen"]);
        assert_relative_eq!(cities[0].latitude(), 60.39);
    }

    #[test]
    fn test_short_row_population_defaults() {
        let index = build(&["Oslo,Oslo,Norway,59.91,10.75"]);
        assert_eq!(names(index.cities_of("Norway")), vec!["Oslo"]);
    }

    #[test]
    fn test_unknown_country_is_empty() {
        let index = build(&["Oslo,Oslo,Norway,59.91,10.75,1000000"]);
        assert!(index.cities_of("Atlantis").is_empty());
        assert!(index.filter("Atlantis", "o").is_empty());
    }

    #[test]
    fn test_empty_input_empty_index() {
        assert!(GazetteerIndex::build("").is_empty());
        assert!(GazetteerIndex::build("not,a,gazetteer\n1,2,3").is_empty());
    }

    #[test]
    fn test_filter_case_insensitive_keeps_order() {
        let index = build(&[
            "Stockholm,Stockholm,Sweden,59.33,18.07,1600000",
            "Gothenburg,Gothenburg,Sweden,57.71,11.97,600000",
            "Östersund,Ostersund,Sweden,63.18,14.64,50000",
            "Sollentuna,Sollentuna,Sweden,59.43,17.95,70000",
        ]);
        let hits: Vec<&str> = index.filter("Sweden", "ST").iter().map(|c| c.name()).collect();
        assert_eq!(hits, vec!["Stockholm", "Östersund"]);

        let hits: Vec<&str> = index.filter("Sweden", "östers").iter().map(|c| c.name()).collect();
        assert_eq!(hits, vec!["Östersund"]);

        assert_eq!(index.filter("Sweden", "").len(), 4);
    }

    #[test]
    fn test_countries_sorted() {
        let index = build(&[
            "Oslo,Oslo,Norway,59.91,10.75,1",
            "Cairo,Cairo,Egypt,30.04,31.24,1",
            "Lima,Lima,Peru,-12.05,-77.04,1",
        ]);
        let countries: Vec<&str> = index.countries().collect();
        assert_eq!(countries, vec!["Egypt", "Norway", "Peru"]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let rows = [
            "b,b,X,1,1,5",
            "a,a,X,1,1,5",
            "c,c,Y,1,1,5",
            "a,a,X,2,2,5",
        ];
        let first = build(&rows);
        let second = build(&rows);
        for country in first.countries() {
            assert_eq!(first.cities_of(country), second.cities_of(country));
        }
    }

    #[test]
    fn test_find_exact() {
        let index = build(&["Medina,Medina,Saudi Arabia,24.47,39.61,1300000"]);
        assert!(index.find("Saudi Arabia", "Medina").is_some());
        assert!(index.find("Saudi Arabia", "medina").is_none());
    }

    #[test]
    fn test_city_record_rejects_non_finite() {
        assert!(CityRecord::new("x", f64::NAN, 0.0).is_none());
        assert!(CityRecord::new("x", 0.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_city_record_json_shape() {
        let city = CityRecord::new("Tokyo", 139.7495, 35.687).unwrap();
        let json = serde_json::to_value(&city).unwrap();
        assert_eq!(json["name"], "Tokyo");
        assert_eq!(json["coords"][0], 139.7495);

        let back: CityRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, city);
    }
}
