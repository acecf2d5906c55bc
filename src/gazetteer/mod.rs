//! World-cities gazetteer.
//!
//! Turns the flat `worldcities.csv` dataset into an immutable index of cities
//! grouped by country, ordered most populous first.

pub mod csv;
pub mod index;
pub mod source;

pub use index::{CityRecord, GazetteerIndex};
pub use source::{load, load_or_empty, SourceError, DEFAULT_SOURCE};
