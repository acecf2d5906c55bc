//! Calculation parameters sent to the prayer-times source.
//!
//! Ids follow the AlAdhan API. Method 6 is not assigned there.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A selectable option: API id plus the label shown in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamOption {
    pub id: u8,
    pub label: &'static str,
}

const fn opt(id: u8, label: &'static str) -> ParamOption {
    ParamOption { id, label }
}

pub const CALCULATION_METHODS: &[ParamOption] = &[
    opt(0, "Jafari / Shia Ithna-Ashari"),
    opt(1, "University of Islamic Sciences, Karachi"),
    opt(2, "Islamic Society of North America"),
    opt(3, "Muslim World League"),
    opt(4, "Umm Al-Qura University, Makkah"),
    opt(5, "Egyptian General Authority of Survey"),
    opt(7, "Institute of Geophysics, University of Tehran"),
    opt(8, "Gulf Region"),
    opt(9, "Kuwait"),
    opt(10, "Qatar"),
    opt(11, "Majlis Ugama Islam Singapura, Singapore"),
    opt(12, "Union Organization islamic de France"),
    opt(13, "Diyanet İşleri Başkanlığı, Turkey"),
    opt(14, "Spiritual Administration of Muslims of Russia"),
    opt(15, "Moonsighting Committee Worldwide"),
    opt(16, "Dubai (experimental)"),
    opt(17, "Jabatan Kemajuan Islam Malaysia (JAKIM)"),
    opt(18, "Tunisia"),
    opt(19, "Algeria"),
    opt(20, "KEMENAG - Kementerian Agama Republik Indonesia"),
    opt(21, "Morocco"),
    opt(22, "Comunidade Islamica de Lisboa"),
    opt(23, "Ministry of Awqaf, Islamic Affairs and Holy Places, Jordan"),
];

/// Asr juristic school.
pub const SCHOOLS: &[ParamOption] = &[
    opt(0, "Earlier Asr Time (Maliki, Shafi'i & Hanbali)"),
    opt(1, "Later Asr Time (Hanafi)"),
];

/// High-latitude adjustment rules.
pub const LATITUDE_ADJUSTMENTS: &[ParamOption] = &[
    opt(1, "Middle of the Night"),
    opt(2, "One Seventh"),
    opt(3, "Angle Based"),
];

fn lookup(options: &[ParamOption], id: u8) -> Option<&ParamOption> {
    options.iter().find(|o| o.id == id)
}

/// Parameters for one timings lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationParams {
    #[serde(default = "default_method")]
    pub method: u8,
    #[serde(default)]
    pub school: u8,
    #[serde(default = "default_latitude_adjustment")]
    pub latitude_adjustment_method: u8,
}

fn default_method() -> u8 {
    15
}

fn default_latitude_adjustment() -> u8 {
    1
}

impl Default for CalculationParams {
    fn default() -> Self {
        Self {
            method: default_method(),
            school: 0,
            latitude_adjustment_method: default_latitude_adjustment(),
        }
    }
}

/// A parameter id outside its catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidParam {
    pub field: &'static str,
    pub value: u8,
}

impl fmt::Display for InvalidParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown {} id {}", self.field, self.value)
    }
}

impl std::error::Error for InvalidParam {}

impl CalculationParams {
    pub fn validate(&self) -> Result<(), InvalidParam> {
        let checks = [
            ("method", self.method, CALCULATION_METHODS),
            ("school", self.school, SCHOOLS),
            ("latitudeAdjustmentMethod", self.latitude_adjustment_method, LATITUDE_ADJUSTMENTS),
        ];
        for (field, value, options) in checks {
            if lookup(options, value).is_none() {
                return Err(InvalidParam { field, value });
            }
        }
        Ok(())
    }

    pub fn method_label(&self) -> Option<&'static str> {
        lookup(CALCULATION_METHODS, self.method).map(|o| o.label)
    }

    /// Query-string pairs in the order the API documents them.
    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        [
            ("method", self.method.to_string()),
            ("school", self.school.to_string()),
            ("latitudeAdjustmentMethod", self.latitude_adjustment_method.to_string()),
        ]
    }
}

/// All catalogues, for the settings screen.
#[derive(Debug, Clone, Serialize)]
pub struct ParamCatalogue {
    pub methods: &'static [ParamOption],
    pub schools: &'static [ParamOption],
    pub latitude_adjustments: &'static [ParamOption],
    pub defaults: CalculationParams,
}

pub fn catalogue() -> ParamCatalogue {
    ParamCatalogue {
        methods: CALCULATION_METHODS,
        schools: SCHOOLS,
        latitude_adjustments: LATITUDE_ADJUSTMENTS,
        defaults: CalculationParams::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = CalculationParams::default();
        assert_eq!((p.method, p.school, p.latitude_adjustment_method), (15, 0, 1));
        assert_eq!(p.method_label(), Some("Moonsighting Committee Worldwide"));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_method_catalogue() {
        assert_eq!(CALCULATION_METHODS.len(), 23);
        assert!(lookup(CALCULATION_METHODS, 6).is_none());
        assert_eq!(lookup(CALCULATION_METHODS, 7).unwrap().label,
            "Institute of Geophysics, University of Tehran");
    }

    #[test]
    fn test_validate_rejects_unknown() {
        let p = CalculationParams { method: 6, ..Default::default() };
        assert_eq!(p.validate(), Err(InvalidParam { field: "method", value: 6 }));

        let p = CalculationParams { school: 2, ..Default::default() };
        assert_eq!(p.validate().unwrap_err().field, "school");

        let p = CalculationParams { latitude_adjustment_method: 0, ..Default::default() };
        assert_eq!(p.validate().unwrap_err().field, "latitudeAdjustmentMethod");
    }

    #[test]
    fn test_serde_camel_case_with_defaults() {
        let p: CalculationParams = serde_json::from_str(r#"{"school":1}"#).unwrap();
        assert_eq!(p.method, 15);
        assert_eq!(p.school, 1);
        assert_eq!(p.latitude_adjustment_method, 1);

        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json["latitudeAdjustmentMethod"], 1);
    }

    #[test]
    fn test_query_pairs() {
        let pairs = CalculationParams::default().query_pairs();
        assert_eq!(pairs[0], ("method", "15".to_string()));
        assert_eq!(pairs[2].0, "latitudeAdjustmentMethod");
    }
}
