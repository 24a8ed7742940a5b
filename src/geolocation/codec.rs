//! Location codes.
//!
//! A slot is addressed by three free-text labels (rack, level, aisle). Every
//! check on those labels lives here so the registry, the reports and the HTTP
//! layer agree on what a valid coordinate is and how it is written.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

/// Separator between the three labels of a location code.
pub const SEPARATOR: char = '-';

/// Matches the width of the rack/level/aisle columns.
pub const MAX_LABEL_LEN: usize = 20;

/// A single validated coordinate label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    pub fn new(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.chars().count() > MAX_LABEL_LEN {
            return None;
        }
        Some(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Label {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Label::new(&value).ok_or_else(|| format!("invalid location label '{}'", value))
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rack/level/aisle triple inside one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub rack: Label,
    pub level: Label,
    pub aisle: Label,
}

impl Location {
    pub fn new(rack: &str, level: &str, aisle: &str) -> GeoResult<Self> {
        match (Label::new(rack), Label::new(level), Label::new(aisle)) {
            (Some(rack), Some(level), Some(aisle)) => Ok(Self { rack, level, aisle }),
            _ => Err(GeoError::validation("Invalid location format")),
        }
    }

    /// Canonical display code, `rack-level-aisle`.
    pub fn code(&self) -> String {
        format(self.rack.as_str(), self.level.as_str(), self.aisle.as_str())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

pub fn validate(rack: &str, level: &str, aisle: &str) -> bool {
    Location::new(rack, level, aisle).is_ok()
}

pub fn format(rack: &str, level: &str, aisle: &str) -> String {
    format!("{rack}{SEPARATOR}{level}{SEPARATOR}{aisle}")
}

/// Inverse of [`format`]. Labels that themselves contain the separator do not
/// round-trip and yield `None`.
pub fn parse(code: &str) -> Option<Location> {
    let mut parts = code.split(SEPARATOR);
    let rack = parts.next()?;
    let level = parts.next()?;
    let aisle = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Location::new(rack, level, aisle).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_all_three_labels() {
        assert!(validate("A1", "02", "03"));
        assert!(!validate("", "02", "03"));
        assert!(!validate("A1", "", "03"));
        assert!(!validate("A1", "02", ""));
        assert!(!validate("   ", "02", "03"));
    }

    #[test]
    fn validate_rejects_labels_wider_than_the_column() {
        let wide = "R".repeat(MAX_LABEL_LEN + 1);
        assert!(!validate(&wide, "01", "01"));
        assert!(validate(&"R".repeat(MAX_LABEL_LEN), "01", "01"));
    }

    #[test]
    fn format_is_rack_level_aisle() {
        assert_eq!(format("A1", "02", "03"), "A1-02-03");
        let location = Location::new("B1", "01", "05").unwrap();
        assert_eq!(location.code(), "B1-01-05");
        assert_eq!(location.to_string(), "B1-01-05");
    }

    #[test]
    fn labels_are_trimmed() {
        let location = Location::new(" A1 ", "02", "03 ").unwrap();
        assert_eq!(location.code(), "A1-02-03");
    }

    #[test]
    fn parse_recovers_the_triple() {
        let samples = [("A1", "02", "03"), ("RACK9", "top", "P_12"), ("x", "y", "z")];
        for (rack, level, aisle) in samples {
            let location = parse(&format(rack, level, aisle)).unwrap();
            assert_eq!(location.rack.as_str(), rack);
            assert_eq!(location.level.as_str(), level);
            assert_eq!(location.aisle.as_str(), aisle);
        }
    }

    #[test]
    fn parse_rejects_malformed_codes() {
        assert!(parse("A1-02").is_none());
        assert!(parse("A1-02-03-04").is_none());
        assert!(parse("A1--03").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn label_deserialization_validates() {
        let ok: Label = serde_json::from_str("\"A1\"").unwrap();
        assert_eq!(ok.as_str(), "A1");
        assert!(serde_json::from_str::<Label>("\"\"").is_err());
    }
}
