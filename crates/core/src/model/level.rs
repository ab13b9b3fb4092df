use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown level label: {raw}")]
pub struct ParseLevelError {
    raw: String,
}

/// Proficiency tier, ordered low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::A1,
        Level::A2,
        Level::B1,
        Level::B2,
        Level::C1,
        Level::C2,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Level::A1),
            "A2" => Ok(Level::A2),
            "B1" => Ok(Level::B1),
            "B2" => Ok(Level::B2),
            "C1" => Ok(Level::C1),
            "C2" => Ok(Level::C2),
            _ => Err(ParseLevelError { raw: s.to_string() }),
        }
    }
}

/// Outcome label of a step or attempt: a level, or the `fail` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CertifiedLevel {
    #[default]
    Fail,
    Level(Level),
}

impl CertifiedLevel {
    #[must_use]
    pub fn level(self) -> Option<Level> {
        match self {
            CertifiedLevel::Fail => None,
            CertifiedLevel::Level(level) => Some(level),
        }
    }

    #[must_use]
    pub fn is_fail(self) -> bool {
        matches!(self, CertifiedLevel::Fail)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CertifiedLevel::Fail => "fail",
            CertifiedLevel::Level(level) => level.as_str(),
        }
    }
}

impl From<Level> for CertifiedLevel {
    fn from(level: Level) -> Self {
        CertifiedLevel::Level(level)
    }
}

impl fmt::Display for CertifiedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertifiedLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("fail") {
            return Ok(CertifiedLevel::Fail);
        }
        s.parse::<Level>().map(CertifiedLevel::Level)
    }
}

impl Serialize for CertifiedLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CertifiedLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_low_to_high() {
        let mut sorted = Level::ALL;
        sorted.sort();
        assert_eq!(sorted, Level::ALL);
        assert!(Level::A2 < Level::B1);
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("b2".parse::<Level>().unwrap(), Level::B2);
        assert!("D1".parse::<Level>().is_err());
    }

    #[test]
    fn certified_level_round_trips_fail_sentinel() {
        assert_eq!("fail".parse::<CertifiedLevel>().unwrap(), CertifiedLevel::Fail);
        assert_eq!(CertifiedLevel::Fail.to_string(), "fail");
        assert_eq!(
            "C1".parse::<CertifiedLevel>().unwrap(),
            CertifiedLevel::Level(Level::C1)
        );
    }

    #[test]
    fn certified_level_serializes_as_label() {
        let json = serde_json::to_string(&CertifiedLevel::Level(Level::A2)).unwrap();
        assert_eq!(json, "\"A2\"");
        let back: CertifiedLevel = serde_json::from_str("\"fail\"").unwrap();
        assert!(back.is_fail());
    }
}
