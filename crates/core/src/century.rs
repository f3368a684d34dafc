//! Century identifiers and the compiled-in code tables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Sentinel returned when no code can be produced for an unrecognized century.
pub const CODE_NOT_FOUND: &str = "CODE_NOT_FOUND";

/// One stage of the unlock chain, labelled by roman numeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Century {
    XIV,
    XV,
    XVI,
    XVII,
    XVIII,
}

impl Century {
    /// All centuries in chronological (unlock) order.
    pub const ALL: [Century; 5] = [
        Century::XIV,
        Century::XV,
        Century::XVI,
        Century::XVII,
        Century::XVIII,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Century::XIV => "XIV",
            Century::XV => "XV",
            Century::XVI => "XVI",
            Century::XVII => "XVII",
            Century::XVIII => "XVIII",
        }
    }

    /// The century whose code unlocks this one, if any.
    pub fn previous(&self) -> Option<Century> {
        let idx = Self::ALL.iter().position(|c| c == self)?;
        idx.checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Fallback code compiled into the program for this century.
    pub fn backup_code(&self) -> &'static str {
        match self {
            Century::XIV => "AUREUS1350",
            Century::XV => "DIAZEPAM850",
            Century::XVI => "SERAPH1520",
            Century::XVII => "NECRONOMICON1317",
            Century::XVIII => "MALLEUS1692",
        }
    }

    /// Manuscript title used when none could be captured from the portal.
    pub fn default_title(&self) -> Option<&'static str> {
        match self {
            Century::XVII => Some("Necronomicon"),
            Century::XVIII => Some("Malleus Maleficarum"),
            _ => None,
        }
    }
}

impl fmt::Display for Century {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Century {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == label)
            .ok_or_else(|| Error::UnknownCentury(s.to_string()))
    }
}

/// Backup code lookup for a raw label; unknown labels have no entry.
pub fn backup_code(century: &str) -> Option<&'static str> {
    century.parse::<Century>().ok().map(|c| c.backup_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for c in Century::ALL {
            assert_eq!(c.as_str().parse::<Century>().unwrap(), c);
        }
        assert_eq!(" xvii ".parse::<Century>().unwrap(), Century::XVII);
        assert!("XIX".parse::<Century>().is_err());
    }

    #[test]
    fn test_previous_follows_chronology() {
        assert_eq!(Century::XIV.previous(), None);
        assert_eq!(Century::XV.previous(), Some(Century::XIV));
        assert_eq!(Century::XVIII.previous(), Some(Century::XVII));
    }

    #[test]
    fn test_backup_lookup_by_label() {
        assert_eq!(backup_code("XV"), Some("DIAZEPAM850"));
        assert_eq!(backup_code("XX"), None);
    }
}
