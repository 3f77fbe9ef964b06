//! Postal address value.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned address key.
pub type AddressId = i64;

/// Named geographic region an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
}

impl Region {
    /// Upper-case name used in the `REGION` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "NORTH",
            Self::South => "SOUTH",
            Self::East => "EAST",
            Self::West => "WEST",
            Self::Central => "CENTRAL",
        }
    }

    /// Parses a region name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NORTH" => Some(Self::North),
            "SOUTH" => Some(Self::South),
            "EAST" => Some(Self::East),
            "WEST" => Some(Self::West),
            "CENTRAL" => Some(Self::Central),
            _ => None,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postal address referenced from person rows.
///
/// Addresses are never updated in place. Saving a person inserts a fresh row
/// for an unkeyed address; an address that already has a key is referenced
/// by that key, so several people may share one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// `None` until the address store inserts the row.
    pub id: Option<AddressId>,
    pub street_address: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub county: String,
    pub region: Region,
}

#[cfg(test)]
mod tests {
    use super::Region;

    #[test]
    fn region_names_round_trip() {
        for region in [
            Region::North,
            Region::South,
            Region::East,
            Region::West,
            Region::Central,
        ] {
            assert_eq!(Region::parse(region.as_str()), Some(region));
        }
    }

    #[test]
    fn region_parse_is_case_insensitive() {
        assert_eq!(Region::parse(" west "), Some(Region::West));
        assert_eq!(Region::parse("Central"), Some(Region::Central));
        assert_eq!(Region::parse("midlands"), None);
    }
}
