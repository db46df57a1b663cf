//! Terrain classification carried by every grid cell.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four terrain classes.
///
/// The numeric codes (Water=0, Land=1, Forest=2, Desert=3) only exist for
/// configuration and log compatibility; rule evaluation never compares them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Terrain {
    #[default]
    Water,
    Land,
    Forest,
    Desert,
}

impl Terrain {
    pub const ALL: [Terrain; 4] = [
        Terrain::Water,
        Terrain::Land,
        Terrain::Forest,
        Terrain::Desert,
    ];

    /// Serialization code used in configuration records and event logs.
    pub fn code(self) -> u8 {
        match self {
            Terrain::Water => 0,
            Terrain::Land => 1,
            Terrain::Forest => 2,
            Terrain::Desert => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Terrain::Water),
            1 => Some(Terrain::Land),
            2 => Some(Terrain::Forest),
            3 => Some(Terrain::Desert),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Terrain::Water => "water",
            Terrain::Land => "land",
            Terrain::Forest => "forest",
            Terrain::Desert => "desert",
        }
    }
}

impl TryFrom<u8> for Terrain {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Terrain::from_code(i64::from(value))
            .ok_or_else(|| format!("terrain code {value} is not one of 0..=3"))
    }
}

impl From<Terrain> for u8 {
    fn from(value: Terrain) -> Self {
        value.code()
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
