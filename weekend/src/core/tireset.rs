use crate::errors::WeekendError;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

/// Base tire wear per lap (percentage points) at a track wear multiplier of 1.0.
pub const BASE_WEAR_PER_LAP: f64 = 2.1;

/// Wear level (%) at which a tireset is considered used up.
pub const WEAR_LIMIT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compound {
    Soft,
    Medium,
    Hard,
}

/// * `pace_advantage` - (s/lap) Lap time gain compared to the hard compound
/// * `wear_rate` - Multiplier on the base tire wear per lap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundPars {
    pub pace_advantage: f64,
    pub wear_rate: f64,
}

impl Compound {
    pub const ALL: [Compound; 3] = [Compound::Soft, Compound::Medium, Compound::Hard];

    pub fn pars(self) -> CompoundPars {
        match self {
            Compound::Soft => CompoundPars {
                pace_advantage: 0.8,
                wear_rate: 1.8,
            },
            Compound::Medium => CompoundPars {
                pace_advantage: 0.3,
                wear_rate: 1.2,
            },
            Compound::Hard => CompoundPars {
                pace_advantage: 0.0,
                wear_rate: 0.8,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Compound::Soft => "Soft",
            Compound::Medium => "Medium",
            Compound::Hard => "Hard",
        }
    }

    /// estimated_life returns the number of laps a fresh tireset lasts until it reaches the wear
    /// limit on a track with the given wear multiplier.
    pub fn estimated_life(self, wear_multiplier: f64) -> u32 {
        let wear_per_lap = BASE_WEAR_PER_LAP * wear_multiplier * self.pars().wear_rate;
        if wear_per_lap <= 0.0 || !wear_per_lap.is_finite() {
            return 0;
        }
        (WEAR_LIMIT / wear_per_lap).floor() as u32
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Compound {
    type Err = WeekendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SOFT" | "S" => Ok(Compound::Soft),
            "MEDIUM" | "M" => Ok(Compound::Medium),
            "HARD" | "H" => Ok(Compound::Hard),
            _ => Err(WeekendError::Validation(format!(
                "unknown tire compound {:?}",
                s
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawStint {
    compound: Compound,
    laps: u32,
}

/// Stint is a contiguous block of laps run on one tire compound. The number of laps is always at
/// least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStint")]
pub struct Stint {
    compound: Compound,
    laps: u32,
}

impl Stint {
    pub fn new(compound: Compound, laps: u32) -> Result<Stint, WeekendError> {
        if laps == 0 {
            return Err(WeekendError::Validation(format!(
                "a {} stint must cover at least one lap",
                compound
            )));
        }
        Ok(Stint { compound, laps })
    }

    pub fn compound(&self) -> Compound {
        self.compound
    }

    pub fn laps(&self) -> u32 {
        self.laps
    }
}

impl TryFrom<RawStint> for Stint {
    type Error = WeekendError;

    fn try_from(raw: RawStint) -> Result<Self, Self::Error> {
        Stint::new(raw.compound, raw.laps)
    }
}
