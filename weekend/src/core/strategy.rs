use crate::core::tireset::{Compound, Stint};
use crate::core::track::Track;
use crate::errors::WeekendError;
use helpers::general::sum_laps;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::convert::TryFrom;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverSlot {
    D1,
    D2,
}

impl DriverSlot {
    pub const BOTH: [DriverSlot; 2] = [DriverSlot::D1, DriverSlot::D2];

    pub fn index(self) -> usize {
        match self {
            DriverSlot::D1 => 0,
            DriverSlot::D2 => 1,
        }
    }
}

impl TryFrom<usize> for DriverSlot {
    type Error = WeekendError;

    fn try_from(idx: usize) -> Result<Self, Self::Error> {
        match idx {
            0 => Ok(DriverSlot::D1),
            1 => Ok(DriverSlot::D2),
            _ => Err(WeekendError::Validation(format!(
                "driver index {} out of range, a team runs drivers 0 and 1",
                idx
            ))),
        }
    }
}

impl fmt::Display for DriverSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "driver {}", self.index() + 1)
    }
}

/// Strategy is one driver's ordered plan of stints. The first stint is run first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Strategy {
    stints: Vec<Stint>,
}

impl Strategy {
    pub fn new(stints: Vec<Stint>) -> Strategy {
        Strategy { stints }
    }

    pub fn stints(&self) -> &[Stint] {
        &self.stints
    }

    pub fn is_empty(&self) -> bool {
        self.stints.is_empty()
    }

    /// committed_laps returns the sum of laps over all stints.
    pub fn committed_laps(&self) -> u32 {
        sum_laps(self.stints.iter().map(|s| s.laps()))
    }

    pub fn is_race_legal(&self, track: &Track) -> bool {
        self.committed_laps() >= track.laps
    }

    /// compounds_used returns the number of distinct compounds in the plan (informational only, no
    /// variety rule is enforced).
    pub fn compounds_used(&self) -> usize {
        self.stints
            .iter()
            .map(|s| s.compound())
            .collect::<HashSet<Compound>>()
            .len()
    }
}

/// RaceSubmission is the payload sent to the race simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSubmission {
    pub d1_strategy: Strategy,
    pub d2_strategy: Strategy,
}

impl RaceSubmission {
    pub fn strategy(&self, driver: DriverSlot) -> &Strategy {
        match driver {
            DriverSlot::D1 => &self.d1_strategy,
            DriverSlot::D2 => &self.d2_strategy,
        }
    }
}

/// StrategyBuilder keeps the stint plans of both drivers of the team during the pre-race phase.
/// It is edited by a single actor, one change at a time.
#[derive(Debug, Clone, Default)]
pub struct StrategyBuilder {
    strategies: [Strategy; 2],
}

impl StrategyBuilder {
    pub fn new() -> StrategyBuilder {
        StrategyBuilder::default()
    }

    /// from_submission seeds a builder with previously saved strategies.
    pub fn from_submission(submission: RaceSubmission) -> StrategyBuilder {
        StrategyBuilder {
            strategies: [submission.d1_strategy, submission.d2_strategy],
        }
    }

    pub fn strategy(&self, driver: DriverSlot) -> &Strategy {
        &self.strategies[driver.index()]
    }

    /// append_stint adds a stint at the end of the driver's plan. Planning more laps than the race
    /// distance is allowed.
    pub fn append_stint(&mut self, driver: DriverSlot, stint: Stint) {
        self.strategies[driver.index()].stints.push(stint);
    }

    /// remove_last_stint undoes the most recent append for the driver. Nothing happens if the plan
    /// is empty.
    pub fn remove_last_stint(&mut self, driver: DriverSlot) -> Option<Stint> {
        self.strategies[driver.index()].stints.pop()
    }

    pub fn total_laps(&self, driver: DriverSlot) -> u32 {
        self.strategy(driver).committed_laps()
    }

    /// overcommitted_laps returns the number of planned laps beyond the race distance, if any.
    pub fn overcommitted_laps(&self, driver: DriverSlot, track: &Track) -> Option<u32> {
        let total = self.total_laps(driver);
        if total > track.laps {
            Some(total - track.laps)
        } else {
            None
        }
    }

    /// compounds_used returns the number of distinct compounds in the driver's plan.
    pub fn compounds_used(&self, driver: DriverSlot) -> usize {
        self.strategy(driver).compounds_used()
    }

    pub fn is_submittable(&self, track: &Track) -> bool {
        DriverSlot::BOTH
            .iter()
            .all(|&driver| self.strategy(driver).is_race_legal(track))
    }

    /// validate reports the first driver whose plan does not cover the race distance.
    pub fn validate(&self, track: &Track) -> Result<(), WeekendError> {
        for &driver in DriverSlot::BOTH.iter() {
            let total = self.total_laps(driver);
            if total < track.laps {
                return Err(WeekendError::Validation(format!(
                    "{} plans {} of {} laps at {}",
                    driver, total, track.laps, track.name
                )));
            }
        }
        Ok(())
    }

    /// to_submission creates the simulator payload. Callers are expected to check
    /// `is_submittable` first, the builder rejects invalid plans nonetheless.
    pub fn to_submission(&self, track: &Track) -> Result<RaceSubmission, WeekendError> {
        if let Err(e) = self.validate(track) {
            return Err(WeekendError::Precondition(format!(
                "submission requested for an invalid strategy ({})",
                e
            )));
        }

        for &driver in DriverSlot::BOTH.iter() {
            if let Some(extra) = self.overcommitted_laps(driver, track) {
                warn!(
                    "{} plans {} laps beyond the race distance of {}",
                    driver, extra, track.name
                );
            }
        }

        Ok(RaceSubmission {
            d1_strategy: self.strategies[0].clone(),
            d2_strategy: self.strategies[1].clone(),
        })
    }
}
