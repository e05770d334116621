use serde::{Deserialize, Serialize};

/// * `name` - Track name
/// * `country` - Country the track is located in
/// * `laps` - Race distance in laps, every strategy must cover at least this many laps
/// * `aero_weight` - Importance of the aero package on this track (1.0 = average)
/// * `powertrain_weight` - Importance of the powertrain on this track (1.0 = average)
/// * `chassis_weight` - Importance of the chassis on this track (1.0 = average)
/// * `tire_wear_multiplier` - Track specific tire wear factor (1.0 = average)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub laps: u32,
    #[serde(default = "default_weight")]
    pub aero_weight: f64,
    #[serde(default = "default_weight")]
    pub powertrain_weight: f64,
    #[serde(default = "default_weight")]
    pub chassis_weight: f64,
    #[serde(default = "default_weight")]
    pub tire_wear_multiplier: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Track {
    /// new creates a track with average demands, mainly useful when only the race distance matters.
    pub fn new(name: &str, laps: u32) -> Track {
        Track {
            name: name.to_owned(),
            country: String::new(),
            laps,
            aero_weight: 1.0,
            powertrain_weight: 1.0,
            chassis_weight: 1.0,
            tire_wear_multiplier: 1.0,
        }
    }
}

/// Calendar is the ordered list of race weekends of a season.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Calendar {
    pub tracks: Vec<Track>,
}

impl Calendar {
    pub fn get(&self, race_index: usize) -> Option<&Track> {
        self.tracks.get(race_index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
