use crate::core::tireset::Compound;
use crate::core::track::Track;
use crate::errors::WeekendError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// * `laps` - Estimated number of laps until the tireset is used up
/// * `pace` - (s/lap) Pace advantage compared to the hard compound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TireEstimate {
    pub laps: u32,
    pub pace: f64,
}

#[derive(Debug, Deserialize)]
struct RawTireEstimates {
    status: String,
    #[serde(default = "default_multiplier")]
    multiplier: f64,
    #[serde(default)]
    estimates: HashMap<Compound, TireEstimate>,
}

fn default_multiplier() -> f64 {
    1.0
}

/// TireEstimates informs the user about the expected life and pace of every compound on a track.
#[derive(Debug, Clone, PartialEq)]
pub struct TireEstimates {
    pub multiplier: f64,
    pub estimates: HashMap<Compound, TireEstimate>,
}

impl TireEstimates {
    pub fn from_json(body: &str) -> Result<TireEstimates, WeekendError> {
        let raw: RawTireEstimates = serde_json::from_str(body).map_err(|e| {
            WeekendError::Transport(format!("could not decode tire estimates: {}", e))
        })?;
        if raw.status != "success" {
            return Err(WeekendError::RemoteRejection { detail: raw.status });
        }
        Ok(TireEstimates {
            multiplier: raw.multiplier,
            estimates: raw.estimates,
        })
    }

    /// from_wear_multiplier derives the estimates from the reference compound characteristics.
    pub fn from_wear_multiplier(multiplier: f64) -> TireEstimates {
        let estimates = Compound::ALL
            .iter()
            .map(|&c| {
                (
                    c,
                    TireEstimate {
                        laps: c.estimated_life(multiplier),
                        pace: c.pars().pace_advantage,
                    },
                )
            })
            .collect();
        TireEstimates {
            multiplier,
            estimates,
        }
    }

    pub fn get(&self, compound: Compound) -> Option<&TireEstimate> {
        self.estimates.get(&compound)
    }
}

/// TireModel provides the tire estimates for a track.
pub trait TireModel {
    fn estimates(&self, track: &Track) -> Result<TireEstimates, WeekendError>;
}

/// LocalTireModel computes the estimates without asking a remote service.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTireModel;

impl TireModel for LocalTireModel {
    fn estimates(&self, track: &Track) -> Result<TireEstimates, WeekendError> {
        Ok(TireEstimates::from_wear_multiplier(track.tire_wear_multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_service_answer() {
        let body = r#"{"status": "success", "multiplier": 1.45, "estimates": {
            "Soft": {"laps": 18, "pace": 0.8},
            "Medium": {"laps": 27, "pace": 0.3},
            "Hard": {"laps": 41, "pace": 0.0}
        }}"#;
        let est = TireEstimates::from_json(body).unwrap();

        assert_eq!(est.multiplier, 1.45);
        assert_eq!(est.get(Compound::Medium).unwrap().laps, 27);
        assert_eq!(est.get(Compound::Hard).unwrap().pace, 0.0);
    }

    #[test]
    fn non_success_status_is_a_rejection() {
        let body = r#"{"status": "no_save_loaded"}"#;
        assert_eq!(
            TireEstimates::from_json(body),
            Err(WeekendError::RemoteRejection {
                detail: String::from("no_save_loaded")
            })
        );
        assert!(matches!(
            TireEstimates::from_json("not json"),
            Err(WeekendError::Transport(_))
        ));
    }

    #[test]
    fn local_model_follows_track_wear() {
        let mut track = Track::new("Bahrain International Circuit", 57);
        track.tire_wear_multiplier = 1.45;
        let est = LocalTireModel.estimates(&track).unwrap();

        // 100 / (2.1 * 1.45 * 1.8) = 18.2
        assert_eq!(est.get(Compound::Soft).unwrap().laps, 18);
        assert_eq!(est.get(Compound::Soft).unwrap().pace, 0.8);
        assert_eq!(est.estimates.len(), 3);
    }
}
