use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{close_time, open_time, BrevetError};

const KM_PER_MILE: f64 = 1.609344;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Unit {
    #[serde(rename = "km", alias = "kilometers")]
    Kilometers,
    #[serde(rename = "mi", alias = "miles")]
    Miles,
}

impl Default for Unit {
    fn default() -> Self {
        Unit::Kilometers
    }
}

impl Unit {
    pub fn to_km(self, distance: f64) -> f64 {
        match self {
            Unit::Kilometers => distance,
            Unit::Miles => distance * KM_PER_MILE,
        }
    }
}

/// Official ACP brevet distances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrevetDistance {
    Km200,
    Km300,
    Km400,
    Km600,
    Km1000,
}

impl BrevetDistance {
    pub const ALL: [BrevetDistance; 5] = [
        BrevetDistance::Km200,
        BrevetDistance::Km300,
        BrevetDistance::Km400,
        BrevetDistance::Km600,
        BrevetDistance::Km1000,
    ];

    pub fn km(self) -> f64 {
        match self {
            BrevetDistance::Km200 => 200.0,
            BrevetDistance::Km300 => 300.0,
            BrevetDistance::Km400 => 400.0,
            BrevetDistance::Km600 => 600.0,
            BrevetDistance::Km1000 => 1000.0,
        }
    }
}

impl TryFrom<f64> for BrevetDistance {
    type Error = BrevetError;

    fn try_from(km: f64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|d| (d.km() - km).abs() < 1e-9)
            .ok_or(BrevetError::UnofficialDistance(km))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Control {
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Control {
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            name: None,
        }
    }
}

/// A brevet definition: nominal distance, start time and its controls.
///
/// Control distances are expressed in `unit`; the nominal distance is always
/// in kilometers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Brevet {
    pub distance_km: f64,
    pub start_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub controls: Vec<Control>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ControlTimes {
    pub name: Option<String>,
    pub distance_km: f64,
    pub open: Option<DateTime<FixedOffset>>,
    pub close: Option<DateTime<FixedOffset>>,
}

impl Brevet {
    pub fn new(distance_km: f64, start_time: DateTime<FixedOffset>) -> Self {
        Self {
            distance_km,
            start_time,
            unit: Unit::Kilometers,
            controls: Vec::new(),
        }
    }

    /// Parse a JSON brevet definition and validate it.
    pub fn from_json_str(input: &str) -> Result<Self, BrevetError> {
        let brevet: Brevet =
            serde_json::from_str(input).map_err(|e| BrevetError::Parse(e.to_string()))?;
        brevet.validate()?;
        Ok(brevet)
    }

    /// Reject distances that cannot describe a route.
    ///
    /// Unofficial brevet distances pass; see [`Brevet::official_distance`].
    pub fn validate(&self) -> Result<(), BrevetError> {
        if !self.distance_km.is_finite() || self.distance_km <= 0.0 {
            return Err(BrevetError::InvalidDistance(self.distance_km));
        }
        for (index, control) in self.controls.iter().enumerate() {
            if !control.distance.is_finite() || control.distance < 0.0 {
                return Err(BrevetError::InvalidControl {
                    index,
                    distance: control.distance,
                });
            }
        }
        Ok(())
    }

    pub fn official_distance(&self) -> Result<BrevetDistance, BrevetError> {
        BrevetDistance::try_from(self.distance_km)
    }

    /// Open and close times for every control, in input order.
    pub fn schedule(&self) -> Vec<ControlTimes> {
        self.controls
            .iter()
            .map(|control| {
                let distance_km = self.unit.to_km(control.distance);
                let open = open_time(distance_km, self.distance_km, &self.start_time);
                let close = close_time(distance_km, self.distance_km, &self.start_time);
                if open.is_none() {
                    debug!(
                        "control at {:.1} km has no times on the {} km brevet",
                        distance_km, self.distance_km
                    );
                }
                ControlTimes {
                    name: control.name.clone(),
                    distance_km,
                    open,
                    close,
                }
            })
            .collect()
    }
}
