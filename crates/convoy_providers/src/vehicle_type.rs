use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Internal vehicle classification. Each routing provider maps this onto its
/// own profile vocabulary.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Car,
    Van,
    Truck,
    Bike,
    Scooter,
    Foot,
}

impl Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                VehicleType::Car => "car",
                VehicleType::Van => "van",
                VehicleType::Truck => "truck",
                VehicleType::Bike => "bike",
                VehicleType::Scooter => "scooter",
                VehicleType::Foot => "foot",
            }
        )
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car" => Ok(VehicleType::Car),
            "van" => Ok(VehicleType::Van),
            "truck" => Ok(VehicleType::Truck),
            "bike" => Ok(VehicleType::Bike),
            "scooter" => Ok(VehicleType::Scooter),
            "foot" => Ok(VehicleType::Foot),
            other => Err(format!("unknown vehicle type: {other}")),
        }
    }
}

impl Default for VehicleType {
    fn default() -> Self {
        VehicleType::Car
    }
}
