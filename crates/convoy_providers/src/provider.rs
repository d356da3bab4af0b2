use std::fmt::Display;
use std::str::FromStr;

use geo_types::Point;
use thiserror::Error;

use crate::{
    geoapify::GeoapifyClient, graphhopper::GraphHopperClient, matrix::TravelMatrices,
    tomtom::TomTomClient, vehicle_type::VehicleType,
};

/// Matrix size (depot + jobs) up to which the synchronous matrix endpoint is
/// used; anything larger goes through the submit/poll/download flow. Only
/// the TomTom adapter offers both endpoints.
pub const SYNC_LOCATION_THRESHOLD: usize = 14;

pub fn use_sync_matrix(num_locations: usize) -> bool {
    num_locations <= SYNC_LOCATION_THRESHOLD
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Matrix job failed with status: {0}")]
    JobFailed(String),

    #[error("Polling timeout after {0} attempts")]
    Timeout(u32),

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Empty matrix returned by provider")]
    EmptyMatrix,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Geoapify,
    GraphHopper,
    TomTom,
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ProviderKind::Geoapify => "geoapify",
                ProviderKind::GraphHopper => "graphhopper",
                ProviderKind::TomTom => "tomtom",
            }
        )
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geoapify" => Ok(ProviderKind::Geoapify),
            "graphhopper" => Ok(ProviderKind::GraphHopper),
            "tomtom" => Ok(ProviderKind::TomTom),
            other => Err(format!("unknown routing provider: {other}")),
        }
    }
}

/// The configured routing backend. Selected once at startup and shared
/// through the application context.
pub enum RoutingProvider {
    Geoapify(GeoapifyClient),
    GraphHopper(GraphHopperClient),
    TomTom(TomTomClient),
}

impl RoutingProvider {
    pub fn from_kind(kind: ProviderKind, api_key: String) -> Self {
        match kind {
            ProviderKind::Geoapify => RoutingProvider::Geoapify(GeoapifyClient::new(api_key)),
            ProviderKind::GraphHopper => {
                RoutingProvider::GraphHopper(GraphHopperClient::new(api_key))
            }
            ProviderKind::TomTom => RoutingProvider::TomTom(TomTomClient::new(api_key)),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            RoutingProvider::Geoapify(_) => ProviderKind::Geoapify,
            RoutingProvider::GraphHopper(_) => ProviderKind::GraphHopper,
            RoutingProvider::TomTom(_) => ProviderKind::TomTom,
        }
    }

    /// Square distance/duration matrices over `[depot, jobs...]`.
    pub async fn matrix(
        &self,
        depot: Point<f64>,
        jobs: &[Point<f64>],
        vehicle_type: VehicleType,
    ) -> Result<TravelMatrices, ProviderError> {
        let mut locations = Vec::with_capacity(1 + jobs.len());
        locations.push(depot);
        locations.extend_from_slice(jobs);

        match self {
            RoutingProvider::Geoapify(client) => {
                client.fetch_matrix(&locations, vehicle_type).await
            }
            RoutingProvider::GraphHopper(client) => {
                client.fetch_matrix(&locations, vehicle_type).await
            }
            RoutingProvider::TomTom(client) => client.fetch_matrix(&locations, vehicle_type).await,
        }
    }

    /// Encoded polyline through `points` in order. Failures are non-fatal:
    /// the adapters log and return `None`.
    pub async fn polyline(
        &self,
        points: &[Point<f64>],
        vehicle_type: VehicleType,
    ) -> Option<String> {
        match self {
            RoutingProvider::Geoapify(client) => client.fetch_route(points, vehicle_type).await,
            RoutingProvider::GraphHopper(client) => client.fetch_route(points, vehicle_type).await,
            RoutingProvider::TomTom(client) => client.fetch_route(points, vehicle_type).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_matrix_threshold_boundary() {
        assert!(use_sync_matrix(14));
        assert!(!use_sync_matrix(15));
    }

    #[test]
    fn test_provider_kind_round_trip() {
        for kind in [
            ProviderKind::Geoapify,
            ProviderKind::GraphHopper,
            ProviderKind::TomTom,
        ] {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }

        assert!("mapzen".parse::<ProviderKind>().is_err());
    }
}
