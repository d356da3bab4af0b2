use geo_types::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{matrix::TravelMatrices, provider::ProviderError, vehicle_type::VehicleType};

pub const GRAPHHOPPER_MATRIX_API_URL: &str = "https://graphhopper.com/api/1/matrix";
pub const GRAPHHOPPER_ROUTE_API_URL: &str = "https://graphhopper.com/api/1/route";

pub fn graphhopper_profile(vehicle_type: VehicleType) -> &'static str {
    match vehicle_type {
        VehicleType::Car => "car",
        // GraphHopper free tier has no van profile
        VehicleType::Van => "car",
        VehicleType::Truck => "truck",
        VehicleType::Bike => "bike",
        VehicleType::Scooter => "scooter",
        VehicleType::Foot => "foot",
    }
}

#[derive(Debug, Clone, Serialize)]
struct MatrixRequestBody {
    /// Points for symmetric matrix (all-to-all), as `[lng, lat]`
    points: Vec<[f64; 2]>,

    /// Which arrays to return: "times", "distances"
    out_arrays: Vec<&'static str>,

    profile: String,

    fail_fast: bool,
}

#[derive(Deserialize)]
struct MatrixSolution {
    /// Travel times in seconds; `null` cells are unreachable
    times: Vec<Vec<Option<f64>>>,

    /// Distances in meters
    distances: Vec<Vec<Option<f64>>>,
}

#[derive(Deserialize)]
struct RoutePath {
    points: Option<String>,
}

#[derive(Deserialize)]
struct RouteResponse {
    paths: Vec<RoutePath>,
}

pub struct GraphHopperClient {
    api_key: String,
    client: reqwest::Client,
}

impl GraphHopperClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub async fn fetch_matrix(
        &self,
        points: &[Point<f64>],
        vehicle_type: VehicleType,
    ) -> Result<TravelMatrices, ProviderError> {
        let profile = graphhopper_profile(vehicle_type);
        debug!(
            "GraphHopper: requesting matrix for {} locations, profile={profile}",
            points.len()
        );

        let body = MatrixRequestBody {
            points: points.iter().map(|p| [p.x(), p.y()]).collect(),
            out_arrays: vec!["times", "distances"],
            profile: profile.to_string(),
            fail_fast: false,
        };

        let response = self
            .client
            .post(GRAPHHOPPER_MATRIX_API_URL)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, message });
        }

        let solution: MatrixSolution = response.json().await?;

        if solution.distances.is_empty() || solution.times.is_empty() {
            return Err(ProviderError::EmptyMatrix);
        }

        let num_locations = points.len();
        let mut matrices = TravelMatrices::filled(num_locations);

        for (i, row) in solution.distances.iter().enumerate().take(num_locations) {
            for (j, distance) in row.iter().enumerate().take(num_locations) {
                let time = solution
                    .times
                    .get(i)
                    .and_then(|times_row| times_row.get(j))
                    .copied()
                    .flatten();

                if let (Some(distance), Some(time)) = (distance, time) {
                    matrices.set(i, j, distance.round() as i64, time.round() as i64);
                }
            }
        }

        Ok(matrices)
    }

    /// Encoded polyline for an ordered traversal, or `None` on any failure.
    pub async fn fetch_route(
        &self,
        points: &[Point<f64>],
        vehicle_type: VehicleType,
    ) -> Option<String> {
        if points.len() < 2 {
            warn!("GraphHopper: not enough locations for a route: {}", points.len());
            return None;
        }

        let body = serde_json::json!({
            "points": points.iter().map(|p| [p.x(), p.y()]).collect::<Vec<_>>(),
            "profile": graphhopper_profile(vehicle_type),
            "elevation": false,
            "instructions": false,
            "calc_points": true,
            "points_encoded": true,
        });

        let response = self
            .client
            .post(GRAPHHOPPER_ROUTE_API_URL)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!("GraphHopper route API error: {}", response.status());
                return None;
            }
            Err(error) => {
                warn!("GraphHopper route request failed: {error}");
                return None;
            }
        };

        match response.json::<RouteResponse>().await {
            Ok(route) => route.paths.into_iter().next().and_then(|path| path.points),
            Err(error) => {
                warn!("GraphHopper route response unreadable: {error}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_mapping() {
        assert_eq!(graphhopper_profile(VehicleType::Van), "car");
        assert_eq!(graphhopper_profile(VehicleType::Truck), "truck");
        assert_eq!(graphhopper_profile(VehicleType::Scooter), "scooter");
    }
}
