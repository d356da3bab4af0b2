use geo_types::Point;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    matrix::TravelMatrices, polyline, provider::ProviderError, vehicle_type::VehicleType,
};

pub const GEOAPIFY_BASE_URL: &str = "https://api.geoapify.com/v1";

pub fn geoapify_mode(vehicle_type: VehicleType) -> &'static str {
    match vehicle_type {
        VehicleType::Car | VehicleType::Van => "drive",
        VehicleType::Truck => "truck",
        VehicleType::Bike | VehicleType::Scooter => "bicycle",
        VehicleType::Foot => "walk",
    }
}

#[derive(Deserialize)]
struct MatrixCell {
    target_index: Option<usize>,
    distance: Option<f64>,
    time: Option<f64>,
}

#[derive(Deserialize)]
struct MatrixResponse {
    #[serde(default)]
    sources_to_targets: Vec<Vec<MatrixCell>>,
}

#[derive(Deserialize)]
struct RouteGeometry {
    #[serde(rename = "type")]
    geometry_type: String,
    coordinates: serde_json::Value,
}

#[derive(Deserialize)]
struct RouteFeature {
    geometry: Option<RouteGeometry>,
}

#[derive(Deserialize)]
struct RouteResponse {
    #[serde(default)]
    features: Vec<RouteFeature>,
}

pub struct GeoapifyClient {
    api_key: String,
    client: reqwest::Client,
}

impl GeoapifyClient {
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
        let mode = geoapify_mode(vehicle_type);
        debug!(
            "Geoapify: requesting matrix for {} locations, mode={mode}",
            points.len()
        );

        // Geoapify expects `{"location": [lng, lat]}` entries
        let locations: Vec<_> = points
            .iter()
            .map(|p| serde_json::json!({ "location": [p.x(), p.y()] }))
            .collect();

        let body = serde_json::json!({
            "mode": mode,
            "sources": locations.clone(),
            "targets": locations,
        });

        let url = format!("{GEOAPIFY_BASE_URL}/routematrix");
        let response = self
            .client
            .post(url)
            .query(&[("apiKey", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, message });
        }

        let matrix_response: MatrixResponse = response.json().await?;

        if matrix_response.sources_to_targets.is_empty() {
            return Err(ProviderError::EmptyMatrix);
        }

        let mut matrices = TravelMatrices::filled(points.len());

        for (source_index, targets) in matrix_response.sources_to_targets.iter().enumerate() {
            for cell in targets {
                let Some(target_index) = cell.target_index else {
                    continue;
                };

                if source_index >= points.len() || target_index >= points.len() {
                    continue;
                }

                if let (Some(distance), Some(time)) = (cell.distance, cell.time) {
                    matrices.set(
                        source_index,
                        target_index,
                        distance.round() as i64,
                        time.round() as i64,
                    );
                }
            }
        }

        Ok(matrices)
    }

    /// Fetches the route geometry and re-encodes it as a polyline, or `None`
    /// on any failure.
    pub async fn fetch_route(
        &self,
        points: &[Point<f64>],
        vehicle_type: VehicleType,
    ) -> Option<String> {
        if points.len() < 2 {
            warn!("Geoapify: not enough locations for a route: {}", points.len());
            return None;
        }

        // waypoints format: lat,lng|lat,lng|...
        let waypoints = points
            .iter()
            .map(|p| format!("{},{}", p.y(), p.x()))
            .collect::<Vec<_>>()
            .join("|");

        let url = format!("{GEOAPIFY_BASE_URL}/routing");
        let response = self
            .client
            .get(url)
            .query(&[
                ("waypoints", waypoints.as_str()),
                ("mode", geoapify_mode(vehicle_type)),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!("Geoapify route API error: {}", response.status());
                return None;
            }
            Err(error) => {
                warn!("Geoapify route request failed: {error}");
                return None;
            }
        };

        let route: RouteResponse = match response.json().await {
            Ok(route) => route,
            Err(error) => {
                warn!("Geoapify route response unreadable: {error}");
                return None;
            }
        };

        let geometry = route.features.into_iter().next()?.geometry?;
        let path = geometry_to_lat_lng(&geometry);

        if path.is_empty() {
            warn!("Geoapify: no usable coordinates in routing response");
            return None;
        }

        Some(polyline::encode(&path))
    }
}

/// Flattens GeoJSON LineString/MultiLineString coordinates into `(lat, lng)`
/// pairs.
fn geometry_to_lat_lng(geometry: &RouteGeometry) -> Vec<(f64, f64)> {
    fn pair(value: &serde_json::Value) -> Option<(f64, f64)> {
        let lng = value.get(0)?.as_f64()?;
        let lat = value.get(1)?.as_f64()?;
        Some((lat, lng))
    }

    let Some(coordinates) = geometry.coordinates.as_array() else {
        return Vec::new();
    };

    match geometry.geometry_type.as_str() {
        "LineString" => coordinates.iter().filter_map(pair).collect(),
        "MultiLineString" => coordinates
            .iter()
            .filter_map(|segment| segment.as_array())
            .flatten()
            .filter_map(pair)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_mapping() {
        assert_eq!(geoapify_mode(VehicleType::Car), "drive");
        assert_eq!(geoapify_mode(VehicleType::Van), "drive");
        assert_eq!(geoapify_mode(VehicleType::Bike), "bicycle");
        assert_eq!(geoapify_mode(VehicleType::Foot), "walk");
    }

    #[test]
    fn test_geometry_to_lat_lng_multi_line_string() {
        let geometry = RouteGeometry {
            geometry_type: "MultiLineString".to_string(),
            coordinates: serde_json::json!([
                [[4.36, 50.82], [4.37, 50.83]],
                [[4.38, 50.84]],
            ]),
        };

        let path = geometry_to_lat_lng(&geometry);

        assert_eq!(path, vec![(50.82, 4.36), (50.83, 4.37), (50.84, 4.38)]);
    }
}
