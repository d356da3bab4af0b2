use std::time::Duration;

use geo_types::Point;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    matrix::TravelMatrices,
    provider::{ProviderError, use_sync_matrix},
    vehicle_type::VehicleType,
};

pub const TOMTOM_MATRIX_BASE_URL: &str = "https://api.tomtom.com/routing/matrix/2";

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLL_ATTEMPTS: u32 = 60;

pub fn tomtom_travel_mode(vehicle_type: VehicleType) -> &'static str {
    match vehicle_type {
        VehicleType::Car | VehicleType::Van => "car",
        VehicleType::Truck => "truck",
        // TomTom has no bicycle mode on the matrix API
        VehicleType::Bike | VehicleType::Scooter | VehicleType::Foot => "pedestrian",
    }
}

#[derive(Deserialize)]
struct RouteSummary {
    #[serde(rename = "lengthInMeters")]
    length_in_meters: Option<f64>,
    #[serde(rename = "travelTimeInSeconds")]
    travel_time_in_seconds: Option<f64>,
}

#[derive(Deserialize)]
struct MatrixCell {
    #[serde(rename = "originIndex")]
    origin_index: Option<usize>,
    #[serde(rename = "destinationIndex")]
    destination_index: Option<usize>,
    #[serde(rename = "routeSummary")]
    route_summary: Option<RouteSummary>,
}

#[derive(Deserialize)]
struct MatrixResponse {
    #[serde(default)]
    data: Vec<MatrixCell>,
}

#[derive(Deserialize)]
struct AsyncSubmitResponse {
    #[serde(rename = "jobId")]
    job_id: Option<String>,
}

#[derive(Deserialize)]
struct AsyncStatusResponse {
    state: String,
}

pub struct TomTomClient {
    api_key: String,
    client: reqwest::Client,
}

impl TomTomClient {
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
        let body = TomTomClient::build_request_body(points, vehicle_type);

        let response = if use_sync_matrix(points.len()) {
            debug!("TomTom: sync matrix request for {} locations", points.len());
            self.sync_matrix_request(&body).await?
        } else {
            debug!("TomTom: async matrix request for {} locations", points.len());
            self.async_matrix_request(&body).await?
        };

        if response.data.is_empty() {
            return Err(ProviderError::EmptyMatrix);
        }

        let mut matrices = TravelMatrices::filled(points.len());

        for cell in &response.data {
            let (Some(origin), Some(destination)) = (cell.origin_index, cell.destination_index)
            else {
                continue;
            };

            if origin >= points.len() || destination >= points.len() {
                continue;
            }

            // Cells with a detailedError instead of a summary stay unreachable
            if let Some(summary) = &cell.route_summary {
                if let (Some(length), Some(time)) =
                    (summary.length_in_meters, summary.travel_time_in_seconds)
                {
                    matrices.set(origin, destination, length.round() as i64, time.round() as i64);
                }
            }
        }

        Ok(matrices)
    }

    fn build_request_body(points: &[Point<f64>], vehicle_type: VehicleType) -> serde_json::Value {
        let locations: Vec<_> = points
            .iter()
            .map(|p| serde_json::json!({ "point": { "latitude": p.y(), "longitude": p.x() } }))
            .collect();

        serde_json::json!({
            "origins": locations,
            "destinations": locations,
            "options": {
                "departAt": "now",
                "traffic": "live",
                "routeType": "fastest",
                "travelMode": tomtom_travel_mode(vehicle_type),
            },
        })
    }

    async fn sync_matrix_request(
        &self,
        body: &serde_json::Value,
    ) -> Result<MatrixResponse, ProviderError> {
        let response = self
            .client
            .post(TOMTOM_MATRIX_BASE_URL)
            .query(&[("key", &self.api_key)])
            .json(body)
            .send()
            .await?;

        TomTomClient::handle_response(response).await
    }

    async fn async_matrix_request(
        &self,
        body: &serde_json::Value,
    ) -> Result<MatrixResponse, ProviderError> {
        let submit_url = format!("{TOMTOM_MATRIX_BASE_URL}/async");
        let submit_response = self
            .client
            .post(submit_url)
            .query(&[("key", &self.api_key)])
            .json(body)
            .send()
            .await?;

        if !submit_response.status().is_success() {
            let status = submit_response.status().as_u16();
            let message = submit_response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, message });
        }

        let submit: AsyncSubmitResponse = submit_response.json().await?;
        let job_id = submit
            .job_id
            .ok_or_else(|| ProviderError::JobFailed("submission returned no jobId".to_string()))?;

        debug!("TomTom: async matrix job submitted: {job_id}");

        self.poll_until_completed(&job_id).await?;

        let result_url = format!("{TOMTOM_MATRIX_BASE_URL}/async/{job_id}/result");
        let result_response = self
            .client
            .get(result_url)
            .query(&[("key", &self.api_key)])
            .send()
            .await?;

        TomTomClient::handle_response(result_response).await
    }

    async fn poll_until_completed(&self, job_id: &str) -> Result<(), ProviderError> {
        let status_url = format!("{TOMTOM_MATRIX_BASE_URL}/async/{job_id}");

        for attempt in 1..=MAX_POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;

            let response = self
                .client
                .get(&status_url)
                .query(&[("key", &self.api_key)])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let message = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api { status, message });
            }

            let status: AsyncStatusResponse = response.json().await?;
            debug!(
                "TomTom: async matrix job state {} ({}/{})",
                status.state, attempt, MAX_POLL_ATTEMPTS
            );

            match status.state.as_str() {
                "Completed" => return Ok(()),
                "Failed" => return Err(ProviderError::JobFailed(status.state)),
                _ => {}
            }
        }

        Err(ProviderError::Timeout(MAX_POLL_ATTEMPTS))
    }

    async fn handle_response(response: reqwest::Response) -> Result<MatrixResponse, ProviderError> {
        if response.status().is_success() {
            let matrix_response: MatrixResponse = response.json().await?;
            Ok(matrix_response)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(ProviderError::Api { status, message })
        }
    }

    /// The matrix API has no route geometry endpoint.
    pub async fn fetch_route(
        &self,
        _points: &[Point<f64>],
        _vehicle_type: VehicleType,
    ) -> Option<String> {
        warn!("TomTom matrix client does not serve route polylines");
        None
    }
}
