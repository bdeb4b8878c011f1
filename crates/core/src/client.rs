//! Clinical Records API client.
//!
//! [`ClinicalRecordsApi`] is the seam the controller talks to; [`HttpClinicalRecordsApi`] is
//! the reqwest implementation. Response-shape quirks are normalised here so the controller
//! only ever sees `Option`s:
//! - a non-2xx service request fetch or search is "not found", not an error
//! - an appointment lookup may answer 404, `null`, `[]`, `[{..}]` or `{..}`
//! - every call carries a deadline; expiry is reported as [`ApiError::Timeout`]

use crate::config::BookingConfig;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use fhir::{Appointment, AppointmentData, ResourceId, ServiceRequest, ServiceRequestData};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use std::time::Duration;

const OP_GET_SERVICE_REQUEST: &str = "service request fetch";
const OP_FIND_SERVICE_REQUEST: &str = "service request identifier search";
const OP_FIND_APPOINTMENT: &str = "appointment lookup";
const OP_CREATE_APPOINTMENT: &str = "appointment create";

/// Operations the booking workflow needs from the Clinical Records API.
#[async_trait]
pub trait ClinicalRecordsApi: Send + Sync {
    /// `GET /servicerequest/{id}`. `Ok(None)` on any non-2xx status.
    async fn get_service_request(&self, id: &ResourceId)
        -> ApiResult<Option<ServiceRequestData>>;

    /// `GET /servicerequest?system={system}&value={value}`. `Ok(None)` on any non-2xx
    /// status or an empty result.
    async fn find_service_request_by_identifier(
        &self,
        system: &str,
        value: &ResourceId,
    ) -> ApiResult<Option<ServiceRequestData>>;

    /// `GET /appointment/service-request/{id}`: id of an existing appointment, if any.
    async fn find_appointment_for_service_request(
        &self,
        service_request_id: &ResourceId,
    ) -> ApiResult<Option<ResourceId>>;

    /// `POST /appointment`: id of the created appointment.
    async fn create_appointment(&self, appointment: &AppointmentData) -> ApiResult<ResourceId>;
}

/// reqwest-backed [`ClinicalRecordsApi`].
#[derive(Clone, Debug)]
pub struct HttpClinicalRecordsApi {
    client: Client,
    base_url: Url,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl HttpClinicalRecordsApi {
    pub fn new(cfg: &BookingConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("radbook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Transport {
                operation: "client setup",
                source,
            })?;

        Ok(Self::with_client(client, cfg))
    }

    pub fn with_client(client: Client, cfg: &BookingConfig) -> Self {
        Self {
            client,
            base_url: cfg.api_base_url().clone(),
            read_timeout: cfg.read_timeout(),
            write_timeout: cfg.write_timeout(),
        }
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // http(s) URLs always have path segments; BookingConfig rejects other schemes.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> ApiResult<Response> {
        let response = request
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(operation, timeout, e))?;

        tracing::debug!(operation, status = %response.status(), "clinical records API response");
        Ok(response)
    }

    async fn read_json(
        operation: &'static str,
        timeout: Duration,
        response: Response,
    ) -> ApiResult<Option<serde_json::Value>> {
        let text = response
            .text()
            .await
            .map_err(|e| classify(operation, timeout, e))?;

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ApiError::Malformed {
                operation,
                detail: e.to_string(),
            })
    }

    async fn read_service_request(
        &self,
        operation: &'static str,
        response: Response,
    ) -> ApiResult<Option<ServiceRequestData>> {
        let Some(body) = Self::read_json(operation, self.read_timeout, response).await? else {
            return Ok(None);
        };
        let Some(resource) = fhir::first_resource(body) else {
            return Ok(None);
        };

        ServiceRequest::from_value(resource)
            .map(Some)
            .map_err(|e| ApiError::Malformed {
                operation,
                detail: e.to_string(),
            })
    }
}

fn classify(operation: &'static str, timeout: Duration, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout {
            operation,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else {
        ApiError::Transport {
            operation,
            source: err,
        }
    }
}

#[async_trait]
impl ClinicalRecordsApi for HttpClinicalRecordsApi {
    async fn get_service_request(
        &self,
        id: &ResourceId,
    ) -> ApiResult<Option<ServiceRequestData>> {
        let url = self.endpoint(&["servicerequest", id.as_str()]);
        let response = self
            .send(OP_GET_SERVICE_REQUEST, self.client.get(url), self.read_timeout)
            .await?;

        if !response.status().is_success() {
            return Ok(None);
        }
        self.read_service_request(OP_GET_SERVICE_REQUEST, response)
            .await
    }

    async fn find_service_request_by_identifier(
        &self,
        system: &str,
        value: &ResourceId,
    ) -> ApiResult<Option<ServiceRequestData>> {
        let url = self.endpoint(&["servicerequest"]);
        let request = self
            .client
            .get(url)
            .query(&[("system", system), ("value", value.as_str())]);
        let response = self
            .send(OP_FIND_SERVICE_REQUEST, request, self.read_timeout)
            .await?;

        if !response.status().is_success() {
            return Ok(None);
        }
        self.read_service_request(OP_FIND_SERVICE_REQUEST, response)
            .await
    }

    async fn find_appointment_for_service_request(
        &self,
        service_request_id: &ResourceId,
    ) -> ApiResult<Option<ResourceId>> {
        let url = self.endpoint(&["appointment", "service-request", service_request_id.as_str()]);
        let response = self
            .send(OP_FIND_APPOINTMENT, self.client.get(url), self.read_timeout)
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                operation: OP_FIND_APPOINTMENT,
                status: status.as_u16(),
            });
        }

        let body = Self::read_json(OP_FIND_APPOINTMENT, self.read_timeout, response).await?;
        Ok(body
            .and_then(fhir::first_resource)
            .and_then(|resource| fhir::resource_id_of(&resource)))
    }

    async fn create_appointment(&self, appointment: &AppointmentData) -> ApiResult<ResourceId> {
        let body = Appointment::to_value(appointment).map_err(|e| ApiError::Malformed {
            operation: OP_CREATE_APPOINTMENT,
            detail: e.to_string(),
        })?;
        let url = self.endpoint(&["appointment"]);
        let response = self
            .send(
                OP_CREATE_APPOINTMENT,
                self.client.post(url).json(&body),
                self.write_timeout,
            )
            .await?;

        let status = response.status();
        // The error body is optional; anything unreadable leaves `detail` empty.
        let body = Self::read_json(OP_CREATE_APPOINTMENT, self.write_timeout, response).await;

        if !status.is_success() {
            let detail = body.ok().flatten().and_then(|value| {
                value
                    .get("detail")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            });
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        body?
            .as_ref()
            .and_then(fhir::resource_id_of)
            .ok_or_else(|| ApiError::Malformed {
                operation: OP_CREATE_APPOINTMENT,
                detail: "created appointment has no id".into(),
            })
    }
}
