//! REST client for the `/api/v1` endpoints.
//!
//! Every successful response is a `{ "data": ... }` envelope; failures carry
//! `{ "error": message, "code": CODE }`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use steeple_core::attendance::{
    AttendanceEntry, AttendanceKey, AttendanceRow, AttendanceSheet, AttendanceSummary, MemberRef,
    ServiceType,
};
use steeple_core::board::ScheduleCard;
use steeple_core::schedule::{ScheduleDefinition, ScheduleInput};
use steeple_core::store::{AttendanceStore, ScheduleStore, TransportError};
use steeple_core::types::DbId;

use crate::config::ClientConfig;

/// Errors from the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never got an answer (connect, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
}

impl From<ClientError> for TransportError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Request(e) => match e.status() {
                Some(status) => TransportError::status(status.as_u16(), e.to_string()),
                None => TransportError::network(e.to_string()),
            },
            ClientError::ApiError { status, message } => TransportError::status(status, message),
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct UpsertBody<'a> {
    #[serde(flatten)]
    key: AttendanceKey,
    items: &'a [AttendanceEntry],
}

#[derive(Serialize)]
struct MoveBody<'a> {
    from_date: chrono::NaiveDate,
    from_type: ServiceType,
    to_date: chrono::NaiveDate,
    to_type: ServiceType,
    items: &'a [AttendanceEntry],
}

/// Occurrences of one schedule within a window.
#[derive(Debug, Clone, Deserialize)]
pub struct OccurrenceList {
    pub schedule_id: DbId,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub occurrences: Vec<NaiveDateTime>,
}

/// HTTP client for one Steeple server.
#[derive(Debug, Clone)]
pub struct SteepleApi {
    client: reqwest::Client,
    api_url: String,
}

impl SteepleApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.api_url)
    }

    // ---- members ----

    pub async fn list_members(&self) -> Result<Vec<MemberRef>, ClientError> {
        let response = self.client.get(self.url("/members")).send().await?;
        Self::parse_data(response).await
    }

    // ---- attendance ----

    pub async fn get_roster(&self, key: AttendanceKey) -> Result<AttendanceSheet, ClientError> {
        let response = self
            .client
            .get(self.url("/attendance"))
            .query(&key_query(key))
            .send()
            .await?;
        Self::parse_data(response).await
    }

    pub async fn get_summary(&self, key: AttendanceKey) -> Result<AttendanceSummary, ClientError> {
        let response = self
            .client
            .get(self.url("/attendance/summary"))
            .query(&key_query(key))
            .send()
            .await?;
        Self::parse_data(response).await
    }

    pub async fn save_attendance(
        &self,
        key: AttendanceKey,
        items: &[AttendanceEntry],
    ) -> Result<AttendanceSheet, ClientError> {
        let response = self
            .client
            .post(self.url("/attendance"))
            .json(&UpsertBody { key, items })
            .send()
            .await?;
        Self::parse_data(response).await
    }

    pub async fn move_attendance(
        &self,
        from: AttendanceKey,
        to: AttendanceKey,
        items: &[AttendanceEntry],
    ) -> Result<AttendanceSheet, ClientError> {
        let body = MoveBody {
            from_date: from.date,
            from_type: from.service_type,
            to_date: to.date,
            to_type: to.service_type,
            items,
        };
        let response = self
            .client
            .put(self.url("/attendance"))
            .json(&body)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    // ---- schedules ----

    pub async fn get_schedules(&self) -> Result<Vec<ScheduleDefinition>, ClientError> {
        let response = self.client.get(self.url("/schedules")).send().await?;
        Self::parse_data(response).await
    }

    pub async fn get_schedule(&self, id: DbId) -> Result<ScheduleDefinition, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/schedules/{id}")))
            .send()
            .await?;
        Self::parse_data(response).await
    }

    pub async fn post_schedule(
        &self,
        input: &ScheduleInput,
    ) -> Result<ScheduleDefinition, ClientError> {
        let response = self
            .client
            .post(self.url("/schedules"))
            .json(input)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    pub async fn put_schedule(
        &self,
        id: DbId,
        input: &ScheduleInput,
    ) -> Result<ScheduleDefinition, ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/schedules/{id}")))
            .json(input)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    pub async fn remove_schedule(&self, id: DbId) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/schedules/{id}")))
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Server-side annotations. `at` defaults to the server's clock.
    pub async fn overview(&self, at: Option<NaiveDateTime>) -> Result<Vec<ScheduleCard>, ClientError> {
        let mut request = self.client.get(self.url("/schedules/overview"));
        if let Some(at) = at {
            request = request.query(&[("at", at.format("%Y-%m-%dT%H:%M:%S").to_string())]);
        }
        Self::parse_data(request.send().await?).await
    }

    pub async fn occurrences(
        &self,
        id: DbId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<OccurrenceList, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/schedules/{id}/occurrences")))
            .query(&[
                ("from", from.format("%Y-%m-%dT%H:%M:%S").to_string()),
                ("to", to.format("%Y-%m-%dT%H:%M:%S").to_string()),
            ])
            .send()
            .await?;
        Self::parse_data(response).await
    }

    // ---- private helpers ----

    /// Return the response unchanged on 2xx, otherwise an
    /// [`ClientError::ApiError`] carrying the server's message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);

        tracing::debug!(status = status.as_u16(), %message, "API request failed");
        Err(ClientError::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Envelope<T>>().await?.data)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

fn key_query(key: AttendanceKey) -> [(&'static str, String); 2] {
    [
        ("date", key.date.to_string()),
        ("type", key.service_type.as_str().to_string()),
    ]
}

#[async_trait]
impl AttendanceStore for SteepleApi {
    async fn load_records(&self, key: AttendanceKey) -> Result<Vec<AttendanceRow>, TransportError> {
        Ok(self.get_roster(key).await?.items)
    }

    async fn upsert_batch(
        &self,
        key: AttendanceKey,
        entries: &[AttendanceEntry],
    ) -> Result<Vec<AttendanceRow>, TransportError> {
        Ok(self.save_attendance(key, entries).await?.items)
    }

    async fn move_batch(
        &self,
        from: AttendanceKey,
        to: AttendanceKey,
        entries: &[AttendanceEntry],
    ) -> Result<Vec<AttendanceRow>, TransportError> {
        Ok(self.move_attendance(from, to, entries).await?.items)
    }
}

#[async_trait]
impl ScheduleStore for SteepleApi {
    async fn list_schedules(&self) -> Result<Vec<ScheduleDefinition>, TransportError> {
        Ok(self.get_schedules().await?)
    }

    async fn create_schedule(
        &self,
        input: &ScheduleInput,
    ) -> Result<ScheduleDefinition, TransportError> {
        Ok(self.post_schedule(input).await?)
    }

    async fn update_schedule(
        &self,
        id: DbId,
        input: &ScheduleInput,
    ) -> Result<ScheduleDefinition, TransportError> {
        Ok(self.put_schedule(id, input).await?)
    }

    async fn delete_schedule(&self, id: DbId) -> Result<(), TransportError> {
        Ok(self.remove_schedule(id).await?)
    }
}
