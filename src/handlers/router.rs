use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::routes::{resolve, Action, Resource};
use crate::auth::AccessPolicy;
use crate::{error_with_trace, info_with_trace};
use crate::models::{ApiError, ApiResult, RepositoryError, RequestEnvelope, ResponseEnvelope};
use crate::observability::metrics::Outcome;
use crate::observability::Metrics;
use crate::repositories::{Entity, GuestRepository, Repository, RoomRepository};

/// Maps inbound envelopes onto repository operations
///
/// A request rejected by routing or by the access policy never reaches the store.
#[derive(Clone)]
pub struct RequestRouter {
    guests: GuestRepository,
    rooms: RoomRepository,
    policy: AccessPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl RequestRouter {
    pub fn new(guests: GuestRepository, rooms: RoomRepository, policy: AccessPolicy) -> Self {
        Self {
            guests,
            rooms,
            policy,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Handle one call end to end; every outcome becomes a response envelope
    pub async fn dispatch(&self, envelope: RequestEnvelope) -> ResponseEnvelope {
        let request_id = envelope
            .request_context
            .request_id
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let invocation_id = Uuid::new_v4().to_string();

        let span = tracing::info_span!(
            "dispatch",
            request_id = %request_id,
            invocation_id = %invocation_id,
            http.method = %envelope.http_method,
            http.route = %envelope.resource_path,
            http.status_code = tracing::field::Empty,
        );

        async {
            let response = match self.handle(&envelope).await {
                Ok(response) => response,
                Err(error) => self.error_response(&error, &request_id, &invocation_id),
            };

            tracing::Span::current().record("http.status_code", response.status_code);
            info_with_trace!(status_code = response.status_code, "Request dispatched");
            response
        }
        .instrument(span)
        .await
    }

    async fn handle(&self, envelope: &RequestEnvelope) -> ApiResult<ResponseEnvelope> {
        let route = resolve(envelope)?;
        let credential = self.policy.authorize(route.tier, envelope.claims())?;
        debug!(subject = %credential.subject, resource = %route.resource, operation = route.action.name(), "Caller authorized");

        match route.resource {
            Resource::Guests => {
                self.execute(&self.guests, route.resource, route.action, envelope.body.as_deref())
                    .await
            }
            Resource::Rooms => {
                self.execute(&self.rooms, route.resource, route.action, envelope.body.as_deref())
                    .await
            }
        }
    }

    async fn execute<E>(
        &self,
        repository: &Repository<E>,
        resource: Resource,
        action: Action,
        body: Option<&str>,
    ) -> ApiResult<ResponseEnvelope>
    where
        E: Entity + Serialize + DeserializeOwned,
    {
        let input = if action.requires_body() {
            Some(parse_body::<E>(body)?)
        } else {
            None
        };

        let operation = action.name();
        let start_time = Instant::now();

        let result = match (action, input) {
            (Action::ListAll, _) => repository
                .list_all()
                .await
                .map(|records| ResponseEnvelope::json(200, &records)),
            (Action::ListFiltered(filter), _) => repository
                .list_filtered(filter)
                .await
                .map(|records| ResponseEnvelope::json(200, &records)),
            (Action::Get(id), _) => repository
                .get_by_id(&id)
                .await
                .map(|record| ResponseEnvelope::json(200, &record)),
            (Action::Create, Some(input)) => repository
                .create(input)
                .await
                .map(|record| ResponseEnvelope::json(201, &record)),
            (Action::Update(id), Some(input)) => repository
                .update(&id, input)
                .await
                .map(|record| ResponseEnvelope::json(200, &record)),
            (Action::Delete(id), _) => repository
                .delete(&id)
                .await
                .map(|record| ResponseEnvelope::json(200, &record)),
            (_, None) => return Err(ApiError::bad_request("Missing request body")),
        };

        self.record(resource, operation, &result, start_time);
        result.map_err(ApiError::from)
    }

    fn record<T>(
        &self,
        resource: Resource,
        operation: &str,
        result: &Result<T, RepositoryError>,
        start_time: Instant,
    ) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        let outcome = match result {
            Ok(_) => Outcome::Success,
            Err(e) if e.is_not_found() => Outcome::NotFound,
            Err(e) if e.is_store_fault() => Outcome::Fault,
            Err(_) => Outcome::Rejected,
        };

        metrics.record_repository_operation(
            resource.as_str(),
            operation,
            outcome,
            start_time.elapsed().as_secs_f64(),
        );
    }

    fn error_response(
        &self,
        error: &ApiError,
        request_id: &str,
        invocation_id: &str,
    ) -> ResponseEnvelope {
        match error {
            ApiError::StoreFault { source } => {
                error_with_trace!(
                    request_id = %request_id,
                    invocation_id = %invocation_id,
                    error = %source,
                    "Store fault while handling request"
                );
            }
            ApiError::BadRequest { reason } => {
                info!(reason = %reason, "Rejected bad request");
            }
            ApiError::Unauthorized => {
                info!("Rejected request without credentials");
            }
            ApiError::Forbidden { reason } => {
                warn!(reason = %reason, "Rejected request by access policy");
            }
            ApiError::Blocked { message } => {
                warn!(reason = %message, "Rejected request from blocked user");
            }
            ApiError::NotFound { .. } => {}
        }

        ResponseEnvelope::message(error.status_code(), error.to_string())
    }
}

fn parse_body<E: DeserializeOwned>(body: Option<&str>) -> ApiResult<E> {
    let body = body
        .map(str::trim)
        .filter(|body| !body.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing request body"))?;

    serde_json::from_str(body).map_err(|e| ApiError::bad_request(format!("Malformed body: {}", e)))
}
