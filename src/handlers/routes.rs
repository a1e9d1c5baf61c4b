use std::fmt;

use crate::auth::AccessTier;
use crate::models::{ApiError, ApiResult, RequestEnvelope};
use crate::repositories::room_repository::{IS_CLEANED, IS_FULL};
use crate::repositories::AttributeFilter;

pub const GUESTS: &str = "/guests";
pub const GUEST_BY_ID: &str = "/guests/{id}";
pub const ROOMS: &str = "/rooms";
pub const ROOM_BY_ID: &str = "/rooms/{id}";

/// Record type a route operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Guests,
    Rooms,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Guests => "guests",
            Resource::Rooms => "rooms",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository operation selected by a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ListAll,
    ListFiltered(AttributeFilter),
    Get(String),
    Create,
    Update(String),
    Delete(String),
}

impl Action {
    /// Metric label for the operation
    pub fn name(&self) -> &'static str {
        match self {
            Action::ListAll => "list_all",
            Action::ListFiltered(_) => "list_filtered",
            Action::Get(_) => "get",
            Action::Create => "create",
            Action::Update(_) => "update",
            Action::Delete(_) => "delete",
        }
    }

    pub fn requires_body(&self) -> bool {
        matches!(self, Action::Create | Action::Update(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub resource: Resource,
    pub action: Action,
    pub tier: AccessTier,
}

/// Map an inbound envelope onto a route; anything not in the table is a bad request
pub fn resolve(envelope: &RequestEnvelope) -> ApiResult<Route> {
    let method = envelope.http_method.to_ascii_uppercase();

    let (resource, action) = match (envelope.resource_path.as_str(), method.as_str()) {
        (GUESTS, "GET") => (Resource::Guests, Action::ListAll),
        (GUESTS, "POST") => (Resource::Guests, Action::Create),
        (GUEST_BY_ID, "GET") => (Resource::Guests, Action::Get(path_id(envelope)?)),
        (GUEST_BY_ID, "PUT") => (Resource::Guests, Action::Update(path_id(envelope)?)),
        (GUEST_BY_ID, "DELETE") => (Resource::Guests, Action::Delete(path_id(envelope)?)),
        (ROOMS, "GET") => (Resource::Rooms, room_listing(envelope)?),
        (ROOMS, "POST") => (Resource::Rooms, Action::Create),
        (ROOM_BY_ID, "GET") => (Resource::Rooms, Action::Get(path_id(envelope)?)),
        (ROOM_BY_ID, "PUT") => (Resource::Rooms, Action::Update(path_id(envelope)?)),
        (ROOM_BY_ID, "DELETE") => (Resource::Rooms, Action::Delete(path_id(envelope)?)),
        (path, method) => {
            return Err(ApiError::bad_request(format!(
                "No route for {} {}",
                method, path
            )))
        }
    };

    let tier = match (&resource, &action) {
        (_, Action::Create | Action::Update(_) | Action::Delete(_)) => AccessTier::Admin,
        // Single-guest lookups are only exposed to the web client
        (Resource::Guests, Action::Get(_)) => AccessTier::WEB_ONLY,
        _ => AccessTier::WEB_OR_MOBILE,
    };

    Ok(Route {
        resource,
        action,
        tier,
    })
}

fn path_id(envelope: &RequestEnvelope) -> ApiResult<String> {
    envelope
        .path_parameter("id")
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("Missing id path parameter"))
}

fn room_listing(envelope: &RequestEnvelope) -> ApiResult<Action> {
    let cleaned = envelope.query_parameter(IS_CLEANED);
    let full = envelope.query_parameter(IS_FULL);

    match (cleaned, full) {
        (None, None) => Ok(Action::ListAll),
        (Some(value), None) => Ok(Action::ListFiltered(AttributeFilter::equals(
            IS_CLEANED,
            parse_flag(IS_CLEANED, value)?,
        ))),
        (None, Some(value)) => Ok(Action::ListFiltered(AttributeFilter::equals(
            IS_FULL,
            parse_flag(IS_FULL, value)?,
        ))),
        (Some(_), Some(_)) => Err(ApiError::bad_request(
            "Rooms can be filtered by one attribute at a time",
        )),
    }
}

fn parse_flag(name: &str, value: &str) -> ApiResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ApiError::bad_request(format!(
            "{} must be true or false, got {}",
            name, other
        ))),
    }
}

/// Split a concrete request path into its resource pattern and `id` parameter
///
/// `/guests/abc` becomes `("/guests/{id}", Some("abc"))`. The id segment is
/// percent-decoded. Unknown paths and ids that do not decode to UTF-8 yield `None`.
pub fn match_path(path: &str) -> Option<(&'static str, Option<String>)> {
    let trimmed = path.trim_end_matches('/');
    let mut segments = trimmed.trim_start_matches('/').split('/');

    let collection = match segments.next()? {
        "guests" => (GUESTS, GUEST_BY_ID),
        "rooms" => (ROOMS, ROOM_BY_ID),
        _ => return None,
    };

    match (segments.next(), segments.next()) {
        (None, _) => Some((collection.0, None)),
        (Some(id), None) if !id.is_empty() => urlencoding::decode(id)
            .ok()
            .map(|id| (collection.1, Some(id.into_owned()))),
        _ => None,
    }
}
