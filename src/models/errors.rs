use thiserror::Error;

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("DynamoDB table not found: {table_name}. Ensure the table exists and IAM permissions are correct.")]
    TableNotFound { table_name: String },

    #[error("AWS SDK error: {message}")]
    AwsSdk { message: String },

    #[error("Invalid item: {message}")]
    InvalidItem { message: String },

    #[error("Invalid query parameters: {message}")]
    InvalidQuery { message: String },
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// True for failures of the store itself rather than of the request
    pub fn is_store_fault(&self) -> bool {
        matches!(
            self,
            RepositoryError::Conflict { .. }
                | RepositoryError::TableNotFound { .. }
                | RepositoryError::AwsSdk { .. }
                | RepositoryError::InvalidItem { .. }
        )
    }
}

/// Errors produced while dispatching an inbound request
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request")]
    BadRequest { reason: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden { reason: String },

    /// Caller is on the block list; the message carries the configured reason
    #[error("{message}")]
    Blocked { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("Internal server error")]
    StoreFault {
        #[source]
        source: RepositoryError,
    },
}

impl ApiError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        ApiError::BadRequest {
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest { .. } => 400,
            ApiError::Unauthorized => 401,
            ApiError::Forbidden { .. } | ApiError::Blocked { .. } => 403,
            ApiError::NotFound { .. } => 404,
            ApiError::StoreFault { .. } => 500,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => ApiError::NotFound {
                message: err.to_string(),
            },
            RepositoryError::InvalidQuery { message } => ApiError::BadRequest { reason: message },
            other => ApiError::StoreFault { source: other },
        }
    }
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for request dispatch
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RepositoryError::NotFound {
            entity: "Guest",
            id: "g-1".to_string(),
        };
        assert_eq!(error.to_string(), "Guest not found");

        let error = ApiError::bad_request("missing body");
        assert_eq!(error.to_string(), "Bad request");
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let api_error: ApiError = RepositoryError::NotFound {
            entity: "Room",
            id: "r-1".to_string(),
        }
        .into();

        assert_eq!(api_error.status_code(), 404);
        assert_eq!(api_error.to_string(), "Room not found");
    }

    #[test]
    fn test_store_errors_map_to_server_fault() {
        let cases = vec![
            RepositoryError::AwsSdk {
                message: "throttled".to_string(),
            },
            RepositoryError::TableNotFound {
                table_name: "guests".to_string(),
            },
            RepositoryError::Conflict {
                message: "id collision".to_string(),
            },
        ];

        for repo_error in cases {
            assert!(repo_error.is_store_fault());
            let api_error: ApiError = repo_error.into();
            assert_eq!(api_error.status_code(), 500);
            assert_eq!(api_error.to_string(), "Internal server error");
        }
    }

    #[test]
    fn test_blocked_renders_reason() {
        let error = ApiError::Blocked {
            message: "This user is blocked. Reason: PAYMENT".to_string(),
        };
        assert_eq!(error.status_code(), 403);
        assert_eq!(error.to_string(), "This user is blocked. Reason: PAYMENT");

        let error = ApiError::Forbidden {
            reason: "Requires membership of admin".to_string(),
        };
        assert_eq!(error.to_string(), "Forbidden");
    }

    #[test]
    fn test_invalid_query_is_client_error() {
        let api_error: ApiError = RepositoryError::InvalidQuery {
            message: "guestName is not filterable".to_string(),
        }
        .into();
        assert_eq!(api_error.status_code(), 400);
    }
}
