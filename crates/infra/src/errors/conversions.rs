//! Conversions from external infrastructure errors into domain errors.

use feedminder_domain::FeedminderError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FeedminderError);

impl From<InfraError> for FeedminderError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FeedminderError> for InfraError {
    fn from(value: FeedminderError) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for InfraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for InfraError {}

trait IntoFeedminderError {
    fn into_feedminder(self) -> FeedminderError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → FeedminderError */
/* -------------------------------------------------------------------------- */

impl IntoFeedminderError for SqlError {
    fn into_feedminder(self) -> FeedminderError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => FeedminderError::Database("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        FeedminderError::Database("database is locked".into())
                    }
                    ErrorCode::NotADatabase => {
                        FeedminderError::Database("file is not a database".into())
                    }
                    _ => FeedminderError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => FeedminderError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                FeedminderError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                FeedminderError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => FeedminderError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => FeedminderError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_feedminder())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → FeedminderError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        Self(FeedminderError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FeedminderError */
/* -------------------------------------------------------------------------- */

impl IntoFeedminderError for HttpError {
    fn into_feedminder(self) -> FeedminderError {
        if self.is_timeout() {
            return FeedminderError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return FeedminderError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return FeedminderError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown status").to_string(),
            };
        }

        if self.is_decode() {
            return FeedminderError::Internal(format!("failed to decode response body: {self}"));
        }

        FeedminderError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_feedminder())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → FeedminderError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(FeedminderError::Internal(format!("JSON (de)serialization failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use rusqlite::ffi::{Error as FfiError, ErrorCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn sqlite_busy_maps_to_database_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        );

        let mapped: FeedminderError = InfraError::from(err).into();
        match mapped {
            FeedminderError::Database(msg) => assert!(msg.contains("busy")),
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let mapped: FeedminderError = InfraError::from(SqlError::QueryReturnedNoRows).into();
        assert!(matches!(mapped, FeedminderError::NotFound(_)));
    }

    #[test]
    fn malformed_json_maps_to_internal() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let mapped: FeedminderError = InfraError::from(err).into();
        assert!(matches!(mapped, FeedminderError::Internal(_)));
    }

    #[tokio::test]
    async fn http_status_keeps_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::SERVICE_UNAVAILABLE))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: FeedminderError = InfraError::from(error).into();
        assert_eq!(
            mapped,
            FeedminderError::Http { status: 503, message: "Service Unavailable".into() }
        );
        assert!(mapped.is_transient());
    }
}
