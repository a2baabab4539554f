//! Error types shared by the Supabase storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`SupabaseDaoError`] failures.
pub type SupabaseResult<T> = Result<T, SupabaseDaoError>;

/// Failures that can occur while interacting with the PostgREST API.
#[derive(Debug, Error)]
pub enum SupabaseDaoError {
    /// Required environment variable is missing.
    #[error("missing Supabase environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Supabase client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request to a table endpoint could not be sent.
    #[error("failed to send Supabase request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// PostgREST returned an unexpected status code.
    #[error("unexpected Supabase response status {status} for `{path}`: {body}")]
    RequestStatus {
        path: String,
        status: StatusCode,
        body: String,
    },
    /// Response payload could not be parsed into the expected rows.
    #[error("failed to decode Supabase response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A write returned no representation although one was requested.
    #[error("Supabase returned no row for `{path}`")]
    EmptyRepresentation { path: String },
}

impl From<SupabaseDaoError> for StorageError {
    fn from(err: SupabaseDaoError) -> Self {
        match err {
            SupabaseDaoError::RequestStatus { status, .. } if status.is_client_error() => {
                StorageError::rejected(err.to_string())
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
