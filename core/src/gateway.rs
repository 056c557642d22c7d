//! The Remote Data Gateway contract.
//!
//! A gateway persists records somewhere else and answers every request with a
//! [`RemoteResponse`]. The engine never looks past `into_result()`: any error is a failure,
//! whatever transport detail produced it.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{RejectionKind, RemoteError},
    id::RecordId,
    record::Record,
};

pub use memory::{MemoryGateway, Release};

/// `{ data, error }` as returned by a backend client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResponse<T> {
    pub data: Option<T>,
    pub error: Option<RemoteError>,
}

impl<T> RemoteResponse<T> {
    pub fn ok(data: T) -> Self { Self { data: Some(data), error: None } }

    pub fn err(error: RemoteError) -> Self { Self { data: None, error: Some(error) } }

    /// Any error wins; no error and no data is an empty-response rejection.
    pub fn into_result(self) -> Result<T, RemoteError> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(RemoteError::rejected(RejectionKind::Other, "empty response")),
        }
    }
}

impl<T> From<Result<T, RemoteError>> for RemoteResponse<T> {
    fn from(result: Result<T, RemoteError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::err(error),
        }
    }
}

/// Equality filters and ordering for `list`, in the spirit of `.eq("alliance_id", id).order("name")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub filters: Vec<(String, String)>,
    pub order_by: Option<String>,
    pub descending: bool,
}

impl Scope {
    pub fn all() -> Self { Self::default() }

    pub fn eq(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((field.into(), value.to_string()));
        self
    }

    pub fn order(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Newest or largest first.
    pub fn order_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self.descending = true;
        self
    }
}

/// Request/response access to one persisted table.
#[async_trait]
pub trait Gateway<T: Record>: Send + Sync + 'static {
    async fn list(&self, scope: &Scope) -> RemoteResponse<Vec<T>>;

    /// Persist a new record. The response carries the server's version, including its id.
    async fn create(&self, draft: T) -> RemoteResponse<T>;

    async fn update(&self, record: T) -> RemoteResponse<T>;

    async fn delete(&self, id: RecordId) -> RemoteResponse<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_wins_over_data() {
        let response = RemoteResponse { data: Some(1), error: Some(RemoteError::transport("reset")) };
        assert_eq!(response.into_result(), Err(RemoteError::transport("reset")));
        assert_eq!(RemoteResponse::ok(1).into_result(), Ok(1));
    }

    #[test]
    fn test_empty_response_is_rejection() {
        let response: RemoteResponse<u8> = RemoteResponse { data: None, error: None };
        assert_eq!(response.into_result().unwrap_err().rejection_kind(), Some(RejectionKind::Other));
    }

    #[test]
    fn test_wire_shape() {
        let response: RemoteResponse<u8> = serde_json::from_str(r#"{ "data": 4, "error": null }"#).unwrap();
        assert_eq!(response, RemoteResponse::ok(4));
    }
}
