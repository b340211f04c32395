//! Error mapping from gateway errors to GraphQL errors.

use async_graphql::ErrorExtensions;
use vellum_common::{GatewayError, GatewayResult};

use crate::scalars::Json;

/// Convert a gateway error into an `async_graphql::Error`.
///
/// The machine-readable code travels in the `code` extension so clients can
/// branch on the error class without parsing messages.
pub fn gql_err(err: GatewayError) -> async_graphql::Error {
    let code = err.code();
    async_graphql::Error::new(err.to_string()).extend_with(|_, e| e.set("code", code))
}

/// Convert a serde_json parse error into an `async_graphql::Error`.
pub fn parse_err(e: serde_json::Error) -> async_graphql::Error {
    gql_err(GatewayError::from(e))
}

/// Convert an orchestration result into a typed GraphQL result.
///
/// Deserializes the JSON value from the upstream service into the expected
/// type `T`.
pub fn from_service<T: serde::de::DeserializeOwned>(
    result: GatewayResult<serde_json::Value>,
) -> async_graphql::Result<T> {
    let value = result.map_err(gql_err)?;
    serde_json::from_value(value).map_err(parse_err)
}

/// Convert an orchestration result into a raw JSON GraphQL result.
///
/// Returns the JSON value as-is, wrapped in the `Json` scalar. Use this for
/// payloads whose shape is owned by the upstream service.
pub fn from_service_json(result: GatewayResult<serde_json::Value>) -> async_graphql::Result<Json> {
    let value = result.map_err(gql_err)?;
    Ok(Json(value))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Probe {
        id: String,
    }

    #[test]
    fn gateway_error_carries_code_extension() {
        let err = gql_err(GatewayError::Unauthenticated);
        assert_eq!(err.message, "Authentication required");
        let ext = err.extensions.unwrap();
        assert_eq!(ext.get("code"), Some(&async_graphql::Value::from("UNAUTHENTICATED")));
    }

    #[test]
    fn from_service_deserializes_payloads() {
        let probe: Probe = from_service(Ok(json!({ "id": "doc-1" }))).unwrap();
        assert_eq!(probe.id, "doc-1");
    }

    #[test]
    fn from_service_reports_shape_mismatches() {
        let result: async_graphql::Result<Probe> = from_service(Ok(json!({ "id": 7 })));
        let err = result.unwrap_err();
        assert!(err.message.contains("failed to parse response"));
    }
}
