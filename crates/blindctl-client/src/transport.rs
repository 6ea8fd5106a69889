//! The transport seam between the panel and the device.
//!
//! [`Transport`] moves raw JSON; [`fetch_list`] and [`send`] add the typed
//! contract on top. Nothing here retries: a failed call is reported once and
//! the caller decides what to do with it.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::{NetworkError, Result};

/// Raw JSON request/response channel to the device.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a read and return the decoded JSON body.
    async fn get(&self, endpoint: Endpoint) -> Result<Value>;

    /// Issue a JSON-bodied write and return the decoded JSON body.
    ///
    /// An empty acknowledgement body is returned as `Value::Null`.
    async fn post(&self, endpoint: Endpoint, payload: Value) -> Result<Value>;
}

/// Read `endpoint` and decode its JSON array body.
///
/// Any body that is not an array of `T` is a [`NetworkError::Malformed`].
pub async fn fetch_list<T: DeserializeOwned>(
    transport: &dyn Transport,
    endpoint: Endpoint,
) -> Result<Vec<T>> {
    let body = transport.get(endpoint).await?;
    if !body.is_array() {
        return Err(NetworkError::Malformed {
            endpoint: endpoint.path().to_string(),
            message: format!("expected a JSON array, got {}", json_kind(&body)),
        });
    }
    decode(endpoint, body)
}

/// Read `endpoint` and decode its body as a single `T`.
pub async fn fetch_one<T: DeserializeOwned>(
    transport: &dyn Transport,
    endpoint: Endpoint,
) -> Result<T> {
    let body = transport.get(endpoint).await?;
    decode(endpoint, body)
}

/// Post `payload` to `endpoint` and decode the reply as `T`.
///
/// Use `T = Value` to accept any acknowledgement body.
pub async fn send<T, P>(transport: &dyn Transport, endpoint: Endpoint, payload: &P) -> Result<T>
where
    T: DeserializeOwned,
    P: Serialize + ?Sized,
{
    let payload = serde_json::to_value(payload).map_err(|e| NetworkError::Encode {
        endpoint: endpoint.path().to_string(),
        message: e.to_string(),
    })?;
    let body = transport.post(endpoint, payload).await?;
    decode(endpoint, body)
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| NetworkError::Malformed {
        endpoint: endpoint.path().to_string(),
        message: e.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use blindctl_core::Channel;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_list_decodes_array() {
        let transport = MockTransport::new().with_response(
            Endpoint::Remotes,
            json!([{"id": 1, "name": "Kitchen", "enabled": true, "rolling_code": 3}]),
        );
        let channels: Vec<Channel> = fetch_list(&transport, Endpoint::Remotes).await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].rolling_code, 3);
    }

    #[tokio::test]
    async fn test_fetch_list_rejects_object() {
        let transport =
            MockTransport::new().with_response(Endpoint::Remotes, json!({"message": "nope"}));
        let err = fetch_list::<Channel>(&transport, Endpoint::Remotes)
            .await
            .unwrap_err();
        match err {
            NetworkError::Malformed { message, .. } => assert!(message.contains("an object")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_send_records_payload() {
        let transport = MockTransport::new();
        let _: Value = send(&transport, Endpoint::CoreRestart, &json!({}))
            .await
            .unwrap();
        assert_eq!(
            transport.requests(),
            vec![(Endpoint::CoreRestart, Some(json!({})))]
        );
    }
}
