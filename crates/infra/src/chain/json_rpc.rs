//! JSON-RPC 2.0 client for a Sui fullnode.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, instrument};

use coffeeclub_core::ObjectId;
use coffeeclub_events::{EventCursor, EventFilter, EventPage};

use super::{ChainClient, ChainError, ObjectContent, SortOrder};

/// Node client over HTTP JSON-RPC.
///
/// Every request carries the configured timeout; a stuck node surfaces as
/// [`ChainError::Timeout`] instead of blocking the calling tracker forever.
#[derive(Debug)]
pub struct JsonRpcChainClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<JsonValue>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    #[serde(default)]
    data: Option<ObjectData>,
    #[serde(default)]
    error: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectData {
    object_id: ObjectId,
    #[serde(default)]
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContent {
    data_type: String,
    #[serde(rename = "type", default)]
    object_type: Option<String>,
    #[serde(default)]
    fields: JsonValue,
}

impl JsonRpcChainClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: JsonValue,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest)?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChainError::RateLimited(format!("{method}: HTTP 429")));
        }
        let resp = resp.error_for_status().map_err(map_reqwest)?;
        let envelope: RpcResponse = resp.json().await.map_err(map_reqwest)?;

        let result = unwrap_envelope(envelope)?;
        serde_json::from_value(result).map_err(|e| ChainError::Decode(format!("{method}: {e}")))
    }
}

fn map_reqwest(err: reqwest::Error) -> ChainError {
    if err.is_timeout() {
        ChainError::Timeout(err.to_string())
    } else if err.status() == Some(StatusCode::TOO_MANY_REQUESTS) {
        ChainError::RateLimited(err.to_string())
    } else if err.is_decode() {
        ChainError::Decode(err.to_string())
    } else {
        ChainError::Transport(err.to_string())
    }
}

fn unwrap_envelope(envelope: RpcResponse) -> Result<JsonValue, ChainError> {
    if let Some(err) = envelope.error {
        let lowered = err.message.to_ascii_lowercase();
        if lowered.contains("rate limit") || lowered.contains("too many requests") {
            return Err(ChainError::RateLimited(err.message));
        }
        return Err(ChainError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    envelope
        .result
        .ok_or_else(|| ChainError::Decode("response has neither result nor error".into()))
}

fn decode_object(resp: ObjectResponse) -> Result<Option<ObjectContent>, ChainError> {
    if let Some(err) = resp.error {
        let code = err.get("code").and_then(JsonValue::as_str).unwrap_or_default();
        return match code {
            "notExists" | "deleted" => Ok(None),
            _ => Err(ChainError::Decode(format!("object error: {err}"))),
        };
    }

    let Some(data) = resp.data else {
        return Ok(None);
    };
    match data.content {
        Some(content) if content.data_type == "moveObject" => Ok(Some(ObjectContent {
            object_id: data.object_id,
            object_type: content.object_type,
            fields: content.fields,
        })),
        Some(content) => Err(ChainError::Decode(format!(
            "object {} is a {}, not a Move object",
            data.object_id, content.data_type
        ))),
        None => Err(ChainError::Decode(format!(
            "object {} returned without content",
            data.object_id
        ))),
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    #[instrument(skip(self, filter))]
    async fn query_events(
        &self,
        filter: &EventFilter,
        cursor: Option<&EventCursor>,
        limit: usize,
        order: SortOrder,
    ) -> Result<EventPage, ChainError> {
        let descending = matches!(order, SortOrder::Descending);
        let page: EventPage = self
            .call("suix_queryEvents", json!([filter, cursor, limit, descending]))
            .await?;
        debug!(events = page.data.len(), has_next_page = page.has_next_page, "queried events");
        Ok(page)
    }

    #[instrument(skip(self), fields(object_id = %id))]
    async fn get_object(&self, id: &ObjectId) -> Result<Option<ObjectContent>, ChainError> {
        let resp: ObjectResponse = self
            .call(
                "sui_getObject",
                json!([id, { "showContent": true, "showType": true }]),
            )
            .await?;
        decode_object(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_response(v: JsonValue) -> ObjectResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn decodes_move_object() {
        let resp = object_response(json!({
            "data": {
                "objectId": "0xa",
                "version": "12",
                "digest": "d",
                "content": {
                    "dataType": "moveObject",
                    "type": "0xc0ffee::coffee_club::CoffeeOrder",
                    "hasPublicTransfer": false,
                    "fields": {
                        "id": { "id": "0xa" },
                        "status": { "variant": "Processing", "fields": {} },
                        "coffee_type": { "variant": "Espresso", "fields": {} }
                    }
                }
            }
        }));

        let obj = decode_object(resp).unwrap().unwrap();
        assert_eq!(obj.object_id, ObjectId::parse("0xa").unwrap());
        assert_eq!(obj.variant("status"), Some("Processing"));
        assert_eq!(obj.variant("coffee_type"), Some("Espresso"));
        assert_eq!(obj.variant("missing"), None);
    }

    #[test]
    fn missing_object_is_none() {
        let resp = object_response(json!({
            "error": { "code": "notExists", "object_id": "0xa" }
        }));
        assert_eq!(decode_object(resp).unwrap(), None);

        let resp = object_response(json!({
            "error": { "code": "deleted", "object_id": "0xa", "version": "3", "digest": "x" }
        }));
        assert_eq!(decode_object(resp).unwrap(), None);
    }

    #[test]
    fn package_content_is_rejected() {
        let resp = object_response(json!({
            "data": { "objectId": "0x2", "content": { "dataType": "package" } }
        }));
        assert!(matches!(decode_object(resp), Err(ChainError::Decode(_))));
    }

    #[test]
    fn rpc_errors_are_classified() {
        let limited = RpcResponse {
            result: None,
            error: Some(RpcErrorObject {
                code: -32000,
                message: "Rate limit exceeded".into(),
            }),
        };
        let err = unwrap_envelope(limited).unwrap_err();
        assert!(matches!(err, ChainError::RateLimited(_)));
        assert!(err.is_transient());

        let other = RpcResponse {
            result: None,
            error: Some(RpcErrorObject {
                code: -32602,
                message: "Invalid params".into(),
            }),
        };
        let err = unwrap_envelope(other).unwrap_err();
        assert_eq!(
            err,
            ChainError::Rpc {
                code: -32602,
                message: "Invalid params".into()
            }
        );
        assert!(!err.is_transient());
    }
}
