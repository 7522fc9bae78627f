//! Wire envelope types
//!
//! Every frame exchanged with the result server is a JSON envelope whose `Type`
//! field selects one of three traffic classes:
//!
//! ```text
//! → API request:  {"Type":"API","Msg":{"Tag":1,"Req":{"Action":"...","Params":...}}}
//! ← API response: {"Type":"API","Msg":{"Tag":1,"Resp":{"Success":true,"Result":...,"ErrorMessage":""}}}
//! ← Event:        {"Type":"Event","Msg":{"Name":"NewDelta","Data":...}}
//! ← Error:        {"Type":"Error","Msg":"..."}
//! ```
//!
//! Outbound frames are typed structs serialized directly. Inbound frames are
//! classified into [`Inbound`] by [`codec::decode`](crate::codec::decode), which
//! reports a precise error for every malformed shape instead of a generic serde
//! failure.

use serde::{Deserialize, Serialize};

/// Name of the event carrying a full `{Hash, Results}` payload
pub const NEW_RESULTS_EVENT: &str = "NewResults";

/// Name of the event carrying a [`Delta`](crate::reconcile::Delta)
pub const NEW_DELTA_EVENT: &str = "NewDelta";

/// Raw control message asking the server for a full result set
pub const REQUEST_RESULTS: &str = "RequestResults";

/// Tag correlating an API request with its response
pub type Tag = u64;

/// Outbound `{"Type":"API","Msg":{...}}` frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type", content = "Msg")]
pub enum Outbound {
    #[serde(rename = "API")]
    Api(ApiRequest),
}

/// API request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiRequest {
    pub tag: Tag,
    pub req: ApiCallSpec,
}

/// The `Req` part of an API request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiCallSpec {
    pub action: String,
    pub params: serde_json::Value,
}

impl ApiRequest {
    pub fn new(tag: Tag, action: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            tag,
            req: ApiCallSpec {
                action: action.into(),
                params,
            },
        }
    }
}

/// Classified inbound envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Server-reported error text
    Error(String),
    /// Response to one of our API requests
    Api(ApiResponse),
    /// Server-pushed event
    Event(EventMessage),
}

/// API response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResponse {
    pub tag: Tag,
    pub resp: ApiOutcome,
}

/// The `Resp` part of an API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiOutcome {
    pub success: bool,
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub error_message: String,
}

impl ApiResponse {
    pub fn success(tag: Tag, result: serde_json::Value) -> Self {
        Self {
            tag,
            resp: ApiOutcome {
                success: true,
                result,
                error_message: String::new(),
            },
        }
    }

    pub fn failure(tag: Tag, message: impl Into<String>) -> Self {
        Self {
            tag,
            resp: ApiOutcome {
                success: false,
                result: serde_json::Value::Null,
                error_message: message.into(),
            },
        }
    }
}

/// Server-pushed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventMessage {
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl EventMessage {
    pub fn new(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outbound_api_shape() {
        let frame = Outbound::Api(ApiRequest::new(7, "GetCourses", json!({"Day": 1})));
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({"Type": "API", "Msg": {"Tag": 7, "Req": {"Action": "GetCourses", "Params": {"Day": 1}}}})
        );
    }

    #[test]
    fn test_api_response_defaults() {
        let resp: ApiResponse = serde_json::from_value(json!({"Tag": 3, "Resp": {"Success": true}})).unwrap();
        assert_eq!(resp.resp.result, serde_json::Value::Null);
        assert_eq!(resp.resp.error_message, "");
    }

    #[test]
    fn test_response_constructors() {
        assert!(ApiResponse::success(1, json!(42)).resp.success);
        let failed = ApiResponse::failure(2, "nope");
        assert!(!failed.resp.success);
        assert_eq!(failed.resp.error_message, "nope");
    }
}
