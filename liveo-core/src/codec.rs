//! Codec for envelope serialization and deserialization
//!
//! This module turns wire text into classified [`Inbound`] envelopes and typed
//! outbound frames into wire text.
//!
//! # Why a Codec Module?
//!
//! serde alone would reject a bad frame with a generic message. Decoding in two
//! steps (first to a JSON value, then by `Type`) lets every failure be reported
//! precisely so the transport can log it and move on:
//!
//! - Invalid JSON → [`Error::Parse`]
//! - Missing or unknown `Type` → [`Error::UnknownEnvelopeType`]
//! - `API` without `Resp` or `Tag`, `Event` without `Name` → [`Error::InvalidEnvelope`]
//!
//! # Examples
//!
//! ```rust
//! use liveo_core::{codec, Inbound};
//!
//! let frame = r#"{"Type":"Event","Msg":{"Name":"NewDelta","Data":{"Old":1,"New":2}}}"#;
//! match codec::decode(frame).unwrap() {
//!     Inbound::Event(event) => assert_eq!(event.name, "NewDelta"),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use crate::error::{Error, Result};
use crate::types::{ApiRequest, ApiResponse, EventMessage, Inbound, Outbound, Tag};
use serde::Serialize;
use serde_json::{json, Value};

/// Encode any serializable frame to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode an API request envelope
///
/// ```rust
/// use liveo_core::codec;
///
/// let text = codec::encode_api_request(1, "Ping", serde_json::Value::Null).unwrap();
/// assert_eq!(text, r#"{"Type":"API","Msg":{"Tag":1,"Req":{"Action":"Ping","Params":null}}}"#);
/// ```
pub fn encode_api_request(tag: Tag, action: &str, params: Value) -> Result<String> {
    encode(&Outbound::Api(ApiRequest::new(tag, action, params)))
}

/// Encode an API response envelope (server → client direction)
pub fn encode_api_response(response: &ApiResponse) -> Result<String> {
    encode(&json!({"Type": "API", "Msg": response}))
}

/// Encode an event envelope (server → client direction)
pub fn encode_event(event: &EventMessage) -> Result<String> {
    encode(&json!({"Type": "Event", "Msg": event}))
}

/// Encode an error envelope (server → client direction)
pub fn encode_error(message: &str) -> Result<String> {
    encode(&json!({"Type": "Error", "Msg": message}))
}

/// Decode and classify an inbound envelope
///
/// # Errors
///
/// See the module documentation for the error mapping.
pub fn decode(data: &str) -> Result<Inbound> {
    let value: Value = serde_json::from_str(data).map_err(|e| Error::Parse(e.to_string()))?;

    let Value::Object(mut envelope) = value else {
        return Err(Error::UnknownEnvelopeType("envelope is not an object".to_string()));
    };

    let kind = match envelope.get("Type") {
        Some(Value::String(kind)) if !kind.is_empty() => kind.clone(),
        Some(other) => return Err(Error::UnknownEnvelopeType(other.to_string())),
        None => return Err(Error::UnknownEnvelopeType("missing Type".to_string())),
    };
    let msg = envelope.remove("Msg").unwrap_or(Value::Null);

    match kind.as_str() {
        "Error" => Ok(Inbound::Error(match msg {
            Value::String(text) => text,
            other => other.to_string(),
        })),
        "API" => decode_api(msg).map(Inbound::Api),
        "Event" => decode_event(msg).map(Inbound::Event),
        _ => Err(Error::UnknownEnvelopeType(kind)),
    }
}

fn decode_api(msg: Value) -> Result<ApiResponse> {
    if msg.get("Resp").map_or(true, Value::is_null) {
        return Err(Error::InvalidEnvelope("API message without Resp".to_string()));
    }
    serde_json::from_value(msg).map_err(|e| Error::InvalidEnvelope(format!("API response: {}", e)))
}

fn decode_event(msg: Value) -> Result<EventMessage> {
    match msg.get("Name") {
        Some(Value::String(name)) if !name.is_empty() => {}
        _ => return Err(Error::InvalidEnvelope("event without Name".to_string())),
    }
    serde_json::from_value(msg).map_err(|e| Error::InvalidEnvelope(format!("event: {}", e)))
}
