//! Wire envelope and codec
//!
//! Every message crossing the realm boundary travels inside a
//! [`WireEnvelope`]: a versioned, correlatable wrapper over a type-erased
//! payload. [`WireMessage`] is the decoded form the subject routes on.

use crate::tickets::{CallArgsTicket, CleanupTicket, HostMethodAddress, ResponseTicket};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Envelope action for function calls.
pub const ACTION_CALL: &str = "realmlink.call";

/// Envelope action for call responses.
pub const ACTION_RESPONSE: &str = "realmlink.response";

/// Envelope action for out-of-scope cleanup notifications.
pub const ACTION_CLEANUP: &str = "realmlink.cleanup";

/// Envelope action for batched namespace method addresses.
pub const ACTION_BATCH: &str = "realmlink.batch";

/// Envelope action for channel disconnection.
pub const ACTION_DISCONNECT: &str = "realmlink.disconnect";

/// Current wire schema version (v1.0).
pub const REALMLINK_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0);

/// Unique identifier for an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a message ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Msg({})", self.0)
    }
}

/// Schema version for envelope payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version (breaking changes)
    pub major: u32,
    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl SchemaVersion {
    /// Creates a new schema version
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Checks if this version is compatible with another
    ///
    /// Same major version = compatible.
    pub fn is_compatible_with(&self, other: &SchemaVersion) -> bool {
        self.major == other.major
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

/// Type-erased envelope payload (JSON bytes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    data: Vec<u8>,
}

impl MessagePayload {
    /// Creates a new payload from serializable data
    pub fn new<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_vec(data)?;
        Ok(Self { data: json })
    }

    /// Deserializes the payload into a specific type
    pub fn deserialize<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.data)
    }

    /// Returns the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Envelope carrying one wire message across the realm boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEnvelope {
    /// Unique identifier for this envelope
    pub id: MessageId,
    /// Action identifying the payload shape
    pub action: String,
    /// Schema version of the payload
    pub schema_version: SchemaVersion,
    /// Correlation ID for request/response matching
    pub correlation_id: Option<MessageId>,
    /// Serialized payload (type-erased)
    pub payload: MessagePayload,
}

impl WireEnvelope {
    fn new(action: &str, payload: MessagePayload) -> Self {
        Self {
            id: MessageId::new(),
            action: action.to_string(),
            schema_version: REALMLINK_SCHEMA,
            correlation_id: None,
            payload,
        }
    }

    /// Sets the correlation ID (for responses)
    pub fn with_correlation(mut self, correlation_id: MessageId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Checks if this envelope is a response to another
    pub fn is_response(&self) -> bool {
        self.correlation_id.is_some()
    }
}

/// Decoded wire message, routed by the subject
#[derive(Debug, Clone)]
pub enum WireMessage {
    /// Invoke a remote function
    Call(CallArgsTicket),
    /// Settle the call correlated via the envelope
    Response(ResponseTicket),
    /// The holding side released a ticket
    Cleanup(CleanupTicket),
    /// Batched namespace method invocations
    Batch(Vec<HostMethodAddress>),
    /// The channel became permanently unusable
    Disconnect { reason: String },
}

impl WireMessage {
    /// Returns the envelope action for this message
    pub fn action(&self) -> &'static str {
        match self {
            WireMessage::Call(_) => ACTION_CALL,
            WireMessage::Response(_) => ACTION_RESPONSE,
            WireMessage::Cleanup(_) => ACTION_CLEANUP,
            WireMessage::Batch(_) => ACTION_BATCH,
            WireMessage::Disconnect { .. } => ACTION_DISCONNECT,
        }
    }

    /// Encodes this message into an envelope
    pub fn encode(&self) -> Result<WireEnvelope, CodecError> {
        let payload = match self {
            WireMessage::Call(ticket) => MessagePayload::new(ticket),
            WireMessage::Response(ticket) => MessagePayload::new(ticket),
            WireMessage::Cleanup(ticket) => MessagePayload::new(ticket),
            WireMessage::Batch(addresses) => MessagePayload::new(addresses),
            WireMessage::Disconnect { reason } => MessagePayload::new(reason),
        }
        .map_err(|err| CodecError::Codec(err.to_string()))?;
        Ok(WireEnvelope::new(self.action(), payload))
    }

    /// Decodes an envelope into a wire message
    pub fn decode(envelope: &WireEnvelope) -> Result<Self, CodecError> {
        if !envelope.schema_version.is_compatible_with(&REALMLINK_SCHEMA) {
            return Err(CodecError::IncompatibleSchema(envelope.schema_version));
        }
        let decoded = match envelope.action.as_str() {
            ACTION_CALL => WireMessage::Call(decode_payload(envelope)?),
            ACTION_RESPONSE => WireMessage::Response(decode_payload(envelope)?),
            ACTION_CLEANUP => WireMessage::Cleanup(decode_payload(envelope)?),
            ACTION_BATCH => WireMessage::Batch(decode_payload(envelope)?),
            ACTION_DISCONNECT => WireMessage::Disconnect {
                reason: decode_payload(envelope)?,
            },
            other => return Err(CodecError::UnexpectedAction(other.to_string())),
        };
        Ok(decoded)
    }
}

fn decode_payload<T: for<'de> Deserialize<'de>>(envelope: &WireEnvelope) -> Result<T, CodecError> {
    envelope
        .payload
        .deserialize()
        .map_err(|err| CodecError::Codec(err.to_string()))
}

/// Errors from encoding or decoding envelopes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unexpected envelope action: {0}")]
    UnexpectedAction(String),

    #[error("Incompatible schema version: {0}")]
    IncompatibleSchema(SchemaVersion),

    #[error("Codec error: {0}")]
    Codec(String),
}
