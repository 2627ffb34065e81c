//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The server never touches `serde_json` directly; it goes through a
//! [`Codec`] so the wire format can be swapped without touching the
//! handler.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to frame bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is what browser clients speak, so it is the default.
///
/// ```rust
/// use livepoll_protocol::{ClientAction, Codec, JsonCodec, RoomCode};
///
/// let codec = JsonCodec;
/// let action: ClientAction = codec
///     .decode(br#"{"type":"check_poll_status","roomCode":"ab12cd"}"#)
///     .unwrap();
/// assert_eq!(
///     action,
///     ClientAction::CheckPollStatus { room_code: RoomCode::new("AB12CD") }
/// );
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
