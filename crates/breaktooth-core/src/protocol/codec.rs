//! Binary codec for IPC frames.
//!
//! Wire format:
//! ```text
//! [version:1][msg_type:1][reserved:2][payload_len:4][payload:N]
//! ```
//! Total header size: 8 bytes. `payload_len` is big-endian.

use thiserror::Error;

use crate::protocol::messages::{
    IpcRequest, MessageType, SendKeysMessage, HEADER_SIZE, MAX_KEYS, MAX_PAYLOAD_LEN,
    PROTOCOL_VERSION,
};

/// Errors that can occur during frame encoding or decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The message type byte in the header is not a recognized value.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The protocol version in the header is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The payload could not be parsed.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The declared payload length does not match the bytes available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// The declared payload exceeds [`MAX_PAYLOAD_LEN`].
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// A SEND_KEYS message carries more than six usage codes.
    #[error("too many keys: {0} (max {MAX_KEYS})")]
    TooManyKeys(usize),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`IpcRequest`] into a complete frame.
///
/// # Errors
///
/// Returns [`ProtocolError::TooManyKeys`] if a SEND_KEYS key buffer is longer
/// than six codes.
///
/// # Examples
///
/// ```rust
/// use breaktooth_core::protocol::{decode_frame, encode_frame, IpcRequest, SendKeysMessage};
///
/// let req = IpcRequest::SendKeys(SendKeysMessage { modifiers: 1, keys: vec![0x04] });
/// let bytes = encode_frame(&req).unwrap();
/// let (decoded, consumed) = decode_frame(&bytes).unwrap();
/// assert_eq!(decoded, req);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_frame(req: &IpcRequest) -> Result<Vec<u8>, ProtocolError> {
    let payload = encode_payload(req)?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.push(PROTOCOL_VERSION);
    buf.push(req.message_type() as u8);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Validates a frame header and returns the payload length it declares.
///
/// Stream readers call this after reading [`HEADER_SIZE`] bytes to learn how
/// many more bytes belong to the frame.
///
/// # Errors
///
/// Returns [`ProtocolError`] for a short header, a foreign version, or an
/// oversized payload.
pub fn payload_len(header: &[u8]) -> Result<usize, ProtocolError> {
    if header.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: header.len(),
        });
    }
    if header[0] != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(header[0]));
    }
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if len > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge(len));
    }
    Ok(len)
}

/// Decodes one [`IpcRequest`] from the beginning of `bytes`.
///
/// Returns the request and the number of bytes consumed.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are malformed.
pub fn decode_frame(bytes: &[u8]) -> Result<(IpcRequest, usize), ProtocolError> {
    let len = payload_len(bytes)?;

    let msg_type_byte = bytes[1];
    let msg_type = MessageType::try_from(msg_type_byte)
        .map_err(|_| ProtocolError::UnknownMessageType(msg_type_byte))?;

    // bytes[2..4] are reserved – ignored on decode

    let total = HEADER_SIZE + len;
    if bytes.len() < total {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: len,
            available: bytes.len() - HEADER_SIZE,
        });
    }

    let payload = &bytes[HEADER_SIZE..total];
    let req = match msg_type {
        MessageType::SendKeys => IpcRequest::SendKeys(decode_send_keys(payload)?),
    };
    Ok((req, total))
}

// ── Payloads ──────────────────────────────────────────────────────────────────

fn encode_payload(req: &IpcRequest) -> Result<Vec<u8>, ProtocolError> {
    match req {
        IpcRequest::SendKeys(m) => {
            if m.keys.len() > MAX_KEYS {
                return Err(ProtocolError::TooManyKeys(m.keys.len()));
            }
            let mut buf = Vec::with_capacity(2 + m.keys.len());
            buf.push(m.modifiers);
            buf.push(m.keys.len() as u8);
            buf.extend_from_slice(&m.keys);
            Ok(buf)
        }
    }
}

fn decode_send_keys(payload: &[u8]) -> Result<SendKeysMessage, ProtocolError> {
    if payload.len() < 2 {
        return Err(ProtocolError::InsufficientData {
            needed: 2,
            available: payload.len(),
        });
    }
    let modifiers = payload[0];
    let count = payload[1] as usize;
    if count > MAX_KEYS {
        return Err(ProtocolError::TooManyKeys(count));
    }
    if payload.len() != 2 + count {
        return Err(ProtocolError::MalformedPayload(format!(
            "key count {count} does not match payload of {} bytes",
            payload.len()
        )));
    }
    Ok(SendKeysMessage {
        modifiers,
        keys: payload[2..].to_vec(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn send_keys(modifiers: u8, keys: &[u8]) -> IpcRequest {
        IpcRequest::SendKeys(SendKeysMessage {
            modifiers,
            keys: keys.to_vec(),
        })
    }

    #[test]
    fn test_encode_send_keys_produces_expected_bytes() {
        // Arrange
        let req = send_keys(0b0000_0001, &[0x04, 0, 0, 0, 0, 0]);

        // Act
        let bytes = encode_frame(&req).unwrap();

        // Assert
        assert_eq!(
            bytes,
            vec![
                0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x08, // header
                0x01, 0x06, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, // payload
            ]
        );
    }

    #[test]
    fn test_decode_reports_consumed_length_with_trailing_data() {
        let req = send_keys(0, &[0x2C]);
        let mut bytes = encode_frame(&req).unwrap();
        let frame_len = bytes.len();
        bytes.extend_from_slice(&[0xFF, 0xFF]);

        let (decoded, consumed) = decode_frame(&bytes).unwrap();

        assert_eq!(decoded, req);
        assert_eq!(consumed, frame_len);
    }

    #[test]
    fn test_encode_rejects_more_than_six_keys() {
        let req = send_keys(0, &[1, 2, 3, 4, 5, 6, 7]);

        assert_eq!(encode_frame(&req), Err(ProtocolError::TooManyKeys(7)));
    }

    #[test]
    fn test_decode_short_header_is_insufficient_data() {
        let err = decode_frame(&[0x01, 0x01, 0x00]).unwrap_err();

        assert_eq!(
            err,
            ProtocolError::InsufficientData {
                needed: HEADER_SIZE,
                available: 3
            }
        );
    }

    #[test]
    fn test_decode_rejects_foreign_version_and_type() {
        let mut bytes = encode_frame(&send_keys(0, &[])).unwrap();
        bytes[0] = 0x09;
        assert_eq!(decode_frame(&bytes), Err(ProtocolError::UnsupportedVersion(0x09)));

        let mut bytes = encode_frame(&send_keys(0, &[])).unwrap();
        bytes[1] = 0x7E;
        assert_eq!(decode_frame(&bytes), Err(ProtocolError::UnknownMessageType(0x7E)));
    }

    #[test]
    fn test_decode_truncated_payload_is_length_mismatch() {
        let bytes = encode_frame(&send_keys(0, &[0x04, 0x05])).unwrap();

        let err = decode_frame(&bytes[..bytes.len() - 1]).unwrap_err();

        assert_eq!(
            err,
            ProtocolError::PayloadLengthMismatch {
                declared: 4,
                available: 3
            }
        );
    }

    #[test]
    fn test_decode_count_mismatch_is_malformed() {
        // header declares 3 payload bytes: modifiers, count=2, one key
        let bytes = [0x01, 0x01, 0, 0, 0, 0, 0, 3, 0x00, 0x02, 0x04];

        assert!(matches!(
            decode_frame(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_payload_len_rejects_oversized_declaration() {
        let header = [0x01, 0x01, 0, 0, 0, 0, 0x10, 0x00];

        assert_eq!(payload_len(&header), Err(ProtocolError::PayloadTooLarge(0x1000)));
    }
}
