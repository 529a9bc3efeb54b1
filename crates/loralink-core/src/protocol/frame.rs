//! Frame encoding/decoding
//!
//! One frame is the unit of transmission on the serial wire:
//!
//! ```text
//! [Type(1)][Seq(1)][Total(1)][Len(1)][Payload(Len)][CRC-8(1)]
//! ```
//!
//! The CRC covers every byte that precedes it. Payloads longer than 26
//! bytes are clamped on encode and rejected on decode.

use super::crc::crc8;
use super::{TransportError, MAX_CHUNK_PAYLOAD, MIN_FRAME_LEN};

/// Frame type identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Carries one chunk of an application packet
    Data = 0x10,
    /// Acknowledges one received chunk
    Ack = 0x20,
    /// Negative acknowledgement (reserved, never emitted)
    Nack = 0x30,
    /// Acknowledges a completely reassembled packet
    PacketAck = 0x50,
}

impl FrameType {
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<FrameType> {
        match byte {
            0x10 => Some(FrameType::Data),
            0x20 => Some(FrameType::Ack),
            0x30 => Some(FrameType::Nack),
            0x50 => Some(FrameType::PacketAck),
            _ => None,
        }
    }
}

/// A decoded protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub seq: u8,
    pub total: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a DATA frame for one chunk. The payload is clamped to the
    /// first 26 bytes.
    pub fn data(seq: u8, total: u8, payload: &[u8]) -> Self {
        let len = payload.len().min(MAX_CHUNK_PAYLOAD);
        Self {
            frame_type: FrameType::Data,
            seq,
            total,
            payload: payload[..len].to_vec(),
        }
    }

    /// Create an ACK frame acknowledging chunk `seq` of `total`.
    pub fn ack(seq: u8, total: u8) -> Self {
        Self {
            frame_type: FrameType::Ack,
            seq,
            total,
            payload: Vec::new(),
        }
    }

    /// Create a PACKET_ACK frame acknowledging a whole reassembled packet.
    pub fn packet_ack() -> Self {
        Self {
            frame_type: FrameType::PacketAck,
            seq: 0,
            total: 0,
            payload: Vec::new(),
        }
    }

    /// Encode the frame to wire bytes, CRC appended.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = self.payload.len().min(MAX_CHUNK_PAYLOAD);
        let mut bytes = Vec::with_capacity(MIN_FRAME_LEN + len);
        bytes.push(self.frame_type.as_byte());
        bytes.push(self.seq);
        bytes.push(self.total);
        bytes.push(len as u8);
        bytes.extend_from_slice(&self.payload[..len]);
        bytes.push(crc8(&bytes));
        bytes
    }

    /// Decode a frame from raw bytes. Trailing bytes beyond the frame are
    /// ignored. Rejects short input, oversized length fields, CRC
    /// mismatches, and unknown type bytes; callers treat any rejection as
    /// a resynchronisation signal, not a fatal error.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, TransportError> {
        if raw.len() < MIN_FRAME_LEN {
            return Err(TransportError::FrameTooShort(raw.len()));
        }

        let len = raw[3] as usize;
        if len > MAX_CHUNK_PAYLOAD {
            return Err(TransportError::PayloadTooLong(len));
        }
        if raw.len() < MIN_FRAME_LEN + len {
            return Err(TransportError::FrameTooShort(raw.len()));
        }

        let expected = crc8(&raw[..4 + len]);
        let actual = raw[4 + len];
        if expected != actual {
            return Err(TransportError::CrcMismatch { expected, actual });
        }

        let frame_type =
            FrameType::from_byte(raw[0]).ok_or(TransportError::UnknownFrameType(raw[0]))?;

        Ok(Self {
            frame_type,
            seq: raw[1],
            total: raw[2],
            payload: raw[4..4 + len].to_vec(),
        })
    }

    /// Total encoded size of this frame
    pub fn encoded_size(&self) -> usize {
        MIN_FRAME_LEN + self.payload.len().min(MAX_CHUNK_PAYLOAD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_roundtrip() {
        let original = Frame::data(3, 7, b"chunk payload");
        let encoded = original.to_bytes();
        let decoded = Frame::from_bytes(&encoded).expect("Should decode successfully");

        assert_eq!(decoded, original);
        assert_eq!(encoded.len(), original.encoded_size());
    }

    #[test]
    fn test_reencode_is_identity() {
        let raw = Frame::data(0, 2, b"abc").to_bytes();
        let decoded = Frame::from_bytes(&raw).unwrap();
        assert_eq!(decoded.to_bytes(), raw);
    }

    #[test]
    fn test_control_frames_have_no_payload() {
        let ack = Frame::ack(0, 1).to_bytes();
        assert_eq!(ack.len(), 5);
        assert_eq!(ack[0], 0x20);
        assert_eq!(ack[3], 0);

        let pack = Frame::packet_ack().to_bytes();
        assert_eq!(pack.len(), 5);
        assert_eq!(&pack[..4], &[0x50, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_payload_clamped_to_26_bytes() {
        let long = [0x55u8; 40];
        let frame = Frame::data(0, 1, &long);
        let encoded = frame.to_bytes();

        assert_eq!(encoded[3], 26);
        assert_eq!(encoded.len(), 31);
    }

    #[test]
    fn test_crc_verification() {
        let mut encoded = Frame::data(0, 1, &[1, 2, 3, 4, 5]).to_bytes();
        encoded[6] ^= 0xFF;

        assert!(matches!(
            Frame::from_bytes(&encoded),
            Err(TransportError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_short_input_rejected() {
        assert!(Frame::from_bytes(&[0x10, 0x00, 0x01]).is_err());

        // header claims 22 payload bytes, only 2 present
        let truncated = Frame::data(0, 1, b"This is a long payload").to_bytes();
        assert!(Frame::from_bytes(&truncated[..7]).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut raw = vec![0x42, 0x00, 0x00, 0x00];
        raw.push(crc8(&raw));

        assert!(matches!(
            Frame::from_bytes(&raw),
            Err(TransportError::UnknownFrameType(0x42))
        ));
    }

    #[test]
    fn test_binary_payload_preserved() {
        let payload = [0x00, 0xFF, 0x7F, 0x80, 0xAA, 0x55];
        let decoded = Frame::from_bytes(&Frame::data(0, 1, &payload).to_bytes()).unwrap();
        assert_eq!(decoded.payload, payload);
    }
}
