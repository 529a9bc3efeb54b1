//! Protocol errors

use thiserror::Error;

/// Errors that can occur on the LoRa serial transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("Frame too short: {0} bytes")]
    FrameTooShort(usize),

    #[error("Frame payload length {0} exceeds 26")]
    PayloadTooLong(usize),

    #[error("CRC mismatch: expected {expected:#04x}, got {actual:#04x}")]
    CrcMismatch { expected: u8, actual: u8 },

    #[error("Unknown frame type: {0:#04x}")]
    UnknownFrameType(u8),

    #[error("Transport busy: a packet send is already in progress")]
    Busy,

    #[error("Packet too large: {size} bytes (max {max})")]
    PacketTooLarge { size: usize, max: usize },
}
