//! LoRa Serial Protocol
//!
//! Implements the framed, CRC-checked, acknowledged transport spoken over
//! the serial link to the E22-400T22U module.
//!
//! Frame format on the wire:
//!
//! ```text
//! [Type(1)][Seq(1)][Total(1)][Len(1)][Payload(0-26)][CRC-8(1)]
//! ```

pub mod crc;
mod error;
mod fragment;
mod frame;
pub mod serial;
mod stream;
mod timer;
mod transport;

pub use crc::crc8;
pub use error::TransportError;
pub use fragment::{chunk_packet, Chunk, Reassembly};
pub use frame::{Frame, FrameType};
pub use serial::{clear_buffers, list_ports, open_port, PortInfo};
pub use stream::{ByteChannel, SerialChannel};
pub use timer::{AckTimer, SystemTimer};
pub use transport::{LoraTransport, TransportEvent};

/// Default baud rate for the E22-400T22U in transparent mode
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Maximum payload bytes carried by a single frame
pub const MAX_CHUNK_PAYLOAD: usize = 26;

/// Maximum packet size accepted by [`chunk_packet`] (255 full chunks)
pub const MAX_PACKET_SIZE: usize = MAX_CHUNK_PAYLOAD * u8::MAX as usize;

/// Size of a frame with no payload (4 header bytes + CRC)
pub const MIN_FRAME_LEN: usize = 5;

/// Size of a frame with a full payload
pub const MAX_FRAME_LEN: usize = MIN_FRAME_LEN + MAX_CHUNK_PAYLOAD;

/// How long to wait for a chunk acknowledgement before retransmitting
pub const ACK_TIMEOUT_MS: u64 = 1000;

/// Retransmission attempts per chunk before the send is abandoned
pub const MAX_RETRIES: u32 = 5;
