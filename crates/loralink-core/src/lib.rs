//! # LoRaLink Core Library
//!
//! Reliable packet delivery for the Ebyte E22-400T22U LoRa module attached
//! as a USB/serial device.
//!
//! The radio's air interface moves at most 26 payload bytes per transmission
//! and guarantees neither delivery nor ordering across those transmissions.
//! This library layers a reliable transport on top of the raw serial link:
//!
//! - Packet fragmentation into CRC-protected frames
//! - Per-chunk acknowledgement with timed retransmission
//! - Receive-side reassembly with duplicate suppression
//! - Progress reporting for both directions
//!
//! ## Example
//!
//! ```rust,ignore
//! use loralink_core::worker::{LoraWorker, WorkerConfig, WorkerEvent};
//!
//! let mut worker = LoraWorker::new(WorkerConfig {
//!     port_name: "/dev/ttyUSB0".into(),
//!     ..WorkerConfig::default()
//! });
//! worker.open_port();
//!
//! worker.send_packet(b"hello over the air");
//! loop {
//!     worker.poll();
//!     for event in worker.take_events() {
//!         match event {
//!             WorkerEvent::PacketSent(ok) => println!("sent: {}", ok),
//!             WorkerEvent::PacketReceived(data) => println!("got {} bytes", data.len()),
//!             _ => {}
//!         }
//!     }
//! }
//! ```

pub mod protocol;
pub mod worker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{Frame, FrameType, LoraTransport, TransportError, TransportEvent};
    pub use crate::worker::{LoraWorker, WorkerConfig, WorkerEvent};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
