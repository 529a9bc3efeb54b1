//! LoRa worker facade
//!
//! Owns the serial port and the transport engine, and exposes the whole
//! link as three operations (`open_port`, `close_port`, `send_packet`)
//! plus an event stream. Application shells drive [`LoraWorker::poll`]
//! from their own loop and react to [`WorkerEvent`]s; nothing in here
//! blocks or spawns threads.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::protocol::{
    clear_buffers, open_port, LoraTransport, SerialChannel, SystemTimer, TransportEvent,
    DEFAULT_BAUD_RATE,
};

/// Port lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortState {
    /// No port open
    Closed,
    /// Port open, transport ready
    Open,
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Events surfaced to the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Result of an `open_port` call
    PortOpened { ok: bool, error: String },
    /// A send finished
    PacketSent(bool),
    /// A complete packet arrived from the peer
    PacketReceived(Vec<u8>),
    /// Acknowledged send progress
    SendProgress { sent: usize, total: usize },
    /// Reassembly progress
    ReceiveProgress { received: usize, total: usize },
    /// An error occurred
    Error(String),
}

impl From<TransportEvent> for WorkerEvent {
    fn from(event: TransportEvent) -> Self {
        match event {
            TransportEvent::PacketSent(ok) => WorkerEvent::PacketSent(ok),
            TransportEvent::PacketReceived(data) => WorkerEvent::PacketReceived(data),
            TransportEvent::SendProgress { sent, total } => {
                WorkerEvent::SendProgress { sent, total }
            }
            TransportEvent::ReceiveProgress { received, total } => {
                WorkerEvent::ReceiveProgress { received, total }
            }
            TransportEvent::Error(msg) => WorkerEvent::Error(msg),
        }
    }
}

/// Facade over one radio link
pub struct LoraWorker {
    config: WorkerConfig,
    transport: Option<LoraTransport<SerialChannel, SystemTimer>>,
    events: VecDeque<WorkerEvent>,
}

impl LoraWorker {
    /// Create a worker for the configured port. Nothing is opened yet.
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            transport: None,
            events: VecDeque::new(),
        }
    }

    pub fn state(&self) -> PortState {
        if self.transport.is_some() {
            PortState::Open
        } else {
            PortState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// True while a packet send is in flight.
    pub fn is_sending(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_sending())
    }

    /// Open and configure the serial port, then bind the transport to it.
    /// The outcome is reported as [`WorkerEvent::PortOpened`].
    pub fn open_port(&mut self) {
        if self.transport.is_some() {
            self.events
                .push_back(WorkerEvent::Error("Port already open".into()));
            return;
        }

        let mut port = match open_port(&self.config.port_name, Some(self.config.baud_rate)) {
            Ok(port) => port,
            Err(e) => {
                self.events.push_back(WorkerEvent::PortOpened {
                    ok: false,
                    error: e.to_string(),
                });
                return;
            }
        };

        // discard whatever accumulated while the port was unattended
        if let Err(e) = clear_buffers(port.as_mut()) {
            eprintln!("[WARN] open_port: could not clear buffers: {e} (continuing)");
        }

        self.transport = Some(LoraTransport::new(
            SerialChannel::new(port),
            SystemTimer::new(),
        ));
        self.events.push_back(WorkerEvent::PortOpened {
            ok: true,
            error: String::new(),
        });
    }

    /// Close the port. Safe to call when nothing is open; any packet in
    /// flight is abandoned without terminal events.
    pub fn close_port(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.reset();
        }
    }

    /// Hand a packet to the transport for sending.
    pub fn send_packet(&mut self, data: &[u8]) {
        match self.transport.as_mut() {
            Some(transport) => transport.send_packet(data),
            None => self
                .events
                .push_back(WorkerEvent::Error("Transport not ready".into())),
        }
    }

    /// Service the link: pull in serial bytes, fire the timer if due, and
    /// collect transport events. Call this regularly from the event loop.
    pub fn poll(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.on_readable();
            transport.poll();
            for event in transport.take_events() {
                self.events.push_back(event.into());
            }
        }
    }

    /// Take every event queued since the last call.
    pub fn take_events(&mut self) -> Vec<WorkerEvent> {
        self.events.drain(..).collect()
    }
}

impl Drop for LoraWorker {
    fn drop(&mut self) {
        self.close_port();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_port_reports_error() {
        let mut worker = LoraWorker::new(WorkerConfig::default());
        worker.send_packet(b"hello");

        assert_eq!(
            worker.take_events(),
            vec![WorkerEvent::Error("Transport not ready".into())]
        );
    }

    #[test]
    fn test_open_missing_port_reports_failure() {
        let mut worker = LoraWorker::new(WorkerConfig {
            port_name: "/definitely/not/a/port".into(),
            ..WorkerConfig::default()
        });
        worker.open_port();

        let events = worker.take_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            WorkerEvent::PortOpened { ok, error } => {
                assert!(!ok);
                assert!(!error.is_empty());
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(worker.state(), PortState::Closed);
    }

    #[test]
    fn test_close_port_is_idempotent() {
        let mut worker = LoraWorker::new(WorkerConfig::default());
        worker.close_port();
        worker.close_port();
        assert!(!worker.is_open());
    }
}
