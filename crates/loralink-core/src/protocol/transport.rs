//! Reliable-delivery transport engine
//!
//! Owns the sender and receiver state machines that turn the raw serial
//! byte stream into acknowledged, reassembled packets.
//!
//! The engine is single-threaded and cooperative. Nothing here blocks:
//! [`LoraTransport::send_packet`] primes the sender and returns. The two
//! external event sources (bytes arriving on the serial port and the
//! retransmission timer) are delivered as [`LoraTransport::on_readable`]
//! and [`LoraTransport::on_timeout`] calls. Outcomes surface on the
//! [`TransportEvent`] queue drained by the owner.
//!
//! Sender: one packet in flight at a time. Each chunk is written as a DATA
//! frame and the engine waits for the matching ACK; a timeout retransmits
//! the chunk up to [`MAX_RETRIES`] times before the send is abandoned. The
//! send completes when the final chunk's ACK arrives; the peer's
//! PACKET_ACK is accepted but carries no additional meaning here.
//!
//! Receiver: chunks are collected by sequence number and each one is
//! ACKed, duplicates included. When the set is complete the packet is
//! delivered and a single PACKET_ACK is written.

use std::collections::VecDeque;
use std::time::Duration;

use super::fragment::{chunk_packet, Chunk, Reassembly};
use super::frame::{Frame, FrameType};
use super::stream::ByteChannel;
use super::timer::AckTimer;
use super::{TransportError, ACK_TIMEOUT_MS, MAX_CHUNK_PAYLOAD, MAX_RETRIES, MIN_FRAME_LEN};

/// Events reported by the transport to its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A send finished; `true` means every chunk was acknowledged
    PacketSent(bool),
    /// A complete packet was reassembled from the peer
    PacketReceived(Vec<u8>),
    /// Acknowledged progress of the send in flight
    SendProgress { sent: usize, total: usize },
    /// Progress of the reassembly in flight; `total` is exact once the
    /// whole packet has been seen, otherwise an upper bound
    ReceiveProgress { received: usize, total: usize },
    /// A surfaced error (busy, write failure, retries exhausted)
    Error(String),
}

/// Send-side state for the packet in flight
struct SendState {
    chunks: Vec<Chunk>,
    cursor: usize,
    retries: u32,
    total_bytes: usize,
    sent_bytes: usize,
}

/// The reliable-delivery engine
pub struct LoraTransport<C: ByteChannel, T: AckTimer> {
    channel: C,
    timer: T,
    send: Option<SendState>,
    recv: Reassembly,
    rx_buf: Vec<u8>,
    events: VecDeque<TransportEvent>,
}

impl<C: ByteChannel, T: AckTimer> LoraTransport<C, T> {
    /// Bind the engine to an open byte channel and a fresh timer.
    pub fn new(channel: C, timer: T) -> Self {
        Self {
            channel,
            timer,
            send: None,
            recv: Reassembly::new(),
            rx_buf: Vec::new(),
            events: VecDeque::new(),
        }
    }

    /// Begin sending a packet. Rejected with an error event when a send
    /// is already in flight. Completion is reported via
    /// [`TransportEvent::PacketSent`].
    pub fn send_packet(&mut self, data: &[u8]) {
        if self.send.is_some() {
            self.events
                .push_back(TransportEvent::Error(TransportError::Busy.to_string()));
            return;
        }

        let chunks = match chunk_packet(data) {
            Ok(chunks) => chunks,
            Err(e) => {
                self.events.push_back(TransportEvent::Error(e.to_string()));
                return;
            }
        };

        self.send = Some(SendState {
            chunks,
            cursor: 0,
            retries: 0,
            total_bytes: data.len(),
            sent_bytes: 0,
        });
        self.transmit_chunk(0);
    }

    /// True while a send is in flight.
    pub fn is_sending(&self) -> bool {
        self.send.is_some()
    }

    /// Drain all available bytes from the channel and process every
    /// complete frame found in them.
    pub fn on_readable(&mut self) {
        if let Err(e) = self.channel.read_available(&mut self.rx_buf) {
            self.events
                .push_back(TransportEvent::Error(format!("serial read failed: {e}")));
            return;
        }
        self.scan_frames();
    }

    /// Handle an acknowledgement timeout: retransmit the current chunk,
    /// or give up once the retry budget is spent.
    pub fn on_timeout(&mut self) {
        let Some(state) = self.send.as_mut() else {
            return;
        };

        if state.retries + 1 > MAX_RETRIES {
            self.abort_send(format!("send timeout after {MAX_RETRIES} retries"));
            return;
        }

        state.retries += 1;
        let index = state.cursor;
        self.transmit_chunk(index);
    }

    /// Fire [`Self::on_timeout`] if the timer has expired. Call this from
    /// the owner's event loop.
    pub fn poll(&mut self) {
        if self.timer.expired() {
            self.on_timeout();
        }
    }

    /// Take every event queued since the last call.
    pub fn take_events(&mut self) -> Vec<TransportEvent> {
        self.events.drain(..).collect()
    }

    /// Abandon any send and reassembly in flight without emitting
    /// terminal events, and discard buffered bytes.
    pub fn reset(&mut self) {
        self.timer.stop();
        self.send = None;
        self.recv.reset();
        self.rx_buf.clear();
    }

    /// Greedily extract frames from the accumulator. Any candidate that
    /// fails to decode costs exactly one byte, so a corrupted byte can
    /// never permanently desynchronise the stream.
    fn scan_frames(&mut self) {
        loop {
            if self.rx_buf.len() < MIN_FRAME_LEN {
                return;
            }

            let len = self.rx_buf[3] as usize;
            if len > MAX_CHUNK_PAYLOAD {
                self.rx_buf.drain(..1);
                continue;
            }

            let frame_len = MIN_FRAME_LEN + len;
            if self.rx_buf.len() < frame_len {
                return;
            }

            match Frame::from_bytes(&self.rx_buf[..frame_len]) {
                Ok(frame) => {
                    self.rx_buf.drain(..frame_len);
                    self.handle_frame(frame);
                }
                Err(_) => {
                    self.rx_buf.drain(..1);
                }
            }
        }
    }

    fn handle_frame(&mut self, frame: Frame) {
        match frame.frame_type {
            FrameType::Data => self.handle_data(frame.seq, frame.total, frame.payload),
            FrameType::Ack => self.handle_chunk_ack(frame.seq),
            // the send already completed on the final chunk's ACK
            FrameType::PacketAck => {}
            // reserved
            FrameType::Nack => {}
        }
    }

    /// Sender transition on a chunk acknowledgement.
    fn handle_chunk_ack(&mut self, seq: u8) {
        let Some(state) = self.send.as_mut() else {
            return;
        };
        // stale or duplicate ACK
        if state.cursor != seq as usize {
            return;
        }

        self.timer.stop();
        state.sent_bytes += state.chunks[state.cursor].payload.len();
        let sent = state.sent_bytes;
        let total = state.total_bytes;
        let next = if state.cursor + 1 < state.chunks.len() {
            state.cursor += 1;
            state.retries = 0;
            Some(state.cursor)
        } else {
            None
        };

        self.events
            .push_back(TransportEvent::SendProgress { sent, total });
        match next {
            Some(index) => self.transmit_chunk(index),
            None => {
                self.send = None;
                self.events.push_back(TransportEvent::PacketSent(true));
            }
        }
    }

    /// Receiver transition on a DATA frame.
    fn handle_data(&mut self, seq: u8, total: u8, payload: Vec<u8>) {
        if total == 0 || seq >= total {
            return;
        }

        // a different Total abandons the in-progress packet
        if !self.recv.is_idle() && self.recv.total() != total {
            self.recv.reset();
        }
        if self.recv.is_idle() {
            self.recv.begin(total);
        }

        if self.recv.delivered() {
            if self.recv.matches_chunk(seq, &payload) {
                // retransmission of the finished packet: our ACK or the
                // PACKET_ACK was lost in the air
                self.write_frame(&Frame::ack(seq, total));
                return;
            }
            // same shape, different bytes: a new packet has begun
            self.recv.begin(total);
        }

        if self.recv.contains(seq) {
            // duplicate chunk, re-ACK without double-counting
            self.write_frame(&Frame::ack(seq, total));
            return;
        }

        self.recv.insert(seq, payload);
        self.write_frame(&Frame::ack(seq, total));

        let received = self.recv.bytes_so_far();
        if self.recv.is_complete() {
            self.events.push_back(TransportEvent::ReceiveProgress {
                received,
                total: received,
            });
            self.events
                .push_back(TransportEvent::PacketReceived(self.recv.assemble()));
            if !self.recv.packet_ack_sent() {
                self.write_frame(&Frame::packet_ack());
                self.recv.mark_packet_ack_sent();
            }
            self.recv.mark_delivered();
        } else {
            self.events.push_back(TransportEvent::ReceiveProgress {
                received,
                total: total as usize * MAX_CHUNK_PAYLOAD,
            });
        }
    }

    /// Write the chunk at `index` as a DATA frame and arm the timer.
    fn transmit_chunk(&mut self, index: usize) {
        let bytes = match self.send.as_ref() {
            Some(state) => {
                let chunk = &state.chunks[index];
                Frame::data(chunk.seq, chunk.total, &chunk.payload).to_bytes()
            }
            None => return,
        };

        match self.channel.write_all(&bytes) {
            Ok(()) => self.timer.start(Duration::from_millis(ACK_TIMEOUT_MS)),
            Err(e) => self.abort_send(format!("serial write failed: {e}")),
        }
    }

    /// Abort the send in flight: error event, failed terminal event,
    /// back to idle.
    fn abort_send(&mut self, message: String) {
        self.timer.stop();
        self.send = None;
        self.events.push_back(TransportEvent::Error(message));
        self.events.push_back(TransportEvent::PacketSent(false));
    }

    /// Write a control frame. A failed control write is surfaced but does
    /// not abort anything: the peer's retransmission will give us another
    /// chance to acknowledge.
    fn write_frame(&mut self, frame: &Frame) {
        if let Err(e) = self.channel.write_all(&frame.to_bytes()) {
            self.events
                .push_back(TransportEvent::Error(format!("serial write failed: {e}")));
        }
    }
}
