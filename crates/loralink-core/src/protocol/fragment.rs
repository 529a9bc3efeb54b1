//! Packet fragmentation and reassembly
//!
//! Outbound packets are split into chunks of at most 26 bytes, one per
//! DATA frame. Inbound chunks are collected in a [`Reassembly`] until every
//! sequence number of the packet has arrived, then concatenated in order.

use std::collections::HashMap;

use super::{TransportError, MAX_CHUNK_PAYLOAD, MAX_PACKET_SIZE};

/// One fragment of an outbound packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Sequence number within the packet (0-based)
    pub seq: u8,
    /// Total number of chunks in the packet
    pub total: u8,
    /// Chunk data, at most 26 bytes
    pub payload: Vec<u8>,
}

/// Split `data` into chunks. An empty packet becomes a single empty chunk
/// so that zero-length sends still travel the wire. Fails when the packet
/// needs more than 255 chunks.
pub fn chunk_packet(data: &[u8]) -> Result<Vec<Chunk>, TransportError> {
    if data.len() > MAX_PACKET_SIZE {
        return Err(TransportError::PacketTooLarge {
            size: data.len(),
            max: MAX_PACKET_SIZE,
        });
    }

    if data.is_empty() {
        return Ok(vec![Chunk {
            seq: 0,
            total: 1,
            payload: Vec::new(),
        }]);
    }

    let pieces: Vec<&[u8]> = data.chunks(MAX_CHUNK_PAYLOAD).collect();
    let total = pieces.len() as u8;

    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| Chunk {
            seq: i as u8,
            total,
            payload: piece.to_vec(),
        })
        .collect())
}

/// Receive-side reassembly state for the packet currently in flight.
///
/// `total == 0` means idle. After delivery the record is kept around,
/// marked delivered, so that retransmitted chunks of the finished packet
/// can be re-acknowledged without producing a second delivery; any chunk
/// that does not byte-match the finished packet starts a fresh assembly.
#[derive(Debug, Default)]
pub struct Reassembly {
    total: u8,
    chunks: HashMap<u8, Vec<u8>>,
    packet_ack_sent: bool,
    delivered: bool,
}

impl Reassembly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.total == 0
    }

    pub fn total(&self) -> u8 {
        self.total
    }

    pub fn delivered(&self) -> bool {
        self.delivered
    }

    pub fn packet_ack_sent(&self) -> bool {
        self.packet_ack_sent
    }

    /// Begin assembling a packet of `total` chunks.
    pub fn begin(&mut self, total: u8) {
        self.reset();
        self.total = total;
    }

    /// Forget everything and return to idle.
    pub fn reset(&mut self) {
        self.total = 0;
        self.chunks.clear();
        self.packet_ack_sent = false;
        self.delivered = false;
    }

    pub fn contains(&self, seq: u8) -> bool {
        self.chunks.contains_key(&seq)
    }

    /// True when `seq` is stored with exactly this payload.
    pub fn matches_chunk(&self, seq: u8, payload: &[u8]) -> bool {
        self.chunks.get(&seq).is_some_and(|stored| stored == payload)
    }

    /// Store a chunk. The caller checks for duplicates first.
    pub fn insert(&mut self, seq: u8, payload: Vec<u8>) {
        self.chunks.insert(seq, payload);
    }

    pub fn received_count(&self) -> usize {
        self.chunks.len()
    }

    /// Payload bytes accumulated so far.
    pub fn bytes_so_far(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.total != 0 && self.chunks.len() == self.total as usize
    }

    /// Concatenate the chunks in sequence order.
    pub fn assemble(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(self.bytes_so_far());
        for seq in 0..self.total {
            if let Some(chunk) = self.chunks.get(&seq) {
                packet.extend_from_slice(chunk);
            }
        }
        packet
    }

    pub fn mark_packet_ack_sent(&mut self) {
        self.packet_ack_sent = true;
    }

    pub fn mark_delivered(&mut self) {
        self.delivered = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chunk_at_boundary() {
        let data: Vec<u8> = (b'A'..=b'Z').collect();
        let chunks = chunk_packet(&data).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].seq, 0);
        assert_eq!(chunks[0].total, 1);
        assert_eq!(chunks[0].payload, data);
    }

    #[test]
    fn test_split_just_over_boundary() {
        let mut data: Vec<u8> = (b'A'..=b'Z').collect();
        data.push(b'A');
        let chunks = chunk_packet(&data).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].payload.len(), 26);
        assert_eq!(chunks[1].payload.len(), 1);
        assert!(chunks.iter().all(|c| c.total == 2));
    }

    #[test]
    fn test_empty_packet_is_one_empty_chunk() {
        let chunks = chunk_packet(&[]).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].total, 1);
        assert!(chunks[0].payload.is_empty());
    }

    #[test]
    fn test_chunks_concatenate_to_input() {
        let data: Vec<u8> = (0..200u8).collect();
        let chunks = chunk_packet(&data).unwrap();

        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.payload.clone()).collect();
        assert_eq!(joined, data);
        assert!(chunks.iter().all(|c| c.payload.len() <= MAX_CHUNK_PAYLOAD));
        assert_eq!(chunks.len(), data.len().div_ceil(MAX_CHUNK_PAYLOAD));
    }

    #[test]
    fn test_oversized_packet_rejected() {
        let data = vec![0u8; MAX_PACKET_SIZE + 1];
        assert!(matches!(
            chunk_packet(&data),
            Err(TransportError::PacketTooLarge { .. })
        ));
    }

    #[test]
    fn test_reassembly_out_of_order() {
        let mut asm = Reassembly::new();
        asm.begin(2);
        asm.insert(1, vec![4, 5, 6]);
        assert!(!asm.is_complete());
        asm.insert(0, vec![1, 2, 3]);

        assert!(asm.is_complete());
        assert_eq!(asm.assemble(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(asm.bytes_so_far(), 6);
        assert_eq!(asm.received_count(), 2);
    }

    #[test]
    fn test_begin_clears_previous_state() {
        let mut asm = Reassembly::new();
        asm.begin(3);
        asm.insert(0, vec![1]);
        asm.mark_packet_ack_sent();

        asm.begin(2);
        assert_eq!(asm.received_count(), 0);
        assert!(!asm.packet_ack_sent());
        assert!(!asm.delivered());
    }
}
