//! Transfer descriptors handed to [`PgnSender`](crate::protocol::transport::traits::pgn_sender::PgnSender).
use crate::protocol::pgn::{ADDRESS_GLOBAL, DEFAULT_PRIORITY, RESERVED};
use crate::protocol::transport::{etp, tp, PACKET_DATA_LEN, SINGLE_FRAME_MAX_PAYLOAD};

//==================================================================================PAYLOAD
/// Opaque byte sequence made of an optional prefix followed by a body.
///
/// VT messages are mostly a command byte (or short header) in front of caller data,
/// e.g. `0x11` + object pool. Keeping both halves borrowed avoids copying a pool of
/// up to 117 MB into a contiguous buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payload<'a> {
    head: &'a [u8],
    body: &'a [u8],
}

impl<'a> Payload<'a> {
    /// Single contiguous payload.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            head: bytes,
            body: &[],
        }
    }

    /// `head` immediately followed by `body`.
    pub const fn with_prefix(head: &'a [u8], body: &'a [u8]) -> Self {
        Self { head, body }
    }

    /// Total number of bytes.
    pub const fn len(&self) -> usize {
        self.head.len() + self.body.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte at `index`, if any.
    pub fn get(&self, index: usize) -> Option<u8> {
        if index < self.head.len() {
            Some(self.head[index])
        } else {
            self.body.get(index - self.head.len()).copied()
        }
    }

    /// Copy bytes starting at `offset` into `out`, padding past the end with 0xFF.
    pub fn copy_into(&self, offset: usize, out: &mut [u8]) {
        for (index, byte) in out.iter_mut().enumerate() {
            *byte = self.get(offset + index).unwrap_or(RESERVED);
        }
    }

    /// The seven data bytes of packet `packet_index` (0-based), padded with 0xFF.
    pub fn packet(&self, packet_index: usize) -> [u8; PACKET_DATA_LEN] {
        let mut out = [RESERVED; PACKET_DATA_LEN];
        self.copy_into(packet_index * PACKET_DATA_LEN, &mut out);
        out
    }
}

//==================================================================================TRANSFER_REQUEST
/// Which transport a payload length calls for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferKind {
    /// Up to eight bytes, one frame.
    SingleFrame,
    /// 9 to 1785 bytes to one node, RTS/CTS handshake.
    Tp,
    /// 9 to 1785 bytes to every node, Broadcast Announce Message.
    Bam,
    /// 1786 to 117,440,505 bytes, windowed with data packet offsets.
    Etp,
    /// Beyond the ETP capacity.
    TooLarge,
}

/// One outgoing parameter group.
#[derive(Clone, Copy, Debug)]
pub struct TransferRequest<'a> {
    pub pgn: u32,
    /// Priority of single frames and connection management; data packets use 7.
    pub priority: u8,
    pub source_address: u8,
    pub destination_address: u8,
    pub payload: Payload<'a>,
    /// Wait for the receiver's end-of-message acknowledgement before returning.
    pub require_completion: bool,
}

impl<'a> TransferRequest<'a> {
    /// Destination specific request with default priority and no completion wait.
    pub fn new(pgn: u32, source_address: u8, destination_address: u8, payload: Payload<'a>) -> Self {
        Self {
            pgn,
            priority: DEFAULT_PRIORITY,
            source_address,
            destination_address,
            payload,
            require_completion: false,
        }
    }

    /// Override the priority (3 bits).
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority & 0x07;
        self
    }

    /// Toggle the end-of-message acknowledgement wait.
    pub fn with_completion(mut self, require_completion: bool) -> Self {
        self.require_completion = require_completion;
        self
    }

    /// Transport selected for this payload.
    pub fn kind(&self) -> TransferKind {
        let len = self.payload.len();
        if len <= SINGLE_FRAME_MAX_PAYLOAD {
            TransferKind::SingleFrame
        } else if len <= tp::TP_MAX_PAYLOAD {
            if self.destination_address == ADDRESS_GLOBAL {
                TransferKind::Bam
            } else {
                TransferKind::Tp
            }
        } else if len <= etp::ETP_MAX_PAYLOAD {
            TransferKind::Etp
        } else {
            TransferKind::TooLarge
        }
    }
}
