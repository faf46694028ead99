//! In-memory representation of an ISO 11783 CAN frame.
use crate::protocol::pgn::RESERVED;
use crate::protocol::transport::can_id::CanId;
use embedded_can::{ExtendedId, Id};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw frame as read from or written to the CAN bus.
pub struct CanFrame {
    /// Full 29-bit CAN identifier stored inside a `u32`.
    pub id: CanId,
    /// Payload buffer. Bytes past `len` hold the 0xFF filler.
    pub data: [u8; 8],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Build a frame from up to eight bytes; the rest of the buffer is padded with 0xFF.
    /// Extra bytes are dropped.
    pub fn new(id: CanId, payload: &[u8]) -> Self {
        let len = payload.len().min(8);
        let mut data = [RESERVED; 8];
        data[..len].copy_from_slice(&payload[..len]);
        Self { id, data, len }
    }

    /// Populated bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Mux/command byte, when the frame carries data.
    pub fn first_byte(&self) -> Option<u8> {
        self.payload().first().copied()
    }
}

/// Bridge towards `embedded-can` drivers. ISOBUS only uses extended data frames:
/// standard identifiers and remote frames are rejected.
impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Extended(extended) if data.len() <= 8 => {
                Some(CanFrame::new(CanId(extended.as_raw()), data))
            }
            _ => None,
        }
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        true
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        let raw = self.id.0 & ExtendedId::MAX.as_raw();
        Id::Extended(ExtendedId::new(raw).unwrap_or(ExtendedId::ZERO))
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}
