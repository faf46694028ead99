//! Creation and extraction of the 29-bit CAN identifiers used by
//! ISO 11783 (derived from the SAE J1939 data link layer).
//!
//! # Layout
//!
//! ```text
//! Bits 26-28 : priority
//! Bit  24    : data page
//! Bits 16-23 : PDU format (PF)
//! Bits  8-15 : PDU specific (destination for PDU1, group extension for PDU2)
//! Bits  0-7  : source address
//! ```
//!
//! A PF below [`PDU2_FORMAT_THRESHOLD`] selects PDU1 (destination specific). Anything
//! else is PDU2: the destination is implicit and always decodes as global, so a
//! destination given for a PDU2 PGN does not survive a round trip.
use crate::protocol::pgn::{ADDRESS_GLOBAL, DEFAULT_PRIORITY};

/// First PDU format value handled as PDU2.
pub const PDU2_FORMAT_THRESHOLD: u8 = 0xEF;

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Encapsulates an extended CAN identifier (29 bits) and exposes accessors
/// for priority, PGN, destination, and source.
pub struct CanId(pub u32);

impl CanId {
    /// Creates a pre-configured `CanIdBuilder` for a PGN and source address.
    pub fn builder(pgn: u32, source_address: u8) -> CanIdBuilder {
        CanIdBuilder::new(pgn, source_address)
    }

    /// Returns the priority (3 bits, value 0-7) encoded in the CAN ID.
    pub fn priority(&self) -> u8 {
        ((self.0 >> 26) & 0x07) as u8
    }

    /// PDU format byte (bits 16-23).
    pub fn pdu_format(&self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    /// `true` when the identifier carries an explicit destination.
    pub fn is_pdu1(&self) -> bool {
        self.pdu_format() < PDU2_FORMAT_THRESHOLD
    }

    /// Extracts the 17-bit PGN, handling the PDU1/PDU2 distinction.
    pub fn pgn(&self) -> u32 {
        if self.is_pdu1() {
            // PS holds the destination, not part of the PGN.
            (self.0 >> 8) & 0x1_FF00
        } else {
            (self.0 >> 8) & 0x1_FFFF
        }
    }

    /// Destination address; PDU2 identifiers always report the global address.
    pub fn destination(&self) -> u8 {
        if self.is_pdu1() {
            ((self.0 >> 8) & 0xFF) as u8
        } else {
            ADDRESS_GLOBAL
        }
    }

    /// Eight-bit source address.
    pub fn source_address(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Decode every field at once.
    pub fn parts(&self) -> IsobusId {
        IsobusId {
            priority: self.priority(),
            pgn: self.pgn(),
            source_address: self.source_address(),
            destination_address: self.destination(),
        }
    }
}

//==================================================================================ISOBUS_ID
/// Decoded view of a [`CanId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IsobusId {
    /// 0 (highest) to 7 (lowest).
    pub priority: u8,
    /// Parameter group number, data page included.
    pub pgn: u32,
    pub source_address: u8,
    /// `0xFF` addresses every node.
    pub destination_address: u8,
}

impl IsobusId {
    /// Pack the fields into a 29-bit identifier.
    pub fn encode(&self) -> CanId {
        let priority = ((self.priority & 0x07) as u32) << 26;
        let source = self.source_address as u32;
        let pdu_format = ((self.pgn >> 8) & 0xFF) as u8;

        if pdu_format < PDU2_FORMAT_THRESHOLD {
            CanId(
                priority
                    | ((self.pgn & 0x1_FF00) << 8)
                    | ((self.destination_address as u32) << 8)
                    | source,
            )
        } else {
            CanId(priority | ((self.pgn & 0x1_FFFF) << 8) | source)
        }
    }
}

impl From<CanId> for IsobusId {
    fn from(id: CanId) -> Self {
        id.parts()
    }
}

impl From<IsobusId> for CanId {
    fn from(id: IsobusId) -> Self {
        id.encode()
    }
}

//==================================================================================CAN_ID_BUILDER
#[derive(Debug, Clone, Copy)]
/// Fluent builder on top of [`IsobusId::encode`].
pub struct CanIdBuilder {
    pub priority: u8,
    pub pgn: u32,
    pub source_address: u8,
    pub destination: u8,
}

impl CanIdBuilder {
    /// Initializes the builder for a given PGN and source address, addressed to everyone.
    pub fn new(pgn: u32, source_address: u8) -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            pgn,
            source_address,
            destination: ADDRESS_GLOBAL,
        }
    }

    /// Sets the priority (3 bits) to use during construction.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority & 0x07;
        self
    }

    /// Assigns a destination address. Ignored by PDU2 PGNs.
    pub fn to_destination(mut self, destination_address: u8) -> Self {
        self.destination = destination_address;
        self
    }

    /// Builds the identifier. Every combination is encodable.
    pub fn build(self) -> CanId {
        IsobusId {
            priority: self.priority,
            pgn: self.pgn,
            source_address: self.source_address,
            destination_address: self.destination,
        }
        .encode()
    }
}
