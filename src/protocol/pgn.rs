//! Parameter Group Numbers and reserved addresses used by this stack.

/// VT to ECU application messages (ISO 11783-6).
pub const PGN_VT_TO_ECU: u32 = 0xE600;
/// ECU to VT application messages (ISO 11783-6).
pub const PGN_ECU_TO_VT: u32 = 0xE700;
/// Request (ISO 11783-3).
pub const PGN_REQUEST: u32 = 0xEA00;
/// Address Claimed (ISO 11783-5).
pub const PGN_ADDRESS_CLAIM: u32 = 0xEE00;
/// Transport Protocol, connection management.
pub const PGN_TP_CM: u32 = 0xEC00;
/// Transport Protocol, data transfer.
pub const PGN_TP_DT: u32 = 0xEB00;
/// Extended Transport Protocol, connection management.
pub const PGN_ETP_CM: u32 = 0xC800;
/// Extended Transport Protocol, data transfer.
pub const PGN_ETP_DT: u32 = 0xC700;

/// Global (broadcast) destination address.
pub const ADDRESS_GLOBAL: u8 = 0xFF;
/// Null address used by nodes that have not claimed yet.
pub const ADDRESS_NULL: u8 = 0xFE;

/// Filler for unused payload bytes.
pub const RESERVED: u8 = 0xFF;

/// Priority used for requests, claims and application messages.
pub const DEFAULT_PRIORITY: u8 = 6;
/// Priority used for TP/ETP data packets.
pub const DATA_TRANSFER_PRIORITY: u8 = 7;
