//! ISO 11783 transport layer: CAN frame representation, 29-bit identifier
//! management, response matching, TP/ETP segmentation and bus abstraction traits.
//!
//! ## Timing Constants
//!
//! Delays and timeouts used by the segmented transfers and the address claim.

pub mod can_frame;
pub mod can_id;
pub mod etp;
pub mod matcher;
pub mod periodic_table;
pub mod tp;
pub mod traits;
pub mod transfer;

/// Minimal delay between two data packets of the same TP/ETP transfer (ms).
///
/// The protocol permits back-to-back packets, yet small CAN controllers (three-frame
/// TX buffers are common) overflow when a whole window is queued at once.
pub const PACKET_INTER_FRAME_DELAY_MS: u32 = 1;

/// Gap between broadcast (BAM) data packets (ms). Receivers are allowed 50 to 200 ms.
pub const BAM_INTER_FRAME_DELAY_MS: u32 = 50;

/// How long the originator waits for a clear-to-send or an end-of-message
/// acknowledgement before abandoning the transfer (ms).
pub const HANDSHAKE_TIMEOUT_MS: u32 = 3_000;

/// Base backoff before an address claim and settle time after it (ms).
pub const ADDRESS_CLAIM_SETTLE_MS: u32 = 250;

/// Number of payload bytes carried by one TP/ETP data packet.
pub const PACKET_DATA_LEN: usize = 7;

/// Largest payload that fits in a single frame.
pub const SINGLE_FRAME_MAX_PAYLOAD: usize = 8;

/// Number of data packets needed for `len` bytes.
#[inline]
pub const fn packet_count(len: usize) -> usize {
    len.div_ceil(PACKET_DATA_LEN)
}
