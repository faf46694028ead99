//! Request/response correlation: wait for the next frame matching a PGN,
//! source, destination and mux byte, or give up once the deadline elapses.
//!
//! The wait owns the bus receive path for its whole duration (`&mut` borrow),
//! so at most one expectation is ever outstanding. Frames that do not match
//! are dropped; nothing is queued for later.
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::{can_bus::CanBus, korri_timer::KorriTimer};
use futures_util::future::{select, Either};
use futures_util::pin_mut;

/// Correlation key of an in-flight request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponseFilter {
    pub pgn: u32,
    /// Node expected to answer.
    pub source_address: u8,
    /// Address the answer is sent to (`0xFF` for broadcasts).
    pub destination_address: u8,
    /// Mux/command byte the answer starts with.
    pub first_byte: u8,
}

impl ResponseFilter {
    pub const fn new(pgn: u32, source_address: u8, destination_address: u8, first_byte: u8) -> Self {
        Self {
            pgn,
            source_address,
            destination_address,
            first_byte,
        }
    }

    /// All four keys must agree.
    pub fn matches(&self, frame: &CanFrame) -> bool {
        frame.id.pgn() == self.pgn
            && frame.id.source_address() == self.source_address
            && frame.id.destination() == self.destination_address
            && frame.first_byte() == Some(self.first_byte)
    }
}

/// Wait up to `timeout_ms` for a frame accepted by `filter`.
///
/// Returns `Ok(None)` on timeout. Receive errors abort the wait.
pub async fn wait_for_frame<C: CanBus, T: KorriTimer>(
    can_bus: &mut C,
    timer: &mut T,
    filter: &ResponseFilter,
    timeout_ms: u32,
) -> Result<Option<CanFrame>, C::Error>
where
    C::Error: core::fmt::Debug,
{
    let deadline = timer.delay_ms(timeout_ms);
    pin_mut!(deadline);

    loop {
        let recv = can_bus.recv();
        pin_mut!(recv);

        match select(deadline.as_mut(), recv).await {
            Either::Left(_) => {
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "Timeout waiting for PGN {:#X} mux {:#X} from {:#X}",
                    filter.pgn,
                    filter.first_byte,
                    filter.source_address
                );
                return Ok(None);
            }
            Either::Right((incoming, _)) => {
                let frame = incoming?;
                if filter.matches(&frame) {
                    return Ok(Some(frame));
                }
                #[cfg(feature = "defmt")]
                defmt::trace!("Discarding frame {:#X}", frame.id.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::pgn::PGN_VT_TO_ECU;
    use crate::protocol::transport::can_id::CanId;

    fn vt_frame(source: u8, destination: u8, data: &[u8]) -> CanFrame {
        let id = CanId::builder(PGN_VT_TO_ECU, source)
            .to_destination(destination)
            .build();
        CanFrame::new(id, data)
    }

    #[test]
    fn test_filter_requires_every_key() {
        let filter = ResponseFilter::new(PGN_VT_TO_ECU, 0x26, 0x0A, 0xAD);

        assert!(filter.matches(&vt_frame(0x26, 0x0A, &[0xAD, 0, 0, 0])));
        assert!(!filter.matches(&vt_frame(0x27, 0x0A, &[0xAD])));
        assert!(!filter.matches(&vt_frame(0x26, 0x0B, &[0xAD])));
        assert!(!filter.matches(&vt_frame(0x26, 0x0A, &[0xAE])));
        assert!(!filter.matches(&vt_frame(0x26, 0x0A, &[])));
    }

    #[test]
    fn test_broadcast_filter() {
        let status = ResponseFilter::new(PGN_VT_TO_ECU, 0x26, 0xFF, 0xFE);
        assert!(status.matches(&vt_frame(0x26, 0xFF, &[0xFE, 0xFF])));
        assert!(!status.matches(&vt_frame(0x26, 0x0A, &[0xFE, 0xFF])));
    }
}
