//! Periodic transmission contract. The working-set maintenance message has to
//! keep flowing once a second while foreground commands block on responses, so it
//! is handed to whoever owns the transmit path: a driver feature (SocketCAN
//! broadcast manager, CAN controller mailbox) or
//! [`PeriodicTable`](crate::protocol::transport::periodic_table::PeriodicTable).
use crate::protocol::transport::can_frame::CanFrame;

/// Schedule and cancel frames that repeat on their own.
pub trait PeriodicScheduler {
    /// Token identifying one scheduled frame.
    type Handle;
    type Error: core::fmt::Debug;

    /// Start sending `frame` every `period_ms` milliseconds.
    fn schedule_periodic(
        &mut self,
        frame: &CanFrame,
        period_ms: u32,
    ) -> Result<Self::Handle, Self::Error>;

    /// Stop a scheduled frame. Once this returns, the frame is not sent again.
    fn cancel_periodic(&mut self, handle: Self::Handle);
}
