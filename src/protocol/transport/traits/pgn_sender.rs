//! `CanBus` extension sending a parameter group of any size: one frame up to eight
//! bytes, TP or BAM up to 1785 bytes, ETP beyond that.
//!
//! # Inter-frame delay
//!
//! Data packets of a segmented transfer are spaced by
//! [`PACKET_INTER_FRAME_DELAY_MS`](crate::protocol::transport::PACKET_INTER_FRAME_DELAY_MS)
//! (BAM: [`BAM_INTER_FRAME_DELAY_MS`](crate::protocol::transport::BAM_INTER_FRAME_DELAY_MS))
//! to keep embedded CAN controllers from saturating their TX buffers.
use crate::{
    error::TransportError,
    protocol::transport::can_frame::CanFrame,
    protocol::transport::can_id::CanId,
    protocol::transport::traits::{can_bus::CanBus, korri_timer::KorriTimer},
    protocol::transport::transfer::{TransferKind, TransferRequest},
    protocol::transport::{etp, tp, SINGLE_FRAME_MAX_PAYLOAD},
};

/// Trait extending `CanBus` with size-aware transmission.
pub trait PgnSender: CanBus
where
    <Self as CanBus>::Error: core::fmt::Debug,
{
    /// Send `request`, picking the transport from its payload length.
    ///
    /// Short payloads are padded to eight bytes with 0xFF. Segmented transfers
    /// return once the last data packet is sent, or once the receiver acknowledged
    /// the message when [`TransferRequest::require_completion`] is set.
    ///
    /// # Errors
    ///
    /// - [`TransportError::PayloadTooLarge`] beyond the ETP capacity
    /// - [`TransportError::BroadcastNotSupported`] for an ETP sized broadcast
    /// - [`TransportError::HandshakeTimeout`] when the receiver stops answering
    /// - [`TransportError::InvalidPacketRequest`] for an out of range ETP window
    /// - [`TransportError::Send`] / [`TransportError::Receive`] from the bus
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use korri_isobus::protocol::transport::{
    ///     traits::pgn_sender::PgnSender,
    ///     transfer::{Payload, TransferRequest},
    /// };
    ///
    /// let request = TransferRequest::new(0xE700, 0x0A, 0x26, Payload::with_prefix(&[0x11], pool));
    /// can_bus.send_transfer(&mut timer, request).await?;
    /// ```
    fn send_transfer<'a, T: KorriTimer>(
        &'a mut self,
        timer: &'a mut T,
        request: TransferRequest<'a>,
    ) -> impl core::future::Future<Output = Result<(), TransportError<Self::Error>>> + 'a;
}

impl<C: CanBus> PgnSender for C
where
    C::Error: core::fmt::Debug,
{
    fn send_transfer<'a, T: KorriTimer>(
        &'a mut self,
        timer: &'a mut T,
        request: TransferRequest<'a>,
    ) -> impl core::future::Future<Output = Result<(), TransportError<Self::Error>>> + 'a {
        async move {
            match request.kind() {
                TransferKind::SingleFrame => {
                    let mut data = [0u8; SINGLE_FRAME_MAX_PAYLOAD];
                    request.payload.copy_into(0, &mut data);
                    let id = CanId::builder(request.pgn, request.source_address)
                        .to_destination(request.destination_address)
                        .with_priority(request.priority)
                        .build();
                    self.send(&CanFrame::new(id, &data))
                        .await
                        .map_err(TransportError::Send)
                }
                TransferKind::Tp => tp::send_tp(self, timer, &request).await,
                TransferKind::Bam => tp::send_bam(self, timer, &request).await,
                TransferKind::Etp => etp::send_etp(self, timer, &request).await,
                TransferKind::TooLarge => Err(TransportError::PayloadTooLarge {
                    len: request.payload.len(),
                }),
            }
        }
    }
}
