//! Transport Protocol (ISO 11783-3): 9 to 1785 bytes split into 7-byte packets.
//!
//! Destination specific transfers open with Request-To-Send and send the whole
//! packet sequence after the first Clear-To-Send. Broadcasts announce the transfer
//! with a BAM and pace the packets without any handshake.
//!
//! ```text
//! RTS  : 0x10 | size LE16 | packets | 0xFF | PGN LE24
//! CTS  : 0x11 | max packets | next packet | 0xFF 0xFF | PGN LE24
//! EOMA : 0x13 | size LE16 | packets | 0xFF | PGN LE24
//! BAM  : 0x20 | size LE16 | packets | 0xFF | PGN LE24
//! DT   : seq (1-based) | 7 data bytes
//! ```
use crate::error::TransportError;
use crate::infra::codec::numeric::to_le;
use crate::protocol::pgn::{
    ADDRESS_GLOBAL, DATA_TRANSFER_PRIORITY, PGN_TP_CM, PGN_TP_DT, RESERVED,
};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::matcher::{wait_for_frame, ResponseFilter};
use crate::protocol::transport::traits::{can_bus::CanBus, korri_timer::KorriTimer};
use crate::protocol::transport::transfer::{Payload, TransferRequest};
use crate::protocol::transport::{
    packet_count, BAM_INTER_FRAME_DELAY_MS, HANDSHAKE_TIMEOUT_MS, PACKET_INTER_FRAME_DELAY_MS,
};

/// Largest payload carried by TP (255 packets of 7 bytes).
pub const TP_MAX_PAYLOAD: usize = 1785;

/// Request-To-Send control byte.
pub const TP_CM_RTS: u8 = 0x10;
/// Clear-To-Send control byte.
pub const TP_CM_CTS: u8 = 0x11;
/// End-of-Message-Acknowledgement control byte.
pub const TP_CM_EOMA: u8 = 0x13;
/// Broadcast Announce Message control byte.
pub const TP_CM_BAM: u8 = 0x20;

//==================================================================================FRAMES
/// Connection management header shared by RTS and BAM.
fn announce_frame(control: u8, request: &TransferRequest<'_>) -> CanFrame {
    let len = request.payload.len();
    let mut data = [RESERVED; 8];
    data[0] = control;
    to_le(len as u64, &mut data[1..3]);
    data[3] = packet_count(len) as u8;
    to_le(request.pgn as u64, &mut data[5..8]);

    let id = CanId::builder(PGN_TP_CM, request.source_address)
        .to_destination(request.destination_address)
        .with_priority(request.priority)
        .build();
    CanFrame::new(id, &data)
}

/// Request-To-Send opening a destination specific transfer.
pub fn rts_frame(request: &TransferRequest<'_>) -> CanFrame {
    announce_frame(TP_CM_RTS, request)
}

/// Broadcast Announce Message.
pub fn bam_frame(request: &TransferRequest<'_>) -> CanFrame {
    announce_frame(TP_CM_BAM, request)
}

/// Identifier of the data packets of `request` on `data_pgn`.
pub(crate) fn data_id(data_pgn: u32, request: &TransferRequest<'_>) -> CanId {
    CanId::builder(data_pgn, request.source_address)
        .to_destination(request.destination_address)
        .with_priority(DATA_TRANSFER_PRIORITY)
        .build()
}

/// Data packet carrying bytes `packet_index * 7 ..` with sequence number `sequence`.
pub fn data_frame(id: CanId, sequence: u8, payload: &Payload<'_>, packet_index: usize) -> CanFrame {
    let mut data = [RESERVED; 8];
    data[0] = sequence;
    data[1..].copy_from_slice(&payload.packet(packet_index));
    CanFrame::new(id, &data)
}

//==================================================================================SENDING
/// Send `count` packets starting at `first_packet`, numbered from 1, `gap_ms` apart.
pub(crate) async fn send_data_packets<C: CanBus, T: KorriTimer>(
    can_bus: &mut C,
    timer: &mut T,
    id: CanId,
    payload: &Payload<'_>,
    first_packet: usize,
    count: usize,
    gap_ms: u32,
) -> Result<(), TransportError<C::Error>>
where
    C::Error: core::fmt::Debug,
{
    for n in 0..count {
        if n > 0 {
            timer.delay_ms(gap_ms).await;
        }
        let frame = data_frame(id, (n + 1) as u8, payload, first_packet + n);
        can_bus.send(&frame).await.map_err(TransportError::Send)?;
    }
    Ok(())
}

/// Wait for a connection management answer, mapping a missed deadline to
/// [`TransportError::HandshakeTimeout`].
pub(crate) async fn await_handshake<C: CanBus, T: KorriTimer>(
    can_bus: &mut C,
    timer: &mut T,
    filter: &ResponseFilter,
) -> Result<CanFrame, TransportError<C::Error>>
where
    C::Error: core::fmt::Debug,
{
    wait_for_frame(can_bus, timer, filter, HANDSHAKE_TIMEOUT_MS)
        .await
        .map_err(TransportError::Receive)?
        .ok_or(TransportError::HandshakeTimeout {
            control: filter.first_byte,
        })
}

/// Destination specific TP transfer: RTS, one CTS, every packet, optional EOMA.
pub async fn send_tp<C: CanBus, T: KorriTimer>(
    can_bus: &mut C,
    timer: &mut T,
    request: &TransferRequest<'_>,
) -> Result<(), TransportError<C::Error>>
where
    C::Error: core::fmt::Debug,
{
    let total_packets = packet_count(request.payload.len());

    #[cfg(feature = "defmt")]
    defmt::debug!(
        "(TP) RTS for PGN {:#X}: {} bytes in {} packets",
        request.pgn,
        request.payload.len(),
        total_packets
    );
    can_bus
        .send(&rts_frame(request))
        .await
        .map_err(TransportError::Send)?;

    let cts_filter = ResponseFilter::new(
        PGN_TP_CM,
        request.destination_address,
        request.source_address,
        TP_CM_CTS,
    );
    let _cts = await_handshake(can_bus, timer, &cts_filter).await?;

    #[cfg(feature = "defmt")]
    defmt::debug!(
        "(TP) CTS received: max {} packets, next {}",
        _cts.data[1],
        _cts.data[2]
    );

    let id = data_id(PGN_TP_DT, request);
    send_data_packets(
        can_bus,
        timer,
        id,
        &request.payload,
        0,
        total_packets,
        PACKET_INTER_FRAME_DELAY_MS,
    )
    .await?;

    if request.require_completion {
        let eoma_filter = ResponseFilter::new(
            PGN_TP_CM,
            request.destination_address,
            request.source_address,
            TP_CM_EOMA,
        );
        await_handshake(can_bus, timer, &eoma_filter).await?;
    }

    Ok(())
}

/// Broadcast TP transfer: BAM followed by paced packets, nothing to wait for.
pub async fn send_bam<C: CanBus, T: KorriTimer>(
    can_bus: &mut C,
    timer: &mut T,
    request: &TransferRequest<'_>,
) -> Result<(), TransportError<C::Error>>
where
    C::Error: core::fmt::Debug,
{
    let mut broadcast = *request;
    broadcast.destination_address = ADDRESS_GLOBAL;

    can_bus
        .send(&bam_frame(&broadcast))
        .await
        .map_err(TransportError::Send)?;

    let id = data_id(PGN_TP_DT, &broadcast);
    let total_packets = packet_count(broadcast.payload.len());
    // The first packet also keeps the BAM gap.
    timer.delay_ms(BAM_INTER_FRAME_DELAY_MS).await;
    send_data_packets(
        can_bus,
        timer,
        id,
        &broadcast.payload,
        0,
        total_packets,
        BAM_INTER_FRAME_DELAY_MS,
    )
    .await
}
