//! Extended Transport Protocol: destination specific transfers of 1786 to
//! 117,440,505 bytes.
//!
//! The receiver drives the transfer window by window. Each Clear-To-Send names the
//! next packet it wants and how many it accepts; the originator answers with a Data
//! Packet Offset and that many packets, numbered from 1 relative to the offset.
//!
//! ```text
//! RTS  : 0x14 | size LE32 | PGN LE24
//! CTS  : 0x15 | max packets | next packet LE24 | PGN LE24
//! DPO  : 0x16 | packets | offset LE24 | PGN LE24
//! EOMA : 0x17 | size LE32 | PGN LE24
//! ```
use crate::error::TransportError;
use crate::infra::codec::numeric::{le_u24, to_le};
use crate::protocol::pgn::{ADDRESS_GLOBAL, PGN_ETP_CM, PGN_ETP_DT, RESERVED};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::matcher::ResponseFilter;
use crate::protocol::transport::tp::{await_handshake, data_id, send_data_packets};
use crate::protocol::transport::traits::{can_bus::CanBus, korri_timer::KorriTimer};
use crate::protocol::transport::transfer::TransferRequest;
use crate::protocol::transport::{packet_count, PACKET_INTER_FRAME_DELAY_MS};

/// Largest payload carried by ETP ((2^24 - 1) packets of 7 bytes).
pub const ETP_MAX_PAYLOAD: usize = 117_440_505;

pub const ETP_CM_RTS: u8 = 0x14;
pub const ETP_CM_CTS: u8 = 0x15;
pub const ETP_CM_DPO: u8 = 0x16;
pub const ETP_CM_EOMA: u8 = 0x17;

/// Window requested by a Clear-To-Send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClearToSend {
    /// Packets accepted in this window; zero asks the originator to hold.
    pub max_packets: u8,
    /// 1-based number of the next packet expected.
    pub next_packet: u32,
}

impl ClearToSend {
    pub fn parse(frame: &CanFrame) -> Self {
        Self {
            max_packets: frame.data[1],
            next_packet: le_u24(&frame.data, 2),
        }
    }
}

fn cm_id(request: &TransferRequest<'_>) -> CanId {
    CanId::builder(PGN_ETP_CM, request.source_address)
        .to_destination(request.destination_address)
        .with_priority(request.priority)
        .build()
}

/// Extended Request-To-Send.
pub fn rts_frame(request: &TransferRequest<'_>) -> CanFrame {
    let mut data = [RESERVED; 8];
    data[0] = ETP_CM_RTS;
    to_le(request.payload.len() as u64, &mut data[1..5]);
    to_le(request.pgn as u64, &mut data[5..8]);
    CanFrame::new(cm_id(request), &data)
}

/// Data Packet Offset announcing `packets` packets after packet number `offset`.
pub fn dpo_frame(request: &TransferRequest<'_>, packets: u8, offset: u32) -> CanFrame {
    let mut data = [RESERVED; 8];
    data[0] = ETP_CM_DPO;
    data[1] = packets;
    to_le(offset as u64, &mut data[2..5]);
    to_le(request.pgn as u64, &mut data[5..8]);
    CanFrame::new(cm_id(request), &data)
}

/// Run an ETP transfer to completion, following every Clear-To-Send window.
pub async fn send_etp<C: CanBus, T: KorriTimer>(
    can_bus: &mut C,
    timer: &mut T,
    request: &TransferRequest<'_>,
) -> Result<(), TransportError<C::Error>>
where
    C::Error: core::fmt::Debug,
{
    if request.destination_address == ADDRESS_GLOBAL {
        return Err(TransportError::BroadcastNotSupported);
    }

    let total_packets = packet_count(request.payload.len());

    #[cfg(feature = "defmt")]
    defmt::debug!(
        "(ETP) RTS for PGN {:#X}: {} bytes in {} packets",
        request.pgn,
        request.payload.len(),
        total_packets
    );
    can_bus
        .send(&rts_frame(request))
        .await
        .map_err(TransportError::Send)?;

    let cts_filter = ResponseFilter::new(
        PGN_ETP_CM,
        request.destination_address,
        request.source_address,
        ETP_CM_CTS,
    );
    let packet_id = data_id(PGN_ETP_DT, request);

    loop {
        let cts = ClearToSend::parse(&await_handshake(can_bus, timer, &cts_filter).await?);

        if cts.max_packets == 0 {
            #[cfg(feature = "defmt")]
            defmt::debug!("(ETP) receiver holds the transfer");
            continue;
        }

        let offset = match cts.next_packet.checked_sub(1) {
            Some(offset) if (offset as usize) < total_packets => offset as usize,
            _ => {
                return Err(TransportError::InvalidPacketRequest {
                    next_packet: cts.next_packet,
                })
            }
        };
        let window = (cts.max_packets as usize).min(total_packets - offset);

        #[cfg(feature = "defmt")]
        defmt::debug!("(ETP) window of {} packets from offset {}", window, offset);

        can_bus
            .send(&dpo_frame(request, window as u8, offset as u32))
            .await
            .map_err(TransportError::Send)?;
        send_data_packets(
            can_bus,
            timer,
            packet_id,
            &request.payload,
            offset,
            window,
            PACKET_INTER_FRAME_DELAY_MS,
        )
        .await?;

        if offset + window >= total_packets {
            break;
        }
    }

    if request.require_completion {
        let eoma_filter = ResponseFilter::new(
            PGN_ETP_CM,
            request.destination_address,
            request.source_address,
            ETP_CM_EOMA,
        );
        await_handshake(can_bus, timer, &eoma_filter).await?;
    }

    Ok(())
}
