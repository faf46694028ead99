//! ISO 11783-5 address claim, single-shot variant: ask the current holder of the address
//! for its claim, back off by a NAME-derived delay, announce our own claim and let it settle.
//!
//! Competing claims are not arbitrated; the procedure assumes the address is free.
use crate::error::ClaimError;
use crate::infra::codec::numeric::to_le_array;
use crate::protocol::managment::iso_name::IsoName;
use crate::protocol::pgn::{ADDRESS_GLOBAL, ADDRESS_NULL, PGN_ADDRESS_CLAIM, PGN_REQUEST};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::traits::{can_bus::CanBus, korri_timer::KorriTimer};
use crate::protocol::transport::ADDRESS_CLAIM_SETTLE_MS;

/// Execute the claim sequence for `source_address` and return it.
///
/// Sequence:
/// 1. Request PGN 0xEE00 from the node holding `source_address` (sent from the null
///    address).
/// 2. Wait `250 ms + slot * 0.6 ms`, `slot` being derived from the NAME.
/// 3. Broadcast Address Claimed carrying the NAME.
/// 4. Wait 250 ms for the claim to settle.
pub async fn claim_address<C: CanBus, T: KorriTimer>(
    can_bus: &mut C,
    timer: &mut T,
    name: IsoName,
    source_address: u8,
) -> Result<u8, ClaimError<C::Error>>
where
    C::Error: core::fmt::Debug,
{
    if source_address == ADDRESS_GLOBAL {
        return Err(ClaimError::InvalidSourceAddress {
            address: source_address,
        });
    }

    #[cfg(feature = "defmt")]
    defmt::info!("Requesting address claims before claiming {:#X}", source_address);

    can_bus
        .send(&build_address_claim_request_frame(source_address))
        .await
        .map_err(ClaimError::SendError)?;

    timer.delay_ms(contention_delay_ms(name)).await;

    #[cfg(feature = "defmt")]
    defmt::info!("Claiming address {:#X} for NAME {:#X}", source_address, name.raw());

    can_bus
        .send(&build_address_claim_frame(name, source_address))
        .await
        .map_err(ClaimError::SendError)?;

    timer.delay_ms(ADDRESS_CLAIM_SETTLE_MS).await;
    Ok(source_address)
}

/// Request for PGN 0xEE00 addressed to `address_to_claim`, sent from the null address.
pub fn build_address_claim_request_frame(address_to_claim: u8) -> CanFrame {
    let id = CanId::builder(PGN_REQUEST, ADDRESS_NULL)
        .to_destination(address_to_claim)
        .build();
    CanFrame::new(id, &to_le_array::<3>(PGN_ADDRESS_CLAIM as u64))
}

/// Address Claimed (PGN 0xEE00) for the provided NAME.
pub fn build_address_claim_frame(name: IsoName, address_to_claim: u8) -> CanFrame {
    let id = CanId::builder(PGN_ADDRESS_CLAIM, address_to_claim)
        .to_destination(ADDRESS_GLOBAL)
        .build();
    CanFrame::new(id, &name.to_le_bytes())
}

/// Backoff before claiming: `250 ms + slot * 0.6 ms` with `slot` in `0..=255`.
///
/// The slot is pseudo-random but not drawn per claim: it is a xorshift scramble of the
/// NAME. Nodes with different NAMEs spread their claims over the whole window, while a
/// given NAME gets the same delay on every claim.
pub fn contention_delay_ms(name: IsoName) -> u32 {
    let mut x = name.raw() | 1;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    let slot = (x & 0xFF) as u32;
    ADDRESS_CLAIM_SETTLE_MS + slot * 6 / 10
}
