//! `korri-isobus` library: the control-function and Virtual Terminal client side of
//! an ISO 11783 (ISOBUS) stack in a `no_std` environment. The crate exposes the
//! infrastructure modules (byte codec), protocol logic (identifiers, TP/ETP
//! transport, address claiming) and the VT client session.
#![no_std]
//==================================================================================
/// Transport, address claim and VT session errors.
pub mod error;
/// Byte-level helpers shared by every protocol layer.
pub mod infra;
/// ISOBUS implementation: CAN transport, segmentation, network management and the
/// Virtual Terminal client.
pub mod protocol;
//==================================================================================
