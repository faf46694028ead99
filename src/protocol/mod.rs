//! ISOBUS protocol layers: network management, parameter groups, CAN transport
//! and the Virtual Terminal client.
pub mod managment;
pub mod pgn;
pub mod transport;
pub mod vt;
