//! Abstraction traits used by the transport layer (CAN bus, timer, periodic
//! transmission and the segmented PGN sender).
pub mod can_bus;
pub mod korri_timer;
pub mod periodic;
pub mod pgn_sender;
