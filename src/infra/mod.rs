//! Infrastructure shared by the protocol layers: byte-level codecs that carry
//! no ISOBUS semantics of their own.
pub mod codec;
