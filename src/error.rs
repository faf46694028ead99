//! Error definitions shared across library modules.
//! Each type models one layer: segmented transport, address claiming, and the
//! VT client session. Bus driver errors travel inside them untouched.
use crate::protocol::vt::commands::VtFunction;
use thiserror_no_std::Error;

//==================================================================================TRANSPORT_ERROR
#[derive(Error, Debug, PartialEq, Eq)]
/// Failures of a single-frame, TP or ETP transfer.
pub enum TransportError<E: core::fmt::Debug> {
    /// CAN bus rejected a frame.
    #[error("CAN bus send error: {0:?}")]
    Send(E),

    /// Unable to receive frames while waiting for a handshake.
    #[error("CAN bus receive error: {0:?}")]
    Receive(E),

    /// The peer did not answer with the expected control byte in time.
    #[error("Timed out waiting for control byte {control:#04X}")]
    HandshakeTimeout { control: u8 },

    /// Payload exceeds the Extended Transport Protocol capacity.
    #[error("Payload of {len} bytes is too large to transfer")]
    PayloadTooLarge { len: usize },

    /// ETP clear-to-send asked for a packet outside the transfer.
    #[error("Peer requested packet {next_packet} outside the transfer")]
    InvalidPacketRequest { next_packet: u32 },

    /// ETP has no broadcast variant.
    #[error("Extended transport cannot target the global address")]
    BroadcastNotSupported,
}

//==================================================================================CLAIM_ERROR
#[derive(Error, Debug, PartialEq, Eq)]
/// Errors encountered while claiming an address.
pub enum ClaimError<E: core::fmt::Debug> {
    /// CAN bus rejected the frame during transmission.
    #[error("CAN bus send error: {0:?}")]
    SendError(E),

    /// The global address can never be claimed.
    #[error("Address {address:#04X} cannot be claimed")]
    InvalidSourceAddress { address: u8 },
}

//==================================================================================VT_ERROR
#[derive(Error, Debug, PartialEq, Eq)]
/// Outcome of a failed VT client operation.
pub enum VtError<E: core::fmt::Debug> {
    /// A VT command was issued while disconnected. Nothing was sent.
    #[error("Not connected to a VT")]
    NotConnected,

    /// `connect` was called on a live session.
    #[error("Already connected to a VT")]
    AlreadyConnected,

    /// No VT status message from that address within the status timeout.
    #[error("No VT status message from address {address:#04X}")]
    VtNotFound { address: u8 },

    /// No matching response within the deadline.
    #[error("No response to {function:?}")]
    Timeout { function: VtFunction },

    /// The VT answered with a non-zero error code.
    #[error("{function:?} rejected with error code {code:#04X}")]
    Protocol { function: VtFunction, code: u8 },

    /// The VT cannot store an object pool of this size.
    #[error("VT has not enough memory for {required} bytes")]
    InsufficientMemory { required: u32 },

    /// A segmented transfer broke down.
    #[error("Transport failure: {0}")]
    Transport(TransportError<E>),

    /// The address claim could not be sent.
    #[error("Address claim failure: {0}")]
    Claim(ClaimError<E>),

    /// CAN bus rejected a frame.
    #[error("CAN bus send error: {0:?}")]
    Send(E),

    /// Unable to receive frames while waiting for a response.
    #[error("CAN bus receive error: {0:?}")]
    Receive(E),

    /// The periodic scheduler refused the working-set maintenance frame.
    #[error("Periodic transmission unavailable")]
    PeriodicUnavailable,

    /// Caller input rejected before touching the bus.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: &'static str },
}

impl<E: core::fmt::Debug> From<TransportError<E>> for VtError<E> {
    fn from(err: TransportError<E>) -> Self {
        match err {
            TransportError::Send(e) => VtError::Send(e),
            TransportError::Receive(e) => VtError::Receive(e),
            other => VtError::Transport(other),
        }
    }
}

impl<E: core::fmt::Debug> From<ClaimError<E>> for VtError<E> {
    fn from(err: ClaimError<E>) -> Self {
        match err {
            ClaimError::SendError(e) => VtError::Send(e),
            other => VtError::Claim(other),
        }
    }
}
