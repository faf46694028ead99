//! ISO 11783-6 Virtual Terminal client: message codec and session state machine.
//!
//! ## Timing Constants
//!
//! Defaults for [`VtClientConfig`](client::VtClientConfig).
pub mod client;
pub mod commands;

/// VT version announced in the working set maintenance message.
pub const VT_VERSION: u8 = 3;

/// Period of the working set maintenance message (ms).
pub const MAINTENANCE_PERIOD_MS: u32 = 1_000;

/// How long a VT may take to answer a command (ms).
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u32 = 3_000;

/// End of Object Pool is acknowledged once the pool is parsed, which takes longer (ms).
pub const END_OF_POOL_TIMEOUT_MS: u32 = 5_000;

/// How long `connect` listens for the VT status broadcast (ms).
pub const STATUS_TIMEOUT_MS: u32 = 3_000;

/// Pause between the initiating maintenance message and the first command (ms).
pub const CONNECT_SETTLE_MS: u32 = 500;
