//! ISO 11783-6 Virtual Terminal messages: ECU to VT command encoders and VT to ECU
//! response decoders.
//!
//! Every command is keyed by its first byte (the function mux). The VT answers
//! with the same mux; its error code sits at a fixed offset per function and zero
//! always means success.
//!
//! ```text
//! change active mask   : AD | working set LE16 | mask LE16 | FF FF FF
//! change soft key mask : AE | 01 data / 02 alarm | mask LE16 | soft key mask LE16 | FF FF
//! change attribute     : AF | object LE16 | attribute | value LE32
//! change numeric value : A8 | object LE16 | FF | value LE32
//! change string value  : B3 | object LE16 | length LE16 | text
//! change list item     : B1 | object LE16 | index | new object LE16 | FF FF
//! get memory           : C0 | FF | required LE32 | FF FF
//! load / store version : D1 / D0 | 7 ASCII characters
//! working set maint.   : FF | initiating | version | FF FF FF FF FF
//! ```
use thiserror_no_std::Error;

use crate::infra::codec::numeric::{le_u16, to_le};
use crate::protocol::pgn::RESERVED;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::vt::VT_VERSION;

/// Length of a single-frame VT message.
pub const VT_MESSAGE_LEN: usize = 8;

/// One encoded single-frame command.
pub type VtMessage = [u8; VT_MESSAGE_LEN];

//==================================================================================VT_FUNCTION
/// VT function mux byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum VtFunction {
    ObjectPoolTransfer = 0x11,
    EndOfObjectPool = 0x12,
    Esc = 0x92,
    ChangeNumericValue = 0xA8,
    ChangeActiveMask = 0xAD,
    ChangeSoftKeyMask = 0xAE,
    ChangeAttribute = 0xAF,
    ChangeListItem = 0xB1,
    DeleteObjectPool = 0xB2,
    ChangeStringValue = 0xB3,
    IdentifyVt = 0xBB,
    GetMemory = 0xC0,
    StoreVersion = 0xD0,
    LoadVersion = 0xD1,
    VtStatus = 0xFE,
    WorkingSetMaintenance = 0xFF,
}

impl VtFunction {
    #[inline]
    pub const fn mux(self) -> u8 {
        self as u8
    }

    /// Where the error code and the echoed object id sit in the response, for
    /// functions that answer with one.
    pub const fn response_layout(self) -> Option<ResponseLayout> {
        let layout = match self {
            VtFunction::ChangeActiveMask | VtFunction::Esc => ResponseLayout {
                error_offset: 3,
                object_id_offset: Some(1),
            },
            VtFunction::ChangeSoftKeyMask => ResponseLayout {
                error_offset: 5,
                object_id_offset: Some(3),
            },
            VtFunction::ChangeAttribute => ResponseLayout::error_at(4),
            VtFunction::ChangeNumericValue => ResponseLayout::error_at(3),
            VtFunction::ChangeStringValue => ResponseLayout::error_at(5),
            VtFunction::ChangeListItem => ResponseLayout::error_at(6),
            VtFunction::DeleteObjectPool | VtFunction::EndOfObjectPool => {
                ResponseLayout::error_at(1)
            }
            VtFunction::LoadVersion | VtFunction::StoreVersion => ResponseLayout::error_at(5),
            VtFunction::ObjectPoolTransfer
            | VtFunction::IdentifyVt
            | VtFunction::GetMemory
            | VtFunction::VtStatus
            | VtFunction::WorkingSetMaintenance => return None,
        };
        Some(layout)
    }
}

impl TryFrom<u8> for VtFunction {
    type Error = u8;

    fn try_from(mux: u8) -> Result<Self, Self::Error> {
        Ok(match mux {
            0x11 => VtFunction::ObjectPoolTransfer,
            0x12 => VtFunction::EndOfObjectPool,
            0x92 => VtFunction::Esc,
            0xA8 => VtFunction::ChangeNumericValue,
            0xAD => VtFunction::ChangeActiveMask,
            0xAE => VtFunction::ChangeSoftKeyMask,
            0xAF => VtFunction::ChangeAttribute,
            0xB1 => VtFunction::ChangeListItem,
            0xB2 => VtFunction::DeleteObjectPool,
            0xB3 => VtFunction::ChangeStringValue,
            0xBB => VtFunction::IdentifyVt,
            0xC0 => VtFunction::GetMemory,
            0xD0 => VtFunction::StoreVersion,
            0xD1 => VtFunction::LoadVersion,
            0xFE => VtFunction::VtStatus,
            0xFF => VtFunction::WorkingSetMaintenance,
            other => return Err(other),
        })
    }
}

//==================================================================================COMMAND_ERROR
/// Command arguments that cannot be encoded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    #[error("Version label must be exactly 7 characters, got {len}")]
    LabelLength { len: usize },
    #[error("Version label must be ASCII")]
    LabelNotAscii,
    #[error("String of {len} bytes exceeds the 16-bit length field")]
    StringTooLong { len: usize },
}

impl CommandError {
    /// Static description, suitable for `VtError::InvalidArgument`.
    pub const fn reason(&self) -> &'static str {
        match self {
            CommandError::LabelLength { .. } => "version label must be exactly 7 characters",
            CommandError::LabelNotAscii => "version label must be ASCII",
            CommandError::StringTooLong { .. } => "string exceeds 65535 bytes",
        }
    }
}

//==================================================================================VERSION_LABEL
/// Seven ASCII characters naming a stored object pool version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VersionLabel([u8; 7]);

impl VersionLabel {
    pub const fn as_bytes(&self) -> &[u8; 7] {
        &self.0
    }
}

impl TryFrom<&str> for VersionLabel {
    type Error = CommandError;

    fn try_from(label: &str) -> Result<Self, Self::Error> {
        if !label.is_ascii() {
            return Err(CommandError::LabelNotAscii);
        }
        let bytes: [u8; 7] = label
            .as_bytes()
            .try_into()
            .map_err(|_| CommandError::LabelLength { len: label.len() })?;
        Ok(Self(bytes))
    }
}

//==================================================================================ENCODERS
fn message(function: VtFunction) -> VtMessage {
    let mut data = [RESERVED; VT_MESSAGE_LEN];
    data[0] = function.mux();
    data
}

/// Command carrying nothing but its mux (ESC, delete pool, identify, end of pool).
pub fn bare_command(function: VtFunction) -> VtMessage {
    message(function)
}

pub fn change_active_mask(working_set_id: u16, mask_id: u16) -> VtMessage {
    let mut data = message(VtFunction::ChangeActiveMask);
    to_le(working_set_id as u64, &mut data[1..3]);
    to_le(mask_id as u64, &mut data[3..5]);
    data
}

/// `alarm` selects the alarm mask type (0x02) instead of the data mask (0x01).
pub fn change_soft_key_mask(mask_id: u16, soft_key_mask_id: u16, alarm: bool) -> VtMessage {
    let mut data = message(VtFunction::ChangeSoftKeyMask);
    data[1] = if alarm { 0x02 } else { 0x01 };
    to_le(mask_id as u64, &mut data[2..4]);
    to_le(soft_key_mask_id as u64, &mut data[4..6]);
    data
}

pub fn change_attribute(object_id: u16, attribute_id: u8, value: u32) -> VtMessage {
    let mut data = message(VtFunction::ChangeAttribute);
    to_le(object_id as u64, &mut data[1..3]);
    data[3] = attribute_id;
    to_le(value as u64, &mut data[4..8]);
    data
}

pub fn change_numeric_value(object_id: u16, value: u32) -> VtMessage {
    let mut data = message(VtFunction::ChangeNumericValue);
    to_le(object_id as u64, &mut data[1..3]);
    to_le(value as u64, &mut data[4..8]);
    data
}

pub fn change_list_item(object_id: u16, index: u8, new_object_id: u16) -> VtMessage {
    let mut data = message(VtFunction::ChangeListItem);
    to_le(object_id as u64, &mut data[1..3]);
    data[3] = index;
    to_le(new_object_id as u64, &mut data[4..6]);
    data
}

pub fn get_memory(required: u32) -> VtMessage {
    let mut data = message(VtFunction::GetMemory);
    to_le(required as u64, &mut data[2..6]);
    data
}

pub fn load_version(label: &VersionLabel) -> VtMessage {
    let mut data = message(VtFunction::LoadVersion);
    data[1..].copy_from_slice(label.as_bytes());
    data
}

pub fn store_version(label: &VersionLabel) -> VtMessage {
    let mut data = message(VtFunction::StoreVersion);
    data[1..].copy_from_slice(label.as_bytes());
    data
}

pub fn working_set_maintenance(initiating: bool) -> VtMessage {
    let mut data = message(VtFunction::WorkingSetMaintenance);
    data[1] = initiating as u8;
    data[2] = VT_VERSION;
    data
}

/// Header of Change String Value; the text follows it directly. Messages shorter
/// than eight bytes are padded with 0xFF by the transport.
pub fn change_string_value_header(object_id: u16, text: &[u8]) -> Result<[u8; 5], CommandError> {
    let len = u16::try_from(text.len())
        .map_err(|_| CommandError::StringTooLong { len: text.len() })?;
    let mut header = [RESERVED; 5];
    header[0] = VtFunction::ChangeStringValue.mux();
    to_le(object_id as u64, &mut header[1..3]);
    to_le(len as u64, &mut header[3..5]);
    Ok(header)
}

/// Prefix of an object pool transfer; the pool bytes follow it.
pub const OBJECT_POOL_TRANSFER_PREFIX: [u8; 1] = [VtFunction::ObjectPoolTransfer as u8];

//==================================================================================DECODERS
/// Byte offsets of the fields of a command response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseLayout {
    pub error_offset: usize,
    pub object_id_offset: Option<usize>,
}

impl ResponseLayout {
    const fn error_at(error_offset: usize) -> Self {
        Self {
            error_offset,
            object_id_offset: None,
        }
    }
}

/// Decoded answer to a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandResponse {
    pub function: VtFunction,
    /// 0 on success; bit meaning is defined per function.
    pub error_code: u8,
    /// Mask or object id echoed by the VT (active mask, soft key mask, ESC).
    pub object_id: Option<u16>,
}

impl CommandResponse {
    /// Decode `frame` as the response to `function`. Returns `None` for functions the
    /// VT does not acknowledge this way.
    pub fn parse(function: VtFunction, frame: &CanFrame) -> Option<Self> {
        let layout = function.response_layout()?;
        Some(Self {
            function,
            error_code: frame.data[layout.error_offset],
            object_id: layout
                .object_id_offset
                .map(|offset| le_u16(&frame.data, offset)),
        })
    }

    pub const fn is_success(&self) -> bool {
        self.error_code == 0
    }
}

/// Answer to Get Memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryResponse {
    /// VT version reported by the terminal.
    pub vt_version: u8,
    pub enough_memory: bool,
}

impl MemoryResponse {
    pub fn parse(frame: &CanFrame) -> Self {
        Self {
            vt_version: frame.data[1],
            enough_memory: frame.data[2] != 0x01,
        }
    }
}

/// VT Status, broadcast by the terminal about once per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VtStatus {
    /// Address of the working set master currently shown.
    pub working_set_master: u8,
    pub visible_data_mask: u16,
    pub visible_soft_key_mask: u16,
    pub busy_codes: u8,
    /// Function the VT is currently executing.
    pub function_code: u8,
}

impl VtStatus {
    pub fn parse(frame: &CanFrame) -> Self {
        Self {
            working_set_master: frame.data[1],
            visible_data_mask: le_u16(&frame.data, 2),
            visible_soft_key_mask: le_u16(&frame.data, 4),
            busy_codes: frame.data[6],
            function_code: frame.data[7],
        }
    }
}
