//! ISO 11783-5 NAME (64 bits). The NAME uniquely identifies a control function on
//! the ISOBUS network and is the payload of the Address Claimed message. The module
//! provides a typed wrapper around the raw `u64` plus safe accessors/builders.
//!
//! # Bit layout (Little Endian order)
//!
//! ```text
//! Bits  0-20  (21 bits) : Identity number
//! Bits 21-31  (11 bits) : Manufacturer code
//! Bits 32-34  ( 3 bits) : ECU instance
//! Bits 35-39  ( 5 bits) : Function instance
//! Bits 40-47  ( 8 bits) : Function
//! Bit  48     ( 1 bit ) : Reserved
//! Bits 49-55  ( 7 bits) : Device class
//! Bits 56-59  ( 4 bits) : Device class instance
//! Bits 60-62  ( 3 bits) : Industry group
//! Bit  63     ( 1 bit ) : Self-configurable address
//! ```

use core::fmt;

/// Industry group of agricultural and forestry equipment.
pub const INDUSTRY_GROUP_AGRICULTURE: u8 = 2;

/// Wrapper around the ISO 11783 NAME field (64 bits).
///
/// # Example
///
/// ```
/// use korri_isobus::protocol::managment::iso_name::IsoName;
///
/// let name = IsoName::builder()
///     .identity_number(0x1FF)
///     .manufacturer_code(0x59)
///     .function(0x3E)
///     .industry_group(2)
///     .build();
///
/// assert_eq!(name.identity_number(), 0x1FF);
/// assert_eq!(name.manufacturer_code(), 0x59);
/// assert!(!name.is_self_configurable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IsoName(u64);

impl IsoName {
    /// Build an `IsoName` from the raw value.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the underlying `u64`.
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Create a builder to construct an `IsoName`.
    #[inline]
    pub const fn builder() -> IsoNameBuilder {
        IsoNameBuilder::new()
    }

    /// Builder seeded with every field of this NAME, to derive a variant.
    #[inline]
    pub const fn to_builder(&self) -> IsoNameBuilder {
        IsoNameBuilder { raw: self.0 }
    }

    /// NAME as transmitted in the Address Claimed message.
    #[inline]
    pub const fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Identity number (bits 0-20, 21 bits).
    ///
    /// Serial number assigned by the manufacturer.
    #[inline]
    pub const fn identity_number(&self) -> u32 {
        (self.0 & 0x1F_FFFF) as u32
    }

    /// Manufacturer code (bits 21-31, 11 bits).
    #[inline]
    pub const fn manufacturer_code(&self) -> u16 {
        ((self.0 >> 21) & 0x7FF) as u16
    }

    /// ECU instance (bits 32-34, 3 bits).
    #[inline]
    pub const fn ecu_instance(&self) -> u8 {
        ((self.0 >> 32) & 0x07) as u8
    }

    /// Function instance (bits 35-39, 5 bits).
    #[inline]
    pub const fn function_instance(&self) -> u8 {
        ((self.0 >> 35) & 0x1F) as u8
    }

    /// Function (bits 40-47, 8 bits).
    #[inline]
    pub const fn function(&self) -> u8 {
        ((self.0 >> 40) & 0xFF) as u8
    }

    /// Reserved bit (bit 48).
    #[inline]
    pub const fn reserved(&self) -> bool {
        ((self.0 >> 48) & 0x01) != 0
    }

    /// Device class (bits 49-55, 7 bits).
    #[inline]
    pub const fn device_class(&self) -> u8 {
        ((self.0 >> 49) & 0x7F) as u8
    }

    /// Device class instance (bits 56-59, 4 bits).
    #[inline]
    pub const fn device_class_instance(&self) -> u8 {
        ((self.0 >> 56) & 0x0F) as u8
    }

    /// Industry group (bits 60-62, 3 bits).
    ///
    /// Typical value: `2` ([`INDUSTRY_GROUP_AGRICULTURE`]).
    #[inline]
    pub const fn industry_group(&self) -> u8 {
        ((self.0 >> 60) & 0x07) as u8
    }

    /// Self-configurable address bit (bit 63).
    #[inline]
    pub const fn is_self_configurable(&self) -> bool {
        ((self.0 >> 63) & 0x01) != 0
    }
}

impl From<u64> for IsoName {
    #[inline]
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<IsoName> for u64 {
    #[inline]
    fn from(name: IsoName) -> Self {
        name.raw()
    }
}

impl fmt::Display for IsoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IsoName {{ identity: {}, mfg: {}, func: {}, func_inst: {}, class: {}, group: {} }}",
            self.identity_number(),
            self.manufacturer_code(),
            self.function(),
            self.function_instance(),
            self.device_class(),
            self.industry_group()
        )
    }
}

/// Fluent builder used to construct an `IsoName`. Every setter is `const`, so a
/// NAME can be built at compile time.
#[derive(Debug, Clone, Copy)]
pub struct IsoNameBuilder {
    raw: u64,
}

impl IsoNameBuilder {
    /// Initialize the builder with all fields cleared.
    #[inline]
    pub const fn new() -> Self {
        Self { raw: 0 }
    }

    /// Set the identity number (bits 0-20, 21 bits).
    ///
    /// # Panics
    /// Panics when the value does not fit in 21 bits (> 0x1FFFFF).
    #[inline]
    pub const fn identity_number(mut self, value: u32) -> Self {
        assert!(value <= 0x1F_FFFF, "Identity number must fit in 21 bits");
        self.raw = (self.raw & !0x1F_FFFF) | (value as u64 & 0x1F_FFFF);
        self
    }

    /// Set the manufacturer code (bits 21-31, 11 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 11 bits (> 0x7FF).
    #[inline]
    pub const fn manufacturer_code(mut self, value: u16) -> Self {
        assert!(value <= 0x7FF, "Manufacturer code must fit in 11 bits");
        self.raw = (self.raw & !(0x7FF << 21)) | ((value as u64 & 0x7FF) << 21);
        self
    }

    /// Set the ECU instance (bits 32-34, 3 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 3 bits (> 0x07).
    #[inline]
    pub const fn ecu_instance(mut self, value: u8) -> Self {
        assert!(value <= 0x07, "ECU instance must fit in 3 bits");
        self.raw = (self.raw & !(0x07 << 32)) | ((value as u64 & 0x07) << 32);
        self
    }

    /// Set the function instance (bits 35-39, 5 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 5 bits (> 0x1F).
    #[inline]
    pub const fn function_instance(mut self, value: u8) -> Self {
        assert!(value <= 0x1F, "Function instance must fit in 5 bits");
        self.raw = (self.raw & !(0x1F << 35)) | ((value as u64 & 0x1F) << 35);
        self
    }

    /// Set the function (bits 40-47, 8 bits).
    #[inline]
    pub const fn function(mut self, value: u8) -> Self {
        self.raw = (self.raw & !(0xFF << 40)) | ((value as u64) << 40);
        self
    }

    /// Update the reserved bit (bit 48).
    #[inline]
    pub const fn reserved(mut self, value: bool) -> Self {
        self.raw = (self.raw & !(0x01 << 48)) | ((value as u64) << 48);
        self
    }

    /// Set the device class (bits 49-55, 7 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 7 bits (> 0x7F).
    #[inline]
    pub const fn device_class(mut self, value: u8) -> Self {
        assert!(value <= 0x7F, "Device class must fit in 7 bits");
        self.raw = (self.raw & !(0x7F << 49)) | ((value as u64 & 0x7F) << 49);
        self
    }

    /// Set the device class instance (bits 56-59, 4 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 4 bits (> 0x0F).
    #[inline]
    pub const fn device_class_instance(mut self, value: u8) -> Self {
        assert!(value <= 0x0F, "Device class instance must fit in 4 bits");
        self.raw = (self.raw & !(0x0F << 56)) | ((value as u64 & 0x0F) << 56);
        self
    }

    /// Set the industry group (bits 60-62, 3 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 3 bits (> 0x07).
    #[inline]
    pub const fn industry_group(mut self, value: u8) -> Self {
        assert!(value <= 0x07, "Industry group must fit in 3 bits");
        self.raw = (self.raw & !(0x07 << 60)) | ((value as u64 & 0x07) << 60);
        self
    }

    /// Configure the self-configurable address bit (bit 63).
    #[inline]
    pub const fn self_configurable(mut self, value: bool) -> Self {
        self.raw = (self.raw & !(0x01 << 63)) | ((value as u64) << 63);
        self
    }

    /// Build the final `IsoName`.
    #[inline]
    pub const fn build(self) -> IsoName {
        IsoName(self.raw)
    }
}

impl Default for IsoNameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_number_extraction() {
        let name = IsoName::builder().identity_number(0x1ABCDE).build();
        assert_eq!(name.identity_number(), 0x1ABCDE);
    }

    #[test]
    fn test_self_configurable_bit() {
        let configurable = IsoName::builder().self_configurable(true).build();
        assert!(configurable.is_self_configurable());
        assert_eq!(configurable.raw() & (1u64 << 63), 1u64 << 63);

        let fixed = IsoName::builder().self_configurable(false).build();
        assert!(!fixed.is_self_configurable());
        assert_eq!(fixed.raw(), 0);
    }

    #[test]
    fn test_all_fields() {
        let name = IsoName::builder()
            .identity_number(0x12345)
            .manufacturer_code(0x2AB)
            .ecu_instance(5)
            .function_instance(17)
            .function(0x3E)
            .device_class(0x33)
            .device_class_instance(0x0C)
            .industry_group(INDUSTRY_GROUP_AGRICULTURE)
            .self_configurable(true)
            .build();

        assert_eq!(name.identity_number(), 0x12345);
        assert_eq!(name.manufacturer_code(), 0x2AB);
        assert_eq!(name.ecu_instance(), 5);
        assert_eq!(name.function_instance(), 17);
        assert_eq!(name.function(), 0x3E);
        assert!(!name.reserved());
        assert_eq!(name.device_class(), 0x33);
        assert_eq!(name.device_class_instance(), 0x0C);
        assert_eq!(name.industry_group(), 2);
        assert!(name.is_self_configurable());
        assert_eq!(IsoName::from_raw(name.raw()), name);
    }

    #[test]
    fn test_default_vt_client_name_bytes() {
        let name = IsoName::builder()
            .identity_number(0x1FF)
            .manufacturer_code(0x59)
            .function(0x3E)
            .industry_group(2)
            .build();

        // 0x1FF | 0x59 << 21 | 0x3E << 40 | 2 << 60
        assert_eq!(name.raw(), 0x2000_3E00_0B20_01FF);
        assert_eq!(
            name.to_le_bytes(),
            [0xFF, 0x01, 0x20, 0x0B, 0x00, 0x3E, 0x00, 0x20]
        );
    }

    #[test]
    fn test_to_builder_only_touches_requested_field() {
        let base = IsoName::from_raw(0x8123_4567_89AB_CDEF);
        let variant = base.to_builder().function_instance(3).build();

        assert_eq!(variant.function_instance(), 3);
        assert_eq!(variant.raw() & !(0x1F << 35), base.raw() & !(0x1F << 35));
    }

    #[test]
    #[should_panic(expected = "Function instance must fit in 5 bits")]
    fn test_function_instance_overflow_panics() {
        let _ = IsoName::builder().function_instance(32);
    }
}
