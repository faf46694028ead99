//! Network management: address claiming and the NAME field.
pub mod address_claiming;
pub mod iso_name;
