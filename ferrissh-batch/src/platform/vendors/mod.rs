//! Built-in vendor platform definitions.

pub mod cisco_asa;
pub mod cisco_ios;
pub mod juniper;
