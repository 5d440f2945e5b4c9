//! Core, platform independent bridging code.

pub mod arp_table;
pub mod ble;
pub mod check;
pub mod forward;
pub mod iface;
pub mod queue;
pub mod repr;
pub mod resolver;
pub mod time;
