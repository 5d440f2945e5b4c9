//! Serialization and deserialization of frames and packets.
//!
//! The `repr` module provides, per network layer, a view type wrapping a raw
//! byte buffer with field accessors, and a plain struct representation with
//! serialize/deserialize functions. BLE link addresses and Ethernet hardware
//! addresses share one address type since both are 6 octets on the wire.

pub mod arp;
pub mod ble;
pub mod ethernet;
pub mod ipv4;
pub mod udp;

pub use self::arp::{
    Arp,
    Op as ArpOp,
};
pub use self::ble::Frame as BleFrame;
pub use self::ethernet::{
    eth_types,
    Address as EthernetAddress,
    Frame as EthernetFrame,
    Repr as EthernetRepr,
};
pub use self::ipv4::{
    ipv4_protocols,
    Address as Ipv4Address,
    Packet as Ipv4Packet,
    Repr as Ipv4Repr,
};
pub use self::udp::{
    Packet as UdpPacket,
    Repr as UdpRepr,
};
