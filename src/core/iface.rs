//! Boundary to a physical network interface.

use Result;
use core::repr::{
    EthernetAddress,
    Ipv4Address,
};

/// A physical interface the bridge can forward onto.
///
/// Implementations wrap a raw socket; `send` is fire and forget, the bridge
/// never retries a failed transmit.
pub trait Interface {
    /// Returns a human readable name, e.g. the OS interface name.
    fn name(&self) -> &str;

    /// Returns the IPv4 address assigned to the interface.
    fn ipv4_addr(&self) -> Ipv4Address;

    /// Returns the hardware address of the interface.
    fn ethernet_addr(&self) -> EthernetAddress;

    /// Returns the configured netmask, if any.
    fn netmask(&self) -> Option<Ipv4Address>;

    /// Returns the configured subnet, if any.
    fn subnet(&self) -> Option<Ipv4Address>;

    /// Writes a raw Ethernet frame to the interface.
    fn send(&mut self, buffer: &[u8]) -> Result<()>;

    /// Checks if addr falls within the interface's subnet.
    ///
    /// An interface without a configured netmask or subnet contains nothing;
    /// the forwarding engine skips it as a routing candidate.
    fn contains(&self, addr: Ipv4Address) -> bool {
        match (self.netmask(), self.subnet()) {
            (Some(netmask), Some(subnet)) => addr.mask(netmask) == subnet,
            _ => false,
        }
    }
}
