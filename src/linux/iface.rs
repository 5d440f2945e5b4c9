use get_if_addrs;

use {
    Error,
    Result,
};
use core::iface::Interface;
use core::repr::{
    EthernetAddress,
    Ipv4Address,
};
use linux::sock::RawSocket;

/// A physical interface backed by an AF_PACKET socket, with its IPv4
/// configuration discovered from the OS.
pub struct LinuxInterface {
    name: String,
    ipv4_addr: Ipv4Address,
    netmask: Option<Ipv4Address>,
    subnet: Option<Ipv4Address>,
    sock: RawSocket,
}

impl LinuxInterface {
    /// Opens the named OS interface.
    ///
    /// The interface must have an IPv4 address assigned; a missing netmask
    /// only makes it a non-candidate for routing, not an error.
    pub fn open(name: &str) -> Result<LinuxInterface> {
        let sock = RawSocket::open(name)?;

        let mut ipv4_addr = None;
        let mut netmask = None;

        for iface in get_if_addrs::get_if_addrs()? {
            if iface.name != name {
                continue;
            }

            if let get_if_addrs::IfAddr::V4(v4) = iface.addr {
                ipv4_addr = Some(Ipv4Address::new(v4.ip.octets()));
                netmask = Some(Ipv4Address::new(v4.netmask.octets()));
            }
        }

        let ipv4_addr = match ipv4_addr {
            Some(addr) => addr,
            None => return Err(Error::InvalidAddress),
        };
        let subnet = netmask.map(|netmask| ipv4_addr.mask(netmask));

        Ok(LinuxInterface {
            name: name.to_string(),
            ipv4_addr,
            netmask,
            subnet,
            sock,
        })
    }
}

impl Interface for LinuxInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn ipv4_addr(&self) -> Ipv4Address {
        self.ipv4_addr
    }

    fn ethernet_addr(&self) -> EthernetAddress {
        self.sock.ethernet_addr()
    }

    fn netmask(&self) -> Option<Ipv4Address> {
        self.netmask
    }

    fn subnet(&self) -> Option<Ipv4Address> {
        self.subnet
    }

    fn send(&mut self, buffer: &[u8]) -> Result<()> {
        self.sock.send(buffer)
    }
}
