//! ARP request construction.
//!
//! The bridge only ever builds requests; replies come back through the
//! platform's raw socket and reach the resolver as an already parsed
//! (address, hardware address) observation.

use std;
use std::io::Write;

use byteorder::{
    NetworkEndian,
    WriteBytesExt,
};

use {
    Error,
    Result,
};
use core::repr::{
    EthernetAddress,
    Ipv4Address,
};

#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
// https://www.iana.org/assignments/arp-parameters/arp-parameters.xhtml#arp-parameters-1
pub enum Op {
    Request = 0x0001,
    Reply = 0x0002,
}

const HW_TYPE_ETHERNET: u16 = 0x0001;

const PROTO_TYPE_IPV4: u16 = 0x0800;

/// An ARP packet for the Ethernet + IPv4 combination the bridge speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arp {
    EthernetIpv4 {
        op: Op,
        source_hw_addr: EthernetAddress,
        source_proto_addr: Ipv4Address,
        target_hw_addr: EthernetAddress,
        target_proto_addr: Ipv4Address,
    },
}

impl Arp {
    /// Builds a broadcast request asking for the hardware address of
    /// target_addr, with the querying interface's identity as sender.
    pub fn request(
        source_hw_addr: EthernetAddress,
        source_proto_addr: Ipv4Address,
        target_proto_addr: Ipv4Address,
    ) -> Arp {
        Arp::EthernetIpv4 {
            op: Op::Request,
            source_hw_addr,
            source_proto_addr,
            target_hw_addr: EthernetAddress::UNSPECIFIED,
            target_proto_addr,
        }
    }

    /// Returns the size of the ARP packet when serialized to a buffer.
    pub fn buffer_len(&self) -> usize {
        8 + match *self {
            Arp::EthernetIpv4 { .. } => 20,
        }
    }

    /// Serializes the ARP packet into a buffer.
    pub fn serialize(&self, buffer: &mut [u8]) -> Result<()> {
        if self.buffer_len() > buffer.len() {
            return Err(Error::Truncated);
        }

        match *self {
            Arp::EthernetIpv4 {
                op,
                ref source_hw_addr,
                ref source_proto_addr,
                ref target_hw_addr,
                ref target_proto_addr,
            } => {
                let mut writer = std::io::Cursor::new(buffer);
                writer
                    .write_u16::<NetworkEndian>(HW_TYPE_ETHERNET)
                    .unwrap();
                writer.write_u16::<NetworkEndian>(PROTO_TYPE_IPV4).unwrap();
                writer.write_u8(6).unwrap();
                writer.write_u8(4).unwrap();
                writer.write_u16::<NetworkEndian>(op as u16).unwrap();
                writer.write(source_hw_addr.as_bytes()).unwrap();
                writer.write(source_proto_addr.as_bytes()).unwrap();
                writer.write(target_hw_addr.as_bytes()).unwrap();
                writer.write(target_proto_addr.as_bytes()).unwrap();
            }
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialize() {
        let arp = Arp::request(
            EthernetAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]),
            Ipv4Address::new([10, 0, 0, 1]),
            Ipv4Address::new([10, 0, 0, 5]),
        );

        let mut buffer = vec![0; arp.buffer_len()];
        arp.serialize(&mut buffer).unwrap();

        assert_eq!(
            &buffer[..],
            &[
                0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00,
                0x01, 0x0A, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x00,
                0x00, 0x05,
            ][..]
        );
    }

    #[test]
    fn test_serialize_with_short_buffer() {
        let arp = Arp::request(
            EthernetAddress::UNSPECIFIED,
            Ipv4Address::new([0, 0, 0, 0]),
            Ipv4Address::new([0, 0, 0, 0]),
        );
        let mut buffer = vec![0; 27];
        assert_matches!(arp.serialize(&mut buffer), Err(Error::Truncated));
    }
}
