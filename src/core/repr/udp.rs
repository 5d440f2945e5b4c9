use byteorder::{
    NetworkEndian,
    ReadBytesExt,
    WriteBytesExt,
};

use {
    Error,
    Result,
};
use core::check::internet_checksum;
use core::repr::Ipv4Repr;

/// Safe representation of a UDP header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Repr {
    pub src_port: u16,
    pub dst_port: u16,
    /// Length of the UDP header plus body.
    pub length: u16,
}

impl Repr {
    /// Deserializes a packet view into a UDP header.
    pub fn deserialize<T>(packet: &Packet<T>) -> Repr
    where
        T: AsRef<[u8]>,
    {
        Repr {
            src_port: packet.src_port(),
            dst_port: packet.dst_port(),
            length: packet.length(),
        }
    }

    /// Serializes the UDP header into a packet view.
    ///
    /// The checksum is written as zero, which IPv4 receivers must accept as
    /// "not computed" per RFC 768.
    pub fn serialize<T>(&self, packet: &mut Packet<T>)
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        packet.set_src_port(self.src_port);
        packet.set_dst_port(self.dst_port);
        packet.set_length(self.length);
        packet.set_checksum(0);
    }
}

/// [https://en.wikipedia.org/wiki/User_Datagram_Protocol](https://en.wikipedia.org/wiki/User_Datagram_Protocol)
mod fields {
    use std::ops::Range;

    pub const SRC_PORT: Range<usize> = 0 .. 2;

    pub const DST_PORT: Range<usize> = 2 .. 4;

    pub const LENGTH: Range<usize> = 4 .. 6;

    pub const CHECKSUM: Range<usize> = 6 .. 8;
}

/// View of a byte buffer as a UDP packet.
#[derive(Debug)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> AsRef<[u8]> for Packet<T> {
    fn as_ref(&self) -> &[u8] {
        self.buffer.as_ref()
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> AsMut<[u8]> for Packet<T> {
    fn as_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut()
    }
}

impl<T: AsRef<[u8]>> Packet<T> {
    pub const HEADER_LEN: usize = 8;

    /// Tries to create a UDP packet view over a byte buffer.
    pub fn try_new(buffer: T) -> Result<Packet<T>> {
        let buffer_len = buffer.as_ref().len();

        if buffer_len < Self::HEADER_LEN {
            Err(Error::Truncated)
        } else if buffer_len > u16::max_value() as usize {
            Err(Error::Malformed)
        } else {
            Ok(Packet { buffer })
        }
    }

    /// Returns the length of a UDP packet with the specified payload size.
    pub fn buffer_len(payload_len: usize) -> usize {
        Self::HEADER_LEN + payload_len
    }

    /// Checks if the packet has a valid encoding.
    ///
    /// A zero checksum is never rejected; a nonzero one is verified over the
    /// IPv4 pseudo header.
    pub fn check_encoding(&self, ipv4_repr: &Ipv4Repr) -> Result<()> {
        if self.checksum() != 0 && self.gen_packet_checksum(ipv4_repr) != 0 {
            Err(Error::Checksum)
        } else if self.length() as usize != self.buffer.as_ref().len() {
            Err(Error::Malformed)
        } else {
            Ok(())
        }
    }

    /// Calculates the packet checksum over the IPv4 pseudo header and the
    /// entire UDP packet.
    pub fn gen_packet_checksum(&self, ipv4_repr: &Ipv4Repr) -> u16 {
        let payload_len = self.buffer.as_ref().len() as u16;

        let mut buffer = Vec::with_capacity(12 + payload_len as usize);
        buffer.extend_from_slice(ipv4_repr.src_addr.as_bytes());
        buffer.extend_from_slice(ipv4_repr.dst_addr.as_bytes());
        buffer.push(0);
        buffer.push(ipv4_repr.protocol);
        buffer.push((payload_len >> 8) as u8);
        buffer.push(payload_len as u8);
        buffer.extend_from_slice(self.buffer.as_ref());

        internet_checksum(&buffer)
    }

    pub fn src_port(&self) -> u16 {
        (&self.buffer.as_ref()[fields::SRC_PORT])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn dst_port(&self) -> u16 {
        (&self.buffer.as_ref()[fields::DST_PORT])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn length(&self) -> u16 {
        (&self.buffer.as_ref()[fields::LENGTH])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn checksum(&self) -> u16 {
        (&self.buffer.as_ref()[fields::CHECKSUM])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn payload(&self) -> &[u8] {
        &self.buffer.as_ref()[Self::HEADER_LEN ..]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_src_port(&mut self, port: u16) {
        (&mut self.buffer.as_mut()[fields::SRC_PORT])
            .write_u16::<NetworkEndian>(port)
            .unwrap()
    }

    pub fn set_dst_port(&mut self, port: u16) {
        (&mut self.buffer.as_mut()[fields::DST_PORT])
            .write_u16::<NetworkEndian>(port)
            .unwrap()
    }

    pub fn set_length(&mut self, length: u16) {
        (&mut self.buffer.as_mut()[fields::LENGTH])
            .write_u16::<NetworkEndian>(length)
            .unwrap()
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        (&mut self.buffer.as_mut()[fields::CHECKSUM])
            .write_u16::<NetworkEndian>(checksum)
            .unwrap()
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[Self::HEADER_LEN ..]
    }
}

#[cfg(test)]
mod tests {
    use core::repr::{
        ipv4_protocols,
        Ipv4Address,
    };

    use super::*;

    fn ipv4_repr(payload_len: u16) -> Ipv4Repr {
        Ipv4Repr {
            version: 4,
            ihl: 5,
            tos: 0,
            total_len: 20 + payload_len,
            id: 0,
            frag_offset: 0,
            ttl: 64,
            protocol: ipv4_protocols::UDP,
            checksum: 0,
            src_addr: Ipv4Address::new([0, 1, 2, 3]),
            dst_addr: Ipv4Address::new([4, 5, 6, 7]),
            options: vec![],
        }
    }

    #[test]
    fn test_packet_with_buffer_less_than_header() {
        let buffer: [u8; 4] = [0; 4];
        assert_matches!(Packet::try_new(&buffer[..]), Err(Error::Truncated));
    }

    #[test]
    fn test_packet_with_zero_checksum_accepted() {
        let buffer: [u8; 16] = [
            0x04, 0x00, 0x08, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
        ];
        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_matches!(packet.check_encoding(&ipv4_repr(16)), Ok(()));
    }

    #[test]
    fn test_packet_with_invalid_checksum() {
        let buffer: [u8; 16] = [
            0x04, 0x00, 0x08, 0x00, 0x00, 0x10, 0x12, 0x34, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
        ];
        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_matches!(packet.check_encoding(&ipv4_repr(16)), Err(Error::Checksum));
    }

    #[test]
    fn test_packet_with_inconsistent_length() {
        let buffer: [u8; 16] = [
            0x04, 0x00, 0x08, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
        ];
        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_matches!(packet.check_encoding(&ipv4_repr(16)), Err(Error::Malformed));
    }

    #[test]
    fn test_serialize_writes_zero_checksum() {
        let mut buffer: [u8; 10] = [0; 10];
        let repr = Repr {
            src_port: 5151,
            dst_port: 5151,
            length: 10,
        };

        {
            let mut packet = Packet::try_new(&mut buffer[..]).unwrap();
            repr.serialize(&mut packet);
            packet.payload_mut().copy_from_slice(&[0xAA, 0xBB]);
        }

        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_eq!(0, packet.checksum());
        assert_eq!(repr, Repr::deserialize(&packet));
        assert_eq!(&[0xAA, 0xBB], packet.payload());
    }
}
