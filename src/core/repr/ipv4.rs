use std;
use std::io::Write;

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

/// [IPv4 address](https://en.wikipedia.org/wiki/IPv4) in network byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address([u8; 4]);

impl Address {
    /// Creates an IPv4 address from a network byte order buffer.
    pub fn new(addr: [u8; 4]) -> Address {
        Address(addr)
    }

    /// Tries to create an IPv4 address from a network byte order slice.
    pub fn try_new(addr: &[u8]) -> Result<Address> {
        if addr.len() != 4 {
            return Err(Error::InvalidAddress);
        }

        let mut _addr: [u8; 4] = [0; 4];
        _addr.clone_from_slice(addr);
        Ok(Address(_addr))
    }

    /// Returns a reference to the network byte order representation of the
    /// address.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the address with a netmask applied, for subnet matching.
    pub fn mask(&self, netmask: Address) -> Address {
        let mut masked: [u8; 4] = [0; 4];
        for i in 0 .. 4 {
            masked[i] = self.0[i] & netmask.0[i];
        }
        Address(masked)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl std::str::FromStr for Address {
    type Err = ();

    /// Parses an IPv4 address from an A.B.C.D style string.
    fn from_str(addr: &str) -> std::result::Result<Address, Self::Err> {
        let (bytes, unknown): (Vec<_>, Vec<_>) = addr.split(".")
            .map(|token| token.parse::<u8>())
            .partition(|byte| !byte.is_err());

        if bytes.len() != 4 || unknown.len() > 0 {
            return Err(());
        }

        let bytes: Vec<_> = bytes.into_iter().map(|byte| byte.unwrap()).collect();

        let mut ipv4: [u8; 4] = [0; 4];
        ipv4.clone_from_slice(&bytes);

        Ok(Address::new(ipv4))
    }
}

/// [https://en.wikipedia.org/wiki/IPv4#Header](https://en.wikipedia.org/wiki/IPv4#Header)
pub mod ipv4_protocols {
    pub const UDP: u8 = 17;
}

mod fields {
    use std::ops::Range;

    pub const VERSION_IHL: usize = 0;

    pub const TOS: usize = 1;

    pub const TOTAL_LEN: Range<usize> = 2 .. 4;

    pub const ID: Range<usize> = 4 .. 6;

    pub const FRAG_OFFSET: Range<usize> = 6 .. 8;

    pub const TTL: usize = 8;

    pub const PROTOCOL: usize = 9;

    pub const CHECKSUM: Range<usize> = 10 .. 12;

    pub const SRC_ADDR: Range<usize> = 12 .. 16;

    pub const DST_ADDR: Range<usize> = 16 .. 20;
}

/// Safe representation of an IPv4 header.
///
/// The checksum field holds the raw value observed on the wire when
/// deserialized; serialization recomputes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repr {
    pub version: u8,
    pub ihl: u8,
    pub tos: u8,
    pub total_len: u16,
    pub id: u16,
    /// Flags and fragment offset, packed as on the wire.
    pub frag_offset: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src_addr: Address,
    pub dst_addr: Address,
    pub options: Vec<u8>,
}

impl Repr {
    /// Returns the size of the serialized header in bytes.
    pub fn header_len(&self) -> usize {
        (self.ihl as usize) * 4
    }

    /// Deserializes a packet view into an IPv4 header.
    ///
    /// An invalid checksum does not fail deserialization; callers interested
    /// in it should consult [Packet::checksum_valid](struct.Packet.html).
    pub fn deserialize<T>(packet: &Packet<T>) -> Repr
    where
        T: AsRef<[u8]>,
    {
        Repr {
            version: packet.version(),
            ihl: packet.ihl(),
            tos: packet.tos(),
            total_len: packet.total_len(),
            id: packet.id(),
            frag_offset: packet.frag_offset(),
            ttl: packet.ttl(),
            protocol: packet.protocol(),
            checksum: packet.checksum(),
            src_addr: packet.src_addr(),
            dst_addr: packet.dst_addr(),
            options: packet.options().to_vec(),
        }
    }

    /// Serializes the IPv4 header into a packet view, computing the header
    /// checksum over the assembled bytes.
    ///
    /// Fails with a malformed error if the option bytes do not agree with the
    /// header length.
    pub fn serialize<T>(&self, packet: &mut Packet<T>) -> Result<()>
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        if self.ihl < 5 || self.options.len() != (self.ihl as usize - 5) * 4 {
            return Err(Error::Malformed);
        }

        packet.set_version_ihl(self.version, self.ihl);
        packet.set_tos(self.tos);
        packet.set_total_len(self.total_len);
        packet.set_id(self.id);
        packet.set_frag_offset(self.frag_offset);
        packet.set_ttl(self.ttl);
        packet.set_protocol(self.protocol);
        packet.set_checksum(0);
        packet.set_src_addr(self.src_addr);
        packet.set_dst_addr(self.dst_addr);
        packet.set_options(&self.options);

        let checksum = packet.gen_header_checksum();
        packet.set_checksum(checksum);
        Ok(())
    }
}

/// View of a byte buffer as an IPv4 packet.
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
    pub const MIN_HEADER_LEN: usize = 20;

    /// Tries to create an IPv4 packet view over a byte buffer.
    ///
    /// Only the minimum header length is enforced here so a view can be
    /// created over a not yet serialized buffer; received packets should be
    /// validated with [check_encoding](#method.check_encoding).
    pub fn try_new(buffer: T) -> Result<Packet<T>> {
        if buffer.as_ref().len() < Self::MIN_HEADER_LEN {
            Err(Error::Truncated)
        } else {
            Ok(Packet { buffer })
        }
    }

    /// Checks if the packet has a valid encoding, checksum excluded.
    pub fn check_encoding(&self) -> Result<()> {
        if self.ihl() < 5 || self.buffer.as_ref().len() < self.header_len() {
            Err(Error::Malformed)
        } else {
            Ok(())
        }
    }

    /// Returns the length of an IPv4 packet, without options, with the
    /// specified payload size.
    pub fn buffer_len(payload_len: usize) -> usize {
        Self::MIN_HEADER_LEN + payload_len
    }

    /// Calculates the header checksum over the raw header bytes, with the
    /// checksum field as is.
    ///
    /// Call with the checksum field zeroed to generate a checksum for
    /// sending; over a received header this returns the value the sender
    /// should have written.
    pub fn gen_header_checksum(&self) -> u16 {
        let mut header = self.buffer.as_ref()[.. self.header_len()].to_vec();
        header[fields::CHECKSUM.start] = 0;
        header[fields::CHECKSUM.start + 1] = 0;
        internet_checksum(&header)
    }

    /// Checks the received checksum field against a recomputation over the
    /// raw header bytes.
    pub fn checksum_valid(&self) -> bool {
        self.checksum() == self.gen_header_checksum()
    }

    pub fn version(&self) -> u8 {
        (self.buffer.as_ref()[fields::VERSION_IHL] & 0xF0) >> 4
    }

    pub fn ihl(&self) -> u8 {
        self.buffer.as_ref()[fields::VERSION_IHL] & 0x0F
    }

    /// Returns the header length in bytes, options included.
    pub fn header_len(&self) -> usize {
        (self.ihl() as usize) * 4
    }

    pub fn tos(&self) -> u8 {
        self.buffer.as_ref()[fields::TOS]
    }

    pub fn total_len(&self) -> u16 {
        (&self.buffer.as_ref()[fields::TOTAL_LEN])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn id(&self) -> u16 {
        (&self.buffer.as_ref()[fields::ID])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn frag_offset(&self) -> u16 {
        (&self.buffer.as_ref()[fields::FRAG_OFFSET])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn ttl(&self) -> u8 {
        self.buffer.as_ref()[fields::TTL]
    }

    pub fn protocol(&self) -> u8 {
        self.buffer.as_ref()[fields::PROTOCOL]
    }

    pub fn checksum(&self) -> u16 {
        (&self.buffer.as_ref()[fields::CHECKSUM])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn src_addr(&self) -> Address {
        Address::try_new(&self.buffer.as_ref()[fields::SRC_ADDR]).unwrap()
    }

    pub fn dst_addr(&self) -> Address {
        Address::try_new(&self.buffer.as_ref()[fields::DST_ADDR]).unwrap()
    }

    /// Returns the option bytes, empty unless ihl > 5.
    pub fn options(&self) -> &[u8] {
        let header_len = std::cmp::max(self.header_len(), Self::MIN_HEADER_LEN);
        &self.buffer.as_ref()[Self::MIN_HEADER_LEN .. header_len]
    }

    /// Returns an immutable view of the payload.
    pub fn payload(&self) -> &[u8] {
        let header_len = std::cmp::max(self.header_len(), Self::MIN_HEADER_LEN);
        &self.buffer.as_ref()[header_len ..]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_version_ihl(&mut self, version: u8, ihl: u8) {
        self.buffer.as_mut()[fields::VERSION_IHL] = (version << 4) | (ihl & 0x0F);
    }

    pub fn set_tos(&mut self, tos: u8) {
        self.buffer.as_mut()[fields::TOS] = tos;
    }

    pub fn set_total_len(&mut self, total_len: u16) {
        (&mut self.buffer.as_mut()[fields::TOTAL_LEN])
            .write_u16::<NetworkEndian>(total_len)
            .unwrap()
    }

    pub fn set_id(&mut self, id: u16) {
        (&mut self.buffer.as_mut()[fields::ID])
            .write_u16::<NetworkEndian>(id)
            .unwrap()
    }

    pub fn set_frag_offset(&mut self, frag_offset: u16) {
        (&mut self.buffer.as_mut()[fields::FRAG_OFFSET])
            .write_u16::<NetworkEndian>(frag_offset)
            .unwrap()
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.buffer.as_mut()[fields::TTL] = ttl;
    }

    pub fn set_protocol(&mut self, protocol: u8) {
        self.buffer.as_mut()[fields::PROTOCOL] = protocol;
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        (&mut self.buffer.as_mut()[fields::CHECKSUM])
            .write_u16::<NetworkEndian>(checksum)
            .unwrap()
    }

    pub fn set_src_addr(&mut self, addr: Address) {
        (&mut self.buffer.as_mut()[fields::SRC_ADDR])
            .write(addr.as_bytes())
            .unwrap();
    }

    pub fn set_dst_addr(&mut self, addr: Address) {
        (&mut self.buffer.as_mut()[fields::DST_ADDR])
            .write(addr.as_bytes())
            .unwrap();
    }

    /// Writes the option bytes following the fixed header. The ihl field must
    /// already account for them.
    pub fn set_options(&mut self, options: &[u8]) {
        let header_len = self.header_len();
        (&mut self.buffer.as_mut()[Self::MIN_HEADER_LEN .. header_len])
            .write(options)
            .unwrap();
    }

    /// Returns a mutable view of the payload.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let header_len = std::cmp::max(self.header_len(), Self::MIN_HEADER_LEN);
        &mut self.buffer.as_mut()[header_len ..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repr(options: Vec<u8>) -> Repr {
        let ihl = 5 + (options.len() / 4) as u8;
        Repr {
            version: 4,
            ihl,
            tos: 0,
            total_len: (ihl as u16) * 4 + 8,
            id: 0x1234,
            frag_offset: 0,
            ttl: 64,
            protocol: ipv4_protocols::UDP,
            checksum: 0,
            src_addr: Address::new([10, 0, 0, 1]),
            dst_addr: Address::new([10, 0, 0, 5]),
            options,
        }
    }

    #[test]
    fn test_packet_with_buffer_less_than_min_header() {
        let buffer: [u8; 19] = [0; 19];
        assert_matches!(Packet::try_new(&buffer[..]), Err(Error::Truncated));
    }

    #[test]
    fn test_packet_with_ihl_less_than_min() {
        let mut buffer: [u8; 20] = [0; 20];
        buffer[0] = 0x44;
        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_matches!(packet.check_encoding(), Err(Error::Malformed));
    }

    #[test]
    fn test_packet_with_buffer_less_than_header() {
        let mut buffer: [u8; 20] = [0; 20];
        buffer[0] = 0x46;
        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_matches!(packet.check_encoding(), Err(Error::Malformed));
    }

    #[test]
    fn test_serialize_deserialize_round_trip() {
        let repr = repr(vec![]);
        let mut buffer = vec![0; 28];

        {
            let mut packet = Packet::try_new(&mut buffer[..]).unwrap();
            repr.serialize(&mut packet).unwrap();
        }

        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert!(packet.checksum_valid());

        let mut deserialized = Repr::deserialize(&packet);
        assert_eq!(deserialized.checksum, packet.gen_header_checksum());
        deserialized.checksum = 0;
        assert_eq!(repr, deserialized);
    }

    #[test]
    fn test_serialize_deserialize_with_options() {
        let repr = repr(vec![0x94, 0x04, 0x00, 0x00]);
        let mut buffer = vec![0; 32];

        {
            let mut packet = Packet::try_new(&mut buffer[..]).unwrap();
            repr.serialize(&mut packet).unwrap();
        }

        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_eq!(24, packet.header_len());
        assert_eq!(&[0x94, 0x04, 0x00, 0x00], packet.options());
        assert_eq!(8, packet.payload().len());
        assert!(packet.checksum_valid());
    }

    #[test]
    fn test_serialize_with_inconsistent_options() {
        let mut repr = repr(vec![]);
        repr.options = vec![0x00; 4];
        let mut buffer = vec![0; 28];
        let mut packet = Packet::try_new(&mut buffer[..]).unwrap();
        assert_matches!(repr.serialize(&mut packet), Err(Error::Malformed));
    }

    #[test]
    fn test_corrupted_header_fails_checksum() {
        let repr = repr(vec![]);
        let mut buffer = vec![0; 28];

        {
            let mut packet = Packet::try_new(&mut buffer[..]).unwrap();
            repr.serialize(&mut packet).unwrap();
        }

        for i in 0 .. 20 {
            let mut corrupted = buffer.clone();
            corrupted[i] ^= 0xFF;
            let packet = Packet::try_new(&corrupted[..]).unwrap();
            // Flipping the version/ihl byte can break the encoding itself.
            if packet.check_encoding().is_ok() {
                assert!(!packet.checksum_valid(), "byte {} undetected", i);
            }
        }
    }

    #[test]
    fn test_address_mask() {
        let addr = Address::new([10, 0, 0, 5]);
        let netmask = Address::new([255, 255, 255, 0]);
        assert_eq!(Address::new([10, 0, 0, 0]), addr.mask(netmask));
    }

    #[test]
    fn test_address_from_str() {
        let addr: Address = "192.168.0.1".parse().unwrap();
        assert_eq!(addr, Address::new([192, 168, 0, 1]));
        assert!("192.168.0".parse::<Address>().is_err());
    }
}
