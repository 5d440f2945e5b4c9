//! The custom frame exchanged with BLE peripherals.
//!
//! Wire layout: `src_link(6) | dst_link(6) | length(2, big-endian) | data`.
//! The length field counts the two link addresses plus the data, so its value
//! is `12 + data.len()`, not the full serialized size.

use byteorder::{
    ByteOrder,
    NetworkEndian,
};

use {
    Error,
    Result,
};
use core::repr::EthernetAddress;

/// Number of bytes preceding the data: two link addresses and the length
/// field.
pub const HEADER_LEN: usize = 14;

/// Number of bytes the length field accounts for on top of the data.
pub const LENGTH_OVERHEAD: u16 = 12;

/// A peripheral frame wrapping application payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub src_addr: EthernetAddress,
    pub dst_addr: EthernetAddress,
    pub data: Vec<u8>,
}

impl Frame {
    /// Wraps a payload in a frame between two link addresses.
    pub fn new(src_addr: EthernetAddress, dst_addr: EthernetAddress, data: Vec<u8>) -> Frame {
        Frame {
            src_addr,
            dst_addr,
            data,
        }
    }

    /// Parses a frame from the raw bytes of a notification value.
    pub fn deserialize(buffer: &[u8]) -> Result<Frame> {
        if buffer.len() < HEADER_LEN {
            return Err(Error::Truncated);
        }

        Ok(Frame {
            src_addr: EthernetAddress::try_new(&buffer[0 .. 6]).unwrap(),
            dst_addr: EthernetAddress::try_new(&buffer[6 .. 12]).unwrap(),
            data: buffer[HEADER_LEN ..].to_vec(),
        })
    }

    /// Returns the value the length field carries for this frame.
    pub fn length_field(&self) -> u16 {
        LENGTH_OVERHEAD + self.data.len() as u16
    }

    /// Returns the size of the frame when serialized to a buffer.
    pub fn buffer_len(&self) -> usize {
        HEADER_LEN + self.data.len()
    }

    /// Serializes the frame into a buffer.
    pub fn serialize(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Truncated);
        }

        buffer[0 .. 6].copy_from_slice(self.src_addr.as_bytes());
        buffer[6 .. 12].copy_from_slice(self.dst_addr.as_bytes());
        NetworkEndian::write_u16(&mut buffer[12 .. 14], self.length_field());
        buffer[HEADER_LEN .. HEADER_LEN + self.data.len()].copy_from_slice(&self.data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(
            EthernetAddress::new([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]),
            EthernetAddress::new([0x11, 0x12, 0x13, 0x14, 0x15, 0x16]),
            vec![0xAA, 0xBB],
        )
    }

    #[test]
    fn test_serialize() {
        let frame = frame();
        assert_eq!(16, frame.buffer_len());
        assert_eq!(14, frame.length_field());

        let mut buffer = vec![0; frame.buffer_len()];
        frame.serialize(&mut buffer).unwrap();

        assert_eq!(
            &buffer[..],
            &[
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x00,
                0x0E, 0xAA, 0xBB,
            ][..]
        );
    }

    #[test]
    fn test_deserialize() {
        let frame = frame();
        let mut buffer = vec![0; frame.buffer_len()];
        frame.serialize(&mut buffer).unwrap();
        assert_eq!(frame, Frame::deserialize(&buffer).unwrap());
    }

    #[test]
    fn test_deserialize_empty_data() {
        let buffer = [0; HEADER_LEN];
        let frame = Frame::deserialize(&buffer).unwrap();
        assert!(frame.data.is_empty());
        assert_eq!(12, frame.length_field());
    }

    #[test]
    fn test_deserialize_truncated() {
        let buffer = [0; HEADER_LEN - 1];
        assert_matches!(Frame::deserialize(&buffer), Err(Error::Truncated));
    }

    #[test]
    fn test_serialize_with_short_buffer() {
        let mut buffer = [0; 15];
        assert_matches!(frame().serialize(&mut buffer), Err(Error::Truncated));
    }
}
