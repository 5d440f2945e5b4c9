#[cfg(test)]
#[macro_use]
extern crate assert_matches;
extern crate byteorder;
#[cfg(target_os = "linux")]
extern crate get_if_addrs;
#[cfg(target_os = "linux")]
extern crate libc;
#[macro_use]
extern crate log;
extern crate rand;

pub mod core;

#[cfg(target_os = "linux")]
pub mod linux;

#[derive(Debug)]
pub enum Error {
    /// Indicates an error where an address has the wrong length or format.
    InvalidAddress,
    /// Indicates an error where a buffer holds fewer bytes than a header requires.
    Truncated,
    /// Indicates an error where a checksum is invalid.
    Checksum,
    /// Indicates an error where a packet or frame is malformed.
    Malformed,
    /// Indicates an error raised by the peripheral transport.
    Transport,
    /// Indicates an error where no interface could be used to forward a frame.
    NoRoute,
    /// Indicates a generic IO error.
    IO(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IO(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
