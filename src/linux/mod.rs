//! Linux implementations of the physical interface boundary.

pub mod iface;
pub mod libc;
pub mod sock;

pub use self::iface::LinuxInterface;
pub use self::sock::RawSocket;
