//! Boundary to the BLE peripheral transport.
//!
//! The transport itself (connecting, GATT discovery, the notification loop)
//! lives outside the core; the forwarding engine only reads the peer's
//! reported destination address, writes payloads back down, and checks
//! whether a link address belongs to a peripheral the bridge manages.

use {
    Error,
    Result,
};
use core::repr::{
    EthernetAddress,
    Ipv4Address,
};

/// GATT characteristics of the data transfer service the bridge consumes.
pub mod characteristics {
    pub const DATA_TRANSFER_SERVICE: &'static str = "c8edc62d-8604-40c6-a4b4-8878d228ec1c";

    /// Notify source carrying peripheral frames.
    pub const UPLOAD_DATA: &'static str = "124a03e2-46c2-4ddd-8cf2-b643a1e91071";

    /// Read target holding the peer's destination IPv4 address.
    pub const UPLOAD_DESTINATION: &'static str = "d7299075-a344-48a7-82bb-2baa19838b2d";

    /// Read target holding the peer's link address.
    pub const UPLOAD_LINK_ADDR: &'static str = "9cbb72c9-3673-4d45-b11f-1afca4a0cf7d";

    /// Write target for delivering payload to a peripheral.
    pub const DOWNLOAD_DATA: &'static str = "b4bf78a1-b41a-4412-b3a9-97740d7003e0";
}

/// GATT write mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    WithResponse,
    WithoutResponse,
}

/// Access to the BLE peripherals the bridge manages, keyed by link address.
pub trait Transport {
    /// Reads the value of a characteristic from a peripheral.
    fn read(&self, peripheral: EthernetAddress, characteristic: &str) -> Result<Vec<u8>>;

    /// Writes a value to a characteristic of a peripheral.
    fn write(
        &self,
        peripheral: EthernetAddress,
        characteristic: &str,
        value: &[u8],
        mode: WriteMode,
    ) -> Result<()>;

    /// Subscribes to a notify characteristic. Values are delivered by the
    /// platform driver until [stop_notify](#tymethod.stop_notify).
    fn start_notify(&self, peripheral: EthernetAddress, characteristic: &str) -> Result<()>;

    /// Cancels a notify subscription.
    fn stop_notify(&self, peripheral: EthernetAddress, characteristic: &str) -> Result<()>;

    /// Checks if the link address belongs to a peripheral this bridge
    /// manages.
    fn manages(&self, peripheral: EthernetAddress) -> bool;

    /// Reads the IPv4 address the peripheral wants to talk to.
    fn read_destination(&self, peripheral: EthernetAddress) -> Result<Ipv4Address> {
        let value = self.read(peripheral, characteristics::UPLOAD_DESTINATION)?;
        Ipv4Address::try_new(&value).map_err(|_| Error::InvalidAddress)
    }

    /// Reads the link address the peripheral reports for itself.
    fn read_link_addr(&self, peripheral: EthernetAddress) -> Result<EthernetAddress> {
        let value = self.read(peripheral, characteristics::UPLOAD_LINK_ADDR)?;
        EthernetAddress::try_new(&value).map_err(|_| Error::InvalidAddress)
    }

    /// Hands a payload to a peripheral via its download characteristic.
    fn deliver(&self, peripheral: EthernetAddress, payload: &[u8]) -> Result<()> {
        self.write(
            peripheral,
            characteristics::DOWNLOAD_DATA,
            payload,
            WriteMode::WithoutResponse,
        )
    }
}
