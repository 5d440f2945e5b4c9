use std::cell::RefCell;
use std::collections::{
    HashMap,
    HashSet,
};

use env_logger;

use blebridge::{
    Error,
    Result,
};
use blebridge::core::ble::{
    characteristics,
    Transport,
    WriteMode,
};
use blebridge::core::iface::Interface;
use blebridge::core::repr::{
    EthernetAddress,
    Ipv4Address,
};

/// Initializes logging once; repeated calls are harmless.
pub fn init() {
    let _ = env_logger::try_init();
}

pub struct TestIface {
    pub name: &'static str,
    pub ipv4_addr: Ipv4Address,
    pub ethernet_addr: EthernetAddress,
    pub netmask: Option<Ipv4Address>,
    pub subnet: Option<Ipv4Address>,
    pub sent: Vec<Vec<u8>>,
}

impl TestIface {
    pub fn new(name: &'static str, ipv4_addr: [u8; 4], subnet: Option<[u8; 4]>) -> TestIface {
        TestIface {
            name,
            ipv4_addr: Ipv4Address::new(ipv4_addr),
            ethernet_addr: EthernetAddress::new([0x02, 0, 0, 0, 0, ipv4_addr[3]]),
            netmask: subnet.map(|_| Ipv4Address::new([255, 255, 255, 0])),
            subnet: subnet.map(Ipv4Address::new),
            sent: Vec::new(),
        }
    }
}

impl Interface for TestIface {
    fn name(&self) -> &str {
        self.name
    }

    fn ipv4_addr(&self) -> Ipv4Address {
        self.ipv4_addr
    }

    fn ethernet_addr(&self) -> EthernetAddress {
        self.ethernet_addr
    }

    fn netmask(&self) -> Option<Ipv4Address> {
        self.netmask
    }

    fn subnet(&self) -> Option<Ipv4Address> {
        self.subnet
    }

    fn send(&mut self, buffer: &[u8]) -> Result<()> {
        self.sent.push(buffer.to_vec());
        Ok(())
    }
}

/// A GATT transport over in-memory peripherals.
pub struct TestTransport {
    destinations: HashMap<EthernetAddress, Ipv4Address>,
    managed: HashSet<EthernetAddress>,
    pub written: RefCell<Vec<(EthernetAddress, Vec<u8>)>>,
}

impl TestTransport {
    pub fn new() -> TestTransport {
        TestTransport {
            destinations: HashMap::new(),
            managed: HashSet::new(),
            written: RefCell::new(Vec::new()),
        }
    }

    pub fn peripheral(
        &mut self,
        link_addr: EthernetAddress,
        destination: Option<Ipv4Address>,
    ) -> &mut TestTransport {
        self.managed.insert(link_addr);
        if let Some(destination) = destination {
            self.destinations.insert(link_addr, destination);
        }
        self
    }
}

impl Transport for TestTransport {
    fn read(&self, peripheral: EthernetAddress, characteristic: &str) -> Result<Vec<u8>> {
        if characteristic == characteristics::UPLOAD_DESTINATION {
            match self.destinations.get(&peripheral) {
                Some(addr) => Ok(addr.as_bytes().to_vec()),
                None => Err(Error::Transport),
            }
        } else {
            Err(Error::Transport)
        }
    }

    fn write(
        &self,
        peripheral: EthernetAddress,
        _characteristic: &str,
        value: &[u8],
        mode: WriteMode,
    ) -> Result<()> {
        assert_eq!(WriteMode::WithoutResponse, mode);
        self.written
            .borrow_mut()
            .push((peripheral, value.to_vec()));
        Ok(())
    }

    fn start_notify(&self, _: EthernetAddress, _: &str) -> Result<()> {
        Ok(())
    }

    fn stop_notify(&self, _: EthernetAddress, _: &str) -> Result<()> {
        Ok(())
    }

    fn manages(&self, peripheral: EthernetAddress) -> bool {
        self.managed.contains(&peripheral)
    }
}
