//! Coordination point for address resolution across interfaces.
//!
//! One instance is constructed at startup and shared by reference between
//! all peripheral notification streams. Each interface's table sits behind
//! its own lock so traffic for one interface does not contend with another;
//! no I/O ever happens while a table lock is held.

use std::sync::Mutex;

use {
    Error,
    Result,
};
use core::arp_table::{
    ArpTable,
    Lookup,
    State,
};
use core::iface::Interface;
use core::repr::{
    Arp,
    eth_types,
    EthernetAddress,
    EthernetFrame,
    Ipv4Address,
};
use core::time::{
    Env,
    SystemEnv,
};

/// Resolves IPv4 addresses to hardware addresses, one table per physical
/// interface.
pub struct Resolver<T = SystemEnv>
where
    T: Env,
{
    tables: Vec<Mutex<ArpTable<T>>>,
}

impl Resolver<SystemEnv> {
    /// Creates a resolver for the given number of interfaces using system
    /// time.
    pub fn new(interfaces: usize) -> Resolver<SystemEnv> {
        Resolver::with_time_env(interfaces, SystemEnv::new())
    }
}

impl<T: Env> Resolver<T> {
    pub fn with_time_env(interfaces: usize, time_env: T) -> Resolver<T> {
        Resolver {
            tables: (0 .. interfaces)
                .map(|_| Mutex::new(ArpTable::new(time_env.clone())))
                .collect(),
        }
    }

    /// Number of interface tables.
    pub fn interfaces(&self) -> usize {
        self.tables.len()
    }

    /// Looks up addr in the interface's table, creating a pending entry on a
    /// miss.
    ///
    /// When the entry comes back unresolved and no observed address was
    /// supplied, a broadcast resolution request is transmitted on iface,
    /// outside the table's critical section. Request transmission is fire
    /// and forget; a failure is logged, not returned.
    pub fn lookup<I: Interface>(
        &self,
        iface_no: usize,
        iface: &mut I,
        addr: Ipv4Address,
        observed: Option<EthernetAddress>,
    ) -> Result<Lookup> {
        let lookup = self.with_table(iface_no, |table| table.resolve(addr, observed))?;

        debug!(
            "{}: {} resolves to {:?} ({:?}).",
            iface.name(),
            addr,
            lookup.eth_addr,
            lookup.state
        );

        if lookup.state != State::Resolved && observed.is_none() {
            self.send_request(iface, addr);
        }

        Ok(lookup)
    }

    /// Appends an already built frame to the pending queue of addr's entry.
    pub fn enqueue(
        &self,
        iface_no: usize,
        addr: Ipv4Address,
        target_addr: Ipv4Address,
        payload: Vec<u8>,
    ) -> Result<()> {
        self.with_table(iface_no, |table| table.enqueue(addr, target_addr, payload))
    }

    /// Feeds a resolution learned from an ARP reply back into the table and
    /// transmits the frames it releases, in FIFO order.
    ///
    /// Returns the number of frames handed to the interface. A failed send
    /// is logged and does not hold back the remaining frames.
    pub fn on_resolved<I: Interface>(
        &self,
        iface_no: usize,
        iface: &mut I,
        addr: Ipv4Address,
        eth_addr: EthernetAddress,
    ) -> Result<usize> {
        let lookup = self.lookup(iface_no, iface, addr, Some(eth_addr))?;

        let mut sent = 0;
        for frame in lookup.flushed {
            let mut buffer = frame.payload;

            // Frames are queued with an unspecified destination; patch in
            // the resolved address before sending.
            match EthernetFrame::try_new(&mut buffer[..]) {
                Ok(mut eth_frame) => eth_frame.set_dst_addr(eth_addr),
                Err(err) => {
                    warn!("{}: dropping malformed queued frame: {:?}.", iface.name(), err);
                    continue;
                }
            }

            match iface.send(&buffer) {
                Ok(()) => sent += 1,
                Err(err) => warn!(
                    "{}: sending queued frame to {} failed: {:?}.",
                    iface.name(),
                    frame.target_addr,
                    err
                ),
            }
        }

        Ok(sent)
    }

    fn with_table<F, R>(&self, iface_no: usize, f: F) -> Result<R>
    where
        F: FnOnce(&mut ArpTable<T>) -> R,
    {
        let table = self.tables.get(iface_no).ok_or(Error::InvalidAddress)?;

        // Assertion failures in tests poison the lock; the table itself is
        // still consistent.
        let mut table = match table.lock() {
            Ok(guard) => guard,
            Err(err) => err.into_inner(),
        };

        Ok(f(&mut table))
    }

    fn send_request<I: Interface>(&self, iface: &mut I, addr: Ipv4Address) {
        let arp = Arp::request(iface.ethernet_addr(), iface.ipv4_addr(), addr);

        let mut buffer = vec![0; EthernetFrame::<&[u8]>::buffer_len(arp.buffer_len())];
        {
            let mut eth_frame = EthernetFrame::try_new(&mut buffer[..]).unwrap();
            eth_frame.set_dst_addr(EthernetAddress::BROADCAST);
            eth_frame.set_src_addr(iface.ethernet_addr());
            eth_frame.set_payload_type(eth_types::ARP);
            arp.serialize(eth_frame.payload_mut()).unwrap();
        }

        debug!("{}: sending ARP request for {}.", iface.name(), addr);

        if let Err(err) = iface.send(&buffer) {
            warn!("{}: ARP request for {} failed: {:?}.", iface.name(), addr, err);
        }
    }
}
