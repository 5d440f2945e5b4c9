//! Per interface cache of IPv4 to hardware address resolutions.
//!
//! Entries live in a growable arena with a free list: slots reclaimed by the
//! timeout policy are reused before the table grows, and growth reserves
//! space in 1024 slot chunks. Timeouts are evaluated lazily while scanning,
//! so a stale entry persists until the next lookup touches the table.

use std::time::{
    Duration,
    Instant,
};

use core::queue::{
    FrameQueue,
    PendingFrame,
};
use core::repr::{
    EthernetAddress,
    Ipv4Address,
};
use core::time::{
    Env,
    SystemEnv,
};

/// Seconds after which a resolved entry that nothing refreshed is reclaimed.
pub const RESOLVED_TIMEOUT_SECS: u64 = 60;

/// Seconds after which an entry still waiting on a reply is reclaimed.
pub const PENDING_TIMEOUT_SECS: u64 = 1;

const GROW_CHUNK: usize = 1024;

/// Lifecycle state of a resolution entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Slot is unused and may be reclaimed.
    Free,
    /// A request went out; the hardware address is not yet known.
    Pending,
    /// The hardware address is known.
    Resolved,
}

#[derive(Debug)]
struct Entry {
    addr: Ipv4Address,
    eth_addr: Option<EthernetAddress>,
    state: State,
    last_update: Instant,
    queue: FrameQueue,
}

/// Outcome of a table lookup, snapshotted so it can leave the table's
/// critical section.
#[derive(Debug)]
pub struct Lookup {
    pub state: State,
    pub eth_addr: Option<EthernetAddress>,
    /// True when the entry still holds frames waiting on resolution.
    pub has_queued: bool,
    /// Frames released by this lookup supplying a hardware address; the
    /// caller owns sending them.
    pub flushed: Vec<PendingFrame>,
}

/// Maintains an expiring set of IPv4 to hardware address mappings for one
/// physical interface.
pub struct ArpTable<T = SystemEnv>
where
    T: Env,
{
    entries: Vec<Entry>,
    free: Vec<usize>,
    time_env: T,
}

impl<T: Env> ArpTable<T> {
    pub fn new(time_env: T) -> ArpTable<T> {
        ArpTable {
            entries: Vec::new(),
            free: Vec::new(),
            time_env,
        }
    }

    /// Looks up or creates the entry for addr.
    ///
    /// With an observed hardware address (from an ARP reply) the entry flips
    /// to resolved and all queued frames are handed back. Without one, a
    /// matching live entry is returned as is; a stale or missing entry is
    /// (re)created in the pending state, telling the caller a resolution
    /// request is owed.
    pub fn resolve(&mut self, addr: Ipv4Address, observed: Option<EthernetAddress>) -> Lookup {
        let now = self.time_env.now();

        for i in 0 .. self.entries.len() {
            if self.entries[i].state == State::Free {
                continue;
            }

            if self.entries[i].addr == addr {
                if self.entries[i].state == State::Resolved {
                    self.entries[i].last_update = now;
                }

                if let Some(eth_addr) = observed {
                    let entry = &mut self.entries[i];
                    entry.eth_addr = Some(eth_addr);
                    entry.state = State::Resolved;
                    entry.last_update = now;

                    return Lookup {
                        state: State::Resolved,
                        eth_addr: Some(eth_addr),
                        has_queued: false,
                        flushed: entry.queue.flush(),
                    };
                } else if Self::is_stale(&self.entries[i], now) {
                    self.release(i);
                } else {
                    let entry = &self.entries[i];
                    return Lookup {
                        state: entry.state,
                        eth_addr: entry.eth_addr,
                        has_queued: !entry.queue.is_empty(),
                        flushed: Vec::new(),
                    };
                }
            } else if Self::is_stale(&self.entries[i], now) {
                self.release(i);
            }
        }

        // No live entry; install a fresh pending one, reusing a freed slot
        // when possible.
        let entry = Entry {
            addr,
            eth_addr: observed,
            state: State::Pending,
            last_update: now,
            queue: FrameQueue::new(),
        };

        match self.free.pop() {
            Some(i) => self.entries[i] = entry,
            None => {
                if self.entries.len() == self.entries.capacity() {
                    self.entries.reserve(GROW_CHUNK);
                }
                self.entries.push(entry);
            }
        }

        Lookup {
            state: State::Pending,
            eth_addr: observed,
            has_queued: false,
            flushed: Vec::new(),
        }
    }

    /// Appends a frame to the queue of the live entry for addr.
    ///
    /// A no-op if the entry was reclaimed between the lookup and the append.
    pub fn enqueue(&mut self, addr: Ipv4Address, target_addr: Ipv4Address, payload: Vec<u8>) {
        match self.entries
            .iter_mut()
            .find(|entry| entry.state != State::Free && entry.addr == addr)
        {
            Some(entry) => entry.queue.append(target_addr, payload),
            None => debug!("No live entry for {}, dropping queued frame.", addr),
        }
    }

    /// Number of entries not in the free state.
    pub fn live_entries(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.state != State::Free)
            .count()
    }

    /// Slot index of the live entry for addr.
    pub fn slot_of(&self, addr: Ipv4Address) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.state != State::Free && entry.addr == addr)
    }

    fn is_stale(entry: &Entry, now: Instant) -> bool {
        let timeout = match entry.state {
            State::Resolved => Duration::from_secs(RESOLVED_TIMEOUT_SECS),
            State::Pending => Duration::from_secs(PENDING_TIMEOUT_SECS),
            State::Free => return false,
        };

        now.duration_since(entry.last_update) > timeout
    }

    fn release(&mut self, i: usize) {
        {
            let entry = &mut self.entries[i];
            entry.queue.clear();
            entry.eth_addr = None;
            entry.state = State::Free;
        }
        self.free.push(i);
    }

    #[cfg(test)]
    fn time_env(&mut self) -> &mut T {
        &mut self.time_env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::MockEnv;

    fn table() -> ArpTable<MockEnv> {
        ArpTable::new(MockEnv::new())
    }

    fn ipv4(i: u8) -> Ipv4Address {
        Ipv4Address::new([10, 0, 0, i])
    }

    fn eth(i: u8) -> EthernetAddress {
        EthernetAddress::new([0, 0, 0, 0, 0, i])
    }

    #[test]
    fn test_resolve_unknown_creates_pending_entry() {
        let mut table = table();

        let lookup = table.resolve(ipv4(5), None);
        assert_eq!(State::Pending, lookup.state);
        assert_eq!(None, lookup.eth_addr);
        assert!(!lookup.has_queued);
        assert!(lookup.flushed.is_empty());
        assert_eq!(1, table.live_entries());
    }

    #[test]
    fn test_resolve_again_returns_same_entry() {
        let mut table = table();

        table.resolve(ipv4(5), None);
        let slot = table.slot_of(ipv4(5));
        let lookup = table.resolve(ipv4(5), None);

        assert_eq!(State::Pending, lookup.state);
        assert_eq!(1, table.live_entries());
        assert_eq!(slot, table.slot_of(ipv4(5)));
    }

    #[test]
    fn test_observed_address_resolves_and_flushes_fifo() {
        let mut table = table();

        table.resolve(ipv4(5), None);
        table.enqueue(ipv4(5), ipv4(5), vec![1]);
        table.enqueue(ipv4(5), ipv4(5), vec![2]);

        let lookup = table.resolve(ipv4(5), Some(eth(1)));
        assert_eq!(State::Resolved, lookup.state);
        assert_eq!(Some(eth(1)), lookup.eth_addr);
        assert_eq!(
            vec![vec![1], vec![2]],
            lookup
                .flushed
                .into_iter()
                .map(|frame| frame.payload)
                .collect::<Vec<_>>()
        );

        // Queue is now empty.
        let lookup = table.resolve(ipv4(5), None);
        assert_eq!(State::Resolved, lookup.state);
        assert!(!lookup.has_queued);
    }

    #[test]
    fn test_matching_lookup_refreshes_resolved_entry() {
        let mut table = table();

        table.resolve(ipv4(5), None);
        table.resolve(ipv4(5), Some(eth(1)));
        table.time_env().advance(RESOLVED_TIMEOUT_SECS - 1);
        table.resolve(ipv4(5), None);
        table.time_env().advance(RESOLVED_TIMEOUT_SECS - 1);

        let lookup = table.resolve(ipv4(5), None);
        assert_eq!(State::Resolved, lookup.state);
        assert_eq!(Some(eth(1)), lookup.eth_addr);
    }

    #[test]
    fn test_resolved_entry_reclaimed_by_other_lookup_after_timeout() {
        let mut table = table();

        table.resolve(ipv4(5), None);
        table.resolve(ipv4(5), Some(eth(1)));
        let slot = table.slot_of(ipv4(5)).unwrap();
        table.time_env().advance(RESOLVED_TIMEOUT_SECS + 1);

        // A lookup for a different address scans, reclaims and reuses the
        // stale slot.
        table.resolve(ipv4(9), None);
        assert_eq!(Some(slot), table.slot_of(ipv4(9)));
        assert_eq!(None, table.slot_of(ipv4(5)));
        assert_eq!(1, table.live_entries());
    }

    #[test]
    fn test_pending_entry_recreated_after_timeout() {
        let mut table = table();

        table.resolve(ipv4(5), None);
        table.enqueue(ipv4(5), ipv4(5), vec![1]);
        table.time_env().advance(PENDING_TIMEOUT_SECS + 1);

        // The stale pending entry is cleared and recreated; the old queue is
        // discarded with it.
        let lookup = table.resolve(ipv4(5), None);
        assert_eq!(State::Pending, lookup.state);
        assert!(!lookup.has_queued);
        assert_eq!(1, table.live_entries());

        let lookup = table.resolve(ipv4(5), Some(eth(1)));
        assert!(lookup.flushed.is_empty());
    }

    #[test]
    fn test_pending_entry_returned_before_timeout() {
        let mut table = table();

        table.resolve(ipv4(5), None);
        table.enqueue(ipv4(5), ipv4(5), vec![1]);

        let lookup = table.resolve(ipv4(5), None);
        assert_eq!(State::Pending, lookup.state);
        assert!(lookup.has_queued);
    }

    #[test]
    fn test_enqueue_without_entry_is_dropped() {
        let mut table = table();
        table.enqueue(ipv4(5), ipv4(5), vec![1]);
        assert_eq!(0, table.live_entries());
    }

    #[test]
    fn test_distinct_addresses_use_distinct_slots() {
        let mut table = table();

        table.resolve(ipv4(1), None);
        table.resolve(ipv4(2), None);
        assert_eq!(2, table.live_entries());
        assert_ne!(table.slot_of(ipv4(1)), table.slot_of(ipv4(2)));
    }

    #[test]
    fn test_freed_slots_are_reused_before_growth() {
        let mut table = table();

        table.resolve(ipv4(1), None);
        table.resolve(ipv4(2), None);
        table.time_env().advance(PENDING_TIMEOUT_SECS + 1);

        // The next lookup reclaims both stale entries and installs into the
        // most recently freed slot; the lookup after takes the other.
        table.resolve(ipv4(3), None);
        assert_eq!(Some(1), table.slot_of(ipv4(3)));
        table.resolve(ipv4(4), None);
        assert_eq!(Some(0), table.slot_of(ipv4(4)));
        assert_eq!(2, table.live_entries());
    }

    #[test]
    fn test_observed_address_on_miss_stays_pending() {
        let mut table = table();

        let lookup = table.resolve(ipv4(5), Some(eth(1)));
        assert_eq!(State::Pending, lookup.state);
        assert_eq!(Some(eth(1)), lookup.eth_addr);
        assert!(lookup.flushed.is_empty());
    }
}
