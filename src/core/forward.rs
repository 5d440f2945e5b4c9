//! Decides what to do with each frame received from a peripheral.
//!
//! A decoded peripheral frame is delivered locally, short-circuited to
//! another managed peripheral, sent out a physical interface, or parked on a
//! resolution entry's queue. Candidate interfaces are tried in order and the
//! first one that sends or queues wins; a resolved entry still holding
//! frames from an earlier unresolved period passes its turn to the next
//! candidate instead of flushing first, faithfully to the system this
//! bridge replaces.

use rand;

use Result;
use core::arp_table::State;
use core::ble::Transport;
use core::iface::Interface;
use core::repr::{
    eth_types,
    ipv4_protocols,
    BleFrame,
    EthernetAddress,
    EthernetFrame,
    EthernetRepr,
    Ipv4Address,
    Ipv4Packet,
    Ipv4Repr,
    UdpPacket,
    UdpRepr,
};
use core::resolver::Resolver;
use core::time::Env;

/// UDP port bridged traffic is sent from and to.
pub const BRIDGE_UDP_PORT: u16 = 5151;

const TTL: u8 = 64;

/// What became of one inbound peripheral frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The destination was one of the bridge's own addresses.
    Local,
    /// Handed directly to another managed peripheral.
    Peripheral,
    /// Sent out the interface immediately.
    Sent { iface_no: usize },
    /// Parked on the interface's resolution entry until it resolves.
    Queued { iface_no: usize },
    /// Dropped because the transport could not supply what was needed.
    Dropped,
    /// No candidate interface could take the frame.
    NoRoute,
}

/// Forwards decoded peripheral frames onto the IP network.
pub struct Forwarder<'a, B, T>
where
    B: Transport + 'a,
    T: Env + 'a,
{
    transport: &'a B,
    resolver: &'a Resolver<T>,
    next_hop: Ipv4Address,
    udp_port: u16,
}

impl<'a, B, T> Forwarder<'a, B, T>
where
    B: Transport + 'a,
    T: Env + 'a,
{
    pub fn new(transport: &'a B, resolver: &'a Resolver<T>, next_hop: Ipv4Address) -> Forwarder<'a, B, T> {
        Forwarder {
            transport,
            resolver,
            next_hop,
            udp_port: BRIDGE_UDP_PORT,
        }
    }

    /// Routes one frame notified by the peripheral with link address
    /// src_addr.
    ///
    /// The destination IPv4 address is read from the peripheral itself; the
    /// frame only carries link addresses and payload.
    pub fn handle_inbound<I: Interface>(
        &self,
        frame: &BleFrame,
        src_addr: EthernetAddress,
        ifaces: &mut [I],
    ) -> Result<Outcome> {
        let dst_addr = match self.transport.read_destination(src_addr) {
            Ok(dst_addr) => dst_addr,
            Err(err) => {
                warn!("Reading destination of {} failed: {:?}.", src_addr, err);
                return Ok(Outcome::Dropped);
            }
        };

        if ifaces.iter().any(|iface| iface.ipv4_addr() == dst_addr) {
            debug!("{} is addressed to this bridge.", dst_addr);
            return Ok(Outcome::Local);
        }

        if self.transport.manages(frame.dst_addr) {
            return match self.transport.deliver(frame.dst_addr, &frame.data) {
                Ok(()) => Ok(Outcome::Peripheral),
                Err(err) => {
                    warn!("Delivering to peripheral {} failed: {:?}.", frame.dst_addr, err);
                    Ok(Outcome::Dropped)
                }
            };
        }

        let mut ble_buffer = vec![0; frame.buffer_len()];
        frame.serialize(&mut ble_buffer)?;

        for (iface_no, iface) in ifaces.iter_mut().enumerate() {
            if iface.netmask().is_none() || iface.subnet().is_none() {
                debug!("{} has no subnet, skipping.", iface.name());
                continue;
            }

            let target_addr = if iface.contains(dst_addr) {
                dst_addr
            } else {
                self.next_hop
            };

            let lookup = self.resolver.lookup(iface_no, iface, target_addr, None)?;

            match (lookup.state, lookup.eth_addr) {
                (State::Resolved, Some(eth_addr)) if !lookup.has_queued => {
                    let buffer = self.build_frame(iface, eth_addr, target_addr, &ble_buffer);
                    if let Err(err) = iface.send(&buffer) {
                        warn!("{}: send to {} failed: {:?}.", iface.name(), target_addr, err);
                    }
                    return Ok(Outcome::Sent { iface_no });
                }
                (State::Resolved, Some(_)) => {
                    // Older frames are still waiting on this entry; let the
                    // next candidate have it.
                    debug!(
                        "{}: {} resolved but frames still queued, trying next interface.",
                        iface.name(),
                        target_addr
                    );
                }
                _ => {
                    let buffer = self.build_frame(
                        iface,
                        EthernetAddress::UNSPECIFIED,
                        target_addr,
                        &ble_buffer,
                    );
                    self.resolver
                        .enqueue(iface_no, target_addr, target_addr, buffer)?;
                    return Ok(Outcome::Queued { iface_no });
                }
            }
        }

        warn!("No route for {}, dropping frame from {}.", dst_addr, src_addr);
        Ok(Outcome::NoRoute)
    }

    /// Wraps the serialized peripheral frame in Ethernet, IPv4 and UDP
    /// headers for the given interface and target.
    fn build_frame<I: Interface>(
        &self,
        iface: &I,
        dst_eth_addr: EthernetAddress,
        target_addr: Ipv4Address,
        ble_buffer: &[u8],
    ) -> Vec<u8> {
        let udp_len = UdpPacket::<&[u8]>::buffer_len(ble_buffer.len());
        let ipv4_len = Ipv4Packet::<&[u8]>::buffer_len(udp_len);
        let mut buffer = vec![0; EthernetFrame::<&[u8]>::buffer_len(ipv4_len)];

        {
            let mut eth_frame = EthernetFrame::try_new(&mut buffer[..]).unwrap();
            EthernetRepr {
                dst_addr: dst_eth_addr,
                src_addr: iface.ethernet_addr(),
                payload_type: eth_types::IPV4,
            }.serialize(&mut eth_frame);

            let ipv4_repr = Ipv4Repr {
                version: 4,
                ihl: 5,
                tos: 0,
                total_len: ipv4_len as u16,
                id: rand::random::<u16>(),
                frag_offset: 0,
                ttl: TTL,
                protocol: ipv4_protocols::UDP,
                checksum: 0,
                src_addr: iface.ipv4_addr(),
                dst_addr: target_addr,
                options: Vec::new(),
            };
            let mut ipv4_packet = Ipv4Packet::try_new(eth_frame.payload_mut()).unwrap();
            ipv4_repr.serialize(&mut ipv4_packet).unwrap();

            let udp_repr = UdpRepr {
                src_port: self.udp_port,
                dst_port: self.udp_port,
                length: udp_len as u16,
            };
            let mut udp_packet = UdpPacket::try_new(ipv4_packet.payload_mut()).unwrap();
            udp_repr.serialize(&mut udp_packet);
            udp_packet.payload_mut().copy_from_slice(ble_buffer);
        }

        buffer
    }
}
