use crate::priv_prelude::*;
use crate::wire::{Ipv4Packet, UdpPacket};

/// Ethertype carried alongside IPv4 packets handed between devices and nodes.
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// Identifies a packet for the whole of its life in the simulation. Forwarding a packet keeps
/// its uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketUid(pub u64);

impl fmt::Display for PacketUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A simulated IPv4 packet.
#[derive(Clone, PartialEq)]
pub struct Packet {
    uid: PacketUid,
    ip: Ipv4Packet,
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f
        .debug_struct("Packet")
        .field("uid", &self.uid)
        .field("ip", &self.ip)
        .finish()
    }
}

impl Packet {
    pub fn new(uid: PacketUid, ip: Ipv4Packet) -> Packet {
        Packet { uid, ip }
    }

    pub fn uid(&self) -> PacketUid {
        self.uid
    }

    pub fn ip(&self) -> &Ipv4Packet {
        &self.ip
    }

    /// Size of the packet at the IP layer (header included).
    pub fn len(&self) -> usize {
        self.ip.total_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn udp(&self) -> Option<UdpPacket> {
        self.ip.udp()
    }

    /// A copy of this packet with its TTL decremented, or `None` if the TTL is exhausted.
    pub fn forwarded(&self) -> Option<Packet> {
        let ip = self.ip.decrement_ttl()?;
        Some(Packet { uid: self.uid, ip })
    }
}
