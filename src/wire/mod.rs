//! Types for describing IPv4/UDP packets.

pub(crate) mod checksum;
mod ipv4;
mod udp;

pub use self::ipv4::{Ipv4Packet, Ipv4Fields, MalformedPacket};
pub use self::udp::{UdpPacket, UdpPorts};

/// IP protocol numbers understood by the wire codecs.
pub mod protocol_numbers {
    pub const UDP: u8 = 17;
}
