use crate::priv_prelude::*;
use super::protocol_numbers;

pub const HEADER_LEN: usize = 8;

/// Source and destination ports of a datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpPorts {
    pub source: u16,
    pub dest: u16,
}

/// A view onto the UDP part of an IPv4 packet.
#[derive(Clone, PartialEq)]
pub struct UdpPacket {
    buffer: Bytes,
}

impl fmt::Debug for UdpPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f
        .debug_struct("UdpPacket")
        .field("ports", &self.ports())
        .field("payload_len", &(self.buffer.len() - HEADER_LEN))
        .finish()
    }
}

fn pseudo_sum(source_ip: Ipv4Addr, dest_ip: Ipv4Addr, udp_len: usize) -> u16 {
    checksum::pseudo_header_ipv4(source_ip, dest_ip, protocol_numbers::UDP, udp_len as u32)
}

/// Append a datagram to `out`. The checksum covers the pseudo header built from the two
/// addresses, so they must be the ones the enclosing IPv4 header will carry.
pub(crate) fn encode(
    out: &mut BytesMut,
    ports: UdpPorts,
    source_ip: Ipv4Addr,
    dest_ip: Ipv4Addr,
    payload: &[u8],
) {
    let start = out.len();
    let udp_len = HEADER_LEN + payload.len();
    out.put_u16(ports.source);
    out.put_u16(ports.dest);
    out.put_u16(udp_len as u16);
    out.put_u16(0);
    out.put_slice(payload);

    let sum = checksum::combine(&[
        pseudo_sum(source_ip, dest_ip, udp_len),
        checksum::data(&out[start..]),
    ]);
    // zero means "no checksum" on the wire
    let sum = match !sum {
        0 => 0xffff,
        sum => sum,
    };
    out[start + 6..start + 8].copy_from_slice(&sum.to_be_bytes());
}

impl UdpPacket {
    /// Wrap the bytes following an IPv4 header. `None` if they can't hold a UDP header.
    pub(crate) fn parse(buffer: Bytes) -> Option<UdpPacket> {
        if buffer.len() < HEADER_LEN {
            return None;
        }
        Some(UdpPacket { buffer })
    }

    pub fn ports(&self) -> UdpPorts {
        UdpPorts {
            source: self.source_port(),
            dest: self.dest_port(),
        }
    }

    pub fn source_port(&self) -> u16 {
        (&self.buffer[0..2]).get_u16()
    }

    pub fn dest_port(&self) -> u16 {
        (&self.buffer[2..4]).get_u16()
    }

    pub fn payload(&self) -> Bytes {
        self.buffer.slice(HEADER_LEN..)
    }

    /// Check the datagram against the addresses of the IPv4 header carrying it.
    pub fn verify_checksum_v4(&self, source_ip: Ipv4Addr, dest_ip: Ipv4Addr) -> bool {
        let sum = checksum::combine(&[
            pseudo_sum(source_ip, dest_ip, self.buffer.len()),
            checksum::data(&self.buffer),
        ]);
        sum == 0xffff
    }
}
