use crate::priv_prelude::*;
use super::{protocol_numbers, udp, UdpPacket, UdpPorts};

pub const HEADER_LEN: usize = 20;

const VERSION_IHL: u8 = 0x45;

/// Returned when a buffer does not hold a well-formed packet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedPacket {
    #[error("packet is {len} bytes, shorter than its {needed} byte header")]
    Truncated { len: usize, needed: usize },
    #[error("unsupported IP version {0}")]
    Version(u8),
    #[error("total length field ({field}) disagrees with buffer length ({len})")]
    Length { field: usize, len: usize },
}

/// An IPv4 packet with a bare 20 byte header.
#[derive(Clone, PartialEq)]
pub struct Ipv4Packet {
    buffer: Bytes,
}

impl fmt::Debug for Ipv4Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f
        .debug_struct("Ipv4Packet")
        .field("source_ip", &self.source_ip())
        .field("dest_ip", &self.dest_ip())
        .field("ttl", &self.ttl())
        .field("protocol", &self.protocol())
        .field("udp", &self.udp())
        .finish()
    }
}

/// Addressing for a datagram sent from one socket to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Fields {
    pub source_ip: Ipv4Addr,
    pub dest_ip: Ipv4Addr,
    pub ttl: u8,
}

fn header_checksum(header: &[u8]) -> u16 {
    !checksum::data(header)
}

impl Ipv4Packet {
    /// Encode a UDP datagram inside an IPv4 header.
    pub fn udp_datagram(fields: Ipv4Fields, ports: UdpPorts, payload: &[u8]) -> Ipv4Packet {
        let total_len = HEADER_LEN + udp::HEADER_LEN + payload.len();
        let mut out = BytesMut::with_capacity(total_len);
        out.put_u8(VERSION_IHL);
        out.put_u8(0);
        out.put_u16(total_len as u16);
        // identification, flags and fragment offset are unused
        out.put_u32(0);
        out.put_u8(fields.ttl);
        out.put_u8(protocol_numbers::UDP);
        out.put_u16(0);
        out.put_slice(&fields.source_ip.octets());
        out.put_slice(&fields.dest_ip.octets());
        let sum = header_checksum(&out[..HEADER_LEN]);
        out[10..12].copy_from_slice(&sum.to_be_bytes());

        udp::encode(&mut out, ports, fields.source_ip, fields.dest_ip, payload);
        Ipv4Packet {
            buffer: out.freeze(),
        }
    }

    /// Parse a packet from raw bytes, checking the header is consistent.
    pub fn from_bytes(buffer: Bytes) -> Result<Ipv4Packet, MalformedPacket> {
        if buffer.len() < HEADER_LEN {
            return Err(MalformedPacket::Truncated { len: buffer.len(), needed: HEADER_LEN });
        }
        let version = buffer[0] >> 4;
        if version != 4 {
            return Err(MalformedPacket::Version(version));
        }
        let field = usize::from((&buffer[2..4]).get_u16());
        if field != buffer.len() {
            return Err(MalformedPacket::Length { field, len: buffer.len() });
        }
        Ok(Ipv4Packet { buffer })
    }

    /// The same packet one hop further on, or `None` once the TTL runs out.
    pub fn decrement_ttl(&self) -> Option<Ipv4Packet> {
        let ttl = self.ttl().checked_sub(1).filter(|ttl| *ttl > 0)?;
        let mut buffer = BytesMut::from(&self.buffer[..]);
        buffer[8] = ttl;
        buffer[10..12].copy_from_slice(&[0, 0]);
        let sum = header_checksum(&buffer[..HEADER_LEN]);
        buffer[10..12].copy_from_slice(&sum.to_be_bytes());
        Some(Ipv4Packet {
            buffer: buffer.freeze(),
        })
    }

    pub fn source_ip(&self) -> Ipv4Addr {
        let octets: [u8; 4] = [self.buffer[12], self.buffer[13], self.buffer[14], self.buffer[15]];
        Ipv4Addr::from(octets)
    }

    pub fn dest_ip(&self) -> Ipv4Addr {
        let octets: [u8; 4] = [self.buffer[16], self.buffer[17], self.buffer[18], self.buffer[19]];
        Ipv4Addr::from(octets)
    }

    pub fn ttl(&self) -> u8 {
        self.buffer[8]
    }

    pub fn protocol(&self) -> u8 {
        self.buffer[9]
    }

    pub fn total_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn verify_checksum(&self) -> bool {
        checksum::data(&self.buffer[..HEADER_LEN]) == 0xffff
    }

    /// The UDP datagram this packet carries, if it carries one.
    pub fn udp(&self) -> Option<UdpPacket> {
        if self.protocol() != protocol_numbers::UDP {
            return None;
        }
        UdpPacket::parse(self.buffer.slice(HEADER_LEN..))
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.buffer
    }

    pub fn into_bytes(self) -> Bytes {
        self.buffer
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> Ipv4Packet {
        Ipv4Packet::udp_datagram(
            Ipv4Fields {
                source_ip: ipv4!("1.0.0.2"),
                dest_ip: ipv4!("7.0.0.2"),
                ttl: 64,
            },
            UdpPorts { source: 49153, dest: 1234 },
            b"hello world!",
        )
    }

    #[test]
    fn header_fields_and_checksums() {
        let packet = sample();
        assert_eq!(packet.total_len(), 20 + 8 + 12);
        assert_eq!(packet.source_ip(), ipv4!("1.0.0.2"));
        assert_eq!(packet.dest_ip(), ipv4!("7.0.0.2"));
        assert_eq!(packet.ttl(), 64);
        assert_eq!(packet.protocol(), protocol_numbers::UDP);
        assert!(packet.verify_checksum());

        let udp = packet.udp().unwrap();
        assert_eq!(udp.ports(), UdpPorts { source: 49153, dest: 1234 });
        assert_eq!(&udp.payload()[..], b"hello world!");
        assert!(udp.verify_checksum_v4(packet.source_ip(), packet.dest_ip()));
        assert!(!udp.verify_checksum_v4(packet.source_ip(), ipv4!("7.0.0.3")));
    }

    #[test]
    fn decrement_ttl_keeps_checksum_valid() {
        let packet = sample().decrement_ttl().unwrap();
        assert_eq!(packet.ttl(), 63);
        assert_eq!(packet.total_len(), 40);
        assert!(packet.verify_checksum());

        let last_hop = Ipv4Packet::udp_datagram(
            Ipv4Fields { source_ip: ipv4!("1.0.0.2"), dest_ip: ipv4!("7.0.0.2"), ttl: 1 },
            UdpPorts { source: 1, dest: 2 },
            &[],
        );
        assert!(last_hop.decrement_ttl().is_none());
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        assert_eq!(
            Ipv4Packet::from_bytes(Bytes::from_static(&[0x45; 4])),
            Err(MalformedPacket::Truncated { len: 4, needed: 20 }),
        );
        let mut raw = BytesMut::from(&sample().into_bytes()[..]);
        raw[0] = 0x65;
        assert_eq!(Ipv4Packet::from_bytes(raw.freeze()), Err(MalformedPacket::Version(6)));
        let ok = sample().into_bytes();
        assert!(Ipv4Packet::from_bytes(ok).is_ok());
    }
}
