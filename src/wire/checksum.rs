//! Internet checksum (RFC 1071) arithmetic.

use crate::priv_prelude::*;

fn fold(mut sum: u32) -> u16 {
    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    sum as u16
}

/// Ones' complement sum of `bytes` read as big-endian 16-bit words, without the final
/// complement. An odd trailing byte is padded with a zero byte.
pub fn data(bytes: &[u8]) -> u16 {
    let mut words = bytes.chunks_exact(2);
    let mut sum: u32 = words
        .by_ref()
        .map(|word| u32::from(u16::from_be_bytes([word[0], word[1]])))
        .sum();
    if let [last] = words.remainder() {
        sum += u32::from(*last) << 8;
    }
    fold(sum)
}

/// Ones' complement sum of partial sums.
pub fn combine(sums: &[u16]) -> u16 {
    fold(sums.iter().map(|sum| u32::from(*sum)).sum())
}

/// Partial sum of the IPv4 pseudo header covering a transport segment of `length` bytes.
pub fn pseudo_header_ipv4(
    source_ip: Ipv4Addr,
    dest_ip: Ipv4Addr,
    protocol: u8,
    length: u32,
) -> u16 {
    let length = (length as u16).to_be_bytes();
    combine(&[
        data(&source_ip.octets()),
        data(&dest_ip.octets()),
        data(&[0, protocol, length[0], length[1]]),
    ])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rfc1071_example() {
        // worked example from RFC 1071 section 3
        let bytes = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(data(&bytes), 0xddf2);
    }

    #[test]
    fn odd_length_pads_with_zero() {
        assert_eq!(data(&[0x12]), 0x1200);
        assert_eq!(combine(&[0xffff, 0x0001]), 0x0001);
    }
}
