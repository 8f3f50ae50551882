//! The sequence number/timestamp header that instrumented applications put at the front of
//! their payloads.

use crate::priv_prelude::*;

/// Carries a per-stream sequence number and the virtual time at which the packet was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqTsHeader {
    pub seq: u32,
    pub ts: Duration,
}

impl SeqTsHeader {
    /// Encoded size: a 32-bit sequence number followed by a 64-bit nanosecond timestamp.
    pub const LEN: usize = 12;

    pub fn new(seq: u32, ts: Duration) -> SeqTsHeader {
        SeqTsHeader { seq, ts }
    }

    pub fn write_to(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.seq);
        buf.put_u64(self.ts.nanos_u64());
    }

    /// Read the header from the front of `payload` without consuming it. Returns `None` if the
    /// payload is too short to hold one.
    pub fn peek(payload: &[u8]) -> Option<SeqTsHeader> {
        if payload.len() < SeqTsHeader::LEN {
            return None;
        }
        let mut buf = &payload[..SeqTsHeader::LEN];
        let seq = buf.get_u32();
        let ts = Duration::from_nanos(buf.get_u64());
        Some(SeqTsHeader { seq, ts })
    }

    /// Build an application payload of `size` bytes starting with this header and padded with
    /// zeros. Payloads are never shorter than the header itself.
    pub fn payload(&self, size: usize) -> Bytes {
        let size = cmp::max(size, SeqTsHeader::LEN);
        let mut buf = BytesMut::with_capacity(size);
        self.write_to(&mut buf);
        buf.resize(size, 0);
        buf.freeze()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn peek_reads_what_was_written() {
        let header = SeqTsHeader::new(7, Duration::from_micros(20_010));
        let payload = header.payload(100);
        assert_eq!(payload.len(), 100);
        assert_eq!(SeqTsHeader::peek(&payload), Some(header));
        // peeking twice sees the same thing
        assert_eq!(SeqTsHeader::peek(&payload), Some(header));
    }

    #[test]
    fn short_payloads() {
        let header = SeqTsHeader::new(1, Duration::ZERO);
        assert_eq!(header.payload(3).len(), SeqTsHeader::LEN);
        assert_eq!(SeqTsHeader::peek(&[0u8; 11]), None);
    }
}
