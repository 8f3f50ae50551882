use crate::priv_prelude::*;

/// A 48-bit hardware address identifying a simulated device.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr {
    bytes: [u8; 6],
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.bytes[0],
            self.bytes[1],
            self.bytes[2],
            self.bytes[3],
            self.bytes[4],
            self.bytes[5],
        )
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr {
        bytes: [0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
    };

    pub fn from_bytes(bytes: [u8; 6]) -> MacAddr {
        MacAddr { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    /// The `index`th address handed out by a simulation, `00:00:00:00:00:01` being the first.
    pub fn allocated(index: u64) -> MacAddr {
        let be = index.to_be_bytes();
        MacAddr::from_bytes([be[2], be[3], be[4], be[5], be[6], be[7]])
    }

    pub fn is_broadcast(&self) -> bool {
        *self == MacAddr::BROADCAST
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allocated_addresses_are_sequential() {
        assert_eq!(format!("{}", MacAddr::allocated(1)), "00:00:00:00:00:01");
        assert_eq!(format!("{}", MacAddr::allocated(0x1_02)), "00:00:00:00:01:02");
        assert!(!MacAddr::allocated(1).is_broadcast());
    }
}
