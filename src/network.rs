use crate::priv_prelude::*;

/// An IPv4 network, ie. a base address and a prefix length.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Network {
    base_addr: Ipv4Addr,
    subnet_mask_bits: u8,
}

fn mask(subnet_mask_bits: u8) -> u32 {
    if subnet_mask_bits == 0 { 0 } else { !0u32 << (32 - u32::from(subnet_mask_bits)) }
}

impl Ipv4Network {
    pub fn new(base_addr: Ipv4Addr, subnet_mask_bits: u8) -> Ipv4Network {
        assert!(subnet_mask_bits <= 32);
        let base_addr = Ipv4Addr::from(u32::from(base_addr) & mask(subnet_mask_bits));
        Ipv4Network { base_addr, subnet_mask_bits }
    }

    /// The network containing only `addr`.
    pub fn host(addr: Ipv4Addr) -> Ipv4Network {
        Ipv4Network::new(addr, 32)
    }

    /// The network matching every address.
    pub fn default_route() -> Ipv4Network {
        Ipv4Network::new(Ipv4Addr::UNSPECIFIED, 0)
    }

    pub fn contains(self, addr: Ipv4Addr) -> bool {
        let addr_bits = u32::from(addr) & mask(self.subnet_mask_bits);
        addr_bits == u32::from(self.base_addr)
    }

    pub fn base_addr(self) -> Ipv4Addr {
        self.base_addr
    }

    pub fn subnet_mask_bits(self) -> u8 {
        self.subnet_mask_bits
    }

    pub fn netmask(self) -> Ipv4Addr {
        Ipv4Addr::from(mask(self.subnet_mask_bits))
    }
}

impl fmt::Debug for Ipv4Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Ipv4Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.base_addr, self.subnet_mask_bits)
    }
}

/// Hands out consecutive host addresses from a network, starting at `.1`.
#[derive(Debug, Clone)]
pub struct Ipv4AddrAllocator {
    network: Ipv4Network,
    next_host: u32,
}

impl Ipv4AddrAllocator {
    pub fn new(network: Ipv4Network) -> Ipv4AddrAllocator {
        Ipv4AddrAllocator {
            network,
            next_host: 1,
        }
    }

    /// Start allocating from host number `first_host` instead of `1`.
    pub fn starting_at(mut self, first_host: u32) -> Ipv4AddrAllocator {
        self.next_host = first_host;
        self
    }

    pub fn network(&self) -> Ipv4Network {
        self.network
    }

    /// Returns `None` once the network's host range is exhausted.
    pub fn next_addr(&mut self) -> Option<Ipv4Addr> {
        let host_bits = 32 - u32::from(self.network.subnet_mask_bits());
        let max_host = if host_bits >= 32 { u32::MAX } else { (1u32 << host_bits) - 1 };
        // the all-ones host is the broadcast address
        if self.next_host >= max_host {
            return None;
        }
        let addr = Ipv4Addr::from(u32::from(self.network.base_addr()) | self.next_host);
        self.next_host += 1;
        Some(addr)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn contains_respects_prefix() {
        let network = Ipv4Network::new(ipv4!("7.1.2.3"), 8);
        assert_eq!(network.base_addr(), ipv4!("7.0.0.0"));
        assert!(network.contains(ipv4!("7.0.0.2")));
        assert!(!network.contains(ipv4!("1.0.0.2")));
        assert!(Ipv4Network::default_route().contains(ipv4!("1.0.0.2")));
        assert_eq!(network.netmask(), ipv4!("255.0.0.0"));
        assert_eq!(network.to_string(), "7.0.0.0/8");
    }

    #[test]
    fn allocator_skips_network_and_broadcast() {
        let mut alloc = Ipv4AddrAllocator::new(Ipv4Network::new(ipv4!("10.1.1.0"), 30));
        assert_eq!(alloc.next_addr(), Some(ipv4!("10.1.1.1")));
        assert_eq!(alloc.next_addr(), Some(ipv4!("10.1.1.2")));
        assert_eq!(alloc.next_addr(), None);
    }
}
