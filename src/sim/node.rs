use crate::priv_prelude::*;
use crate::mobility::Position;
use super::{AppId, DeviceId, NodeId};

/// First port handed out by `bind_ephemeral`.
pub const EPHEMERAL_PORT_START: u16 = 49153;

/// A static route. Routes without a gateway are on-link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub destination: Ipv4Network,
    pub device: DeviceId,
    pub gateway: Option<Ipv4Addr>,
}

impl Route {
    pub fn on_link(destination: Ipv4Network, device: DeviceId) -> Route {
        Route {
            destination,
            device,
            gateway: None,
        }
    }

    pub fn via(destination: Ipv4Network, device: DeviceId, gateway: Ipv4Addr) -> Route {
        Route {
            destination,
            device,
            gateway: Some(gateway),
        }
    }
}

/// A host or router in the simulation.
#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) devices: Vec<DeviceId>,
    pub(crate) addrs: Vec<Ipv4Addr>,
    pub(crate) routes: Vec<Route>,
    pub(crate) ports: HashMap<u16, AppId>,
    pub(crate) next_ephemeral: u16,
    pub(crate) apps: Vec<AppId>,
    pub(crate) position: Position,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: String) -> Node {
        Node {
            id,
            name,
            devices: Vec::new(),
            addrs: Vec::new(),
            routes: Vec::new(),
            ports: HashMap::new(),
            next_ephemeral: EPHEMERAL_PORT_START,
            apps: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    /// Position of `device` among this node's devices. This is the index used in capture
    /// file names.
    pub fn device_index(&self, device: DeviceId) -> Option<usize> {
        self.devices.iter().position(|d| *d == device)
    }

    pub fn addrs(&self) -> &[Ipv4Addr] {
        &self.addrs
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn apps(&self) -> &[AppId] {
        &self.apps
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn owns_addr(&self, addr: Ipv4Addr) -> bool {
        addr.is_broadcast() || self.addrs.contains(&addr)
    }

    /// Longest-prefix match. Among equally specific routes the first one added wins.
    pub fn lookup_route(&self, dest: Ipv4Addr) -> Option<Route> {
        let mut best: Option<Route> = None;
        for route in &self.routes {
            if !route.destination.contains(dest) {
                continue;
            }
            let better = match best {
                Some(best) => {
                    route.destination.subnet_mask_bits() > best.destination.subnet_mask_bits()
                },
                None => true,
            };
            if better {
                best = Some(*route);
            }
        }
        best
    }

    pub(crate) fn allocate_ephemeral_port(&mut self) -> Option<u16> {
        for _ in EPHEMERAL_PORT_START..=u16::MAX {
            let port = self.next_ephemeral;
            self.next_ephemeral = match port {
                u16::MAX => EPHEMERAL_PORT_START,
                port => port + 1,
            };
            if !self.ports.contains_key(&port) {
                return Some(port);
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        let mut node = Node::new(NodeId(0), String::from("router"));
        node.routes.push(Route::via(Ipv4Network::default_route(), DeviceId(0), ipv4!("10.0.0.1")));
        node.routes.push(Route::on_link(Ipv4Network::new(ipv4!("7.0.0.0"), 8), DeviceId(1)));
        node.routes.push(Route::on_link(Ipv4Network::host(ipv4!("7.0.0.3")), DeviceId(2)));

        assert_eq!(node.lookup_route(ipv4!("7.0.0.3")).map(|r| r.device), Some(DeviceId(2)));
        assert_eq!(node.lookup_route(ipv4!("7.0.0.2")).map(|r| r.device), Some(DeviceId(1)));
        let route = node.lookup_route(ipv4!("1.0.0.2")).unwrap();
        assert_eq!(route.device, DeviceId(0));
        assert_eq!(route.gateway, Some(ipv4!("10.0.0.1")));
    }

    #[test]
    fn no_route() {
        let node = Node::new(NodeId(0), String::from("host"));
        assert_eq!(node.lookup_route(ipv4!("1.2.3.4")), None);
    }

    #[test]
    fn ephemeral_ports_skip_bound_ones() {
        let mut node = Node::new(NodeId(0), String::from("host"));
        node.ports.insert(EPHEMERAL_PORT_START, AppId(0));
        assert_eq!(node.allocate_ephemeral_port(), Some(EPHEMERAL_PORT_START + 1));
        assert_eq!(node.allocate_ephemeral_port(), Some(EPHEMERAL_PORT_START + 2));
    }
}
