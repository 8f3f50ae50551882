//! The discrete-event simulation core.
//!
//! A `Simulator` owns every node, device, channel and application of a run along with the event
//! queue that drives them. Events are closures over the simulator. Packets travel as follows:
//!
//!  * an application sends, the node routes the packet and hands it to a device
//!  * the device serializes it onto its channel and the peer device receives it one transmission
//!    time plus propagation delay later
//!  * if the receiving device carries an interceptor, the interceptor decides whether the node
//!    sees the packet now or later
//!  * the node either forwards the packet or delivers it to the application bound to its
//!    destination port

mod device;
mod node;

pub use self::device::{Channel, ChannelKind, DataRate, Device, DeviceCounters};
pub use self::node::{Node, Route, EPHEMERAL_PORT_START};

use crate::priv_prelude::*;
use crate::app::{AppContext, AppObject, Application, SinkRxObserver};
use crate::error::SimError;
use crate::flow::FlowMonitor;
use crate::intercept::{Decision, DelayedPacket, InterceptContext, PacketInterceptor};
use crate::mobility::Position;
use crate::packet::{Packet, PacketUid, ETHERTYPE_IPV4};
use crate::pcap::PcapWriter;
use crate::sched::{EventId, Scheduler};
use crate::wire::{protocol_numbers, Ipv4Fields, Ipv4Packet, UdpPorts};
use std::any::Any;

/// TTL given to locally originated packets.
pub const DEFAULT_TTL: u8 = 64;

macro_rules! id_type {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Index of a node. Nodes are numbered from zero in creation order.
    NodeId
);
id_type!(
    /// Index of a device, counted across all nodes.
    DeviceId
);
id_type!(ChannelId);
id_type!(AppId);
id_type!(
    /// Identifies an interceptor registered with `Simulator::add_interceptor`. One interceptor
    /// can serve many devices.
    InterceptorId
);

/// Something to do at a point in virtual time.
pub type Event = Box<dyn FnOnce(&mut Simulator) -> Result<(), SimError>>;

trait InterceptorObject: PacketInterceptor {
    fn as_any(&self) -> &dyn Any;
}

impl<T: PacketInterceptor + 'static> InterceptorObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct AppSlot {
    node: NodeId,
    // `None` while the application is running one of its callbacks
    app: Option<Box<dyn AppObject>>,
    running: bool,
}

/// What a call to `Simulator::run_until` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub executed: u64,
    pub pending: usize,
    pub stopped_at: Duration,
}

pub struct Simulator {
    scheduler: Scheduler<Event>,
    nodes: Vec<Node>,
    devices: Vec<Device>,
    channels: Vec<Channel>,
    apps: Vec<AppSlot>,
    interceptors: Vec<Box<dyn InterceptorObject>>,
    flow_monitor: Option<FlowMonitor>,
    sink_rx_observers: Vec<Box<dyn SinkRxObserver>>,
    next_packet_uid: u64,
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f
        .debug_struct("Simulator")
        .field("now", &self.now())
        .field("nodes", &self.nodes.len())
        .field("devices", &self.devices.len())
        .field("channels", &self.channels.len())
        .field("apps", &self.apps.len())
        .field("pending", &self.scheduler.len())
        .finish()
    }
}

impl Default for Simulator {
    fn default() -> Simulator {
        Simulator::new()
    }
}

impl Simulator {
    pub fn new() -> Simulator {
        Simulator {
            scheduler: Scheduler::new(),
            nodes: Vec::new(),
            devices: Vec::new(),
            channels: Vec::new(),
            apps: Vec::new(),
            interceptors: Vec::new(),
            flow_monitor: None,
            sink_rx_observers: Vec::new(),
            next_packet_uid: 0,
        }
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn schedule_at<F>(&mut self, at: Duration, f: F) -> Result<EventId, SimError>
    where
        F: FnOnce(&mut Simulator) -> Result<(), SimError> + 'static,
    {
        let event: Event = Box::new(f);
        Ok(self.scheduler.schedule_at(at, event)?)
    }

    pub fn schedule_in<F>(&mut self, delay: Duration, f: F) -> Result<EventId, SimError>
    where
        F: FnOnce(&mut Simulator) -> Result<(), SimError> + 'static,
    {
        let event: Event = Box::new(f);
        Ok(self.scheduler.schedule_in(delay, event)?)
    }

    /// Run every event firing no later than `stop`, then stop the simulation. Events left
    /// queued never fire and nothing further can be scheduled.
    pub fn run_until(&mut self, stop: Duration) -> Result<RunStats, SimError> {
        let executed_before = self.scheduler.executed();
        while let Some((_at, event)) = self.scheduler.pop_until(stop) {
            event(self)?;
        }
        self.scheduler.stop_at(stop);
        for device in &mut self.devices {
            if let Some(pcap) = &mut device.pcap {
                pcap.flush()?;
            }
        }
        let stats = RunStats {
            executed: self.scheduler.executed() - executed_before,
            pending: self.scheduler.len(),
            stopped_at: self.now(),
        };
        debug!(
            "simulation stopped at {:?} after {} events, {} left pending",
            stats.stopped_at, stats.executed, stats.pending,
        );
        Ok(stats)
    }

    pub fn is_stopped(&self) -> bool {
        self.scheduler.is_stopped()
    }

    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, name.into()));
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, SimError> {
        self.nodes.get(id.0 as usize).ok_or(SimError::NoSuchNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SimError> {
        self.nodes.get_mut(id.0 as usize).ok_or(SimError::NoSuchNode(id))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn set_position(&mut self, node: NodeId, position: Position) -> Result<(), SimError> {
        self.node_mut(node)?.position = position;
        Ok(())
    }

    pub fn add_channel(&mut self, kind: ChannelKind, data_rate: DataRate, delay: Duration) -> ChannelId {
        let id = ChannelId(self.channels.len() as u32);
        self.channels.push(Channel {
            id,
            kind,
            data_rate,
            delay,
            devices: Vec::new(),
        });
        id
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(id.0 as usize)
    }

    /// Create a device on `node` attached to `channel`.
    pub fn add_device(&mut self, node: NodeId, channel: ChannelId) -> Result<DeviceId, SimError> {
        let id = DeviceId(self.devices.len() as u32);
        let chan = self.channels.get_mut(channel.0 as usize).ok_or(SimError::Attach {
            device: id,
            reason: "no such channel",
        })?;
        if chan.devices.len() >= chan.max_devices() {
            return Err(SimError::Attach {
                device: id,
                reason: "channel is full",
            });
        }
        chan.devices.push(id);
        self.node_mut(node)?.devices.push(id);
        self.devices.push(Device {
            id,
            node,
            mac: MacAddr::allocated(u64::from(id.0) + 1),
            addr: None,
            channel: Some(channel),
            interceptor: None,
            pcap: None,
            busy_until: Duration::ZERO,
            counters: DeviceCounters::default(),
        });
        Ok(id)
    }

    /// Create a two-ended channel between `a` and `b`, returning the device on each side.
    pub fn connect(
        &mut self,
        a: NodeId,
        b: NodeId,
        kind: ChannelKind,
        data_rate: DataRate,
        delay: Duration,
    ) -> Result<(DeviceId, DeviceId), SimError> {
        let channel = self.add_channel(kind, data_rate, delay);
        let dev_a = self.add_device(a, channel)?;
        let dev_b = self.add_device(b, channel)?;
        Ok((dev_a, dev_b))
    }

    pub fn device(&self, id: DeviceId) -> Result<&Device, SimError> {
        self.devices.get(id.0 as usize).ok_or(SimError::NoSuchDevice(id))
    }

    fn device_mut(&mut self, id: DeviceId) -> Result<&mut Device, SimError> {
        self.devices.get_mut(id.0 as usize).ok_or(SimError::NoSuchDevice(id))
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Give `device` an address and add an on-link route for its subnet to the owning node.
    pub fn assign_address(
        &mut self,
        device: DeviceId,
        addr: Ipv4Addr,
        subnet_mask_bits: u8,
    ) -> Result<(), SimError> {
        let dev = self.device_mut(device)?;
        dev.addr = Some((addr, subnet_mask_bits));
        let node = dev.node;
        let node = self.node_mut(node)?;
        node.addrs.push(addr);
        node.routes.push(Route::on_link(Ipv4Network::new(addr, subnet_mask_bits), device));
        Ok(())
    }

    pub fn add_route(&mut self, node: NodeId, route: Route) -> Result<(), SimError> {
        self.device(route.device)?;
        self.node_mut(node)?.routes.push(route);
        Ok(())
    }

    /// The first address assigned to any of the node's devices.
    pub fn node_addr(&self, node: NodeId) -> Result<Option<Ipv4Addr>, SimError> {
        Ok(self.node(node)?.addrs.first().cloned())
    }

    /// Capture every packet sent or received by `device` to a pcap file at `path`.
    pub fn enable_pcap(&mut self, device: DeviceId, path: &Path) -> Result<(), SimError> {
        let pcap = PcapWriter::create(path)?;
        debug!("capturing device {} to {}", device, path.display());
        self.device_mut(device)?.pcap = Some(pcap);
        Ok(())
    }

    pub fn add_interceptor<I>(&mut self, interceptor: I) -> InterceptorId
    where
        I: PacketInterceptor + 'static,
    {
        let id = InterceptorId(self.interceptors.len() as u32);
        self.interceptors.push(Box::new(interceptor));
        id
    }

    /// Route every packet received by `device` through the interceptor `id`.
    pub fn set_interceptor(&mut self, device: DeviceId, id: InterceptorId) -> Result<(), SimError> {
        if id.0 as usize >= self.interceptors.len() {
            return Err(SimError::Attach {
                device,
                reason: "no such interceptor",
            });
        }
        self.device_mut(device)?.interceptor = Some(id);
        Ok(())
    }

    pub fn interceptor<I>(&self, id: InterceptorId) -> Option<&I>
    where
        I: PacketInterceptor + 'static,
    {
        self.interceptors.get(id.0 as usize)?.as_any().downcast_ref()
    }

    pub fn install_flow_monitor(&mut self, monitor: FlowMonitor) {
        self.flow_monitor = Some(monitor);
    }

    pub fn flow_monitor(&self) -> Option<&FlowMonitor> {
        self.flow_monitor.as_ref()
    }

    pub fn flow_monitor_mut(&mut self) -> Option<&mut FlowMonitor> {
        self.flow_monitor.as_mut()
    }

    /// Subscribe to receptions at every `PacketSink` in the simulation.
    pub fn add_sink_rx_observer<O>(&mut self, observer: O)
    where
        O: SinkRxObserver + 'static,
    {
        self.sink_rx_observers.push(Box::new(observer));
    }

    /// Install `app` on `node`, to be started at `start` and, optionally, stopped at `stop`.
    pub fn install_app<A>(
        &mut self,
        node: NodeId,
        app: A,
        start: Duration,
        stop: Option<Duration>,
    ) -> Result<AppId, SimError>
    where
        A: Application + 'static,
    {
        let id = AppId(self.apps.len() as u32);
        self.node_mut(node)?.apps.push(id);
        self.apps.push(AppSlot {
            node,
            app: Some(Box::new(app)),
            running: false,
        });
        self.schedule_at(start, move |sim| sim.start_app(id))?;
        if let Some(stop) = stop {
            self.schedule_at(stop, move |sim| sim.stop_app(id))?;
        }
        Ok(id)
    }

    pub fn app<A>(&self, id: AppId) -> Option<&A>
    where
        A: Application + 'static,
    {
        self.apps.get(id.0 as usize)?.app.as_ref()?.as_any().downcast_ref()
    }

    fn start_app(&mut self, id: AppId) -> Result<(), SimError> {
        let slot = self.apps.get_mut(id.0 as usize).ok_or(SimError::NoSuchApp(id))?;
        if slot.running {
            return Ok(());
        }
        slot.running = true;
        self.with_app(id, |app, ctx| app.start(ctx))
    }

    fn stop_app(&mut self, id: AppId) -> Result<(), SimError> {
        let slot = self.apps.get_mut(id.0 as usize).ok_or(SimError::NoSuchApp(id))?;
        if !slot.running {
            return Ok(());
        }
        slot.running = false;
        let node = slot.node;
        self.with_app(id, |app, ctx| app.stop(ctx))?;
        self.node_mut(node)?.ports.retain(|_, owner| *owner != id);
        Ok(())
    }

    fn with_app<F>(&mut self, id: AppId, f: F) -> Result<(), SimError>
    where
        F: FnOnce(&mut dyn AppObject, &mut AppContext<'_>) -> Result<(), SimError>,
    {
        let slot = self.apps.get_mut(id.0 as usize).ok_or(SimError::NoSuchApp(id))?;
        let node = slot.node;
        let mut app = match slot.app.take() {
            Some(app) => app,
            None => {
                warn!("application {} re-entered, ignoring", id);
                return Ok(());
            },
        };
        let res = {
            let mut ctx = AppContext::new(self, id, node);
            f(&mut *app, &mut ctx)
        };
        if let Some(slot) = self.apps.get_mut(id.0 as usize) {
            slot.app = Some(app);
        }
        res
    }

    pub(crate) fn schedule_app_timer(
        &mut self,
        id: AppId,
        delay: Duration,
        token: u64,
    ) -> Result<(), SimError> {
        self.schedule_in(delay, move |sim| {
            let running = sim.apps.get(id.0 as usize).map(|slot| slot.running).unwrap_or(false);
            if !running {
                return Ok(());
            }
            sim.with_app(id, |app, ctx| app.handle_timer(ctx, token))
        })?;
        Ok(())
    }

    pub(crate) fn bind_port(&mut self, node: NodeId, port: u16, app: AppId) -> Result<(), SimError> {
        let node_ref = self.node_mut(node)?;
        if node_ref.ports.contains_key(&port) {
            return Err(SimError::PortInUse { node, port });
        }
        node_ref.ports.insert(port, app);
        Ok(())
    }

    pub(crate) fn bind_ephemeral_port(&mut self, node: NodeId, app: AppId) -> Result<u16, SimError> {
        let node_ref = self.node_mut(node)?;
        let port = node_ref.allocate_ephemeral_port().ok_or(SimError::PortsExhausted(node))?;
        node_ref.ports.insert(port, app);
        Ok(port)
    }

    pub(crate) fn notify_sink_rx(&mut self, payload: &Bytes, from: SocketAddrV4) {
        let now = self.now();
        for observer in &mut self.sink_rx_observers {
            observer.on_sink_rx(now, payload, from);
        }
    }

    /// Send a UDP datagram from `node`. The source address is the address of the device the
    /// packet leaves through. Unroutable packets are dropped.
    pub(crate) fn send_udp(
        &mut self,
        node: NodeId,
        source_port: u16,
        dest: SocketAddrV4,
        payload: Bytes,
    ) -> Result<(), SimError> {
        let dest_ip = *dest.ip();
        let node_ref = self.node(node)?;
        let source_ip = if node_ref.owns_addr(dest_ip) {
            dest_ip
        } else {
            let route = match node_ref.lookup_route(dest_ip) {
                Some(route) => route,
                None => {
                    warn!("node {} has no route to {}, dropping packet", node, dest_ip);
                    return Ok(());
                },
            };
            match self.device(route.device)?.ipv4_addr() {
                Some(addr) => addr,
                None => match node_ref.addrs.first() {
                    Some(addr) => *addr,
                    None => Ipv4Addr::UNSPECIFIED,
                },
            }
        };
        let ip = Ipv4Packet::udp_datagram(
            Ipv4Fields {
                source_ip,
                dest_ip,
                ttl: DEFAULT_TTL,
            },
            UdpPorts {
                source: source_port,
                dest: dest.port(),
            },
            &payload,
        );
        let uid = PacketUid(self.next_packet_uid);
        self.next_packet_uid += 1;
        let packet = Packet::new(uid, ip);
        let now = self.now();
        if let Some(monitor) = &mut self.flow_monitor {
            monitor.on_send(now, node, &packet);
        }
        self.ip_output(node, packet)
    }

    fn ip_output(&mut self, node: NodeId, packet: Packet) -> Result<(), SimError> {
        let dest = packet.ip().dest_ip();
        let node_ref = self.node(node)?;
        if node_ref.owns_addr(dest) {
            return self.local_deliver(node, packet);
        }
        let route = match node_ref.lookup_route(dest) {
            Some(route) => route,
            None => {
                warn!("node {} has no route to {}, dropping packet {}", node, dest, packet.uid());
                self.report_drop(node, &packet);
                return Ok(());
            },
        };
        let next_hop = route.gateway.unwrap_or(dest);
        self.device_transmit(route.device, next_hop, packet)
    }

    fn device_transmit(
        &mut self,
        device: DeviceId,
        next_hop: Ipv4Addr,
        packet: Packet,
    ) -> Result<(), SimError> {
        let now = self.now();
        let dev = self.device(device)?;
        let node = dev.node;
        let source_mac = dev.mac;
        let channel = match dev.channel.and_then(|id| self.channels.get(id.0 as usize)) {
            Some(channel) => channel,
            None => {
                warn!("device {} is not connected, dropping packet {}", device, packet.uid());
                self.device_mut(device)?.counters.dropped += 1;
                return Ok(());
            },
        };
        let peers: Vec<DeviceId> = channel.devices.iter().cloned().filter(|d| *d != device).collect();
        let target = if peers.len() == 1 {
            Some(peers[0])
        } else {
            peers.into_iter().find(|peer| {
                self.devices
                .get(peer.0 as usize)
                .and_then(|d| d.ipv4_addr())
                .map(|addr| addr == next_hop)
                .unwrap_or(false)
            })
        };
        let (data_rate, delay) = (channel.data_rate, channel.delay);
        let target = match target {
            Some(target) => target,
            None => {
                warn!(
                    "no device for next hop {} on device {}'s channel, dropping packet {}",
                    next_hop, device, packet.uid(),
                );
                self.device_mut(device)?.counters.dropped += 1;
                self.report_drop(node, &packet);
                return Ok(());
            },
        };

        let dev = self.device_mut(device)?;
        let start = cmp::max(now, dev.busy_until);
        dev.busy_until = start.saturating_add(data_rate.tx_time(packet.len()));
        let arrival = dev.busy_until.saturating_add(delay);
        dev.counters.tx_packets += 1;
        dev.counters.tx_bytes += packet.len() as u64;
        if let Some(pcap) = &mut dev.pcap {
            pcap.write_packet(now, packet.ip().as_bytes())?;
        }
        trace!("device {} sends packet {} to device {}, arriving at {:?}", device, packet.uid(), target, arrival);
        self.schedule_at(arrival, move |sim| {
            sim.device_receive(target, packet, ETHERTYPE_IPV4, source_mac)
        })?;
        Ok(())
    }

    fn device_receive(
        &mut self,
        device: DeviceId,
        packet: Packet,
        protocol: u16,
        source: MacAddr,
    ) -> Result<(), SimError> {
        let now = self.now();
        let dev = self.device_mut(device)?;
        let node = dev.node;
        dev.counters.rx_packets += 1;
        dev.counters.rx_bytes += packet.len() as u64;
        if let Some(pcap) = &mut dev.pcap {
            pcap.write_packet(now, packet.ip().as_bytes())?;
        }
        let interceptor = dev.interceptor;

        let delayed = DelayedPacket {
            packet,
            device,
            protocol,
            source,
        };
        let interceptor = match interceptor {
            Some(id) => id,
            None => return self.node_receive(delayed),
        };
        let decision = match self.interceptors.get_mut(interceptor.0 as usize) {
            Some(interceptor) => {
                let ctx = InterceptContext {
                    now,
                    node,
                    device,
                    packet: &delayed.packet,
                    protocol,
                    source,
                };
                interceptor.intercept(&ctx)
            },
            None => Decision::Deliver,
        };
        match decision {
            Decision::Deliver => self.node_receive(delayed),
            Decision::Defer(until) => {
                self.schedule_at(until, move |sim| sim.node_receive(delayed))?;
                Ok(())
            },
        }
    }

    /// The node's normal receive path for a packet that arrived on one of its devices.
    fn node_receive(&mut self, delayed: DelayedPacket) -> Result<(), SimError> {
        let DelayedPacket { packet, device, protocol, .. } = delayed;
        let node = self.device(device)?.node;
        if protocol != ETHERTYPE_IPV4 {
            debug!("node {} ignoring packet with ethertype {:#06x}", node, protocol);
            return Ok(());
        }
        if self.node(node)?.owns_addr(packet.ip().dest_ip()) {
            return self.local_deliver(node, packet);
        }

        let forwarded = match packet.forwarded() {
            Some(forwarded) => forwarded,
            None => {
                warn!("TTL expired at node {}, dropping packet {}", node, packet.uid());
                self.report_drop(node, &packet);
                return Ok(());
            },
        };
        let now = self.now();
        if let Some(monitor) = &mut self.flow_monitor {
            monitor.on_forward(now, node, &forwarded);
        }
        self.ip_output(node, forwarded)
    }

    fn local_deliver(&mut self, node: NodeId, packet: Packet) -> Result<(), SimError> {
        let now = self.now();
        if let Some(monitor) = &mut self.flow_monitor {
            monitor.on_local_deliver(now, node, &packet);
        }
        if packet.ip().protocol() != protocol_numbers::UDP {
            debug!("node {} has no handler for protocol {}", node, packet.ip().protocol());
            return Ok(());
        }
        let udp = match packet.udp() {
            Some(udp) => udp,
            None => return Ok(()),
        };
        let app = match self.node(node)?.ports.get(&udp.dest_port()) {
            Some(app) => *app,
            None => {
                debug!("node {} has nothing bound to port {}, dropping packet {}", node, udp.dest_port(), packet.uid());
                return Ok(());
            },
        };
        let from = SocketAddrV4::new(packet.ip().source_ip(), udp.source_port());
        let local_port = udp.dest_port();
        let payload = udp.payload();
        self.with_app(app, |app, ctx| app.receive(ctx, from, local_port, payload))
    }

    fn report_drop(&mut self, node: NodeId, packet: &Packet) {
        if let Some(monitor) = &mut self.flow_monitor {
            monitor.on_drop(node, packet);
        }
    }
}
