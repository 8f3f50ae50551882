//! A wireless LAN bridged to a wired one.
//!
//! ```text
//!   Wifi 10.1.3.0
//!                  AP
//!  *    *    *    *
//!  |    |    |    |    10.1.1.0
//! n5   n6   n7   n0 -------------- n1   n2   n3   n4
//!                    point-to-point  |    |    |    |
//!                                    ================
//!                                      LAN 10.1.2.0
//! ```
//!
//! The last station sends one datagram to an echo server on the last LAN node and waits for it
//! to come back.

use crate::priv_prelude::*;
use crate::anim::AnimationInterface;
use crate::app::{UdpEchoClient, UdpEchoServer};
use crate::config::WifiConfig;
use crate::error::{ConfigError, ScenarioError};
use crate::mobility::{GridLayout, GridPositionAllocator, PositionAllocator, Rectangle};
use crate::sim::{AppId, ChannelKind, DataRate, DeviceId, NodeId, Route, RunStats, Simulator};

pub const ECHO_PORT: u16 = 9;
pub const ECHO_PACKET_SIZE: usize = 1024;

pub const ANIMATION_FILE: &str = "wireless-animation.xml";
pub const PCAP_PREFIX: &str = "third";

const P2P_NETWORK: Ipv4Addr = Ipv4Addr::new(10, 1, 1, 0);
const CSMA_NETWORK: Ipv4Addr = Ipv4Addr::new(10, 1, 2, 0);
const WIFI_NETWORK: Ipv4Addr = Ipv4Addr::new(10, 1, 3, 0);

/// Where stations are placed. Stations must stay inside the bounding box.
pub fn station_grid() -> GridPositionAllocator {
    GridPositionAllocator::new(0.0, 0.0, 5.0, 10.0, 3, GridLayout::RowFirst)
    .bounded(Rectangle::new(-50.0, 50.0, -50.0, 50.0))
}

/// How many stations fit in the bounding box.
pub fn station_capacity() -> u32 {
    station_grid().capacity().unwrap_or(u32::MAX)
}

#[derive(Debug)]
pub struct WifiOutcome {
    pub sim: Simulator,
    pub run: RunStats,
    pub echo_server: AppId,
    pub echo_client: AppId,
    pub files: Vec<PathBuf>,
}

impl WifiOutcome {
    pub fn echo_client(&self) -> Option<&UdpEchoClient> {
        self.sim.app(self.echo_client)
    }

    pub fn echo_server(&self) -> Option<&UdpEchoServer> {
        self.sim.app(self.echo_server)
    }
}

pub fn run(config: &WifiConfig) -> Result<WifiOutcome, ScenarioError> {
    config.validate()?;
    fs::create_dir_all(&config.output_dir)?;
    let mut sim = Simulator::new();
    let mut files = Vec::new();

    let p2p_nodes = [sim.add_node("p2p-0"), sim.add_node("p2p-1")];
    let mut csma_nodes = vec![p2p_nodes[1]];
    for i in 0..config.n_csma {
        csma_nodes.push(sim.add_node(format!("csma-{}", i + 1)));
    }
    let stations: Vec<NodeId> = (0..config.n_wifi).map(|i| sim.add_node(format!("sta-{}", i))).collect();
    let ap = p2p_nodes[0];

    let (p2p_0, p2p_1) = sim.connect(
        p2p_nodes[0],
        p2p_nodes[1],
        ChannelKind::PointToPoint,
        "5Mbps".parse::<DataRate>()?,
        Duration::from_millis(2),
    )?;

    let csma = sim.add_channel(ChannelKind::Csma, "100Mbps".parse::<DataRate>()?, Duration::from_nanos(6560));
    let mut csma_devices = Vec::with_capacity(csma_nodes.len());
    for &node in &csma_nodes {
        csma_devices.push(sim.add_device(node, csma)?);
    }

    let wifi = sim.add_channel(ChannelKind::Wifi, DataRate::mbps(54), Duration::ZERO);
    let mut station_devices = Vec::with_capacity(stations.len());
    for &station in &stations {
        station_devices.push(sim.add_device(station, wifi)?);
    }
    let ap_device = sim.add_device(ap, wifi)?;

    let mut grid = station_grid();
    for &station in &stations {
        let position = grid.next_position().ok_or(ConfigError::TooManyNodes {
            what: "wifi nodes",
            requested: config.n_wifi,
            capacity: station_capacity(),
        })?;
        sim.set_position(station, position)?;
    }
    // everything else stays still at the next grid points, bounds or not
    grid.bounds = None;
    let rest = std::iter::once(ap).chain(csma_nodes.iter().cloned()).chain(p2p_nodes.iter().cloned());
    for node in rest {
        if let Some(position) = grid.next_position() {
            sim.set_position(node, position)?;
        }
    }

    let p2p_addrs = assign(&mut sim, P2P_NETWORK, &[p2p_0, p2p_1])?;
    let csma_addrs = assign(&mut sim, CSMA_NETWORK, &csma_devices)?;
    let mut wifi_devices = station_devices.clone();
    wifi_devices.push(ap_device);
    let wifi_addrs = assign(&mut sim, WIFI_NETWORK, &wifi_devices)?;
    let ap_addr = wifi_addrs[wifi_addrs.len() - 1];

    for (&station, &device) in stations.iter().zip(station_devices.iter()) {
        sim.add_route(station, Route::via(Ipv4Network::default_route(), device, ap_addr))?;
    }
    sim.add_route(ap, Route::via(Ipv4Network::new(CSMA_NETWORK, 24), p2p_0, p2p_addrs[1]))?;
    sim.add_route(p2p_nodes[1], Route::via(Ipv4Network::new(WIFI_NETWORK, 24), p2p_1, p2p_addrs[0]))?;
    for (&node, &device) in csma_nodes.iter().zip(csma_devices.iter()).skip(1) {
        sim.add_route(node, Route::via(Ipv4Network::default_route(), device, csma_addrs[0]))?;
    }

    let server_node = csma_nodes[csma_nodes.len() - 1];
    let server_addr = csma_addrs[csma_addrs.len() - 1];
    let echo_server = sim.install_app(
        server_node,
        UdpEchoServer::new(ECHO_PORT),
        Duration::from_secs(1),
        Some(Duration::from_secs(10)),
    )?;
    let client_node = stations[stations.len() - 1];
    let echo_client = sim.install_app(
        client_node,
        UdpEchoClient::new(
            SocketAddrV4::new(server_addr, ECHO_PORT),
            ECHO_PACKET_SIZE,
            Duration::from_secs(1),
            1,
        ),
        Duration::from_secs(2),
        Some(Duration::from_secs(10)),
    )?;

    for device in [p2p_0, p2p_1, ap_device, csma_devices[0]] {
        files.push(super::enable_pcap(&mut sim, &config.output_dir, PCAP_PREFIX, device)?);
    }

    let run = sim.run_until(config.sim_time)?;

    let anim_path = config.output_dir.join(ANIMATION_FILE);
    AnimationInterface::new().write_file(&anim_path, &sim)?;
    files.push(anim_path);

    Ok(WifiOutcome {
        sim,
        run,
        echo_server,
        echo_client,
        files,
    })
}

/// Number `devices` consecutively from `.1` in the /24 at `network`.
fn assign(sim: &mut Simulator, network: Ipv4Addr, devices: &[DeviceId]) -> Result<Vec<Ipv4Addr>, ScenarioError> {
    let network = Ipv4Network::new(network, 24);
    let mut alloc = Ipv4AddrAllocator::new(network);
    let mut addrs = Vec::with_capacity(devices.len());
    for &device in devices {
        let addr = alloc.next_addr().ok_or_else(|| ConfigError::Invalid {
            name: "address plan",
            reason: format!("network {} is exhausted", network),
        })?;
        sim.assign_address(device, addr, 24)?;
        addrs.push(addr);
    }
    Ok(addrs)
}
