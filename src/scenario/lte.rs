//! A cellular network with random delays.
//!
//! ```text
//!     UE ------ eNB      eNB ------ UE
//!  7.0.0.2        \      /       7.0.0.3
//!                  \    /
//!                   PGW
//!                    |
//!                RemoteHost 1.0.0.2
//! ```
//!
//! Each UE sends to the remote host, the remote host sends to each UE, and each UE sends to its
//! neighbour. Packets arriving at a cell from its UE, or at the gateway from the internet, are
//! held back for a normally distributed random time. Every reception at a sink prints its
//! one-way delay, and flow statistics for the UEs and the remote host are written at the end.

use crate::priv_prelude::*;
use crate::anim::AnimationInterface;
use crate::app::{PacketSink, UdpClient};
use crate::config::LteConfig;
use crate::console::Console;
use crate::delay::RandomDelayGenerator;
use crate::error::{ConfigError, ScenarioError};
use crate::flow::{self, FlowMonitor, SerializeOptions};
use crate::intercept::DeferredDeliverySink;
use crate::mobility::{ListPositionAllocator, Position, PositionAllocator};
use crate::probe::EndToEndDelayProbe;
use crate::sim::{ChannelKind, DataRate, InterceptorId, NodeId, Route, RunStats, Simulator};

/// How many cells the node layout has room for.
pub const MAX_CELLS: u32 = 2;

pub const DL_PORT: u16 = 1234;
pub const UL_PORT_BASE: u16 = 2000;
pub const OTHER_PORT_BASE: u16 = 3000;

pub const FLOW_MONITOR_FILE: &str = "flow-monitor-file.xml";
pub const ANIMATION_FILE: &str = "test-animation.xml";
pub const PCAP_PREFIX: &str = "lena-epc-first";

const UE_NETWORK: Ipv4Addr = Ipv4Addr::new(7, 0, 0, 0);
const UE_GATEWAY: Ipv4Addr = Ipv4Addr::new(7, 0, 0, 1);
const INTERNET_NETWORK: Ipv4Addr = Ipv4Addr::new(1, 0, 0, 0);

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct LteOutcome {
    pub sim: Simulator,
    pub run: RunStats,
    pub delay_sink: InterceptorId,
    pub ue_addrs: Vec<Ipv4Addr>,
    pub remote_host_addr: Ipv4Addr,
    pub files: Vec<PathBuf>,
}

impl LteOutcome {
    pub fn flow_monitor(&self) -> Option<&FlowMonitor> {
        self.sim.flow_monitor()
    }

    pub fn delay_sink(&self) -> Option<&DeferredDeliverySink> {
        self.sim.interceptor(self.delay_sink)
    }
}

pub fn run(config: &LteConfig, console: Console) -> Result<LteOutcome, ScenarioError> {
    config.validate()?;
    fs::create_dir_all(&config.output_dir)?;
    let n = usize::from(config.nodes);
    let distance = config.distance;
    let mut sim = Simulator::new();
    let mut files = Vec::new();

    let generator = RandomDelayGenerator::normal(config.delay_mean_ms, config.delay_variance, config.seed)?;
    let delay_sink = sim.add_interceptor(DeferredDeliverySink::new(generator));

    let pgw = sim.add_node("pgw");
    let remote_host = sim.add_node("remote-host");
    let enbs: Vec<NodeId> = (0..n).map(|i| sim.add_node(format!("enb-{}", i))).collect();
    let ues: Vec<NodeId> = (0..n).map(|i| sim.add_node(format!("ue-{}", i))).collect();

    let (pgw_wan, remote_host_dev) = sim.connect(
        pgw,
        remote_host,
        ChannelKind::PointToPoint,
        "100Gb/s".parse::<DataRate>()?,
        Duration::from_millis(10),
    )?;
    let mut internet_addrs = Ipv4AddrAllocator::new(Ipv4Network::new(INTERNET_NETWORK, 8));
    let pgw_wan_addr = next_addr(&mut internet_addrs)?;
    let remote_host_addr = next_addr(&mut internet_addrs)?;
    sim.assign_address(pgw_wan, pgw_wan_addr, 8)?;
    sim.assign_address(remote_host_dev, remote_host_addr, 8)?;
    sim.add_route(remote_host, Route::on_link(Ipv4Network::new(UE_NETWORK, 8), remote_host_dev))?;

    let mut ue_positions = ListPositionAllocator::new();
    ue_positions
    .add(Position::new(0.0, 0.0, 0.0))
    .add(Position::new(4.0 * distance, 0.0, 0.0));
    let mut enb_positions = ListPositionAllocator::new();
    enb_positions
    .add(Position::new(distance, 0.0, 0.0))
    .add(Position::new(3.0 * distance, 0.0, 0.0));
    sim.set_position(remote_host, Position::new(2.0 * distance, distance, 0.0))?;
    sim.set_position(pgw, Position::new(2.0 * distance, distance / 2.0, 0.0))?;
    for (&enb, &ue) in enbs.iter().zip(ues.iter()) {
        let enb_position = enb_positions.next_position().ok_or(too_many_cells(config))?;
        let ue_position = ue_positions.next_position().ok_or(too_many_cells(config))?;
        sim.set_position(enb, enb_position)?;
        sim.set_position(ue, ue_position)?;
    }

    let mut ue_addrs_alloc = Ipv4AddrAllocator::new(Ipv4Network::new(UE_NETWORK, 8)).starting_at(2);
    let mut ue_addrs = Vec::with_capacity(n);
    for (i, (&enb, &ue)) in enbs.iter().zip(ues.iter()).enumerate() {
        let (enb_s1u, pgw_s1u) = sim.connect(
            enb,
            pgw,
            ChannelKind::PointToPoint,
            "10Gb/s".parse::<DataRate>()?,
            Duration::ZERO,
        )?;
        let s1u_network = Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 4 * i as u8), 30);
        let mut s1u_addrs = Ipv4AddrAllocator::new(s1u_network);
        sim.assign_address(enb_s1u, next_addr(&mut s1u_addrs)?, 30)?;
        sim.assign_address(pgw_s1u, next_addr(&mut s1u_addrs)?, 30)?;

        let (ue_radio, enb_radio) = sim.connect(
            ue,
            enb,
            ChannelKind::Radio,
            DataRate::mbps(100),
            Duration::from_millis(1),
        )?;
        let ue_addr = next_addr(&mut ue_addrs_alloc)?;
        sim.assign_address(ue_radio, ue_addr, 8)?;
        sim.add_route(ue, Route::via(Ipv4Network::default_route(), ue_radio, UE_GATEWAY))?;
        sim.add_route(enb, Route::on_link(Ipv4Network::host(ue_addr), enb_radio))?;
        sim.add_route(enb, Route::on_link(Ipv4Network::default_route(), enb_s1u))?;
        sim.add_route(pgw, Route::on_link(Ipv4Network::host(ue_addr), pgw_s1u))?;

        sim.set_interceptor(enb_radio, delay_sink)?;
        ue_addrs.push(ue_addr);
    }
    sim.set_interceptor(pgw_wan, delay_sink)?;

    let interval = config.inter_packet_interval;
    let mut clients = Vec::new();
    for u in 0..n {
        let ul_port = UL_PORT_BASE + 1 + u as u16;
        let other_port = OTHER_PORT_BASE + 1 + u as u16;
        sim.install_app(ues[u], PacketSink::new(DL_PORT), config.app_start, None)?;
        sim.install_app(remote_host, PacketSink::new(ul_port), config.app_start, None)?;
        sim.install_app(ues[u], PacketSink::new(other_port), config.app_start, None)?;

        let client = |addr, port| UdpClient::new(SocketAddrV4::new(addr, port), config.packet_size, interval, config.max_packets);
        clients.push((ues[u], client(remote_host_addr, ul_port)));
        clients.push((remote_host, client(ue_addrs[u], DL_PORT)));
        clients.push((ues[(u + 1) % n], client(ue_addrs[u], other_port)));
    }
    for (node, client) in clients {
        sim.install_app(node, client, config.app_start, None)?;
    }

    files.push(super::enable_pcap(&mut sim, &config.output_dir, PCAP_PREFIX, pgw_wan)?);
    files.push(super::enable_pcap(&mut sim, &config.output_dir, PCAP_PREFIX, remote_host_dev)?);

    let mut monitor = FlowMonitor::new(config.bin_widths);
    for &ue in &ues {
        monitor.monitor_node(ue);
    }
    monitor.monitor_node(remote_host);
    sim.install_flow_monitor(monitor);

    sim.add_sink_rx_observer(EndToEndDelayProbe::new(console.clone()));

    let mut anim = AnimationInterface::new();
    for &ue in &ues {
        anim.update_node_description(ue, "UE");
        anim.update_node_color(ue, 255, 0, 0);
    }
    for &enb in &enbs {
        anim.update_node_description(enb, "ENB");
        anim.update_node_color(enb, 0, 255, 0);
    }
    anim.update_node_description(remote_host, "Remote Host");
    anim.update_node_color(remote_host, 0, 0, 255);
    anim.update_node_description(pgw, "PGW");
    anim.update_node_color(pgw, 255, 0, 255);
    for node in sim.nodes().iter().map(|node| node.id()).collect::<Vec<_>>() {
        anim.update_node_size(node, 5000.0, 5000.0);
    }

    info!(
        "running {} cells for {:?} with delays of mean {}ms, variance {}",
        n, config.sim_time, config.delay_mean_ms, config.delay_variance,
    );
    let run = sim.run_until(config.sim_time)?;

    if let Some(sink) = sim.interceptor::<DeferredDeliverySink>(delay_sink) {
        info!("delayed {} packets by {:?} in total", sink.intercepted(), sink.total_delay());
    }

    let now = sim.now();
    if let Some(monitor) = sim.flow_monitor_mut() {
        monitor.check_for_lost_packets(now);
        let flow_path = config.output_dir.join(FLOW_MONITOR_FILE);
        flow::xml::write_flow_monitor_file(&flow_path, monitor, SerializeOptions { histograms: true })?;
        files.push(flow_path);

        let mut out = console;
        flow::write_flow_report(&mut out, monitor.classifier(), monitor.stats(), config.hidden_flows, config.sim_time)?;
        out.flush()?;
    }

    let anim_path = config.output_dir.join(ANIMATION_FILE);
    anim.write_file(&anim_path, &sim)?;
    files.push(anim_path);

    Ok(LteOutcome {
        sim,
        run,
        delay_sink,
        ue_addrs,
        remote_host_addr,
        files,
    })
}

fn next_addr(alloc: &mut Ipv4AddrAllocator) -> Result<Ipv4Addr, ScenarioError> {
    alloc.next_addr().ok_or_else(|| {
        ScenarioError::Config(ConfigError::Invalid {
            name: "address plan",
            reason: format!("network {} is exhausted", alloc.network()),
        })
    })
}

fn too_many_cells(config: &LteConfig) -> ConfigError {
    ConfigError::TooManyNodes {
        what: "nodes",
        requested: u32::from(config.nodes),
        capacity: MAX_CELLS,
    }
}
