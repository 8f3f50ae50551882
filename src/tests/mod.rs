use crate::priv_prelude::*;

mod delay;
mod flow;
mod intercept;
mod probe;
mod sched;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two nodes joined by a 100Mbps point-to-point link with a 1ms delay, addressed 10.0.0.1 and
/// 10.0.0.2. Returns the simulator, both nodes and the device on the receiving side.
fn two_nodes() -> (Simulator, NodeId, NodeId, DeviceId) {
    let mut sim = Simulator::new();
    let a = sim.add_node("a");
    let b = sim.add_node("b");
    let (dev_a, dev_b) = sim
        .connect(a, b, ChannelKind::PointToPoint, DataRate::mbps(100), Duration::from_millis(1))
        .unwrap();
    sim.assign_address(dev_a, ipv4!("10.0.0.1"), 24).unwrap();
    sim.assign_address(dev_b, ipv4!("10.0.0.2"), 24).unwrap();
    (sim, a, b, dev_b)
}
