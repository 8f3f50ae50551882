use crate::priv_prelude::*;
use super::{init_logging, two_nodes};
use std::cell::RefCell;
use std::rc::Rc;

const PORT: u16 = 9;
// 100 payload bytes plus UDP and IPv4 headers at 100Mbps, plus the 1ms link delay
const ARRIVAL_AFTER_SEND: Duration = Duration::from_nanos(1_010_240);

fn install_traffic(sim: &mut Simulator, a: NodeId, b: NodeId, count: u32) -> Rc<RefCell<Vec<Duration>>> {
    sim.install_app(b, PacketSink::new(PORT), Duration::ZERO, None).unwrap();
    let client = UdpClient::new(
        SocketAddrV4::new(ipv4!("10.0.0.2"), PORT),
        100,
        Duration::from_millis(20),
        count,
    );
    sim.install_app(a, client, Duration::ZERO, None).unwrap();

    let received = Rc::new(RefCell::new(Vec::new()));
    let received_by_observer = received.clone();
    sim.add_sink_rx_observer(move |now: Duration, _payload: &Bytes, _from: SocketAddrV4| {
        received_by_observer.borrow_mut().push(now);
    });
    received
}

#[test]
fn deferred_packets_arrive_at_the_deferred_time() {
    init_logging();
    let (mut sim, a, b, dev_b) = two_nodes();
    let intercepted = Rc::new(RefCell::new(Vec::new()));
    let intercepted_by_closure = intercepted.clone();
    let interceptor = sim.add_interceptor(move |ctx: &InterceptContext<'_>| {
        intercepted_by_closure.borrow_mut().push(ctx.now);
        Decision::Defer(ctx.now + Duration::from_millis(5))
    });
    sim.set_interceptor(dev_b, interceptor).unwrap();
    let received = install_traffic(&mut sim, a, b, 3);

    sim.run_until(Duration::from_secs(1)).unwrap();

    let intercepted = intercepted.borrow();
    let received = received.borrow();
    let sent_at = [Duration::ZERO, Duration::from_millis(20), Duration::from_millis(40)];
    // each packet is intercepted exactly once
    assert_eq!(intercepted.len(), 3);
    assert_eq!(received.len(), 3);
    for i in 0..3 {
        assert_eq!(intercepted[i], sent_at[i] + ARRIVAL_AFTER_SEND);
        assert_eq!(received[i], intercepted[i] + Duration::from_millis(5));
    }
}

#[test]
fn delivered_packets_are_not_held_back() {
    let (mut sim, a, b, dev_b) = two_nodes();
    let interceptor = sim.add_interceptor(|_ctx: &InterceptContext<'_>| Decision::Deliver);
    sim.set_interceptor(dev_b, interceptor).unwrap();
    let received = install_traffic(&mut sim, a, b, 2);

    sim.run_until(Duration::from_secs(1)).unwrap();
    assert_eq!(*received.borrow(), vec![
        ARRIVAL_AFTER_SEND,
        Duration::from_millis(20) + ARRIVAL_AFTER_SEND,
    ]);
}

#[test]
fn random_delays_never_go_backwards() {
    init_logging();
    let (mut sim, a, b, dev_b) = two_nodes();
    let generator = RandomDelayGenerator::normal(5.0, 3.0, 3).unwrap();
    let sink = sim.add_interceptor(DeferredDeliverySink::new(generator));
    sim.set_interceptor(dev_b, sink).unwrap();
    let received = install_traffic(&mut sim, a, b, 50);

    sim.run_until(Duration::from_secs(2)).unwrap();

    let delay_sink = sim.interceptor::<DeferredDeliverySink>(sink).unwrap();
    let received = received.borrow();
    assert_eq!(delay_sink.intercepted(), 50);
    assert_eq!(received.len(), 50);

    // packets may overtake each other, but every one of them is held back by exactly its sample
    let arrivals: Duration = (0..50).map(|i| Duration::from_millis(20 * i) + ARRIVAL_AFTER_SEND).sum();
    let injected = received.iter().sum::<Duration>() - arrivals;
    assert_eq!(injected, delay_sink.total_delay());
}

#[test]
fn same_seed_same_run() {
    fn run(seed: u64) -> Vec<Duration> {
        let (mut sim, a, b, dev_b) = two_nodes();
        let generator = RandomDelayGenerator::normal(5.0, 3.0, seed).unwrap();
        let sink = sim.add_interceptor(DeferredDeliverySink::new(generator));
        sim.set_interceptor(dev_b, sink).unwrap();
        let received = install_traffic(&mut sim, a, b, 20);
        sim.run_until(Duration::from_secs(1)).unwrap();
        let times = received.borrow().clone();
        times
    }

    assert_eq!(run(3), run(3));
    assert_ne!(run(3), run(4));
}
