use crate::priv_prelude::*;
use crate::app::SinkRxObserver;
use crate::seq_ts::SeqTsHeader;

fn from() -> SocketAddrV4 {
    SocketAddrV4::new(ipv4!("7.0.0.2"), 49153)
}

#[test]
fn delays_are_truncated_to_whole_milliseconds() {
    let payload = SeqTsHeader::new(0, Duration::from_micros(10_900)).payload(100);
    assert_eq!(EndToEndDelayProbe::measure(Duration::from_micros(11_100), &payload), Some(1));
    assert_eq!(EndToEndDelayProbe::measure(Duration::from_micros(26_999), &payload), Some(16));
    assert_eq!(EndToEndDelayProbe::measure(Duration::from_micros(10_950), &payload), Some(0));
}

#[test]
fn prints_one_line_per_packet() {
    let console = Console::buffer();
    let mut probe = EndToEndDelayProbe::new(console.clone());

    let payload = SeqTsHeader::new(0, Duration::from_millis(10)).payload(100);
    probe.on_sink_rx(Duration::from_micros(25_500), &payload, from());
    let payload = SeqTsHeader::new(1, Duration::from_millis(30)).payload(100);
    probe.on_sink_rx(Duration::from_millis(37), &payload, from());

    assert_eq!(probe.observed(), 2);
    assert_eq!(console.captured().unwrap(), "Output Delay: 15 ms\nOutput Delay: 7 ms\n");
}

#[test]
fn payload_is_left_alone() {
    let console = Console::buffer();
    let mut probe = EndToEndDelayProbe::new(console.clone());
    let payload = SeqTsHeader::new(5, Duration::from_millis(10)).payload(100);
    let before = payload.clone();
    probe.on_sink_rx(Duration::from_millis(20), &payload, from());
    probe.on_sink_rx(Duration::from_millis(20), &payload, from());
    assert_eq!(payload, before);
    assert_eq!(console.captured().unwrap(), "Output Delay: 10 ms\nOutput Delay: 10 ms\n");
}

#[test]
fn short_payloads_are_skipped() {
    let console = Console::buffer();
    let mut probe = EndToEndDelayProbe::new(console.clone());
    probe.on_sink_rx(Duration::from_millis(20), &Bytes::from_static(b"short"), from());
    assert_eq!(probe.observed(), 0);
    assert_eq!(probe.skipped(), 1);
    assert_eq!(console.captured().unwrap(), "");
}
