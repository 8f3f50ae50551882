use crate::priv_prelude::*;
use crate::flow::xml::{parse_flow_monitor, write_flow_monitor};
use crate::flow::{
    summarize_document, write_document_summary, write_flow_report, BinWidths, FlowMonitorDocument,
    SerializeOptions,
};

const MS: Duration = Duration::from_millis(1);

fn tuple(source_port: u16) -> FiveTuple {
    FiveTuple {
        protocol: 17,
        source: ipv4!("7.0.0.2"),
        destination: ipv4!("1.0.0.2"),
        source_port,
        destination_port: 2001,
    }
}

#[test]
fn transmissions_and_receptions_commute() {
    let flow = FlowId(1);
    let mut interleaved = FlowStatisticsAggregator::new(BinWidths::default());
    interleaved.on_transmit(flow, 128, 10 * MS);
    interleaved.on_receive(flow, 128, 16 * MS, 26 * MS);
    interleaved.on_transmit(flow, 128, 30 * MS);
    interleaved.on_receive(flow, 128, 19 * MS, 49 * MS);

    let mut batched = FlowStatisticsAggregator::new(BinWidths::default());
    batched.on_receive(flow, 128, 16 * MS, 26 * MS);
    batched.on_receive(flow, 128, 19 * MS, 49 * MS);
    batched.on_transmit(flow, 128, 10 * MS);
    batched.on_transmit(flow, 128, 30 * MS);

    assert_eq!(interleaved.snapshot(), batched.snapshot());
    let record = interleaved.record(flow).unwrap();
    assert_eq!(record.tx_packets, 2);
    assert_eq!(record.rx_bytes, 256);
    assert_eq!(record.delay_sum, 35 * MS);
    assert_eq!(record.jitter_sum, 3 * MS);
    assert_eq!(record.time_first_tx, 10 * MS);
    assert_eq!(record.time_last_rx, 49 * MS);
    assert_eq!(record.mean_delay(), Some(Duration::from_micros(17_500)));
}

#[test]
fn snapshots_do_not_change_anything() {
    let mut stats = FlowStatisticsAggregator::new(BinWidths::default());
    stats.on_transmit(FlowId(1), 128, MS);
    stats.on_lost(FlowId(1));
    let first = stats.snapshot();
    let second = stats.snapshot();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].lost_packets, 1);
}

#[test]
fn mean_delay_of_an_empty_flow() {
    let mut stats = FlowStatisticsAggregator::new(BinWidths::default());
    stats.on_transmit(FlowId(3), 128, MS);
    assert_eq!(stats.record(FlowId(3)).unwrap().mean_delay(), None);

    let mut out = Vec::new();
    let classifier = FlowClassifier::from_flows(vec![(FlowId(3), tuple(49153))]);
    write_flow_report(&mut out, &classifier, &stats, 2, Duration::from_secs(1)).unwrap();
    let report = String::from_utf8(out).unwrap();
    assert!(report.contains("Flow 3 (7.0.0.2 -> 1.0.0.2)"), "{}", report);
    assert!(report.contains("  Mean Delay: n/a"), "{}", report);
}

#[test]
fn report_hides_the_first_flows() {
    let mut stats = FlowStatisticsAggregator::new(BinWidths::default());
    for id in 1..=3 {
        stats.on_transmit(FlowId(id), 1024 * 1024, MS);
        stats.on_receive(FlowId(id), 1024 * 1024, 5 * MS, 6 * MS);
    }
    let classifier = FlowClassifier::from_flows((1..=3).map(|id| (FlowId(id), tuple(49152 + id as u16))));
    let mut out = Vec::new();
    write_flow_report(&mut out, &classifier, &stats, 2, Duration::from_secs(8)).unwrap();
    let report = String::from_utf8(out).unwrap();
    assert_eq!(report, "\
Flow 3 (7.0.0.2 -> 1.0.0.2)
  Tx Packets: 1
  Tx Bytes:   1048576
  TxOffered:  1 Mbps
  Rx Packets: 1
  Rx Bytes:   1048576
  Throughput: 1 Mbps
  Mean Delay: 5.000 ms
");
}

#[test]
fn reset_keeps_flows() {
    let mut stats = FlowStatisticsAggregator::new(BinWidths::default());
    stats.on_transmit(FlowId(1), 128, MS);
    stats.reset(5 * MS);
    assert_eq!(stats.len(), 1);
    let record = stats.record(FlowId(1)).unwrap();
    assert_eq!(record.tx_packets, 0);
    assert_eq!(record.last_reset, 5 * MS);
}

#[test]
fn document_survives_a_round_trip() {
    let widths = BinWidths {
        delay: 0.001,
        jitter: 0.001,
        packet_size: 2000.0,
    };
    let mut stats = FlowStatisticsAggregator::new(widths);
    stats.on_transmit(FlowId(1), 128, 10 * MS);
    stats.on_transmit(FlowId(1), 128, 30 * MS);
    stats.on_receive(FlowId(1), 128, Duration::from_micros(16_250), Duration::from_micros(26_250));
    stats.on_receive(FlowId(1), 128, Duration::from_micros(12_125), Duration::from_micros(42_125));
    stats.on_forward(FlowId(1));
    stats.on_transmit(FlowId(2), 128, 10 * MS);
    stats.on_lost(FlowId(2));
    let classifier = FlowClassifier::from_flows(vec![
        (FlowId(1), tuple(49153)),
        (FlowId(2), tuple(49154)),
    ]);

    let out = write_flow_monitor(Vec::new(), &classifier, &stats, SerializeOptions::default()).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(r#"delaySum="+28375000ns""#), "{}", text);

    let document = parse_flow_monitor(&text, widths).unwrap();
    assert_eq!(document.stats.snapshot(), stats.snapshot());
    assert_eq!(document.classifier.find_flow(FlowId(2)), Some(tuple(49154)));
    assert_eq!(document.classifier.len(), 2);
}

#[test]
fn reads_fractional_times_and_skips_probes() {
    let text = r#"<?xml version="1.0" ?>
<FlowMonitor>
  <FlowStats>
    <Flow flowId="1" timeFirstTxPacket="+1e+07ns" timeFirstRxPacket="+2.5e+07ns" timeLastTxPacket="+1e+07ns"
          timeLastRxPacket="+1.025e+09ns" delaySum="+1.5e+07ns" jitterSum="+0.0ns" txBytes="128000"
          txPackets="1000" rxBytes="128000" rxPackets="1000" lostPackets="0" timesForwarded="0">
      <delayHistogram nBins="1"><bin index="0" start="0" width="0.001" count="1000"/></delayHistogram>
    </Flow>
    <Flow flowId="2" timeFirstTxPacket="+0.0ns" timeFirstRxPacket="+0.0ns" timeLastTxPacket="+0.0ns"
          timeLastRxPacket="+0.0ns" delaySum="+0.0ns" jitterSum="+0.0ns" txBytes="0" txPackets="0"
          rxBytes="0" rxPackets="0" lostPackets="4" timesForwarded="0"/>
  </FlowStats>
  <Ipv4FlowClassifier>
    <Flow flowId="1" sourceAddress="10.1.3.3" destinationAddress="10.1.2.4" protocol="17" sourcePort="49153" destinationPort="9"/>
    <Flow flowId="2" sourceAddress="10.1.3.1" destinationAddress="10.1.3.255" protocol="17" sourcePort="698" destinationPort="698"/>
  </Ipv4FlowClassifier>
  <FlowProbes>
    <FlowProbe index="0">
      <FlowStats flowId="1" packets="1000" bytes="128000" delayFromFirstProbeSum="+0.0ns"/>
    </FlowProbe>
  </FlowProbes>
</FlowMonitor>
"#;
    let document: FlowMonitorDocument = parse_flow_monitor(text, BinWidths::default()).unwrap();
    let record = document.stats.record(FlowId(1)).unwrap();
    assert_eq!(record.time_first_rx, 25 * MS);
    assert_eq!(record.time_last_rx, Duration::from_millis(1025));
    assert_eq!(record.delay_histogram.count(0), 1000);
    assert_eq!(document.stats.len(), 2);

    // flow 2 goes to the routing protocol port and is left out
    let summaries = summarize_document(&document);
    assert_eq!(summaries.len(), 1);
    // 128000 bytes over one second
    assert_eq!(summaries[0].bitrate_kbps, 8 * 128);
    let mean_delay = summaries[0].mean_delay_secs.unwrap();
    assert!((mean_delay - 15e-6).abs() < 1e-12, "{}", mean_delay);

    let mut out = Vec::new();
    write_document_summary(&mut out, &summaries).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.ends_with("1 flows, 0 packets lost\n"), "{}", text);
}

#[test]
fn missing_root_is_an_error() {
    assert!(parse_flow_monitor("<Something/>", BinWidths::default()).is_err());
}

fn single_flow_document(flow_attrs: &str, histograms: &str, classifier: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<FlowMonitor>
  <FlowStats>
    <Flow {} txBytes="128" txPackets="1" lostPackets="0" timesForwarded="0">
      {}
    </Flow>
  </FlowStats>
  <Ipv4FlowClassifier>
    {}
  </Ipv4FlowClassifier>
</FlowMonitor>
"#,
        flow_attrs, histograms, classifier,
    )
}

#[test]
fn oversized_histograms_are_rejected() {
    let flow = r#"flowId="1" rxBytes="128" rxPackets="1""#;

    let text = single_flow_document(flow, r#"<delayHistogram nBins="18446744073709551615"/>"#, "");
    match parse_flow_monitor(&text, BinWidths::default()) {
        Err(OutputError::Malformed(..)) => (),
        res => panic!("unexpected result {:?}", res.map(|_| ())),
    }

    let text = single_flow_document(
        flow,
        r#"<delayHistogram nBins="1"><bin index="1000000000" start="0" width="0.001" count="1"/></delayHistogram>"#,
        "",
    );
    match parse_flow_monitor(&text, BinWidths::default()) {
        Err(OutputError::Malformed(..)) => (),
        res => panic!("unexpected result {:?}", res.map(|_| ())),
    }
}

#[test]
fn histogram_widths_come_from_the_document() {
    let text = single_flow_document(
        r#"flowId="1" rxBytes="128" rxPackets="1""#,
        r#"<packetSizeHistogram nBins="1"><bin index="0" start="0" width="2000" count="1"/></packetSizeHistogram>"#,
        "",
    );
    let document = parse_flow_monitor(&text, BinWidths::default()).unwrap();
    let record = document.stats.record(FlowId(1)).unwrap();
    assert_eq!(record.packet_size_histogram.bin_width(), 2000.0);
    assert_eq!(record.packet_size_histogram.count(0), 1);
    // nothing recorded, so the caller's width stands
    assert_eq!(record.delay_histogram.bin_width(), BinWidths::default().delay);
}

#[test]
fn largest_flow_id_reads_back() {
    let text = single_flow_document(
        r#"flowId="4294967295" rxBytes="128" rxPackets="1""#,
        "",
        r#"<Flow flowId="4294967295" sourceAddress="7.0.0.2" destinationAddress="1.0.0.2" protocol="17" sourcePort="1" destinationPort="2001"/>"#,
    );
    let document = parse_flow_monitor(&text, BinWidths::default()).unwrap();
    let tuple = document.classifier.find_flow(FlowId(u32::MAX)).unwrap();
    assert_eq!(tuple.destination_port, 2001);
    assert_eq!(summarize_document(&document).len(), 1);
}

#[test]
fn huge_bitrates_saturate() {
    let text = single_flow_document(
        r#"flowId="1" timeFirstRxPacket="+0ns" timeLastRxPacket="+1ns" rxBytes="18446744073709551615" rxPackets="1""#,
        "",
        "",
    );
    let document = parse_flow_monitor(&text, BinWidths::default()).unwrap();
    let summaries = summarize_document(&document);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].bitrate_kbps, u64::MAX);
}
