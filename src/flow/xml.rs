//! Reading and writing flow monitor documents.
//!
//! The document layout is:
//!
//! ```text
//! <FlowMonitor>
//!   <FlowStats>
//!     <Flow flowId="1" timeFirstTxPacket="+10000000ns" ... timesForwarded="0">
//!       <delayHistogram nBins="6">
//!         <bin index="5" start="0.005" width="0.001" count="400" />
//!       </delayHistogram>
//!       <jitterHistogram nBins="..."> ... </jitterHistogram>
//!       <packetSizeHistogram nBins="..."> ... </packetSizeHistogram>
//!     </Flow>
//!   </FlowStats>
//!   <Ipv4FlowClassifier>
//!     <Flow flowId="1" sourceAddress="7.0.0.2" destinationAddress="1.0.0.2" protocol="17"
//!           sourcePort="49153" destinationPort="2001" />
//!   </Ipv4FlowClassifier>
//! </FlowMonitor>
//! ```
//!
//! Times are written as integer nanoseconds. When reading, fractional nanosecond values are
//! accepted too. A `FlowProbes` section, if present, is skipped.

use crate::priv_prelude::*;
use crate::error::OutputError;
use super::histogram::MAX_BINS;
use super::{BinWidths, FiveTuple, FlowClassifier, FlowId, FlowMonitor, FlowRecord, FlowStatisticsAggregator, Histogram};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

/// What to include when writing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    pub histograms: bool,
}

impl Default for SerializeOptions {
    fn default() -> SerializeOptions {
        SerializeOptions {
            histograms: true,
        }
    }
}

/// The contents of a flow monitor document.
#[derive(Debug, Clone)]
pub struct FlowMonitorDocument {
    pub stats: FlowStatisticsAggregator,
    pub classifier: FlowClassifier,
}

pub fn write_flow_monitor_file(
    path: &Path,
    monitor: &FlowMonitor,
    options: SerializeOptions,
) -> Result<(), OutputError> {
    let file = io::BufWriter::new(fs::File::create(path)?);
    let mut file = write_flow_monitor(file, monitor.classifier(), monitor.stats(), options)?;
    file.flush()?;
    info!("wrote flow statistics for {} flows to {}", monitor.stats().len(), path.display());
    Ok(())
}

/// Write the document to `out`, returning `out` when done.
pub fn write_flow_monitor<W: Write>(
    out: W,
    classifier: &FlowClassifier,
    stats: &FlowStatisticsAggregator,
    options: SerializeOptions,
) -> Result<W, OutputError> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    writer.write_event(Event::Start(BytesStart::new("FlowMonitor")))?;

    writer.write_event(Event::Start(BytesStart::new("FlowStats")))?;
    for record in stats.snapshot() {
        write_flow_record(&mut writer, &record, options)?;
    }
    writer.write_event(Event::End(BytesEnd::new("FlowStats")))?;

    writer.write_event(Event::Start(BytesStart::new("Ipv4FlowClassifier")))?;
    for (flow_id, tuple) in classifier.flows() {
        let mut flow = BytesStart::new("Flow");
        push_attributes(&mut flow, &[
            ("flowId", flow_id.0.to_string()),
            ("sourceAddress", tuple.source.to_string()),
            ("destinationAddress", tuple.destination.to_string()),
            ("protocol", tuple.protocol.to_string()),
            ("sourcePort", tuple.source_port.to_string()),
            ("destinationPort", tuple.destination_port.to_string()),
        ]);
        writer.write_event(Event::Empty(flow))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Ipv4FlowClassifier")))?;

    writer.write_event(Event::End(BytesEnd::new("FlowMonitor")))?;
    let mut out = writer.into_inner();
    out.write_all(b"\n")?;
    Ok(out)
}

fn push_attributes(elem: &mut BytesStart<'_>, attributes: &[(&str, String)]) {
    for (name, value) in attributes {
        elem.push_attribute((*name, value.as_str()));
    }
}

fn write_flow_record<W: Write>(
    writer: &mut Writer<W>,
    record: &FlowRecord,
    options: SerializeOptions,
) -> Result<(), OutputError> {
    let mut flow = BytesStart::new("Flow");
    push_attributes(&mut flow, &[
        ("flowId", record.flow_id.0.to_string()),
        ("timeFirstTxPacket", record.time_first_tx.to_ns_string()),
        ("timeFirstRxPacket", record.time_first_rx.to_ns_string()),
        ("timeLastTxPacket", record.time_last_tx.to_ns_string()),
        ("timeLastRxPacket", record.time_last_rx.to_ns_string()),
        ("delaySum", record.delay_sum.to_ns_string()),
        ("jitterSum", record.jitter_sum.to_ns_string()),
        ("lastDelay", record.last_delay.to_ns_string()),
        ("txBytes", record.tx_bytes.to_string()),
        ("txPackets", record.tx_packets.to_string()),
        ("rxBytes", record.rx_bytes.to_string()),
        ("rxPackets", record.rx_packets.to_string()),
        ("lostPackets", record.lost_packets.to_string()),
        ("timesForwarded", record.times_forwarded.to_string()),
    ]);
    if !options.histograms {
        writer.write_event(Event::Empty(flow))?;
        return Ok(());
    }
    writer.write_event(Event::Start(flow))?;
    write_histogram(writer, HistogramKind::Delay.tag(), &record.delay_histogram)?;
    write_histogram(writer, HistogramKind::Jitter.tag(), &record.jitter_histogram)?;
    write_histogram(writer, HistogramKind::PacketSize.tag(), &record.packet_size_histogram)?;
    writer.write_event(Event::End(BytesEnd::new("Flow")))?;
    Ok(())
}

fn write_histogram<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    histogram: &Histogram,
) -> Result<(), OutputError> {
    let mut start = BytesStart::new(tag);
    push_attributes(&mut start, &[("nBins", histogram.n_bins().to_string())]);
    writer.write_event(Event::Start(start))?;
    for bin in histogram.bins() {
        let mut elem = BytesStart::new("bin");
        push_attributes(&mut elem, &[
            ("index", bin.index.to_string()),
            ("start", bin.start.to_string()),
            ("width", bin.width.to_string()),
            ("count", bin.count.to_string()),
        ]);
        writer.write_event(Event::Empty(elem))?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistogramKind {
    Delay,
    Jitter,
    PacketSize,
}

impl HistogramKind {
    fn tag(self) -> &'static str {
        match self {
            HistogramKind::Delay => "delayHistogram",
            HistogramKind::Jitter => "jitterHistogram",
            HistogramKind::PacketSize => "packetSizeHistogram",
        }
    }

    fn from_tag(tag: &[u8]) -> Option<HistogramKind> {
        match tag {
            b"delayHistogram" => Some(HistogramKind::Delay),
            b"jitterHistogram" => Some(HistogramKind::Jitter),
            b"packetSizeHistogram" => Some(HistogramKind::PacketSize),
            _ => None,
        }
    }

    fn of(self, record: &mut FlowRecord) -> &mut Histogram {
        match self {
            HistogramKind::Delay => &mut record.delay_histogram,
            HistogramKind::Jitter => &mut record.jitter_histogram,
            HistogramKind::PacketSize => &mut record.packet_size_histogram,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Stats,
    Classifier,
    Probes,
}

pub fn read_flow_monitor_file(path: &Path, bin_widths: BinWidths) -> Result<FlowMonitorDocument, OutputError> {
    let text = fs::read_to_string(path)?;
    parse_flow_monitor(&text, bin_widths)
}

/// Parse a flow monitor document. `bin_widths` gives the widths of the histograms read back.
/// A histogram with a non-empty bin takes its width from that bin instead.
pub fn parse_flow_monitor(input: &str, bin_widths: BinWidths) -> Result<FlowMonitorDocument, OutputError> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    let mut section = Section::Outside;
    let mut records = Vec::new();
    let mut flows = Vec::new();
    let mut current: Option<FlowRecord> = None;
    let mut histogram: Option<HistogramKind> = None;
    let mut saw_root = false;

    loop {
        let event = reader.read_event()?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                let name = e.name();
                let name = name.as_ref();
                if section == Section::Probes {
                    continue;
                }
                match name {
                    b"FlowMonitor" => saw_root = true,
                    b"FlowStats" if section == Section::Outside => section = Section::Stats,
                    b"Ipv4FlowClassifier" => section = Section::Classifier,
                    b"FlowProbes" if !empty => section = Section::Probes,
                    b"Flow" => match section {
                        Section::Stats => {
                            let record = parse_flow_record(&attributes(e)?, bin_widths)?;
                            if empty {
                                records.push(record);
                            } else {
                                current = Some(record);
                            }
                        },
                        Section::Classifier => flows.push(parse_five_tuple(&attributes(e)?)?),
                        Section::Outside | Section::Probes => {
                            return Err(OutputError::Malformed(String::from("Flow element outside of any section")));
                        },
                    },
                    b"bin" => {
                        let (kind, record) = match (histogram, current.as_mut()) {
                            (Some(kind), Some(record)) => (kind, record),
                            _ => {
                                return Err(OutputError::Malformed(String::from("bin element outside of a histogram")));
                            },
                        };
                        let attrs = attributes(e)?;
                        let index = required::<usize>(&attrs, "index")?;
                        if index >= MAX_BINS {
                            return Err(OutputError::Malformed(format!("bin index {} exceeds {} bins", index, MAX_BINS)));
                        }
                        let count = required::<u64>(&attrs, "count")?;
                        if let Some(width) = attrs.get("width") {
                            let width: f64 = width.parse().map_err(|_| {
                                OutputError::Malformed(format!("bad value {:?} for attribute width", width))
                            })?;
                            if !(width.is_finite() && width > 0.0) {
                                return Err(OutputError::Malformed(format!("bin width {} is not positive", width)));
                            }
                            kind.of(record).set_bin_width(width);
                        }
                        kind.of(record).set_count(index, count);
                    },
                    tag => {
                        if let Some(kind) = HistogramKind::from_tag(tag) {
                            let record = current.as_mut().ok_or_else(|| {
                                OutputError::Malformed(String::from("histogram outside of a Flow element"))
                            })?;
                            let n_bins = bin_count(required::<usize>(&attributes(e)?, "nBins")?)?;
                            kind.of(record).set_n_bins(n_bins);
                            if !empty {
                                histogram = Some(kind);
                            }
                        }
                    },
                }
            },
            Event::End(ref e) => {
                let name = e.name();
                match name.as_ref() {
                    b"FlowProbes" => section = Section::Outside,
                    _ if section == Section::Probes => (),
                    b"Flow" => {
                        if let Some(record) = current.take() {
                            records.push(record);
                        }
                    },
                    b"FlowStats" | b"Ipv4FlowClassifier" => section = Section::Outside,
                    tag => {
                        if HistogramKind::from_tag(tag).is_some() {
                            histogram = None;
                        }
                    },
                }
            },
            Event::Eof => break,
            _ => (),
        }
    }

    if !saw_root {
        return Err(OutputError::Malformed(String::from("missing FlowMonitor element")));
    }
    Ok(FlowMonitorDocument {
        stats: FlowStatisticsAggregator::from_records(bin_widths, records),
        classifier: FlowClassifier::from_flows(flows),
    })
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, OutputError> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn required<T: std::str::FromStr>(attrs: &HashMap<String, String>, name: &str) -> Result<T, OutputError> {
    let value = attrs.get(name).ok_or_else(|| {
        OutputError::Malformed(format!("missing attribute {}", name))
    })?;
    value.parse().map_err(|_| {
        OutputError::Malformed(format!("bad value {:?} for attribute {}", value, name))
    })
}

fn bin_count(n_bins: usize) -> Result<usize, OutputError> {
    if n_bins > MAX_BINS {
        return Err(OutputError::Malformed(format!("nBins {} exceeds {} bins", n_bins, MAX_BINS)));
    }
    Ok(n_bins)
}

fn time(attrs: &HashMap<String, String>, name: &str) -> Result<Duration, OutputError> {
    let value = match attrs.get(name) {
        Some(value) => value,
        None => return Ok(Duration::ZERO),
    };
    Duration::parse_ns_string(value).ok_or_else(|| {
        OutputError::Malformed(format!("bad time {:?} for attribute {}", value, name))
    })
}

fn parse_flow_record(attrs: &HashMap<String, String>, bin_widths: BinWidths) -> Result<FlowRecord, OutputError> {
    let flow_id = FlowId(required(attrs, "flowId")?);
    let mut record = FlowRecord::new(flow_id, bin_widths, Duration::ZERO);
    record.time_first_tx = time(attrs, "timeFirstTxPacket")?;
    record.time_first_rx = time(attrs, "timeFirstRxPacket")?;
    record.time_last_tx = time(attrs, "timeLastTxPacket")?;
    record.time_last_rx = time(attrs, "timeLastRxPacket")?;
    record.delay_sum = time(attrs, "delaySum")?;
    record.jitter_sum = time(attrs, "jitterSum")?;
    record.last_delay = time(attrs, "lastDelay")?;
    record.tx_bytes = required(attrs, "txBytes")?;
    record.tx_packets = required(attrs, "txPackets")?;
    record.rx_bytes = required(attrs, "rxBytes")?;
    record.rx_packets = required(attrs, "rxPackets")?;
    record.lost_packets = required(attrs, "lostPackets")?;
    record.times_forwarded = required(attrs, "timesForwarded")?;
    Ok(record)
}

fn parse_five_tuple(attrs: &HashMap<String, String>) -> Result<(FlowId, FiveTuple), OutputError> {
    let flow_id = FlowId(required(attrs, "flowId")?);
    let tuple = FiveTuple {
        protocol: required(attrs, "protocol")?,
        source: required(attrs, "sourceAddress")?,
        destination: required(attrs, "destinationAddress")?,
        source_port: required(attrs, "sourcePort")?,
        destination_port: required(attrs, "destinationPort")?,
    };
    Ok((flow_id, tuple))
}
