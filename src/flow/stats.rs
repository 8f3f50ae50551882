use crate::priv_prelude::*;
use super::{FlowId, Histogram};

/// Bin widths of the per-flow histograms. Delay and jitter widths are in seconds, packet size
/// widths in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinWidths {
    pub delay: f64,
    pub jitter: f64,
    pub packet_size: f64,
}

impl Default for BinWidths {
    fn default() -> BinWidths {
        BinWidths {
            delay: 0.001,
            jitter: 0.001,
            packet_size: 20.0,
        }
    }
}

/// Everything counted about one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRecord {
    pub flow_id: FlowId,
    pub time_first_tx: Duration,
    pub time_first_rx: Duration,
    pub time_last_tx: Duration,
    pub time_last_rx: Duration,
    pub delay_sum: Duration,
    pub jitter_sum: Duration,
    pub last_delay: Duration,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    pub times_forwarded: u64,
    pub delay_histogram: Histogram,
    pub jitter_histogram: Histogram,
    pub packet_size_histogram: Histogram,
    pub last_reset: Duration,
}

impl FlowRecord {
    pub fn new(flow_id: FlowId, bin_widths: BinWidths, last_reset: Duration) -> FlowRecord {
        FlowRecord {
            flow_id,
            time_first_tx: Duration::ZERO,
            time_first_rx: Duration::ZERO,
            time_last_tx: Duration::ZERO,
            time_last_rx: Duration::ZERO,
            delay_sum: Duration::ZERO,
            jitter_sum: Duration::ZERO,
            last_delay: Duration::ZERO,
            tx_bytes: 0,
            tx_packets: 0,
            rx_bytes: 0,
            rx_packets: 0,
            lost_packets: 0,
            times_forwarded: 0,
            delay_histogram: Histogram::new(bin_widths.delay),
            jitter_histogram: Histogram::new(bin_widths.jitter),
            packet_size_histogram: Histogram::new(bin_widths.packet_size),
            last_reset,
        }
    }

    /// `delay_sum / rx_packets`, or `None` if nothing was received.
    pub fn mean_delay(&self) -> Option<Duration> {
        if self.rx_packets == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.delay_sum.nanos_u64() / self.rx_packets))
    }
}

/// Rates and means derived from a `FlowRecord` over a run of a given duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSummary {
    pub flow_id: FlowId,
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    /// Bits sent per second of run time.
    pub offered_load_bps: f64,
    /// Bits received per second of run time.
    pub throughput_bps: f64,
    pub mean_delay: Option<Duration>,
}

impl FlowSummary {
    pub fn from_record(record: &FlowRecord, duration: Duration) -> FlowSummary {
        let secs = duration.as_secs_f64();
        let per_sec = |bytes: u64| if secs > 0.0 { bytes as f64 * 8.0 / secs } else { 0.0 };
        FlowSummary {
            flow_id: record.flow_id,
            tx_packets: record.tx_packets,
            tx_bytes: record.tx_bytes,
            rx_packets: record.rx_packets,
            rx_bytes: record.rx_bytes,
            offered_load_bps: per_sec(record.tx_bytes),
            throughput_bps: per_sec(record.rx_bytes),
            mean_delay: record.mean_delay(),
        }
    }
}

/// Per-flow counters, keyed by flow id.
///
/// All updates are additions, so the final state doesn't depend on the order in which
/// transmissions and receptions are reported. Records are created the first time a flow id
/// is mentioned.
#[derive(Debug, Clone)]
pub struct FlowStatisticsAggregator {
    bin_widths: BinWidths,
    records: BTreeMap<FlowId, FlowRecord>,
    last_reset: Duration,
}

impl Default for FlowStatisticsAggregator {
    fn default() -> FlowStatisticsAggregator {
        FlowStatisticsAggregator::new(BinWidths::default())
    }
}

impl FlowStatisticsAggregator {
    pub fn new(bin_widths: BinWidths) -> FlowStatisticsAggregator {
        FlowStatisticsAggregator {
            bin_widths,
            records: BTreeMap::new(),
            last_reset: Duration::ZERO,
        }
    }

    /// Rebuild an aggregator from existing records.
    pub fn from_records<I>(bin_widths: BinWidths, records: I) -> FlowStatisticsAggregator
    where
        I: IntoIterator<Item = FlowRecord>,
    {
        let records = records.into_iter().map(|record| (record.flow_id, record)).collect();
        FlowStatisticsAggregator {
            bin_widths,
            records,
            last_reset: Duration::ZERO,
        }
    }

    pub fn bin_widths(&self) -> BinWidths {
        self.bin_widths
    }

    fn record_mut(&mut self, flow_id: FlowId) -> &mut FlowRecord {
        let bin_widths = self.bin_widths;
        let last_reset = self.last_reset;
        self
        .records
        .entry(flow_id)
        .or_insert_with(|| FlowRecord::new(flow_id, bin_widths, last_reset))
    }

    pub fn on_transmit(&mut self, flow_id: FlowId, bytes: u64, now: Duration) {
        let record = self.record_mut(flow_id);
        if record.tx_packets == 0 {
            record.time_first_tx = now;
        }
        record.time_last_tx = now;
        record.tx_packets += 1;
        record.tx_bytes += bytes;
    }

    pub fn on_receive(&mut self, flow_id: FlowId, bytes: u64, delay: Duration, now: Duration) {
        let record = self.record_mut(flow_id);
        if record.rx_packets == 0 {
            record.time_first_rx = now;
        } else {
            let jitter = if delay > record.last_delay {
                delay - record.last_delay
            } else {
                record.last_delay - delay
            };
            record.jitter_sum += jitter;
            record.jitter_histogram.add_value(jitter.as_secs_f64());
        }
        record.time_last_rx = now;
        record.last_delay = delay;
        record.delay_sum += delay;
        record.delay_histogram.add_value(delay.as_secs_f64());
        record.packet_size_histogram.add_value(bytes as f64);
        record.rx_packets += 1;
        record.rx_bytes += bytes;
    }

    pub fn on_lost(&mut self, flow_id: FlowId) {
        self.record_mut(flow_id).lost_packets += 1;
    }

    pub fn on_forward(&mut self, flow_id: FlowId) {
        self.record_mut(flow_id).times_forwarded += 1;
    }

    pub fn record(&self, flow_id: FlowId) -> Option<&FlowRecord> {
        self.records.get(&flow_id)
    }

    /// A copy of every record in flow id order.
    pub fn snapshot(&self) -> Vec<FlowRecord> {
        self.records.values().cloned().collect()
    }

    pub fn summaries(&self, duration: Duration) -> Vec<FlowSummary> {
        self
        .records
        .values()
        .map(|record| FlowSummary::from_record(record, duration))
        .collect()
    }

    /// Zero every record, keeping the set of known flows.
    pub fn reset(&mut self, now: Duration) {
        self.last_reset = now;
        for (flow_id, record) in self.records.iter_mut() {
            *record = FlowRecord::new(*flow_id, self.bin_widths, now);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
