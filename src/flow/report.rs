//! Human-readable renderings of flow statistics.

use crate::priv_prelude::*;
use super::{FiveTuple, FlowClassifier, FlowId, FlowMonitorDocument, FlowStatisticsAggregator, FlowSummary};

/// Destination port of routing protocol chatter, left out of document summaries.
pub const OLSR_PORT: u16 = 698;

fn mbps(bps: f64) -> f64 {
    bps / 1024.0 / 1024.0
}

fn mean_delay_string(mean_delay: Option<Duration>) -> String {
    match mean_delay {
        Some(delay) => format!("{:.3} ms", delay.as_secs_f64() * 1e3),
        None => String::from("n/a"),
    }
}

/// Write one block per flow whose id is greater than `hidden_flows`.
pub fn write_flow_report<W: Write>(
    out: &mut W,
    classifier: &FlowClassifier,
    stats: &FlowStatisticsAggregator,
    hidden_flows: u32,
    duration: Duration,
) -> io::Result<()> {
    for summary in stats.summaries(duration) {
        if summary.flow_id.0 <= hidden_flows {
            continue;
        }
        write_flow_block(out, classifier.find_flow(summary.flow_id), &summary)?;
    }
    Ok(())
}

fn write_flow_block<W: Write>(
    out: &mut W,
    tuple: Option<FiveTuple>,
    summary: &FlowSummary,
) -> io::Result<()> {
    match tuple {
        Some(tuple) => writeln!(out, "Flow {} ({} -> {})", summary.flow_id, tuple.source, tuple.destination)?,
        None => writeln!(out, "Flow {}", summary.flow_id)?,
    }
    writeln!(out, "  Tx Packets: {}", summary.tx_packets)?;
    writeln!(out, "  Tx Bytes:   {}", summary.tx_bytes)?;
    writeln!(out, "  TxOffered:  {} Mbps", mbps(summary.offered_load_bps))?;
    writeln!(out, "  Rx Packets: {}", summary.rx_packets)?;
    writeln!(out, "  Rx Bytes:   {}", summary.rx_bytes)?;
    writeln!(out, "  Throughput: {} Mbps", mbps(summary.throughput_bps))?;
    writeln!(out, "  Mean Delay: {}", mean_delay_string(summary.mean_delay))?;
    Ok(())
}

/// Per-flow figures read back from a flow monitor document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentFlowSummary {
    pub flow_id: FlowId,
    pub tuple: Option<FiveTuple>,
    /// Received bits per second between the first and last reception, in kbit/s rounded down.
    pub bitrate_kbps: u64,
    pub lost_packets: u64,
    /// Mean delay in seconds, `None` if the flow received nothing.
    pub mean_delay_secs: Option<f64>,
}

/// Summarize every flow of a document except routing protocol traffic.
pub fn summarize_document(document: &FlowMonitorDocument) -> Vec<DocumentFlowSummary> {
    let mut summaries = Vec::new();
    for record in document.stats.snapshot() {
        let tuple = document.classifier.find_flow(record.flow_id);
        if tuple.map(|t| t.destination_port == OLSR_PORT).unwrap_or(false) {
            continue;
        }
        let (bitrate_kbps, mean_delay_secs) = if record.rx_packets == 0 {
            (0, None)
        } else {
            let duration = record.time_last_rx.saturating_sub(record.time_first_rx).as_secs_f64();
            let bitrate = if duration > 0.0 {
                ((record.rx_bytes as f64 / duration * 1e-3) as u64).saturating_mul(8)
            } else {
                0
            };
            let mean_delay = record.delay_sum.as_secs_f64() / record.rx_packets as f64;
            (bitrate, Some(mean_delay))
        };
        summaries.push(DocumentFlowSummary {
            flow_id: record.flow_id,
            tuple,
            bitrate_kbps,
            lost_packets: record.lost_packets,
            mean_delay_secs,
        });
    }
    summaries
}

pub fn write_document_summary<W: Write>(out: &mut W, summaries: &[DocumentFlowSummary]) -> io::Result<()> {
    writeln!(out, "{:>6}  {:<44}  {:>14}  {:>6}  {:>14}", "flow", "five-tuple", "bitrate", "lost", "mean delay")?;
    for summary in summaries {
        let tuple = match summary.tuple {
            Some(tuple) => tuple.to_string(),
            None => String::from("?"),
        };
        let delay = match summary.mean_delay_secs {
            Some(secs) => format!("{:.6} s", secs),
            None => String::from("n/a"),
        };
        writeln!(
            out,
            "{:>6}  {:<44}  {:>8} kbit/s  {:>6}  {:>14}",
            summary.flow_id.0, tuple, summary.bitrate_kbps, summary.lost_packets, delay,
        )?;
    }
    let lost: u64 = summaries.iter().map(|s| s.lost_packets).sum();
    writeln!(out, "{} flows, {} packets lost", summaries.len(), lost)?;
    Ok(())
}
