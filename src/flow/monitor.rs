use crate::priv_prelude::*;
use crate::packet::{Packet, PacketUid};
use crate::sim::NodeId;
use super::{BinWidths, FlowClassifier, FlowId, FlowStatisticsAggregator};

/// How long a packet may go unseen before it is counted as lost.
pub const DEFAULT_MAX_PER_HOP_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
struct InFlight {
    flow_id: FlowId,
    first_seen: Duration,
    last_seen: Duration,
}

/// Watches IP traffic at a set of nodes and feeds a `FlowStatisticsAggregator`.
///
/// Packets sent by a monitored node are classified and timestamped. When a monitored node
/// delivers one of those packets locally the delay since it was sent is recorded. Packets that
/// never arrive stay in flight until `check_for_lost_packets` gives up on them.
#[derive(Debug, Clone)]
pub struct FlowMonitor {
    nodes: Vec<NodeId>,
    classifier: FlowClassifier,
    stats: FlowStatisticsAggregator,
    in_flight: HashMap<PacketUid, InFlight>,
    max_per_hop_delay: Duration,
}

impl FlowMonitor {
    pub fn new(bin_widths: BinWidths) -> FlowMonitor {
        FlowMonitor {
            nodes: Vec::new(),
            classifier: FlowClassifier::new(),
            stats: FlowStatisticsAggregator::new(bin_widths),
            in_flight: HashMap::new(),
            max_per_hop_delay: DEFAULT_MAX_PER_HOP_DELAY,
        }
    }

    pub fn with_max_per_hop_delay(mut self, max_per_hop_delay: Duration) -> FlowMonitor {
        self.max_per_hop_delay = max_per_hop_delay;
        self
    }

    pub fn monitor_node(&mut self, node: NodeId) {
        if !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
    }

    pub fn is_monitoring(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn classifier(&self) -> &FlowClassifier {
        &self.classifier
    }

    pub fn stats(&self) -> &FlowStatisticsAggregator {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut FlowStatisticsAggregator {
        &mut self.stats
    }

    /// Packets sent but not yet delivered or declared lost.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn on_send(&mut self, now: Duration, node: NodeId, packet: &Packet) {
        if !self.is_monitoring(node) {
            return;
        }
        let (flow_id, _) = match self.classifier.classify(packet) {
            Some(flow) => flow,
            None => return,
        };
        self.stats.on_transmit(flow_id, packet.len() as u64, now);
        self.in_flight.insert(packet.uid(), InFlight {
            flow_id,
            first_seen: now,
            last_seen: now,
        });
    }

    pub fn on_forward(&mut self, now: Duration, node: NodeId, packet: &Packet) {
        if !self.is_monitoring(node) {
            return;
        }
        if let Some(entry) = self.in_flight.get_mut(&packet.uid()) {
            entry.last_seen = now;
            self.stats.on_forward(entry.flow_id);
        }
    }

    pub fn on_local_deliver(&mut self, now: Duration, node: NodeId, packet: &Packet) {
        if !self.is_monitoring(node) {
            return;
        }
        if let Some(entry) = self.in_flight.remove(&packet.uid()) {
            let delay = now.saturating_sub(entry.first_seen);
            self.stats.on_receive(entry.flow_id, packet.len() as u64, delay, now);
        }
    }

    /// A packet was dropped on its way. Drops are seen wherever they happen, monitored or not.
    pub fn on_drop(&mut self, _node: NodeId, packet: &Packet) {
        if let Some(entry) = self.in_flight.remove(&packet.uid()) {
            self.stats.on_lost(entry.flow_id);
        }
    }

    /// Count every packet unseen for longer than `max_delay` as lost.
    pub fn check_for_lost_packets_within(&mut self, now: Duration, max_delay: Duration) -> u64 {
        let mut lost = Vec::new();
        self.in_flight.retain(|_, entry| {
            if now.saturating_sub(entry.last_seen) > max_delay {
                lost.push(entry.flow_id);
                false
            } else {
                true
            }
        });
        for flow_id in &lost {
            self.stats.on_lost(*flow_id);
        }
        if !lost.is_empty() {
            debug!("{} packets declared lost", lost.len());
        }
        lost.len() as u64
    }

    /// `check_for_lost_packets_within` using the monitor's configured maximum delay.
    pub fn check_for_lost_packets(&mut self, now: Duration) -> u64 {
        let max_delay = self.max_per_hop_delay;
        self.check_for_lost_packets_within(now, max_delay)
    }
}
