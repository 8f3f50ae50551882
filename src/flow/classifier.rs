use crate::priv_prelude::*;
use crate::packet::Packet;
use crate::wire::protocol_numbers;
use super::FlowId;

/// The fields identifying a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiveTuple {
    pub protocol: u8,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub source_port: u16,
    pub destination_port: u16,
}

impl fmt::Display for FiveTuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} (protocol {})",
            self.source, self.source_port, self.destination, self.destination_port, self.protocol,
        )
    }
}

/// Maps five-tuples to flow ids. Ids are handed out from 1 in the order flows are first seen
/// and a five-tuple keeps its id for the life of the classifier.
#[derive(Debug, Clone)]
pub struct FlowClassifier {
    ids: HashMap<FiveTuple, FlowId>,
    tuples: BTreeMap<FlowId, FiveTuple>,
    next_id: u32,
}

impl Default for FlowClassifier {
    fn default() -> FlowClassifier {
        FlowClassifier::new()
    }
}

impl FlowClassifier {
    pub fn new() -> FlowClassifier {
        FlowClassifier {
            ids: HashMap::new(),
            tuples: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// The five-tuple of a packet. Only UDP packets belong to flows.
    pub fn five_tuple(packet: &Packet) -> Option<FiveTuple> {
        if packet.ip().protocol() != protocol_numbers::UDP {
            return None;
        }
        let udp = packet.udp()?;
        Some(FiveTuple {
            protocol: protocol_numbers::UDP,
            source: packet.ip().source_ip(),
            destination: packet.ip().dest_ip(),
            source_port: udp.source_port(),
            destination_port: udp.dest_port(),
        })
    }

    /// Classify a packet, assigning a new flow id if its five-tuple hasn't been seen before.
    pub fn classify(&mut self, packet: &Packet) -> Option<(FlowId, FiveTuple)> {
        let tuple = FlowClassifier::five_tuple(packet)?;
        Some((self.classify_tuple(tuple), tuple))
    }

    pub fn classify_tuple(&mut self, tuple: FiveTuple) -> FlowId {
        if let Some(id) = self.ids.get(&tuple) {
            return *id;
        }
        let id = FlowId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.ids.insert(tuple, id);
        self.tuples.insert(id, tuple);
        trace!("new flow {}: {}", id, tuple);
        id
    }

    pub fn find_flow(&self, id: FlowId) -> Option<FiveTuple> {
        self.tuples.get(&id).cloned()
    }

    /// Every known flow in id order.
    pub fn flows(&self) -> impl Iterator<Item = (FlowId, FiveTuple)> + '_ {
        self.tuples.iter().map(|(id, tuple)| (*id, *tuple))
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Rebuild a classifier from previously assigned ids, eg. ones read back from a flow
    /// monitor document.
    pub fn from_flows<I>(flows: I) -> FlowClassifier
    where
        I: IntoIterator<Item = (FlowId, FiveTuple)>,
    {
        let mut classifier = FlowClassifier::new();
        for (id, tuple) in flows {
            classifier.ids.insert(tuple, id);
            classifier.tuples.insert(id, tuple);
            classifier.next_id = cmp::max(classifier.next_id, id.0.saturating_add(1));
        }
        classifier
    }
}
