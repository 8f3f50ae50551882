//! Flow classification and statistics.

mod classifier;
mod histogram;
mod monitor;
mod report;
mod stats;
pub mod xml;

pub use self::classifier::{FiveTuple, FlowClassifier};
pub use self::histogram::{Bin, Histogram};
pub use self::monitor::{FlowMonitor, DEFAULT_MAX_PER_HOP_DELAY};
pub use self::report::{
    summarize_document, write_document_summary, write_flow_report, DocumentFlowSummary, OLSR_PORT,
};
pub use self::stats::{BinWidths, FlowRecord, FlowStatisticsAggregator, FlowSummary};
pub use self::xml::{FlowMonitorDocument, SerializeOptions};

use crate::priv_prelude::*;

/// Identifies a flow. Ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId(pub u32);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
