//! One-way delay measurement at packet sinks.

use crate::priv_prelude::*;
use crate::app::SinkRxObserver;
use crate::console::Console;
use crate::seq_ts::SeqTsHeader;
use crate::time::signed_millis_between;

/// Reads the `SeqTsHeader` of every packet received by a `PacketSink` and prints the one-way
/// delay as `Output Delay: <n> ms`.
///
/// Send and receive times are both truncated to whole milliseconds before subtracting, so a
/// packet sent at 10.9ms and received at 11.1ms reports 1ms. The payload is only peeked at.
#[derive(Debug)]
pub struct EndToEndDelayProbe {
    console: Console,
    observed: u64,
    skipped: u64,
}

impl EndToEndDelayProbe {
    pub fn new(console: Console) -> EndToEndDelayProbe {
        EndToEndDelayProbe {
            console,
            observed: 0,
            skipped: 0,
        }
    }

    /// Delay in milliseconds of a packet with the given payload received at `now`, or `None`
    /// if the payload carries no header.
    pub fn measure(now: Duration, payload: &[u8]) -> Option<i64> {
        let header = SeqTsHeader::peek(payload)?;
        Some(signed_millis_between(now, header.ts))
    }

    pub fn observed(&self) -> u64 {
        self.observed
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl SinkRxObserver for EndToEndDelayProbe {
    fn on_sink_rx(&mut self, now: Duration, payload: &Bytes, from: SocketAddrV4) {
        let delay = match EndToEndDelayProbe::measure(now, payload) {
            Some(delay) => delay,
            None => {
                debug!("{}-byte packet from {} has no timestamp header", payload.len(), from);
                self.skipped += 1;
                return;
            },
        };
        self.observed += 1;
        if let Err(e) = writeln!(self.console, "Output Delay: {} ms", delay) {
            warn!("failed to write delay report: {}", e);
        }
    }
}
