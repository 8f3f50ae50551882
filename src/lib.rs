//! Discrete-event network simulation with randomized per-hop delays and flow statistics.
//!
//! Everything here runs in virtual time on a single thread. A [`Simulator`] holds nodes, the
//! devices attached to them and the channels joining those devices, plus a queue of pending
//! events. Applications installed on nodes send and receive UDP datagrams, which are routed hop
//! by hop across channels with a configurable data rate and propagation delay.
//!
//! # Injecting delays
//!
//! Any device can carry a [`PacketInterceptor`]. When a packet arrives at an intercepted device,
//! the interceptor decides whether the node sees the packet immediately or at some later time.
//! [`DeferredDeliverySink`] holds every packet back for a time drawn from a
//! [`RandomDelayGenerator`]:
//!
//! ```
//! use delaysim::{ChannelKind, DataRate, DeferredDeliverySink, RandomDelayGenerator, Simulator};
//! use std::time::Duration;
//!
//! let mut sim = Simulator::new();
//! let a = sim.add_node("a");
//! let b = sim.add_node("b");
//! let (_, dev_b) = sim
//!     .connect(a, b, ChannelKind::PointToPoint, DataRate::mbps(100), Duration::from_millis(1))
//!     .unwrap();
//!
//! let generator = RandomDelayGenerator::normal(5.0, 3.0, 3).unwrap();
//! let sink = sim.add_interceptor(DeferredDeliverySink::new(generator));
//! sim.set_interceptor(dev_b, sink).unwrap();
//! ```
//!
//! # Measuring
//!
//! A [`FlowMonitor`] classifies packets into flows by their 5-tuple and aggregates per-flow
//! counters, delay and jitter sums and histograms. Its contents can be written to and read back
//! from an XML document with the [`flow::xml`] module. An [`EndToEndDelayProbe`] prints the
//! one-way delay of every packet reaching a [`PacketSink`], using the timestamp header that
//! [`UdpClient`] puts at the front of each payload.
//!
//! # Scenarios
//!
//! The [`scenario`] module builds two complete topologies: a two-cell cellular network with
//! random delays, and a WiFi network bridged to a LAN running a UDP echo exchange. Both are
//! driven by the `delaysim` binary.

mod prelude;
mod priv_prelude;

pub mod time;
mod network;
mod mac;
pub mod wire;
mod packet;
mod seq_ts;
pub mod error;
pub mod sched;
pub mod delay;
pub mod intercept;
pub mod sim;
pub mod app;
pub mod probe;
mod console;
pub mod flow;
pub mod pcap;
pub mod anim;
pub mod mobility;
pub mod config;
pub mod scenario;

#[cfg(test)]
mod tests;

pub use crate::prelude::*;
