//! Receive-side packet interception.
//!
//! A device may carry a `PacketInterceptor`. Every packet arriving at such a device is shown to
//! the interceptor before the owning node sees it, and the interceptor decides whether the
//! packet is handed up immediately or at some later virtual time. The simulator takes care of
//! holding on to the packet and re-entering the normal receive path.

use crate::priv_prelude::*;
use crate::delay::RandomDelayGenerator;
use crate::packet::Packet;
use crate::sim::{DeviceId, NodeId};

/// What a device knows about a packet it has just received.
#[derive(Debug)]
pub struct InterceptContext<'a> {
    pub now: Duration,
    pub node: NodeId,
    pub device: DeviceId,
    pub packet: &'a Packet,
    pub protocol: u16,
    pub source: MacAddr,
}

/// An interceptor's verdict on a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Hand the packet to the node now.
    Deliver,
    /// Hand the packet to the node at the given virtual time.
    Defer(Duration),
}

pub trait PacketInterceptor {
    fn intercept(&mut self, ctx: &InterceptContext<'_>) -> Decision;
}

impl<F> PacketInterceptor for F
where
    F: FnMut(&InterceptContext<'_>) -> Decision,
{
    fn intercept(&mut self, ctx: &InterceptContext<'_>) -> Decision {
        self(ctx)
    }
}

/// A packet held back by an interceptor, along with everything needed to resume its delivery.
#[derive(Debug, Clone)]
pub struct DelayedPacket {
    pub packet: Packet,
    pub device: DeviceId,
    pub protocol: u16,
    pub source: MacAddr,
}

/// Delays every packet it sees by a random amount drawn from its generator.
#[derive(Debug)]
pub struct DeferredDeliverySink {
    generator: RandomDelayGenerator,
    intercepted: u64,
    total_delay: Duration,
}

impl DeferredDeliverySink {
    pub fn new(generator: RandomDelayGenerator) -> DeferredDeliverySink {
        DeferredDeliverySink {
            generator,
            intercepted: 0,
            total_delay: Duration::ZERO,
        }
    }

    /// Number of packets delayed so far.
    pub fn intercepted(&self) -> u64 {
        self.intercepted
    }

    /// Sum of all the delays injected so far.
    pub fn total_delay(&self) -> Duration {
        self.total_delay
    }
}

impl PacketInterceptor for DeferredDeliverySink {
    fn intercept(&mut self, ctx: &InterceptContext<'_>) -> Decision {
        let delay = self.generator.sample_duration();
        self.intercepted += 1;
        self.total_delay += delay;
        trace!(
            "delaying packet {} on device {} of node {} by {:?}",
            ctx.packet.uid(), ctx.device, ctx.node, delay,
        );
        Decision::Defer(ctx.now + delay)
    }
}
