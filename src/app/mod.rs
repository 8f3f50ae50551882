//! UDP applications and the interface they use to talk to the simulator.

mod echo;
mod sink;
mod udp_client;

pub use self::echo::{UdpEchoClient, UdpEchoServer};
pub use self::sink::PacketSink;
pub use self::udp_client::UdpClient;

use crate::priv_prelude::*;
use crate::error::SimError;
use crate::sim::{AppId, NodeId, Simulator};
use std::any::Any;

/// An application running on a node. Every callback runs at the current virtual time and
/// must return without blocking; waiting is done by scheduling a timer.
pub trait Application {
    fn start(&mut self, ctx: &mut AppContext<'_>) -> Result<(), SimError>;

    fn stop(&mut self, _ctx: &mut AppContext<'_>) -> Result<(), SimError> {
        Ok(())
    }

    /// Called when a timer set with `AppContext::schedule_timer` fires.
    fn handle_timer(&mut self, _ctx: &mut AppContext<'_>, _token: u64) -> Result<(), SimError> {
        Ok(())
    }

    /// Called for every datagram arriving on a port bound by this application.
    fn receive(
        &mut self,
        _ctx: &mut AppContext<'_>,
        _from: SocketAddrV4,
        _local_port: u16,
        _payload: Bytes,
    ) -> Result<(), SimError> {
        Ok(())
    }
}

pub(crate) trait AppObject: Application {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Application + 'static> AppObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Observes every reception at every `PacketSink` of a simulation.
pub trait SinkRxObserver {
    fn on_sink_rx(&mut self, now: Duration, payload: &Bytes, from: SocketAddrV4);
}

impl<F> SinkRxObserver for F
where
    F: FnMut(Duration, &Bytes, SocketAddrV4),
{
    fn on_sink_rx(&mut self, now: Duration, payload: &Bytes, from: SocketAddrV4) {
        self(now, payload, from)
    }
}

/// An application's handle on the simulator for the duration of a callback.
pub struct AppContext<'a> {
    sim: &'a mut Simulator,
    app: AppId,
    node: NodeId,
}

impl<'a> AppContext<'a> {
    pub(crate) fn new(sim: &'a mut Simulator, app: AppId, node: NodeId) -> AppContext<'a> {
        AppContext { sim, app, node }
    }

    pub fn now(&self) -> Duration {
        self.sim.now()
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn app(&self) -> AppId {
        self.app
    }

    /// Receive datagrams sent to `port` on any of the node's addresses.
    pub fn bind(&mut self, port: u16) -> Result<(), SimError> {
        self.sim.bind_port(self.node, port, self.app)
    }

    pub fn bind_ephemeral(&mut self) -> Result<u16, SimError> {
        self.sim.bind_ephemeral_port(self.node, self.app)
    }

    pub fn send_to(&mut self, source_port: u16, dest: SocketAddrV4, payload: Bytes) -> Result<(), SimError> {
        self.sim.send_udp(self.node, source_port, dest, payload)
    }

    /// Call `handle_timer` with `token` after `delay`. Timers of a stopped application never
    /// fire.
    pub fn schedule_timer(&mut self, delay: Duration, token: u64) -> Result<(), SimError> {
        self.sim.schedule_app_timer(self.app, delay, token)
    }

    pub(crate) fn notify_sink_rx(&mut self, payload: &Bytes, from: SocketAddrV4) {
        self.sim.notify_sink_rx(payload, from)
    }
}
