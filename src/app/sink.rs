use crate::priv_prelude::*;
use crate::error::SimError;
use super::{AppContext, Application};

/// Accepts datagrams on a port and discards them, reporting each one to the simulation's
/// `SinkRxObserver`s.
#[derive(Debug, Clone)]
pub struct PacketSink {
    port: u16,
    rx_packets: u64,
    rx_bytes: u64,
}

impl PacketSink {
    pub fn new(port: u16) -> PacketSink {
        PacketSink {
            port,
            rx_packets: 0,
            rx_bytes: 0,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn rx_packets(&self) -> u64 {
        self.rx_packets
    }

    pub fn rx_bytes(&self) -> u64 {
        self.rx_bytes
    }
}

impl Application for PacketSink {
    fn start(&mut self, ctx: &mut AppContext<'_>) -> Result<(), SimError> {
        ctx.bind(self.port)
    }

    fn receive(
        &mut self,
        ctx: &mut AppContext<'_>,
        from: SocketAddrV4,
        _local_port: u16,
        payload: Bytes,
    ) -> Result<(), SimError> {
        self.rx_packets += 1;
        self.rx_bytes += payload.len() as u64;
        trace!("sink on node {} port {} received {} bytes from {}", ctx.node(), self.port, payload.len(), from);
        ctx.notify_sink_rx(&payload, from);
        Ok(())
    }
}
