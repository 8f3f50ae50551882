use crate::priv_prelude::*;
use crate::error::SimError;
use super::{AppContext, Application};

const SEND: u64 = 0;

fn secs(t: Duration) -> f64 {
    t.as_secs_f64()
}

/// Sends every datagram it receives back to where it came from.
#[derive(Debug, Clone)]
pub struct UdpEchoServer {
    port: u16,
    echoed: u64,
}

impl UdpEchoServer {
    pub fn new(port: u16) -> UdpEchoServer {
        UdpEchoServer {
            port,
            echoed: 0,
        }
    }

    pub fn echoed(&self) -> u64 {
        self.echoed
    }
}

impl Application for UdpEchoServer {
    fn start(&mut self, ctx: &mut AppContext<'_>) -> Result<(), SimError> {
        ctx.bind(self.port)
    }

    fn receive(
        &mut self,
        ctx: &mut AppContext<'_>,
        from: SocketAddrV4,
        local_port: u16,
        payload: Bytes,
    ) -> Result<(), SimError> {
        info!(
            "At time {}s server received {} bytes from {} port {}",
            secs(ctx.now()), payload.len(), from.ip(), from.port(),
        );
        let len = payload.len();
        ctx.send_to(local_port, from, payload)?;
        self.echoed += 1;
        info!(
            "At time {}s server sent {} bytes to {} port {}",
            secs(ctx.now()), len, from.ip(), from.port(),
        );
        Ok(())
    }
}

/// Sends zero-filled datagrams to an echo server and counts the replies.
#[derive(Debug, Clone)]
pub struct UdpEchoClient {
    remote: SocketAddrV4,
    packet_size: usize,
    interval: Duration,
    max_packets: u32,
    sent: u32,
    received: u32,
    local_port: Option<u16>,
}

impl UdpEchoClient {
    pub fn new(remote: SocketAddrV4, packet_size: usize, interval: Duration, max_packets: u32) -> UdpEchoClient {
        UdpEchoClient {
            remote,
            packet_size,
            interval,
            max_packets,
            sent: 0,
            received: 0,
            local_port: None,
        }
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn received(&self) -> u32 {
        self.received
    }
}

impl Application for UdpEchoClient {
    fn start(&mut self, ctx: &mut AppContext<'_>) -> Result<(), SimError> {
        self.local_port = Some(ctx.bind_ephemeral()?);
        ctx.schedule_timer(Duration::ZERO, SEND)
    }

    fn stop(&mut self, _ctx: &mut AppContext<'_>) -> Result<(), SimError> {
        self.local_port = None;
        Ok(())
    }

    fn handle_timer(&mut self, ctx: &mut AppContext<'_>, token: u64) -> Result<(), SimError> {
        let local_port = match (token, self.local_port) {
            (SEND, Some(port)) => port,
            _ => return Ok(()),
        };
        let payload = Bytes::from(vec![0u8; self.packet_size]);
        ctx.send_to(local_port, self.remote, payload)?;
        self.sent += 1;
        info!(
            "At time {}s client sent {} bytes to {} port {}",
            secs(ctx.now()), self.packet_size, self.remote.ip(), self.remote.port(),
        );
        if self.sent < self.max_packets {
            ctx.schedule_timer(self.interval, SEND)?;
        }
        Ok(())
    }

    fn receive(
        &mut self,
        ctx: &mut AppContext<'_>,
        from: SocketAddrV4,
        _local_port: u16,
        payload: Bytes,
    ) -> Result<(), SimError> {
        self.received += 1;
        info!(
            "At time {}s client received {} bytes from {} port {}",
            secs(ctx.now()), payload.len(), from.ip(), from.port(),
        );
        Ok(())
    }
}
