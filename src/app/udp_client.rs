use crate::priv_prelude::*;
use crate::error::SimError;
use crate::seq_ts::SeqTsHeader;
use super::{AppContext, Application};

const SEND: u64 = 0;

/// Sends fixed-size datagrams at a fixed interval. Each payload starts with a `SeqTsHeader`
/// carrying the datagram's sequence number and the virtual time it was sent.
#[derive(Debug, Clone)]
pub struct UdpClient {
    remote: SocketAddrV4,
    packet_size: usize,
    interval: Duration,
    max_packets: u32,
    sent: u32,
    local_port: Option<u16>,
}

impl UdpClient {
    /// `packet_size` is the size of the UDP payload, header included. A `max_packets` of zero
    /// means no limit.
    pub fn new(remote: SocketAddrV4, packet_size: usize, interval: Duration, max_packets: u32) -> UdpClient {
        UdpClient {
            remote,
            packet_size,
            interval,
            max_packets,
            sent: 0,
            local_port: None,
        }
    }

    pub fn remote(&self) -> SocketAddrV4 {
        self.remote
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    fn send(&mut self, ctx: &mut AppContext<'_>) -> Result<(), SimError> {
        let local_port = match self.local_port {
            Some(port) => port,
            None => return Ok(()),
        };
        let header = SeqTsHeader::new(self.sent, ctx.now());
        let payload = header.payload(self.packet_size);
        trace!("client on node {} sends seq {} to {}", ctx.node(), header.seq, self.remote);
        ctx.send_to(local_port, self.remote, payload)?;
        self.sent += 1;
        if self.max_packets == 0 || self.sent < self.max_packets {
            ctx.schedule_timer(self.interval, SEND)?;
        }
        Ok(())
    }
}

impl Application for UdpClient {
    fn start(&mut self, ctx: &mut AppContext<'_>) -> Result<(), SimError> {
        self.local_port = Some(ctx.bind_ephemeral()?);
        ctx.schedule_timer(Duration::ZERO, SEND)
    }

    fn stop(&mut self, ctx: &mut AppContext<'_>) -> Result<(), SimError> {
        debug!("client on node {} stopped after {} packets", ctx.node(), self.sent);
        self.local_port = None;
        Ok(())
    }

    fn handle_timer(&mut self, ctx: &mut AppContext<'_>, token: u64) -> Result<(), SimError> {
        match token {
            SEND => self.send(ctx),
            _ => Ok(()),
        }
    }
}
