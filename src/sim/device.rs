use crate::priv_prelude::*;
use crate::error::ConfigError;
use crate::pcap::PcapWriter;
use super::{ChannelId, DeviceId, InterceptorId, NodeId};

/// A link data rate in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DataRate(pub u64);

impl DataRate {
    pub fn bps(bits_per_sec: u64) -> DataRate {
        DataRate(bits_per_sec)
    }

    pub fn mbps(mbits_per_sec: u64) -> DataRate {
        DataRate(mbits_per_sec * 1_000_000)
    }

    pub fn bits_per_sec(self) -> u64 {
        self.0
    }

    /// Time it takes to clock `bytes` bytes onto the link.
    pub fn tx_time(self, bytes: usize) -> Duration {
        if self.0 == 0 {
            return Duration::MAX;
        }
        let bits = bytes as u128 * 8;
        let nanos = bits * 1_000_000_000 / u128::from(self.0);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

impl std::str::FromStr for DataRate {
    type Err = ConfigError;

    /// Parses rates such as `5Mbps`, `100Gb/s` or `2000bps`.
    fn from_str(s: &str) -> Result<DataRate, ConfigError> {
        let invalid = || ConfigError::Invalid {
            name: "data rate",
            reason: format!("cannot parse {:?}", s),
        };
        let s = s.trim();
        let split = s.find(|c: char| !(c.is_ascii_digit() || c == '.')).ok_or_else(invalid)?;
        let (number, unit) = s.split_at(split);
        let number: f64 = number.parse().map_err(|_| invalid())?;
        let multiplier = match unit {
            "bps" | "b/s" => 1e0,
            "kbps" | "kb/s" | "Kbps" | "Kb/s" => 1e3,
            "Mbps" | "Mb/s" => 1e6,
            "Gbps" | "Gb/s" => 1e9,
            _ => return Err(invalid()),
        };
        Ok(DataRate((number * multiplier).round() as u64))
    }
}

/// The kind of medium a channel models. Only used for naming and reporting, all channels
/// behave as fixed-rate, fixed-delay links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    PointToPoint,
    Csma,
    Wifi,
    Radio,
}

/// A medium connecting two or more devices.
#[derive(Debug)]
pub struct Channel {
    pub(crate) id: ChannelId,
    pub(crate) kind: ChannelKind,
    pub(crate) data_rate: DataRate,
    pub(crate) delay: Duration,
    pub(crate) devices: Vec<DeviceId>,
}

impl Channel {
    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn data_rate(&self) -> DataRate {
        self.data_rate
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    /// Point-to-point and radio channels join exactly two devices.
    pub(crate) fn max_devices(&self) -> usize {
        match self.kind {
            ChannelKind::PointToPoint | ChannelKind::Radio => 2,
            ChannelKind::Csma | ChannelKind::Wifi => usize::MAX,
        }
    }
}

/// Per-device packet counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCounters {
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub dropped: u64,
}

/// A network interface attached to a node and, once connected, a channel.
#[derive(Debug)]
pub struct Device {
    pub(crate) id: DeviceId,
    pub(crate) node: NodeId,
    pub(crate) mac: MacAddr,
    pub(crate) addr: Option<(Ipv4Addr, u8)>,
    pub(crate) channel: Option<ChannelId>,
    pub(crate) interceptor: Option<InterceptorId>,
    pub(crate) pcap: Option<PcapWriter<io::BufWriter<fs::File>>>,
    pub(crate) busy_until: Duration,
    pub(crate) counters: DeviceCounters,
}

impl Device {
    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn ipv4_addr(&self) -> Option<Ipv4Addr> {
        self.addr.map(|(addr, _)| addr)
    }

    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    pub fn counters(&self) -> DeviceCounters {
        self.counters
    }
}
