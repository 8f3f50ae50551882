//! Scenario parameters.
//!
//! Defaults reproduce the reference runs. Every config is validated before a scenario builds
//! anything or creates any file.

use crate::priv_prelude::*;
use crate::error::ConfigError;
use crate::flow::BinWidths;
use crate::scenario;

/// Parameters of the cellular scenario: UEs attached one per cell, a packet gateway and a
/// remote host, with random delays injected at the cells and the gateway's internet side.
#[derive(Debug, Clone, PartialEq)]
pub struct LteConfig {
    /// Number of cells, and of UEs.
    pub nodes: u16,
    pub sim_time: Duration,
    /// Spacing of the node layout, in metres.
    pub distance: f64,
    pub inter_packet_interval: Duration,
    /// UDP payload size of the generated traffic, timestamp header included.
    pub packet_size: usize,
    pub max_packets: u32,
    pub app_start: Duration,
    pub seed: u64,
    /// Mean of the injected delay, in milliseconds.
    pub delay_mean_ms: f64,
    /// Variance of the injected delay.
    pub delay_variance: f64,
    pub bin_widths: BinWidths,
    /// Flows with an id up to this are left out of the console report.
    pub hidden_flows: u32,
    pub output_dir: PathBuf,
}

impl Default for LteConfig {
    fn default() -> LteConfig {
        LteConfig {
            nodes: 2,
            sim_time: Duration::from_secs(10),
            distance: 10_000.0,
            inter_packet_interval: Duration::from_millis(20),
            packet_size: 100,
            max_packets: 400,
            app_start: Duration::from_millis(10),
            seed: 3,
            delay_mean_ms: 5.0,
            delay_variance: 3.0,
            bin_widths: BinWidths {
                delay: 0.001,
                jitter: 0.001,
                packet_size: 2000.0,
            },
            hidden_flows: 2,
            output_dir: PathBuf::from("."),
        }
    }
}

impl LteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes == 0 {
            return Err(ConfigError::NoNodes { what: "nodes" });
        }
        let capacity = scenario::lte::MAX_CELLS;
        if u32::from(self.nodes) > capacity {
            return Err(ConfigError::TooManyNodes {
                what: "nodes",
                requested: u32::from(self.nodes),
                capacity,
            });
        }
        positive("simulation time", self.sim_time)?;
        positive("inter-packet interval", self.inter_packet_interval)?;
        if !(self.distance.is_finite() && self.distance >= 0.0) {
            return Err(ConfigError::Invalid {
                name: "distance",
                reason: format!("{} is not a non-negative number", self.distance),
            });
        }
        if !(self.delay_mean_ms.is_finite()) {
            return Err(ConfigError::Invalid {
                name: "delay mean",
                reason: format!("{} is not a number", self.delay_mean_ms),
            });
        }
        if !(self.delay_variance.is_finite() && self.delay_variance >= 0.0) {
            return Err(ConfigError::Invalid {
                name: "delay variance",
                reason: format!("{} is not a non-negative number", self.delay_variance),
            });
        }
        Ok(())
    }
}

/// Parameters of the wireless scenario: WiFi stations behind an access point, a
/// point-to-point link and a CSMA LAN hosting an echo server.
#[derive(Debug, Clone, PartialEq)]
pub struct WifiConfig {
    /// Number of CSMA nodes besides the one at the end of the point-to-point link.
    pub n_csma: u32,
    pub n_wifi: u32,
    /// Whether the echo applications log what they do.
    pub verbose: bool,
    pub sim_time: Duration,
    pub output_dir: PathBuf,
}

impl Default for WifiConfig {
    fn default() -> WifiConfig {
        WifiConfig {
            n_csma: 3,
            n_wifi: 3,
            verbose: true,
            sim_time: Duration::from_secs(10),
            output_dir: PathBuf::from("."),
        }
    }
}

impl WifiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_wifi == 0 {
            return Err(ConfigError::NoNodes { what: "wifi nodes" });
        }
        let capacity = scenario::wifi::station_capacity();
        if self.n_wifi > capacity {
            return Err(ConfigError::TooManyNodes {
                what: "wifi nodes",
                requested: self.n_wifi,
                capacity,
            });
        }
        if self.n_csma > 253 {
            return Err(ConfigError::TooManyNodes {
                what: "csma nodes",
                requested: self.n_csma,
                capacity: 253,
            });
        }
        positive("simulation time", self.sim_time)
    }
}

fn positive(name: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value == Duration::ZERO {
        return Err(ConfigError::Invalid {
            name,
            reason: String::from("must be greater than zero"),
        });
    }
    Ok(())
}
