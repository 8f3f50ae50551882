//! The two canned topologies.

pub mod lte;
pub mod wifi;

use crate::priv_prelude::*;
use crate::error::SimError;
use crate::sim::{DeviceId, Simulator};

/// Capture `device` to `<dir>/<prefix>-<node>-<index>.pcap`, where `index` is the device's
/// position on its node.
pub(crate) fn enable_pcap(
    sim: &mut Simulator,
    dir: &Path,
    prefix: &str,
    device: DeviceId,
) -> Result<PathBuf, SimError> {
    let node = sim.device(device)?.node();
    let index = sim.node(node)?.device_index(device).ok_or(SimError::NoSuchDevice(device))?;
    let path = dir.join(format!("{}-{}-{}.pcap", prefix, node, index));
    sim.enable_pcap(device, &path)?;
    Ok(path)
}
