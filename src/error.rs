use crate::priv_prelude::*;
use crate::sim::{AppId, DeviceId, NodeId};

/// Errors returned when an event cannot be put on the event queue. These indicate a bug in
/// whatever tried to schedule the event and abort the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("cannot schedule an event at {at:?}, simulation time is already {now:?}")]
    InPast {
        at: Duration,
        now: Duration,
    },
    #[error("cannot schedule an event at {at:?}, the simulation has stopped")]
    Stopped {
        at: Duration,
    },
}

/// Errors in scenario configuration, detected before the simulation is built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Number of {what} {requested} specified exceeds the mobility bounding box ({capacity} max)")]
    TooManyNodes {
        what: &'static str,
        requested: u32,
        capacity: u32,
    },
    #[error("Number of {what} must be at least 1")]
    NoNodes {
        what: &'static str,
    },
    #[error("invalid {name}: {reason}")]
    Invalid {
        name: &'static str,
        reason: String,
    },
}

/// Errors writing or reading the files a run produces.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Errors raised while building or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("no such node {0}")]
    NoSuchNode(NodeId),
    #[error("no such device {0}")]
    NoSuchDevice(DeviceId),
    #[error("no such application {0}")]
    NoSuchApp(AppId),
    #[error("port {port} already bound on node {node}")]
    PortInUse {
        node: NodeId,
        port: u16,
    },
    #[error("ran out of ephemeral ports on node {0}")]
    PortsExhausted(NodeId),
    #[error("device {device} cannot join channel: {reason}")]
    Attach {
        device: DeviceId,
        reason: &'static str,
    },
}

impl From<io::Error> for SimError {
    fn from(err: io::Error) -> SimError {
        SimError::Output(OutputError::Io(err))
    }
}

/// Everything that can make a scenario fail.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

impl From<io::Error> for ScenarioError {
    fn from(err: io::Error) -> ScenarioError {
        ScenarioError::Output(OutputError::Io(err))
    }
}
