pub use crate::{
    app::{AppContext, Application, PacketSink, SinkRxObserver, UdpClient, UdpEchoClient, UdpEchoServer},
    console::Console,
    delay::{DelayDistribution, RandomDelayGenerator},
    error::{ConfigError, OutputError, ScenarioError, ScheduleError, SimError},
    flow::{FiveTuple, FlowClassifier, FlowId, FlowMonitor, FlowRecord, FlowStatisticsAggregator},
    intercept::{Decision, DeferredDeliverySink, DelayedPacket, InterceptContext, PacketInterceptor},
    mac::MacAddr,
    network::{Ipv4AddrAllocator, Ipv4Network},
    packet::{Packet, PacketUid},
    probe::EndToEndDelayProbe,
    seq_ts::SeqTsHeader,
    sim::{
        AppId, ChannelId, ChannelKind, DataRate, DeviceId, InterceptorId, NodeId, Route, RunStats,
        Simulator,
    },
};
