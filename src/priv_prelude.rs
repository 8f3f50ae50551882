pub use crate::prelude::*;
pub use std::{io, mem, fmt, fs, cmp};
pub use std::io::Write;
pub use std::collections::{HashMap, BTreeMap, BinaryHeap, VecDeque};
pub use std::net::{Ipv4Addr, SocketAddrV4};
pub use std::path::{Path, PathBuf};
pub use std::time::Duration;
pub use bytes::{Buf, BufMut, Bytes, BytesMut};
pub use log::{trace, debug, info, warn};
pub use net_literals::ipv4;
pub use rand::{Rng, SeedableRng};
pub use rand::rngs::StdRng;

pub(crate) use crate::{
    time::DurationExt,
    wire::checksum,
};
