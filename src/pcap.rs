use crate::priv_prelude::*;

const MAGIC: u32 = 0xa1b2_3c4d;
const VERSION_MAJOR: u16 = 2;
const VERSION_MINOR: u16 = 4;
const SNAPLEN: u32 = 65_536;
const LINKTYPE_RAW: u32 = 101;

/// Size of the global file header.
pub const FILE_HEADER_LEN: usize = 24;
/// Size of the header preceding each record.
pub const RECORD_HEADER_LEN: usize = 16;

/// Writes IP packets to a pcap stream, timestamped with virtual time. Uses the nanosecond
/// variant of the format.
pub struct PcapWriter<W: Write> {
    writer: W,
    records: u64,
}

impl<W: Write> fmt::Debug for PcapWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f
        .debug_struct("PcapWriter")
        .field("records", &self.records)
        .finish()
    }
}

impl PcapWriter<io::BufWriter<fs::File>> {
    /// Create (or truncate) the file at `path` and write the pcap header to it.
    pub fn create(path: &Path) -> io::Result<PcapWriter<io::BufWriter<fs::File>>> {
        let file = fs::File::create(path)?;
        PcapWriter::new(io::BufWriter::new(file))
    }
}

impl<W: Write> PcapWriter<W> {
    pub fn new(mut writer: W) -> io::Result<PcapWriter<W>> {
        let mut header = BytesMut::with_capacity(FILE_HEADER_LEN);
        header.put_u32_le(MAGIC);
        header.put_u16_le(VERSION_MAJOR);
        header.put_u16_le(VERSION_MINOR);
        header.put_i32_le(0);
        header.put_u32_le(0);
        header.put_u32_le(SNAPLEN);
        header.put_u32_le(LINKTYPE_RAW);
        writer.write_all(&header)?;
        Ok(PcapWriter {
            writer,
            records: 0,
        })
    }

    /// Append one packet captured at virtual time `at`.
    pub fn write_packet(&mut self, at: Duration, data: &[u8]) -> io::Result<()> {
        let captured = cmp::min(data.len(), SNAPLEN as usize);
        let mut header = BytesMut::with_capacity(RECORD_HEADER_LEN);
        header.put_u32_le(at.as_secs() as u32);
        header.put_u32_le(at.subsec_nanos());
        header.put_u32_le(captured as u32);
        header.put_u32_le(data.len() as u32);
        self.writer.write_all(&header)?;
        self.writer.write_all(&data[..captured])?;
        self.records += 1;
        Ok(())
    }

    /// Number of packets written so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
