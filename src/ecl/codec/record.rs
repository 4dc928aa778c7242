//! Fortran unformatted sequential records.
//!
//! Every record on disk is `[len:4][payload:len][len:4]`. The two markers
//! must agree; a mismatch means the file is corrupt from that point on.
//! Formatted streams share the same API but carry no markers, so the
//! begin/end calls do nothing for them.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};

use crate::ecl::types::error::{EclError, Result};
use crate::ecl::types::models::{ByteOrder, StreamMode};
use crate::ecl::utils;

/// Path shown in error messages for streams that do not come from a file.
const MEMORY_PATH: &str = "<memory>";

/// A record-oriented stream over a seekable byte source or sink.
#[derive(Debug)]
pub struct RecordStream<S> {
    inner: S,
    mode: StreamMode,
    formatted: bool,
    byte_order: ByteOrder,
    /// Declared length of the open record, `None` between records.
    active_header: Option<u32>,
    /// Payload bytes moved since the open record began.
    transferred: u64,
    /// Index of the next record to be read or written.
    record: u64,
    path: PathBuf,
    /// Set after a corrupt record; every later read fails.
    poisoned: bool,
    /// Last measured length of the underlying stream.
    stream_len: Option<u64>,
}

impl RecordStream<File> {
    /// Opens an existing file for reading.
    pub fn open_read(path: impl AsRef<Path>, formatted: bool, byte_order: ByteOrder) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening record stream for reading: {}", path.display());
        let file = File::open(path)?;
        Ok(Self::new(file, StreamMode::Read, formatted, byte_order).with_path(path))
    }

    /// Creates (or truncates) a file for writing.
    pub fn open_write(path: impl AsRef<Path>, formatted: bool, byte_order: ByteOrder) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening record stream for writing: {}", path.display());
        let file = File::create(path)?;
        Ok(Self::new(file, StreamMode::Write, formatted, byte_order).with_path(path))
    }

    /// Opens a file for writing at its end, creating it if needed.
    pub fn open_append(path: impl AsRef<Path>, formatted: bool, byte_order: ByteOrder) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening record stream for appending: {}", path.display());
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.seek(SeekFrom::End(0))?;
        Ok(Self::new(file, StreamMode::Append, formatted, byte_order).with_path(path))
    }
}

impl<S> RecordStream<S> {
    /// Wraps an already open source or sink.
    pub fn new(inner: S, mode: StreamMode, formatted: bool, byte_order: ByteOrder) -> Self {
        Self {
            inner,
            mode,
            formatted,
            byte_order,
            active_header: None,
            transferred: 0,
            record: 0,
            path: PathBuf::from(MEMORY_PATH),
            poisoned: false,
            stream_len: None,
        }
    }

    /// Sets the path reported in error messages.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Number of records completed so far.
    pub fn record_count(&self) -> u64 {
        self.record
    }

    /// Declared length of the currently open record.
    pub fn active_header(&self) -> Option<u32> {
        self.active_header
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn ensure_readable(&self) -> Result<()> {
        if self.poisoned {
            return Err(EclError::InvalidState(format!(
                "{} is corrupt after record #{}; no further reads are possible",
                self.path.display(),
                self.record
            )));
        }
        if self.mode != StreamMode::Read {
            return Err(EclError::InvalidState("stream is not open for reading".to_string()));
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.mode == StreamMode::Read {
            return Err(EclError::InvalidState("stream is not open for writing".to_string()));
        }
        Ok(())
    }

    /// Checks a transfer of `len` more bytes against the open record.
    fn account(&mut self, len: usize) -> Result<()> {
        if self.formatted {
            return Ok(());
        }
        let header = self
            .active_header
            .ok_or_else(|| EclError::InvalidState("payload transfer outside of a record".to_string()))?;
        let total = self.transferred + len as u64;
        if total > u64::from(header) {
            return Err(EclError::InvalidState(format!(
                "record #{} declares {} bytes but {} were requested",
                self.record, header, total
            )));
        }
        self.transferred = total;
        Ok(())
    }
}

impl<S: Seek> RecordStream<S> {
    /// Current byte offset in the underlying stream.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Moves to an absolute offset. Only allowed between records.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        if self.active_header.is_some() {
            return Err(EclError::InvalidState("cannot seek inside an open record".to_string()));
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

impl<S: Read + Seek> RecordStream<S> {
    /// Reads up to four marker bytes and returns how many were available.
    fn fill_marker(&mut self, buf: &mut [u8; 4]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.inner.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Reads a length marker, `None` at a clean end of file.
    fn read_marker(&mut self) -> Result<Option<u32>> {
        let mut buf = [0u8; 4];
        match self.fill_marker(&mut buf)? {
            0 => Ok(None),
            4 => {
                let value = utils::read_i32(&mut &buf[..], self.byte_order)?;
                if value < 0 {
                    return Err(EclError::InvalidFormat(format!(
                        "negative record length {} at record #{} in {}",
                        value,
                        self.record,
                        self.path.display()
                    )));
                }
                Ok(Some(value as u32))
            }
            _ => Err(EclError::InvalidFormat(format!(
                "truncated record marker at record #{} in {}",
                self.record,
                self.path.display()
            ))),
        }
    }

    /// Reads a trailer as its raw 32-bit pattern, `None` if the stream ends
    /// before all four bytes.
    fn read_trailer(&mut self) -> Result<Option<u32>> {
        let mut buf = [0u8; 4];
        if self.fill_marker(&mut buf)? < buf.len() {
            return Ok(None);
        }
        Ok(Some(utils::read_i32(&mut &buf[..], self.byte_order)? as u32))
    }

    /// Whether `len` payload bytes and a trailer fit before the end of the
    /// stream. The length is measured again before reporting a shortfall, so
    /// a file that grows while open is still read.
    fn record_fits(&mut self, len: u32) -> Result<bool> {
        let position = self.inner.stream_position()?;
        let needed = position + u64::from(len) + 4;
        if self.stream_len.is_some_and(|end| needed <= end) {
            return Ok(true);
        }
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(position))?;
        self.stream_len = Some(end);
        Ok(needed <= end)
    }

    /// Marks the stream corrupt at the current record.
    fn corrupt(&mut self, header: u32, trailer: u32) -> EclError {
        self.poisoned = true;
        self.active_header = None;
        warn!(
            "Corrupt record #{} in {}: header={}, trailer={}",
            self.record,
            self.path.display(),
            header,
            trailer
        );
        EclError::CorruptRecord { path: self.path.clone(), record: self.record, header, trailer }
    }

    /// Starts reading the next record and returns its declared length.
    ///
    /// Returns `None` at a clean end of file. Formatted streams have no
    /// markers and always report `Some(0)`.
    pub fn begin_read(&mut self) -> Result<Option<u32>> {
        self.ensure_readable()?;
        if self.formatted {
            return Ok(Some(0));
        }
        if self.active_header.is_some() {
            return Err(EclError::InvalidState(format!(
                "begin_read called while record #{} is still open",
                self.record
            )));
        }
        let header = self.read_marker()?;
        if let Some(len) = header {
            if !self.record_fits(len)? {
                return Err(self.corrupt(len, 0));
            }
            trace!("Record #{}: {} bytes", self.record, len);
            self.active_header = Some(len);
            self.transferred = 0;
        }
        Ok(header)
    }

    /// Reads exactly `buf.len()` payload bytes of the open record.
    pub fn read_payload(&mut self, buf: &mut [u8]) -> Result<()> {
        self.ensure_readable()?;
        self.account(buf.len())?;
        self.inner.read_exact(buf)?;
        Ok(())
    }

    /// Finishes the open record by reading and checking its trailer.
    pub fn end_read(&mut self) -> Result<()> {
        self.ensure_readable()?;
        if self.formatted {
            return Ok(());
        }
        let header = self
            .active_header
            .ok_or_else(|| EclError::InvalidState("end_read called outside of a record".to_string()))?;
        if self.transferred != u64::from(header) {
            return Err(EclError::InvalidState(format!(
                "record #{} declares {} bytes but {} were read",
                self.record, header, self.transferred
            )));
        }
        let trailer = match self.read_trailer() {
            Ok(Some(trailer)) if trailer == header => trailer,
            Ok(other) => return Err(self.corrupt(header, other.unwrap_or(0))),
            Err(e) => {
                self.poisoned = true;
                self.active_header = None;
                return Err(e);
            }
        };
        self.active_header = None;
        trace!("Record #{} closed ({} bytes)", self.record, trailer);
        self.record += 1;
        Ok(())
    }

    /// Skips the next record with a seek, still checking both markers.
    ///
    /// Returns `false` at a clean end of file.
    pub fn skip_record(&mut self) -> Result<bool> {
        let Some(len) = self.begin_read()? else {
            return Ok(false);
        };
        if self.formatted {
            return Ok(true);
        }
        self.inner.seek(SeekFrom::Current(i64::from(len)))?;
        self.transferred = u64::from(len);
        self.end_read()?;
        Ok(true)
    }

    /// Reads a whole record, `None` at a clean end of file.
    ///
    /// The payload buffer is allocated only after the declared length has
    /// been checked against the bytes left in the stream.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(len) = self.begin_read()? else {
            return Ok(None);
        };
        let mut payload = vec![0u8; len as usize];
        self.read_payload(&mut payload)?;
        self.end_read()?;
        Ok(Some(payload))
    }
}

impl<S: Write + Seek> RecordStream<S> {
    /// Starts a record of `len` payload bytes by writing its header.
    pub fn begin_write(&mut self, len: u32) -> Result<()> {
        self.ensure_writable()?;
        if self.formatted {
            return Ok(());
        }
        if self.active_header.is_some() {
            return Err(EclError::InvalidState(format!(
                "begin_write called while record #{} is still open",
                self.record
            )));
        }
        if len > i32::MAX as u32 {
            return Err(EclError::InvalidFormat(format!("record of {} bytes is too large", len)));
        }
        utils::write_i32(&mut self.inner, len as i32, self.byte_order)?;
        self.active_header = Some(len);
        self.transferred = 0;
        Ok(())
    }

    /// Writes payload bytes into the open record.
    pub fn write_payload(&mut self, buf: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        self.account(buf.len())?;
        self.inner.write_all(buf)?;
        Ok(())
    }

    /// Finishes the open record by writing its trailer.
    pub fn end_write(&mut self) -> Result<()> {
        self.ensure_writable()?;
        if self.formatted {
            return Ok(());
        }
        let header = self
            .active_header
            .ok_or_else(|| EclError::InvalidState("end_write called outside of a record".to_string()))?;
        if self.transferred != u64::from(header) {
            return Err(EclError::InvalidState(format!(
                "record #{} declares {} bytes but {} were written",
                self.record, header, self.transferred
            )));
        }
        utils::write_i32(&mut self.inner, header as i32, self.byte_order)?;
        self.active_header = None;
        self.record += 1;
        Ok(())
    }

    /// Writes a complete record.
    pub fn write_record(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len())
            .map_err(|_| EclError::InvalidFormat(format!("record of {} bytes is too large", payload.len())))?;
        self.begin_write(len)?;
        self.write_payload(payload)?;
        self.end_write()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Probes whether a stream starts with a Fortran record and in which byte order.
///
/// Reads a header, seeks over that many bytes and reads the trailer. Big-endian
/// is tried first, then little-endian. A header of zero never matches. The
/// stream position is restored in every case.
pub fn is_fortran_file<R: Read + Seek>(reader: &mut R) -> Result<Option<ByteOrder>> {
    let start = reader.stream_position()?;
    let mut detected = None;
    for order in [ByteOrder::Big, ByteOrder::Big.flipped()] {
        reader.seek(SeekFrom::Start(start))?;
        if probe_record(reader, order).unwrap_or(false) {
            detected = Some(order);
            break;
        }
    }
    reader.seek(SeekFrom::Start(start))?;
    debug!("Fortran record probe: {:?}", detected);
    Ok(detected)
}

fn probe_record<R: Read + Seek>(reader: &mut R, order: ByteOrder) -> std::io::Result<bool> {
    let header = utils::read_i32(reader, order)?;
    if header <= 0 {
        return Ok(false);
    }
    reader.seek(SeekFrom::Current(i64::from(header)))?;
    let trailer = utils::read_i32(reader, order)?;
    Ok(trailer == header)
}
