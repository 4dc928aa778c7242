use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use log::{debug, info, warn};

use super::codec::record::is_fortran_file;
use super::format::{binary, formatted, ScanResult};
use super::types::elements::{ArrayData, ArrayElement};
use super::types::error::{EclError, Result};
use super::types::models::{ArrayEntry, ArrayType, ByteOrder};
use super::view::ArrayView;

/// Path shown for files opened from an in-memory reader.
const MEMORY_PATH: &str = "<memory>";

/// How to open a keyword file. `None` fields are detected automatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Force the formatted (`Some(true)`) or binary (`Some(false)`) reader.
    pub formatted: Option<bool>,
    /// Force the byte order of a binary file.
    pub byte_order: Option<ByteOrder>,
}

/// Whether a file name uses one of the formatted extensions (`.FUNRST`,
/// `.FEGRID`, `.FINIT`, `.FSMSPEC`, `.FUNSMRY`, `.FRFT`, `.F0001`, ...).
pub fn is_formatted_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.len() > 1 && ext.starts_with(['F', 'f']))
}

/// An indexed ECLIPSE keyword file with lazily loaded payloads.
///
/// The header pass runs on open; payloads are read on first access and
/// kept for the lifetime of the file. Loads are serialized behind a mutex
/// so a shared `ArrayFile` can be read from several threads.
#[derive(Debug)]
pub struct ArrayFile<R = File> {
    reader: Mutex<R>,
    path: PathBuf,
    formatted: bool,
    byte_order: ByteOrder,
    entries: Vec<ArrayEntry>,
    /// Name to index of its first occurrence.
    first_index: HashMap<String, usize>,
    payloads: Vec<OnceLock<ArrayData>>,
    end_offset: u64,
    ix: OnceLock<bool>,
}

impl ArrayFile<File> {
    /// Opens a keyword file, detecting its encoding.
    ///
    /// Formatted files are recognized by their extension; the byte order of
    /// binary files is probed from the first record.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be opened
    /// - A binary file does not start with a valid Fortran record
    /// - An array header is malformed or has an unknown type
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, OpenOptions::default())
    }

    /// Opens a keyword file with explicit options.
    pub fn open_with(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening keyword file: {}", path.display());
        let file = File::open(path)?;
        let options = OpenOptions {
            formatted: Some(options.formatted.unwrap_or_else(|| is_formatted_path(path))),
            ..options
        };
        Self::build(file, options, path.to_path_buf())
    }
}

impl<R: Read + Seek> ArrayFile<R> {
    /// Indexes a keyword file held by any seekable reader.
    ///
    /// Without an explicit `formatted` option the encoding is sniffed: a
    /// formatted file starts with ` '`.
    pub fn from_reader(mut reader: R, options: OpenOptions) -> Result<Self> {
        let formatted = match options.formatted {
            Some(formatted) => formatted,
            None => sniff_formatted(&mut reader)?,
        };
        Self::build(reader, OpenOptions { formatted: Some(formatted), ..options }, PathBuf::from(MEMORY_PATH))
    }

    fn build(mut reader: R, options: OpenOptions, path: PathBuf) -> Result<Self> {
        let formatted = options.formatted.unwrap_or(false);
        let (byte_order, scan) = if formatted {
            (ByteOrder::default(), formatted::scan(&mut reader, &path)?)
        } else {
            let byte_order = match options.byte_order {
                Some(order) => order,
                None => detect_byte_order(&mut reader, &path)?,
            };
            (byte_order, binary::scan(&mut reader, byte_order, &path)?)
        };
        let ScanResult { entries, end_offset } = scan;

        let mut first_index = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            first_index.entry(entry.name.clone()).or_insert(index);
        }
        let payloads = entries.iter().map(|_| OnceLock::new()).collect();
        debug!(
            "Indexed {} arrays ({} distinct names) in {}",
            entries.len(),
            first_index.len(),
            path.display()
        );

        Ok(Self {
            reader: Mutex::new(reader),
            path,
            formatted,
            byte_order,
            entries,
            first_index,
            payloads,
            end_offset,
            ix: OnceLock::new(),
        })
    }

    /// Returns the payload of entry `index`, loading it on first access.
    fn load_entry(&self, index: usize) -> Result<&ArrayData> {
        let cell = self
            .payloads
            .get(index)
            .ok_or(EclError::IndexOutOfRange { index, len: self.entries.len() })?;
        if let Some(data) = cell.get() {
            return Ok(data);
        }
        let mut reader = self.reader.lock().map_err(|_| EclError::LockPoisoned)?;
        if let Some(data) = cell.get() {
            return Ok(data);
        }
        let entry = &self.entries[index];
        let data = if self.formatted {
            formatted::load(&mut *reader, entry)?
        } else {
            binary::load(&mut *reader, entry, self.byte_order, &self.path)?
        };
        Ok(cell.get_or_init(|| data))
    }

    /// Type-checked, memoized access to entry `index`.
    pub fn get_at<T: ArrayElement>(&self, index: usize) -> Result<&[T]> {
        let entry = self
            .entries
            .get(index)
            .ok_or(EclError::IndexOutOfRange { index, len: self.entries.len() })?;
        let mismatch = || EclError::TypeMismatch {
            name: entry.name.clone(),
            expected: T::KIND.to_string(),
            actual: entry.array_type.name(),
        };
        if !T::accepts(entry.array_type) {
            return Err(mismatch());
        }
        T::slice(self.load_entry(index)?).ok_or_else(mismatch)
    }

    /// The first array named `name`.
    ///
    /// # Errors
    /// `MissingArray` if no such array exists, `TypeMismatch` if it is not
    /// stored as `T`.
    pub fn get<T: ArrayElement>(&self, name: &str) -> Result<&[T]> {
        let index = self.index_of(name).ok_or_else(|| EclError::MissingArray(name.to_string()))?;
        self.get_at(index)
    }

    /// Occurrence `occurrence` (0-based) of arrays named `name`.
    pub fn get_nth<T: ArrayElement>(&self, name: &str, occurrence: usize) -> Result<&[T]> {
        let index = self
            .nth_index_of(name, occurrence)
            .ok_or_else(|| EclError::MissingArray(format!("{} (occurrence {})", name, occurrence)))?;
        self.get_at(index)
    }

    /// Loads every payload in file order.
    pub fn load_all(&self) -> Result<()> {
        for index in 0..self.entries.len() {
            self.load_entry(index)?;
        }
        info!("Loaded all {} arrays of {}", self.entries.len(), self.path.display());
        Ok(())
    }

    /// Best-effort guess whether the file was written by the IX toolchain.
    ///
    /// Any `C0NN` array marks an IX file. Otherwise the first LOGI array of a
    /// binary file is sniffed for `1` as its true value.
    pub fn is_ix(&self) -> bool {
        *self.ix.get_or_init(|| {
            if self.entries.iter().any(|e| matches!(e.array_type, ArrayType::C0nn(_))) {
                return true;
            }
            if self.formatted {
                return false;
            }
            let Some(entry) = self.entries.iter().find(|e| e.array_type == ArrayType::Logi && e.count > 0) else {
                return false;
            };
            let sniffed = self
                .reader
                .lock()
                .map_err(|_| EclError::LockPoisoned)
                .and_then(|mut reader| {
                    binary::logi_uses_positive_true(&mut *reader, entry, self.byte_order, &self.path)
                });
            match sniffed {
                Ok(ix) => ix,
                Err(e) => {
                    warn!("Could not sniff LOGI array {}: {}", entry.name, e);
                    false
                }
            }
        })
    }
}

impl<R> ArrayFile<R> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Offset just past the last indexed payload.
    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    /// All entries in file order.
    pub fn entries(&self) -> &[ArrayEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.first_index.contains_key(name)
    }

    /// Number of arrays named `name`.
    pub fn count(&self, name: &str) -> usize {
        self.entries.iter().filter(|e| e.name == name).count()
    }

    /// `(name, type, count)` for every array, in file order.
    pub fn list(&self) -> Vec<(String, ArrayType, usize)> {
        self.entries.iter().map(|e| (e.name.clone(), e.array_type, e.count)).collect()
    }

    /// Index of the first array named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.first_index.get(name).copied()
    }

    /// Index of occurrence `occurrence` of arrays named `name`.
    pub fn nth_index_of(&self, name: &str, occurrence: usize) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.name == name)
            .nth(occurrence)
            .map(|(index, _)| index)
    }

    /// Whether the payload of entry `index` is already in memory.
    pub fn is_loaded(&self, index: usize) -> bool {
        self.payloads.get(index).is_some_and(|cell| cell.get().is_some())
    }

    /// A view over the whole file.
    pub fn view(&self) -> ArrayView<'_, R> {
        ArrayView::new(self, 0, self.entries.len())
    }
}

fn detect_byte_order<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<ByteOrder> {
    reader.seek(SeekFrom::Start(0))?;
    if let Some(order) = is_fortran_file(reader)? {
        debug!("Detected {:?} byte order for {}", order, path.display());
        return Ok(order);
    }
    let len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;
    if len == 0 {
        return Ok(ByteOrder::default());
    }
    Err(EclError::InvalidFormat(format!("{} is not a Fortran record file", path.display())))
}

fn sniff_formatted<R: Read + Seek>(reader: &mut R) -> Result<bool> {
    let start = reader.stream_position()?;
    let mut lead = [0u8; 2];
    let mut filled = 0;
    while filled < lead.len() {
        let n = reader.read(&mut lead[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    reader.seek(SeekFrom::Start(start))?;
    Ok(filled == 2 && lead == *b" '")
}
