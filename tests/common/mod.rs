#![allow(dead_code)]

use std::io::{Cursor, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use eclio::ecl::codec::RecordStream;
use eclio::ecl::format::{binary, formatted};
use eclio::ecl::types::models::StreamMode;
use eclio::{ArrayFile, ByteOrder, EclArray, OpenOptions};

pub fn binary_bytes(arrays: &[EclArray], order: ByteOrder) -> Vec<u8> {
    let mut stream = RecordStream::new(Cursor::new(Vec::new()), StreamMode::Write, false, order);
    for array in arrays {
        binary::write_array(&mut stream, array).expect("write binary array");
    }
    stream.into_inner().into_inner()
}

pub fn formatted_bytes(arrays: &[EclArray]) -> Vec<u8> {
    let mut stream = RecordStream::new(Cursor::new(Vec::new()), StreamMode::Write, true, ByteOrder::Big);
    for array in arrays {
        formatted::write_array(&mut stream, array).expect("write formatted array");
    }
    stream.into_inner().into_inner()
}

pub fn binary_file(arrays: &[EclArray]) -> ArrayFile<Cursor<Vec<u8>>> {
    ArrayFile::from_reader(Cursor::new(binary_bytes(arrays, ByteOrder::Big)), OpenOptions::default())
        .expect("index binary file")
}

/// An INTEHEAD of 300 items, zero except for `items`. UNIT is metric.
pub fn intehead(items: &[(usize, i32)]) -> Vec<i32> {
    let mut ih = vec![0; 300];
    ih[2] = 1;
    for &(index, value) in items {
        ih[index] = value;
    }
    ih
}

/// Words padded into `stride`-sized windows, one window per entry.
pub fn windows(entries: &[&[&str]], stride: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(entries.len() * stride);
    for words in entries {
        let mut window: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        window.resize(stride, String::new());
        out.extend(window);
    }
    out
}

/// A reader that counts every `read` and `seek` call.
pub struct CountingReader {
    inner: Cursor<Vec<u8>>,
    pub calls: Arc<AtomicUsize>,
}

impl CountingReader {
    pub fn new(bytes: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { inner: Cursor::new(bytes), calls: Arc::clone(&calls) }, calls)
    }
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.read(buf)
    }
}

impl Seek for CountingReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.seek(pos)
    }
}
