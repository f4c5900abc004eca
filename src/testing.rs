/* src/testing.rs */

//! Test fixtures: synthetic xdb buffers and an instrumented lookup.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::xdb::{
    GeoLookup, HEADER_INFO_LENGTH, SEGMENT_INDEX_SIZE, VECTOR_INDEX_COLS, VECTOR_INDEX_ROWS,
    VECTOR_INDEX_SIZE, XdbSearcher,
};

pub const AUSTRALIA: &str = "1.1.1.1";
pub const HANGZHOU: &str = "115.236.8.8";
pub const SHANGHAI: &str = "101.80.1.1";
pub const MALFORMED: &str = "9.9.9.9";

/// Builds an xdb buffer from `(start, end, region)` segments.
#[derive(Default)]
pub struct XdbBuilder {
    segments: Vec<(u32, u32, String)>,
}

impl XdbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment(mut self, start: &str, end: &str, region: &str) -> Self {
        let start: Ipv4Addr = start.parse().unwrap();
        let end: Ipv4Addr = end.parse().unwrap();
        self.segments.push((start.into(), end.into(), region.to_string()));
        self
    }

    pub fn bytes(mut self) -> Vec<u8> {
        self.segments.sort_by_key(|(start, _, _)| *start);

        let vector_len = VECTOR_INDEX_ROWS * VECTOR_INDEX_COLS * VECTOR_INDEX_SIZE;
        let mut buf = vec![0u8; HEADER_INFO_LENGTH + vector_len];

        let mut data_refs = Vec::with_capacity(self.segments.len());
        for (_, _, region) in &self.segments {
            data_refs.push((buf.len() as u32, region.len() as u16));
            buf.extend_from_slice(region.as_bytes());
        }

        let index_start = buf.len() as u32;
        let mut cells = vec![(0u32, 0u32); VECTOR_INDEX_ROWS * VECTOR_INDEX_COLS];
        for ((start, end, _), (data_ptr, data_len)) in self.segments.iter().zip(&data_refs) {
            let ptr = buf.len() as u32;
            buf.extend_from_slice(&start.to_le_bytes());
            buf.extend_from_slice(&end.to_le_bytes());
            buf.extend_from_slice(&data_len.to_le_bytes());
            buf.extend_from_slice(&data_ptr.to_le_bytes());

            for cell in (start >> 16)..=(end >> 16) {
                let entry = &mut cells[cell as usize];
                if entry.0 == 0 {
                    entry.0 = ptr;
                }
                entry.1 = ptr;
            }
        }
        let index_end = buf.len() as u32 - SEGMENT_INDEX_SIZE as u32;

        for (i, (start_ptr, end_ptr)) in cells.iter().enumerate() {
            let offset = HEADER_INFO_LENGTH + i * VECTOR_INDEX_SIZE;
            buf[offset..offset + 4].copy_from_slice(&start_ptr.to_le_bytes());
            buf[offset + 4..offset + 8].copy_from_slice(&end_ptr.to_le_bytes());
        }

        buf[0..2].copy_from_slice(&2u16.to_le_bytes());
        buf[2..4].copy_from_slice(&1u16.to_le_bytes());
        buf[4..8].copy_from_slice(&1_700_000_000u32.to_le_bytes());
        buf[8..12].copy_from_slice(&index_start.to_le_bytes());
        buf[12..16].copy_from_slice(&index_end.to_le_bytes());
        buf
    }

    pub fn build(self) -> XdbSearcher {
        XdbSearcher::from_bytes(self.bytes()).unwrap()
    }
}

pub fn sample_builder() -> XdbBuilder {
    XdbBuilder::new()
        .segment("1.1.1.0", "1.1.1.255", "澳大利亚|0|0|0|0")
        .segment("9.9.9.0", "9.9.9.255", "Broken|data")
        .segment("101.80.0.0", "101.80.255.255", "中国|0|上海|上海市|电信")
        .segment("115.236.0.0", "115.236.255.255", "中国|0|浙江省|杭州市|电信")
}

pub fn sample_bytes() -> Vec<u8> {
    sample_builder().bytes()
}

pub fn sample_searcher() -> XdbSearcher {
    sample_builder().build()
}

/// Wraps a lookup and counts how often it is queried.
pub struct CountingLookup<L> {
    inner: L,
    calls: AtomicUsize,
}

impl<L> CountingLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<L: GeoLookup> GeoLookup for CountingLookup<L> {
    fn search(&self, ip: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.search(ip)
    }
}
