/* src/xdb.rs */

//! In-memory searcher for the ip2region `xdb` database format.
//!
//! The whole file is loaded into a buffer once; lookups are pure reads on it,
//! so a single searcher can be shared across threads without locking.

use std::net::Ipv4Addr;
use std::path::Path;

use crate::error::{GeoGuardError, Result};

pub const HEADER_INFO_LENGTH: usize = 256;
pub const VECTOR_INDEX_ROWS: usize = 256;
pub const VECTOR_INDEX_COLS: usize = 256;
pub const VECTOR_INDEX_SIZE: usize = 8;
pub const SEGMENT_INDEX_SIZE: usize = 14;

const VECTOR_INDEX_LENGTH: usize = VECTOR_INDEX_ROWS * VECTOR_INDEX_COLS * VECTOR_INDEX_SIZE;

/// Point lookup against a geo database.
///
/// Implementations return the raw region answer, `country|region|province|city|isp`
/// for ip2region. An empty string means no segment covers the address.
pub trait GeoLookup: Send + Sync {
    fn search(&self, ip: &str) -> Result<String>;
}

/// Metadata stored in the first bytes of an xdb file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XdbHeader {
    pub version: u16,
    pub index_policy: u16,
    pub created_at: u32,
    pub start_index_ptr: u32,
    pub end_index_ptr: u32,
}

/// Searcher over a fully loaded xdb buffer.
#[derive(Clone)]
pub struct XdbSearcher {
    content: Vec<u8>,
    header: XdbHeader,
}

impl std::fmt::Debug for XdbSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XdbSearcher")
            .field("len", &self.content.len())
            .field("header", &self.header)
            .finish()
    }
}

impl XdbSearcher {
    /// Load the whole database file into memory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|source| GeoGuardError::DatabaseIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(content)
    }

    /// Build a searcher from an in-memory database buffer.
    pub fn from_bytes(content: Vec<u8>) -> Result<Self> {
        let min_len = HEADER_INFO_LENGTH + VECTOR_INDEX_LENGTH;
        if content.len() < min_len {
            return Err(GeoGuardError::InvalidDatabase(format!(
                "buffer is {} bytes, expected at least {}",
                content.len(),
                min_len
            )));
        }

        let header = XdbHeader {
            version: read_u16(&content, 0)?,
            index_policy: read_u16(&content, 2)?,
            created_at: read_u32(&content, 4)?,
            start_index_ptr: read_u32(&content, 8)?,
            end_index_ptr: read_u32(&content, 12)?,
        };

        Ok(Self { content, header })
    }

    /// Metadata parsed from the file header.
    pub fn header(&self) -> XdbHeader {
        self.header
    }

    /// Size of the loaded buffer in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Look up a parsed IPv4 address.
    pub fn search_ip(&self, ip: Ipv4Addr) -> Result<String> {
        let ip = u32::from(ip);
        let [il0, il1, _, _] = ip.to_be_bytes();
        let cell = HEADER_INFO_LENGTH
            + il0 as usize * VECTOR_INDEX_COLS * VECTOR_INDEX_SIZE
            + il1 as usize * VECTOR_INDEX_SIZE;
        let start_ptr = read_u32(&self.content, cell)? as usize;
        let end_ptr = read_u32(&self.content, cell + 4)? as usize;

        // No segment starts in this /16.
        if start_ptr == 0 || end_ptr < start_ptr {
            return Ok(String::new());
        }

        let mut low: isize = 0;
        let mut high = ((end_ptr - start_ptr) / SEGMENT_INDEX_SIZE) as isize;
        while low <= high {
            let mid = (low + high) >> 1;
            let block = start_ptr + mid as usize * SEGMENT_INDEX_SIZE;
            let start_ip = read_u32(&self.content, block)?;
            if ip < start_ip {
                high = mid - 1;
                continue;
            }

            let end_ip = read_u32(&self.content, block + 4)?;
            if ip > end_ip {
                low = mid + 1;
                continue;
            }

            let data_len = read_u16(&self.content, block + 8)? as usize;
            let data_ptr = read_u32(&self.content, block + 10)? as usize;
            let data = self
                .content
                .get(data_ptr..data_ptr + data_len)
                .ok_or_else(|| out_of_range(data_ptr))?;
            return Ok(String::from_utf8_lossy(data).into_owned());
        }

        Ok(String::new())
    }
}

impl GeoLookup for XdbSearcher {
    fn search(&self, ip: &str) -> Result<String> {
        let addr: Ipv4Addr = ip
            .parse()
            .map_err(|_| GeoGuardError::InvalidIp(ip.to_string()))?;
        self.search_ip(addr)
    }
}

fn read_u16(buf: &[u8], offset: usize) -> Result<u16> {
    let bytes = buf.get(offset..offset + 2).ok_or_else(|| out_of_range(offset))?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    let bytes = buf.get(offset..offset + 4).ok_or_else(|| out_of_range(offset))?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn out_of_range(offset: usize) -> GeoGuardError {
    GeoGuardError::InvalidDatabase(format!("pointer {offset} is out of range"))
}
