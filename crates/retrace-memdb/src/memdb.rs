//! Random access over a memdb blob, owned or memory-mapped.

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::from_utf8;

use memmap2::Mmap;

use crate::errors::Result;
use crate::format::{MARKER_SIZE, MapHead, NO_ID, RECORD_SIZE, StringMarker, TokenRecord};

enum Backing {
    Buf(Vec<u8>),
    Mmap(Mmap),
}

impl Backing {
    fn data(&self) -> &[u8] {
        match self {
            Backing::Buf(buf) => buf,
            Backing::Mmap(mmap) => mmap,
        }
    }
}

/// A sourcemap view over memdb bytes.
///
/// Opening parses and validates the head only; token records and strings
/// stay in place and are decoded per access, so a memory-mapped database
/// pays I/O on first touch of a region, not at open. The database owns its
/// backing storage (buffer or mapping) for its whole lifetime.
pub struct MemDb {
    backing: Backing,
    head: MapHead,
}

/// A token looked up in a [`MemDb`], resolving strings against its heap.
#[derive(Copy, Clone)]
pub struct Token<'a> {
    db: &'a MemDb,
    record: TokenRecord,
}

impl MemDb {
    /// Opens a memdb from an owned buffer.
    pub fn from_vec(buffer: Vec<u8>) -> Result<MemDb> {
        let head = MapHead::parse(&buffer)?;
        Ok(MemDb {
            backing: Backing::Buf(buffer),
            head,
        })
    }

    /// Memory-maps a memdb file.
    ///
    /// Only the head is touched here; lookups fault pages in on demand.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<MemDb> {
        let file = File::open(path.as_ref())?;
        let mmap = unsafe { Mmap::map(&file)? };
        let head = MapHead::parse(&mmap)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            tokens = head.token_count,
            "mapped memdb"
        );
        Ok(MemDb {
            backing: Backing::Mmap(mmap),
            head,
        })
    }

    fn data(&self) -> &[u8] {
        self.backing.data()
    }

    fn record(&self, idx: u32) -> Option<TokenRecord> {
        if idx >= self.head.token_count {
            return None;
        }
        let off = self.head.index_off as usize + idx as usize * RECORD_SIZE;
        Some(TokenRecord::decode(&self.data()[off..off + RECORD_SIZE]))
    }

    fn marker(&self, table_off: u64, count: u32, idx: u32) -> Option<StringMarker> {
        if idx >= count {
            return None;
        }
        let off = table_off as usize + idx as usize * MARKER_SIZE;
        Some(StringMarker::decode(&self.data()[off..off + MARKER_SIZE]))
    }

    fn string(&self, marker: StringMarker) -> Option<&str> {
        if marker.is_absent() {
            return None;
        }
        let start = marker.pos as usize;
        self.data()
            .get(start..start + marker.len as usize)
            .and_then(|bytes| from_utf8(bytes).ok())
    }

    pub fn get_token_count(&self) -> u32 {
        self.head.token_count
    }

    /// Bounds-checked random access; decodes one record.
    pub fn get_token(&self, idx: u32) -> Option<Token<'_>> {
        self.record(idx).map(|record| Token { db: self, record })
    }

    /// Finds the token with the greatest `dst_col <= col` on exactly
    /// `line`, binary-searching the mapped records in place.
    pub fn lookup_token(&self, line: u32, col: u32) -> Option<Token<'_>> {
        let mut low = 0;
        let mut high = self.head.token_count;
        while low < high {
            let mid = (low + high) / 2;
            // in-range by the loop bounds
            let record = self.record(mid)?;
            if (line, col) < record.dst() {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        if low == 0 {
            return None;
        }
        let record = self.record(low - 1)?;
        if record.dst().0 != line {
            return None;
        }
        Some(Token { db: self, record })
    }

    pub fn get_source_count(&self) -> u32 {
        self.head.source_count
    }

    pub fn get_source(&self, src_id: u32) -> Option<&str> {
        self.marker(self.head.sources_off, self.head.source_count, src_id)
            .and_then(|m| self.string(m))
    }

    pub fn get_source_contents(&self, src_id: u32) -> Option<&str> {
        self.marker(self.head.contents_off, self.head.source_count, src_id)
            .and_then(|m| self.string(m))
    }

    pub fn has_source_contents(&self, src_id: u32) -> bool {
        self.get_source_contents(src_id).is_some()
    }

    /// Iterates `(src_id, source name)` pairs; derived fresh per call.
    pub fn sources(&self) -> impl Iterator<Item = (u32, &str)> {
        (0..self.head.source_count).filter_map(|id| self.get_source(id).map(|name| (id, name)))
    }

    pub fn get_name_count(&self) -> u32 {
        self.head.name_count
    }

    pub fn get_name(&self, name_id: u32) -> Option<&str> {
        self.marker(self.head.names_off, self.head.name_count, name_id)
            .and_then(|m| self.string(m))
    }
}

impl fmt::Debug for MemDb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MemDb")
            .field("tokens", &self.head.token_count)
            .field("sources", &self.head.source_count)
            .field("names", &self.head.name_count)
            .field("mmap", &matches!(self.backing, Backing::Mmap(_)))
            .finish()
    }
}

impl<'a> Token<'a> {
    pub fn get_dst_line(&self) -> u32 {
        self.record.dst().0
    }

    pub fn get_dst_col(&self) -> u32 {
        self.record.dst().1
    }

    pub fn get_dst(&self) -> (u32, u32) {
        self.record.dst()
    }

    pub fn get_src_line(&self) -> u32 {
        self.record.src().0
    }

    pub fn get_src_col(&self) -> u32 {
        self.record.src().1
    }

    pub fn get_src(&self) -> (u32, u32) {
        self.record.src()
    }

    pub fn get_src_id(&self) -> Option<u32> {
        if self.record.src_id == NO_ID {
            None
        } else {
            Some(self.record.src_id as u32)
        }
    }

    pub fn get_source(&self) -> Option<&'a str> {
        self.db.get_source(self.get_src_id()?)
    }

    pub fn get_name_id(&self) -> Option<u32> {
        if self.record.name_id == NO_ID {
            None
        } else {
            Some(self.record.name_id as u32)
        }
    }

    pub fn get_name(&self) -> Option<&'a str> {
        self.db.get_name(self.get_name_id()?)
    }

    pub fn has_name(&self) -> bool {
        self.get_name().is_some()
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<Token {self}>")
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}{}",
            self.get_source().unwrap_or("<unknown>"),
            self.get_src_line(),
            self.get_src_col(),
            self.get_name()
                .map(|x| format!(" name={x}"))
                .unwrap_or_default()
        )
    }
}
