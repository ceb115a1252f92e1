use std::path::Path;

use retrace_memdb::{DumpOptions, MemDb, dump_sourcemap};
use retrace_sourcemap::{DecodedMap, NO_REF, SourceMap, SourceMapIndex, decode_slice};

use crate::errors::{Error, Result};

enum MapRepr {
    Json(SourceMap),
    Mem(MemDb),
}

/// A queryable sourcemap, backed either by a decoded JSON document or by a
/// memdb blob (owned or memory-mapped).
///
/// A view is immutable and owns its backing storage; dropping it is the
/// only way to release that storage, so a live view can always be queried.
pub struct View {
    map: MapRepr,
}

/// An indexed sourcemap waiting to be flattened.
///
/// Flattening consumes the index. An index that contains external-URL
/// sections can never be flattened here; fetching those is the caller's
/// business.
pub struct Index {
    index: SourceMapIndex,
}

/// Outcome of parsing a JSON document that may or may not be indexed.
///
/// The `Index` arm is the indexed-map signal: the caller gets the
/// unflattened index and decides whether to force a flatten.
pub enum ViewOrIndex {
    View(View),
    Index(Index),
}

/// One resolved lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch<'a> {
    pub dst_line: u32,
    pub dst_col: u32,
    pub src_line: u32,
    pub src_col: u32,
    pub src_id: Option<u32>,
    pub src: Option<&'a str>,
    pub name: Option<&'a str>,
}

impl<'a> TokenMatch<'a> {
    fn from_json(token: retrace_sourcemap::Token<'a>) -> TokenMatch<'a> {
        let raw = token.get_raw_token();
        TokenMatch {
            dst_line: raw.dst_line,
            dst_col: raw.dst_col,
            src_line: raw.src_line,
            src_col: raw.src_col,
            src_id: (raw.src_id != NO_REF).then_some(raw.src_id),
            src: token.get_source(),
            name: token.get_name(),
        }
    }

    fn from_memdb(token: retrace_memdb::Token<'a>) -> TokenMatch<'a> {
        TokenMatch {
            dst_line: token.get_dst_line(),
            dst_col: token.get_dst_col(),
            src_line: token.get_src_line(),
            src_col: token.get_src_col(),
            src_id: token.get_src_id(),
            src: token.get_source(),
            name: token.get_name(),
        }
    }
}

/// Parses a JSON sourcemap into a view or, for indexed documents, an index.
///
/// With `auto_flatten`, an index without external references is flattened
/// into a view right away.
pub fn from_json(buffer: &[u8], auto_flatten: bool) -> Result<ViewOrIndex> {
    let rv = ViewOrIndex::from_slice(buffer)?;
    match rv {
        ViewOrIndex::Index(index) if auto_flatten && index.can_flatten() => {
            Ok(ViewOrIndex::View(index.into_view()?))
        }
        rv => Ok(rv),
    }
}

impl ViewOrIndex {
    pub fn from_slice(buffer: &[u8]) -> Result<ViewOrIndex> {
        Ok(match decode_slice(buffer)? {
            DecodedMap::Flat(sm) => ViewOrIndex::View(View::from_sourcemap(sm)),
            DecodedMap::Index(index) => ViewOrIndex::Index(Index { index }),
        })
    }
}

impl View {
    /// Creates a view from a JSON sourcemap.
    ///
    /// An indexed document fails with the indexed-map signal; use
    /// [`ViewOrIndex::from_slice`] or [`from_json`] to handle both shapes.
    pub fn json_from_slice(buffer: &[u8]) -> Result<View> {
        let sm = decode_slice(buffer)?.into_sourcemap()?;
        Ok(View::from_sourcemap(sm))
    }

    /// Creates a view from a JSON sourcemap read from `rdr`.
    pub fn json_from_reader<R: std::io::Read>(rdr: R) -> Result<View> {
        let sm = retrace_sourcemap::decode_reader(rdr)?.into_sourcemap()?;
        Ok(View::from_sourcemap(sm))
    }

    /// Creates a view from memdb bytes.
    pub fn memdb_from_vec(buffer: Vec<u8>) -> Result<View> {
        Ok(View {
            map: MapRepr::Mem(MemDb::from_vec(buffer)?),
        })
    }

    /// Creates a view by memory-mapping a memdb file.
    pub fn memdb_from_path<P: AsRef<Path>>(path: P) -> Result<View> {
        Ok(View {
            map: MapRepr::Mem(MemDb::from_path(path)?),
        })
    }

    pub fn from_sourcemap(sm: SourceMap) -> View {
        View {
            map: MapRepr::Json(sm),
        }
    }

    /// Serializes the view into a memdb blob.
    ///
    /// Only JSON-backed views can be dumped; re-dumping a memdb-backed view
    /// fails with [`Error::AlreadyMemDb`].
    pub fn dump_memdb(&self, opts: DumpOptions) -> Result<Vec<u8>> {
        match &self.map {
            MapRepr::Json(sm) => Ok(dump_sourcemap(sm, opts)?),
            MapRepr::Mem(_) => Err(Error::AlreadyMemDb),
        }
    }

    /// Looks up the token covering the given minified location.
    ///
    /// The search stays on the queried line; a line without tokens is a
    /// miss. Negative or out-of-range coordinates are tolerated and miss
    /// rather than fail, since frames arriving from the wild routinely
    /// carry nonsense positions.
    pub fn lookup_token(&self, line: i64, col: i64) -> Option<TokenMatch<'_>> {
        let line = u32::try_from(line).ok()?;
        let col = u32::try_from(col).ok()?;
        match &self.map {
            MapRepr::Json(sm) => sm.lookup_token(line, col).map(TokenMatch::from_json),
            MapRepr::Mem(db) => db.lookup_token(line, col).map(TokenMatch::from_memdb),
        }
    }

    pub fn get_token_count(&self) -> u32 {
        match &self.map {
            MapRepr::Json(sm) => sm.get_token_count(),
            MapRepr::Mem(db) => db.get_token_count(),
        }
    }

    /// Indexed random access; out of range is an error here, unlike the
    /// tolerant positional lookup.
    pub fn get_token(&self, idx: u32) -> Result<TokenMatch<'_>> {
        match &self.map {
            MapRepr::Json(sm) => sm.get_token(idx).map(TokenMatch::from_json),
            MapRepr::Mem(db) => db.get_token(idx).map(TokenMatch::from_memdb),
        }
        .ok_or(Error::IndexOutOfRange(idx))
    }

    pub fn tokens(&self) -> impl Iterator<Item = TokenMatch<'_>> {
        (0..self.get_token_count()).filter_map(|idx| self.get_token(idx).ok())
    }

    pub fn get_source_count(&self) -> u32 {
        match &self.map {
            MapRepr::Json(sm) => sm.get_source_count(),
            MapRepr::Mem(db) => db.get_source_count(),
        }
    }

    pub fn get_source(&self, src_id: u32) -> Option<&str> {
        match &self.map {
            MapRepr::Json(sm) => sm.get_source(src_id),
            MapRepr::Mem(db) => db.get_source(src_id),
        }
    }

    pub fn get_source_contents(&self, src_id: u32) -> Option<&str> {
        match &self.map {
            MapRepr::Json(sm) => sm.get_source_contents(src_id),
            MapRepr::Mem(db) => db.get_source_contents(src_id),
        }
    }

    pub fn has_source_contents(&self, src_id: u32) -> bool {
        self.get_source_contents(src_id).is_some()
    }

    /// Iterates `(src_id, source name)` pairs; a fresh iterator per call.
    pub fn sources(&self) -> impl Iterator<Item = (u32, &str)> {
        (0..self.get_source_count()).filter_map(|id| self.get_source(id).map(|name| (id, name)))
    }
}

impl Index {
    /// Parses an indexed JSON sourcemap.
    ///
    /// A flat document fails with
    /// [`retrace_sourcemap::Error::RegularSourceMap`].
    pub fn from_slice(buffer: &[u8]) -> Result<Index> {
        match decode_slice(buffer)? {
            DecodedMap::Index(index) => Ok(Index { index }),
            DecodedMap::Flat(_) => Err(retrace_sourcemap::Error::RegularSourceMap.into()),
        }
    }

    /// True iff no section references an external sourcemap.
    pub fn can_flatten(&self) -> bool {
        self.index.can_flatten()
    }

    /// Flattens into a view, consuming the index.
    pub fn into_view(self) -> Result<View> {
        Ok(View::from_sourcemap(self.index.flatten()?))
    }
}
