//! JSON sourcemap decoding.
//!
//! [`decode_slice`] is the entry point: it parses the raw document and
//! yields either a flat [`SourceMap`] or, when the document carries a
//! `sections` array, a [`SourceMapIndex`] for the caller to flatten.

use crate::errors::{Error, Result};
use crate::jsontypes::{RawSection, RawSourceMap};
use crate::types::{NO_REF, RawToken, SourceMap, SourceMapIndex, SourceMapSection};
use crate::vlq::parse_vlq_segment;

/// A decoded sourcemap document: flat or indexed.
#[derive(Debug)]
pub enum DecodedMap {
    Flat(SourceMap),
    Index(SourceMapIndex),
}

impl DecodedMap {
    /// Unwraps into a flat map, failing with the indexed-map signal if the
    /// document would first need flattening.
    pub fn into_sourcemap(self) -> Result<SourceMap> {
        match self {
            DecodedMap::Flat(sm) => Ok(sm),
            DecodedMap::Index(_) => Err(Error::IndexedSourceMap),
        }
    }
}

/// Decodes a JSON sourcemap from a byte slice.
pub fn decode_slice(slice: &[u8]) -> Result<DecodedMap> {
    let rsm: RawSourceMap = serde_json::from_slice(slice)?;
    decode_raw(rsm)
}

/// Decodes a JSON sourcemap from a reader.
pub fn decode_reader<R: std::io::Read>(mut rdr: R) -> Result<DecodedMap> {
    let mut buf = Vec::new();
    rdr.read_to_end(&mut buf)?;
    decode_slice(&buf)
}

pub(crate) fn decode_raw(rsm: RawSourceMap) -> Result<DecodedMap> {
    if let Some(version) = rsm.version {
        if version != 3 {
            return Err(Error::UnsupportedVersion(version));
        }
    }
    if rsm.sections.is_some() {
        Ok(DecodedMap::Index(decode_index(rsm)?))
    } else {
        Ok(DecodedMap::Flat(decode_regular(rsm)?))
    }
}

fn decode_regular(rsm: RawSourceMap) -> Result<SourceMap> {
    let mappings = rsm.mappings.ok_or(Error::MissingMappings)?;
    let sources: Vec<String> = rsm
        .sources
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    let sources_content = rsm.sources_content.unwrap_or_default();
    let names = rsm.names.unwrap_or_default();

    let tokens = decode_mappings(&mappings, sources.len() as u32, names.len() as u32)?;
    tracing::debug!(
        tokens = tokens.len(),
        sources = sources.len(),
        names = names.len(),
        "decoded sourcemap"
    );

    Ok(SourceMap::new(
        rsm.file,
        tokens,
        sources,
        sources_content,
        names,
    ))
}

/// Decodes the delta-encoded `mappings` string into absolute tokens.
///
/// Tokens arrive in encoding order; ordering by `(dst_line, dst_col)` is
/// validated as they are decoded, and a violation rejects the document so
/// the store's binary-search invariant holds by construction.
fn decode_mappings(mappings: &str, source_count: u32, name_count: u32) -> Result<Vec<RawToken>> {
    let mut tokens = Vec::new();

    let mut dst_line: u32 = 0;
    let mut dst_col: i64 = 0;
    let mut src_id: i64 = 0;
    let mut src_line: i64 = 0;
    let mut src_col: i64 = 0;
    let mut name_id: i64 = 0;
    let mut last: Option<(u32, u32)> = None;

    for line in mappings.split(';') {
        for segment in line.split(',') {
            if segment.is_empty() {
                continue;
            }
            let nums = parse_vlq_segment(segment.as_bytes())?;

            dst_col += nums[0];
            let mut token = RawToken {
                dst_line,
                dst_col: to_position(dst_col)?,
                src_line: 0,
                src_col: 0,
                src_id: NO_REF,
                name_id: NO_REF,
            };

            match nums.len() {
                1 => {}
                4 | 5 => {
                    src_id += nums[1];
                    src_line += nums[2];
                    src_col += nums[3];
                    let id = to_position(src_id)?;
                    if id >= source_count {
                        return Err(Error::BadSourceReference(id));
                    }
                    token.src_id = id;
                    token.src_line = to_position(src_line)?;
                    token.src_col = to_position(src_col)?;
                    if nums.len() == 5 {
                        name_id += nums[4];
                        let id = to_position(name_id)?;
                        if id >= name_count {
                            return Err(Error::BadNameReference(id));
                        }
                        token.name_id = id;
                    }
                }
                len => return Err(Error::BadSegmentSize(len)),
            }

            if let Some(prev) = last {
                if (token.dst_line, token.dst_col) < prev {
                    return Err(Error::UnorderedMappings {
                        line: token.dst_line,
                        col: token.dst_col,
                    });
                }
            }
            last = Some((token.dst_line, token.dst_col));
            tokens.push(token);
        }
        dst_line += 1;
        dst_col = 0;
    }

    Ok(tokens)
}

fn to_position(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::VlqOverflow)
}

fn decode_index(rsm: RawSourceMap) -> Result<SourceMapIndex> {
    let mut sections = Vec::new();
    for (idx, raw) in rsm.sections.unwrap_or_default().into_iter().enumerate() {
        sections.push(decode_section(idx, raw)?);
    }
    Ok(SourceMapIndex {
        file: rsm.file,
        sections,
    })
}

fn decode_section(idx: usize, raw: RawSection) -> Result<SourceMapSection> {
    let map = match raw.map {
        Some(map) => match decode_raw(*map)? {
            DecodedMap::Flat(sm) => Some(sm),
            DecodedMap::Index(_) => return Err(Error::NestedIndex(idx)),
        },
        None => None,
    };
    Ok(SourceMapSection {
        offset: (raw.offset.line, raw.offset.column),
        url: raw.url,
        map,
    })
}
