//! Serializing a decoded sourcemap into a memdb blob.

use retrace_sourcemap::{NO_REF, RawToken, SourceMap};

use crate::errors::{Error, Result};
use crate::format::{
    HEAD_SIZE, MARKER_SIZE, MapHead, NO_CONTENTS, NO_ID, RECORD_SIZE, StringMarker, TokenRecord,
    pack_loc,
};

/// Controls which optional heap sections a dump carries.
///
/// Both flags blank their section through sentinels; the head layout and
/// record width are identical for every flag combination.
#[derive(Debug, Copy, Clone)]
pub struct DumpOptions {
    pub with_source_contents: bool,
    pub with_names: bool,
}

impl Default for DumpOptions {
    fn default() -> DumpOptions {
        DumpOptions {
            with_source_contents: true,
            with_names: true,
        }
    }
}

fn pack_id(id: u32, err: fn() -> Error) -> Result<u16> {
    if id == NO_REF {
        Ok(NO_ID)
    } else if id >= NO_ID as u32 {
        Err(err())
    } else {
        Ok(id as u16)
    }
}

fn pack_token(raw: &RawToken, with_names: bool) -> Result<TokenRecord> {
    Ok(TokenRecord {
        packed_dst: pack_loc(raw.dst_line, raw.dst_col)?,
        packed_src: pack_loc(raw.src_line, raw.src_col)?,
        src_id: pack_id(raw.src_id, || Error::TooManySources)?,
        name_id: if with_names {
            pack_id(raw.name_id, || Error::TooManyNames)?
        } else {
            NO_ID
        },
    })
}

/// Serializes `sm` into a memdb blob.
///
/// Every counter and field is validated before the output buffer is
/// assembled; an overflow anywhere aborts the dump with no output.
pub fn dump_sourcemap(sm: &SourceMap, opts: DumpOptions) -> Result<Vec<u8>> {
    let source_count = sm.get_source_count();
    if source_count >= NO_ID as u32 {
        return Err(Error::TooManySources);
    }
    let name_count = if opts.with_names {
        sm.get_name_count()
    } else {
        0
    };
    if name_count >= NO_ID as u32 {
        return Err(Error::TooManyNames);
    }

    let mut records = Vec::with_capacity(sm.get_token_count() as usize);
    for token in sm.tokens() {
        records.push(pack_token(&token.get_raw_token(), opts.with_names)?);
    }

    let index_off = HEAD_SIZE as u64;
    let heap_off = index_off + (records.len() * RECORD_SIZE) as u64;

    // string heap plus the markers addressing into it
    let mut heap: Vec<u8> = Vec::new();
    let push_str = |heap: &mut Vec<u8>, s: &str| -> Result<StringMarker> {
        let pos = heap_off + heap.len() as u64;
        if pos + s.len() as u64 >= NO_CONTENTS as u64 {
            return Err(Error::HeapOverflow);
        }
        heap.extend(s.as_bytes());
        Ok(StringMarker {
            pos: pos as u32,
            len: s.len() as u32,
        })
    };

    let mut source_markers = Vec::with_capacity(source_count as usize);
    let mut contents_markers = Vec::with_capacity(source_count as usize);
    for (src_id, name) in sm.sources() {
        source_markers.push(push_str(&mut heap, name)?);
        let contents = if opts.with_source_contents {
            sm.get_source_contents(src_id)
        } else {
            None
        };
        contents_markers.push(match contents {
            Some(contents) => push_str(&mut heap, contents)?,
            None => StringMarker {
                pos: NO_CONTENTS,
                len: 0,
            },
        });
    }

    let mut name_markers = Vec::with_capacity(name_count as usize);
    if opts.with_names {
        for name in sm.names() {
            name_markers.push(push_str(&mut heap, name)?);
        }
    }

    let sources_off = heap_off + heap.len() as u64;
    let contents_off = sources_off + (source_markers.len() * MARKER_SIZE) as u64;
    let names_off = contents_off + (contents_markers.len() * MARKER_SIZE) as u64;
    let total = names_off as usize + name_markers.len() * MARKER_SIZE;

    let head = MapHead {
        token_count: records.len() as u32,
        source_count,
        name_count,
        index_off,
        sources_off,
        contents_off,
        names_off,
    };

    let mut out = Vec::with_capacity(total);
    head.encode(&mut out);
    for record in &records {
        record.encode(&mut out);
    }
    out.extend(&heap);
    for marker in source_markers
        .iter()
        .chain(&contents_markers)
        .chain(&name_markers)
    {
        marker.encode(&mut out);
    }
    debug_assert_eq!(out.len(), total);

    tracing::debug!(
        tokens = records.len(),
        sources = source_count,
        names = name_count,
        bytes = out.len(),
        "dumped memdb"
    );
    Ok(out)
}
