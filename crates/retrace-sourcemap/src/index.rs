//! Flattening of indexed sourcemaps.
//!
//! An index is consumed by [`SourceMapIndex::flatten`]; afterwards the index
//! no longer exists, which is the whole of the one-shot contract.

use std::collections::HashMap;

use crate::errors::{Error, Result};
use crate::types::{NO_REF, RawToken, SourceMap, SourceMapIndex};

impl SourceMapIndex {
    /// True iff every section embeds its sub-map inline.
    ///
    /// Sections referencing an external map by URL cannot be resolved here
    /// (fetching is the caller's business), so such an index can only be
    /// traversed, never flattened.
    pub fn can_flatten(&self) -> bool {
        self.sections.iter().all(|s| s.map.is_some())
    }

    /// Merges all sections into a single flat map, consuming the index.
    ///
    /// Sections are processed in ascending offset order. Within a sub-map,
    /// the section's line offset shifts every token; the column offset
    /// shifts only tokens on the sub-map's first line, per the indexed-map
    /// convention. Source and name tables are deduplicated into one global
    /// table. When two sections produce tokens at the same destination
    /// position, both are kept in section order and lookups resolve to the
    /// later one.
    pub fn flatten(mut self) -> Result<SourceMap> {
        if let Some(pos) = self.sections.iter().position(|s| s.map.is_none()) {
            return Err(Error::CannotFlatten(pos));
        }

        self.sections.sort_by_key(|s| s.offset);

        let mut builder = FlatBuilder::default();
        for section in self.sections {
            let (off_line, off_col) = section.offset;
            // can_flatten was just checked section by section
            let map = match section.map {
                Some(map) => map,
                None => return Err(Error::CannotFlatten(0)),
            };
            builder.add_section(off_line, off_col, map);
        }

        tracing::debug!(
            tokens = builder.tokens.len(),
            sources = builder.sources.len(),
            "flattened indexed sourcemap"
        );
        Ok(SourceMap::new(
            self.file,
            builder.tokens,
            builder.sources,
            builder.sources_content,
            builder.names,
        ))
    }
}

/// Accumulates sections into one global token/source/name table,
/// deduplicating sources and names by value.
#[derive(Default)]
struct FlatBuilder {
    tokens: Vec<RawToken>,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    source_ids: HashMap<String, u32>,
    names: Vec<String>,
    name_ids: HashMap<String, u32>,
}

impl FlatBuilder {
    fn add_section(&mut self, off_line: u32, off_col: u32, map: SourceMap) {
        let source_remap: Vec<u32> = map
            .sources()
            .map(|(id, name)| self.add_source(name, map.get_source_contents(id)))
            .collect();
        let name_remap: Vec<u32> = map.names().map(|name| self.add_name(name)).collect();

        for token in map.tokens() {
            let mut raw = token.get_raw_token();
            raw.dst_line += off_line;
            if token.get_dst_line() == 0 {
                raw.dst_col += off_col;
            }
            if raw.src_id != NO_REF {
                raw.src_id = source_remap[raw.src_id as usize];
            }
            if raw.name_id != NO_REF {
                raw.name_id = name_remap[raw.name_id as usize];
            }
            self.tokens.push(raw);
        }
    }

    fn add_source(&mut self, name: &str, contents: Option<&str>) -> u32 {
        let id = match self.source_ids.get(name) {
            Some(&id) => id,
            None => {
                let id = self.sources.len() as u32;
                self.sources.push(name.to_string());
                self.sources_content.push(None);
                self.source_ids.insert(name.to_string(), id);
                id
            }
        };
        if let Some(contents) = contents {
            let slot = &mut self.sources_content[id as usize];
            if slot.is_none() {
                *slot = Some(contents.to_string());
            }
        }
        id
    }

    fn add_name(&mut self, name: &str) -> u32 {
        match self.name_ids.get(name) {
            Some(&id) => id,
            None => {
                let id = self.names.len() as u32;
                self.names.push(name.to_string());
                self.name_ids.insert(name.to_string(), id);
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::decoder::{DecodedMap, decode_slice};
    use crate::errors::Error;
    use crate::types::SourceMapIndex;

    fn decode_index(buf: &[u8]) -> SourceMapIndex {
        match decode_slice(buf).unwrap() {
            DecodedMap::Index(index) => index,
            DecodedMap::Flat(_) => panic!("expected an index"),
        }
    }

    const INDEXED: &[u8] = br#"{
        "version": 3,
        "sections": [
            {"offset": {"line": 0, "column": 0},
             "map": {"version": 3, "sources": ["file1.js"], "names": ["add"],
                     "mappings": "AAAAA,GAAG"}},
            {"offset": {"line": 10, "column": 0},
             "map": {"version": 3, "sources": ["file2.js"], "names": ["sub"],
                     "mappings": "AAAAA,IAAI"}}
        ]
    }"#;

    #[test]
    fn flatten_translates_by_section_offset() {
        let index = decode_index(INDEXED);
        assert!(index.can_flatten());
        let sm = index.flatten().unwrap();

        assert_eq!(sm.get_token_count(), 4);
        // first section stays put
        let tok = sm.lookup_token(0, 0).unwrap();
        assert_eq!(tok.get_source(), Some("file1.js"));
        assert_eq!(tok.get_name(), Some("add"));
        // second section is shifted down by ten lines
        let tok = sm.lookup_token(10, 0).unwrap();
        assert_eq!(tok.get_source(), Some("file2.js"));
        assert_eq!(tok.get_name(), Some("sub"));
        assert_eq!(tok.get_src(), (0, 0));
        // nothing between the sections
        assert!(sm.lookup_token(5, 0).is_none());
    }

    #[test]
    fn flatten_column_offset_applies_to_first_line_only() {
        let index = decode_index(
            br#"{
            "version": 3,
            "sections": [
                {"offset": {"line": 2, "column": 100},
                 "map": {"version": 3, "sources": ["a.js"],
                         "mappings": "AAAA;CAAC"}}
            ]
        }"#,
        );
        let sm = index.flatten().unwrap();
        // sub-map line 0 picks up the column offset
        assert_eq!(sm.get_token(0).unwrap().get_dst(), (2, 100));
        // later lines only get the line offset
        assert_eq!(sm.get_token(1).unwrap().get_dst(), (3, 1));
    }

    #[test]
    fn flatten_deduplicates_shared_sources_and_names() {
        let index = decode_index(
            br#"{
            "version": 3,
            "sections": [
                {"offset": {"line": 0, "column": 0},
                 "map": {"version": 3, "sources": ["shared.js"], "names": ["f"],
                         "sourcesContent": ["let f;"],
                         "mappings": "AAAAA"}},
                {"offset": {"line": 1, "column": 0},
                 "map": {"version": 3, "sources": ["shared.js"], "names": ["f"],
                         "mappings": "AAAAA"}}
            ]
        }"#,
        );
        let sm = index.flatten().unwrap();
        assert_eq!(sm.get_source_count(), 1);
        assert_eq!(sm.get_name_count(), 1);
        assert_eq!(sm.get_source_contents(0), Some("let f;"));
        // both tokens resolve through the shared tables
        assert_eq!(sm.lookup_token(1, 0).unwrap().get_name(), Some("f"));
    }

    #[test]
    fn flatten_overlapping_sections_later_wins() {
        let index = decode_index(
            br#"{
            "version": 3,
            "sections": [
                {"offset": {"line": 0, "column": 0},
                 "map": {"version": 3, "sources": ["first.js"], "mappings": "AAAA"}},
                {"offset": {"line": 0, "column": 0},
                 "map": {"version": 3, "sources": ["second.js"], "mappings": "AAAA"}}
            ]
        }"#,
        );
        let sm = index.flatten().unwrap();
        // both tokens are kept, the later section's shadows on lookup
        assert_eq!(sm.get_token_count(), 2);
        let tok = sm.lookup_token(0, 0).unwrap();
        assert_eq!(tok.get_source(), Some("second.js"));
    }

    #[test]
    fn external_sections_cannot_flatten() {
        let index = decode_index(
            br#"{
            "version": 3,
            "sections": [
                {"offset": {"line": 0, "column": 0},
                 "map": {"version": 3, "sources": ["a.js"], "mappings": "AAAA"}},
                {"offset": {"line": 5, "column": 0}, "url": "https://example.invalid/part2.js.map"}
            ]
        }"#,
        );
        assert!(!index.can_flatten());
        assert!(matches!(index.flatten(), Err(Error::CannotFlatten(1))));
    }
}
