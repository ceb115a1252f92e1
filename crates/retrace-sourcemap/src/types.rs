use std::fmt;

/// Sentinel for an absent `src_id`/`name_id` reference.
pub const NO_REF: u32 = !0;

/// One decoded mapping record.
///
/// `src_id` and `name_id` are [`NO_REF`] when the originating segment did
/// not carry the respective field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub dst_line: u32,
    pub dst_col: u32,
    pub src_line: u32,
    pub src_col: u32,
    pub src_id: u32,
    pub name_id: u32,
}

/// A token handle that resolves source and name references against its map.
#[derive(Copy, Clone)]
pub struct Token<'a> {
    map: &'a SourceMap,
    raw: RawToken,
}

impl<'a> Token<'a> {
    /// get the destination (minified) line number
    pub fn get_dst_line(&self) -> u32 {
        self.raw.dst_line
    }

    /// get the destination (minified) column number
    pub fn get_dst_col(&self) -> u32 {
        self.raw.dst_col
    }

    pub fn get_dst(&self) -> (u32, u32) {
        (self.raw.dst_line, self.raw.dst_col)
    }

    /// get the original source line number
    pub fn get_src_line(&self) -> u32 {
        self.raw.src_line
    }

    /// get the original source column number
    pub fn get_src_col(&self) -> u32 {
        self.raw.src_col
    }

    pub fn get_src(&self) -> (u32, u32) {
        (self.raw.src_line, self.raw.src_col)
    }

    /// get the referenced source name, if the token carries one
    pub fn get_source(&self) -> Option<&'a str> {
        if self.raw.src_id == NO_REF {
            None
        } else {
            self.map.get_source(self.raw.src_id)
        }
    }

    /// get the original identifier, if the token carries one
    pub fn get_name(&self) -> Option<&'a str> {
        if self.raw.name_id == NO_REF {
            None
        } else {
            self.map.get_name(self.raw.name_id)
        }
    }

    pub fn has_name(&self) -> bool {
        self.get_name().is_some()
    }

    pub fn get_raw_token(&self) -> RawToken {
        self.raw
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

/// A fully decoded flat sourcemap.
///
/// The token store is sorted ascending by `(dst_line, dst_col)` and
/// immutable after construction; every lookup is a binary search over it.
pub struct SourceMap {
    file: Option<String>,
    tokens: Vec<RawToken>,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    names: Vec<String>,
}

impl SourceMap {
    /// Constructs a sourcemap from parts.
    ///
    /// Tokens are sorted on the way in so the lookup invariant holds no
    /// matter the caller's ordering; the sort is stable, preserving
    /// insertion order between tokens at the same position.
    /// `sources_content` is padded or truncated to the length of `sources`.
    pub fn new(
        file: Option<String>,
        mut tokens: Vec<RawToken>,
        sources: Vec<String>,
        mut sources_content: Vec<Option<String>>,
        names: Vec<String>,
    ) -> SourceMap {
        tokens.sort_by_key(|t| (t.dst_line, t.dst_col));
        sources_content.resize(sources.len(), None);
        SourceMap {
            file,
            tokens,
            sources,
            sources_content,
            names,
        }
    }

    pub fn get_file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn get_token_count(&self) -> u32 {
        self.tokens.len() as u32
    }

    /// Bounds-checked random access to the token store.
    pub fn get_token(&self, idx: u32) -> Option<Token<'_>> {
        self.tokens.get(idx as usize).map(|&raw| Token { map: self, raw })
    }

    pub fn tokens(&self) -> impl Iterator<Item = Token<'_>> {
        self.tokens.iter().map(|&raw| Token { map: self, raw })
    }

    /// Finds the token covering `(line, col)`: the one with the greatest
    /// `dst_col <= col` on exactly that line.
    ///
    /// There is no fallback to neighboring lines; a line with no tokens
    /// yields `None`.
    pub fn lookup_token(&self, line: u32, col: u32) -> Option<Token<'_>> {
        let idx = self
            .tokens
            .partition_point(|t| (t.dst_line, t.dst_col) <= (line, col));
        if idx == 0 {
            return None;
        }
        let raw = self.tokens[idx - 1];
        if raw.dst_line != line {
            return None;
        }
        Some(Token { map: self, raw })
    }

    pub fn get_source_count(&self) -> u32 {
        self.sources.len() as u32
    }

    pub fn get_source(&self, src_id: u32) -> Option<&str> {
        self.sources.get(src_id as usize).map(String::as_str)
    }

    pub fn get_source_contents(&self, src_id: u32) -> Option<&str> {
        self.sources_content
            .get(src_id as usize)
            .and_then(|x| x.as_deref())
    }

    pub fn has_source_contents(&self, src_id: u32) -> bool {
        self.get_source_contents(src_id).is_some()
    }

    /// Iterates `(src_id, source name)` pairs. The iterator is derived
    /// fresh on every call.
    pub fn sources(&self) -> impl Iterator<Item = (u32, &str)> {
        self.sources
            .iter()
            .enumerate()
            .map(|(id, name)| (id as u32, name.as_str()))
    }

    pub fn get_name_count(&self) -> u32 {
        self.names.len() as u32
    }

    pub fn get_name(&self, name_id: u32) -> Option<&str> {
        self.names.get(name_id as usize).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl fmt::Debug for SourceMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SourceMap")
            .field("file", &self.file)
            .field("tokens", &self.tokens.len())
            .field("sources", &self.sources.len())
            .field("names", &self.names.len())
            .finish()
    }
}

/// One section of an indexed sourcemap.
#[derive(Debug)]
pub struct SourceMapSection {
    pub(crate) offset: (u32, u32),
    pub(crate) url: Option<String>,
    pub(crate) map: Option<SourceMap>,
}

impl SourceMapSection {
    /// The `(line, column)` the section's sub-map is shifted by.
    pub fn get_offset(&self) -> (u32, u32) {
        self.offset
    }

    /// The external map URL, for sections that do not embed their sub-map.
    pub fn get_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn get_sourcemap(&self) -> Option<&SourceMap> {
        self.map.as_ref()
    }
}

/// An indexed sourcemap: offset-positioned sub-maps.
///
/// An index has no lookup surface of its own; it either gets flattened into
/// a [`SourceMap`] (consuming it) or abandoned.
#[derive(Debug)]
pub struct SourceMapIndex {
    pub(crate) file: Option<String>,
    pub(crate) sections: Vec<SourceMapSection>,
}

impl SourceMapIndex {
    pub fn get_file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn get_section_count(&self) -> u32 {
        self.sections.len() as u32
    }

    pub fn sections(&self) -> impl Iterator<Item = &SourceMapSection> {
        self.sections.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(dst_line: u32, dst_col: u32) -> RawToken {
        RawToken {
            dst_line,
            dst_col,
            src_line: dst_line,
            src_col: dst_col,
            src_id: 0,
            name_id: NO_REF,
        }
    }

    fn simple_map() -> SourceMap {
        SourceMap::new(
            None,
            vec![token(0, 0), token(0, 10), token(1, 4), token(3, 0)],
            vec!["a.js".into()],
            vec![],
            vec![],
        )
    }

    #[test]
    fn lookup_picks_greatest_column_at_or_before() {
        let sm = simple_map();
        assert_eq!(sm.lookup_token(0, 0).unwrap().get_dst(), (0, 0));
        assert_eq!(sm.lookup_token(0, 9).unwrap().get_dst(), (0, 0));
        assert_eq!(sm.lookup_token(0, 10).unwrap().get_dst(), (0, 10));
        assert_eq!(sm.lookup_token(0, 10_000).unwrap().get_dst(), (0, 10));
    }

    #[test]
    fn lookup_never_crosses_lines() {
        let sm = simple_map();
        // line 2 has no tokens; the line-1 token must not leak over
        assert!(sm.lookup_token(2, 50).is_none());
        // column before the first token of the line
        assert!(sm.lookup_token(1, 3).is_none());
        // line past the end of the store
        assert!(sm.lookup_token(9, 0).is_none());
    }

    #[test]
    fn lookup_monotonicity_over_column_ranges() {
        let sm = simple_map();
        for col in 0..10 {
            assert_eq!(sm.lookup_token(0, col).unwrap().get_dst(), (0, 0));
        }
        for col in 10..40 {
            assert_eq!(sm.lookup_token(0, col).unwrap().get_dst(), (0, 10));
        }
    }

    #[test]
    fn get_token_is_bounds_checked() {
        let sm = simple_map();
        assert!(sm.get_token(3).is_some());
        assert!(sm.get_token(4).is_none());
    }

    #[test]
    fn source_accessors_tolerate_unknown_ids() {
        let sm = simple_map();
        assert_eq!(sm.get_source(0), Some("a.js"));
        assert_eq!(sm.get_source(1), None);
        assert!(!sm.has_source_contents(0));
        assert!(sm.get_source_contents(99).is_none());
    }

    #[test]
    fn sources_iterator_restarts() {
        let sm = simple_map();
        assert_eq!(sm.sources().count(), 1);
        // a second call yields a fresh iterator
        assert_eq!(sm.sources().next(), Some((0, "a.js")));
    }
}
