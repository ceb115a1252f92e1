//! Raw serde shapes of the JSON sourcemap wire format.
//!
//! These mirror the document layout only; all validation and token decoding
//! happens in [`crate::decoder`].

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RawSectionOffset {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Deserialize)]
pub struct RawSection {
    pub offset: RawSectionOffset,
    pub url: Option<String>,
    pub map: Option<Box<RawSourceMap>>,
}

#[derive(Debug, Deserialize)]
pub struct RawSourceMap {
    pub version: Option<u32>,
    pub file: Option<String>,
    pub sources: Option<Vec<Option<String>>>,
    #[serde(rename = "sourcesContent")]
    pub sources_content: Option<Vec<Option<String>>>,
    pub sections: Option<Vec<RawSection>>,
    pub names: Option<Vec<String>>,
    pub mappings: Option<String>,
}
