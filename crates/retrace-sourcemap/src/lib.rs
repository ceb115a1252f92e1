//! Decoding of JavaScript sourcemaps.
//!
//! This crate owns the JSON wire format: the base64 VLQ delta decoder, the
//! document parser, the sorted token store with positional lookup, and the
//! flattening of indexed (sectioned) documents into a single flat map.
//!
//! ```
//! use retrace_sourcemap::{DecodedMap, decode_slice};
//!
//! let input: &[u8] = br#"{
//!     "version": 3,
//!     "sources": ["coolstuff.js"],
//!     "names": ["x", "alert"],
//!     "mappings": "AAAA,GAAIA,GAAI,EACR,IAAIA,GAAK,EAAG,CACVC,MAAM"
//! }"#;
//! let sm = match decode_slice(input).unwrap() {
//!     DecodedMap::Flat(sm) => sm,
//!     DecodedMap::Index(_) => unreachable!(),
//! };
//! let token = sm.lookup_token(0, 0).unwrap();
//! assert_eq!(token.get_source(), Some("coolstuff.js"));
//! ```

pub use crate::decoder::{DecodedMap, decode_reader, decode_slice};
pub use crate::errors::{Error, Result};
pub use crate::types::{
    NO_REF, RawToken, SourceMap, SourceMapIndex, SourceMapSection, Token,
};

mod decoder;
mod errors;
mod index;
mod jsontypes;
mod types;
mod vlq;
