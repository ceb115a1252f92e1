//! Unified sourcemap and obfuscation-mapping query surface.
//!
//! A [`View`] answers minified-location lookups no matter where the map
//! came from: a freshly decoded JSON document, a flattened indexed
//! document, or a previously dumped memdb blob (including memory-mapped
//! files, the preferred shape for hot caches). [`ProguardMapping`] is the
//! sibling surface for class/method rename tables.
//!
//! ```
//! use retrace::{DumpOptions, View, ViewOrIndex, from_json};
//!
//! let input: &[u8] = br#"{
//!     "version": 3,
//!     "sources": ["coolstuff.js"],
//!     "names": ["x", "alert"],
//!     "mappings": "AAAA,GAAIA,GAAI,EACR,IAAIA,GAAK,EAAG,CACVC,MAAM"
//! }"#;
//! let view = match from_json(input, true).unwrap() {
//!     ViewOrIndex::View(view) => view,
//!     ViewOrIndex::Index(_) => unreachable!("no external sections here"),
//! };
//!
//! let token = view.lookup_token(0, 4).unwrap();
//! assert_eq!(token.src, Some("coolstuff.js"));
//! assert_eq!(token.name, Some("x"));
//!
//! // cache the decoded form and reopen it without a parse pass
//! let blob = view.dump_memdb(DumpOptions::default()).unwrap();
//! let cached = View::memdb_from_vec(blob).unwrap();
//! assert_eq!(cached.lookup_token(0, 4).unwrap().name, Some("x"));
//! ```

pub use retrace_memdb::DumpOptions;
pub use retrace_proguard::ProguardMapping;

pub use crate::errors::{Error, Result};
pub use crate::view::{Index, TokenMatch, View, ViewOrIndex, from_json};

mod errors;
mod view;
