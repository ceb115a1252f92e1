//! The memdb binary sourcemap format.
//!
//! A memdb blob is a preprocessed sourcemap: slightly larger than the JSON
//! form but seekable without a parse pass, which makes it the format of
//! choice for caching decoded maps. [`dump_sourcemap`] produces a blob from
//! a decoded [`retrace_sourcemap::SourceMap`]; [`MemDb`] opens one either
//! from an owned buffer or by memory-mapping a file.

pub use crate::errors::{Error, Result};
pub use crate::memdb::{MemDb, Token};
pub use crate::writer::{DumpOptions, dump_sourcemap};

mod errors;
mod format;
mod memdb;
mod writer;
