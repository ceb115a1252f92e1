use std::io;

use thiserror::Error;

/// Errors producing or opening a memdb blob.
///
/// The dump-side variants (`TooManySources`, `TooManyNames`,
/// `LocationOverflow`, `HeapOverflow`) reject the whole dump before a single
/// byte of output exists; there is no partial blob. The open-side variants
/// treat the buffer as untrusted: anything that does not validate is
/// rejected before it is dereferenced.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The buffer does not start with the memdb magic.
    #[error("not a memdb file")]
    BadMagic,

    /// The blob was written by a newer (or unknown) format revision.
    #[error("unsupported memdb version {0}")]
    UnsupportedVersion(u32),

    /// The buffer is truncated or an offset/length points outside it.
    #[error("corrupt memdb: {0}")]
    Corrupt(&'static str),

    /// More distinct sources than the record's source field can address.
    #[error("too many sources for the memdb format")]
    TooManySources,

    /// More names than the record's name field can address.
    #[error("too many names for the memdb format")]
    TooManyNames,

    /// A line or column outside the packable range.
    #[error("location does not fit the memdb format")]
    LocationOverflow,

    /// The string heap outgrew the marker offset width.
    #[error("string heap exceeds the memdb format limits")]
    HeapOverflow,
}

pub type Result<T> = std::result::Result<T, Error>;
