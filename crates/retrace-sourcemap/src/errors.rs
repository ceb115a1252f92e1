use std::io;

use thiserror::Error;

/// An error decoding a JSON sourcemap document.
///
/// Everything in here is a hard parse failure: a document that produces an
/// `Error` yields no map at all. Lookup misses on a successfully decoded map
/// are `Option` returns, not errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The document is not valid JSON or not a JSON object.
    #[error("bad json: {0}")]
    BadJson(#[from] serde_json::Error),

    /// The document declares a `version` other than 3.
    #[error("unsupported sourcemap version {0}")]
    UnsupportedVersion(u32),

    /// A flat map without a `mappings` field.
    #[error("missing mappings")]
    MissingMappings,

    /// A byte in `mappings` that is outside the base64 VLQ alphabet.
    #[error("invalid base64 character 0x{0:02x} in mappings")]
    InvalidBase64(u8),

    /// The mappings string ended in the middle of a VLQ continuation.
    #[error("truncated vlq sequence in mappings")]
    TruncatedVlq,

    /// A delta over/underflowed the running position accumulator.
    #[error("vlq value overflow in mappings")]
    VlqOverflow,

    /// A segment with a field count other than 1, 4 or 5.
    #[error("invalid segment size {0} in mappings")]
    BadSegmentSize(usize),

    /// Token positions went backwards within the mappings stream.
    #[error("mappings are not ordered at line {line}, column {col}")]
    UnorderedMappings { line: u32, col: u32 },

    /// A segment referenced a source that is not in the `sources` table.
    #[error("invalid source reference {0}")]
    BadSourceReference(u32),

    /// A segment referenced a name that is not in the `names` table.
    #[error("invalid name reference {0}")]
    BadNameReference(u32),

    /// A flat map was required but the document has `sections`.
    #[error("sourcemap is an indexed sourcemap")]
    IndexedSourceMap,

    /// An indexed map was required but the document is flat.
    #[error("sourcemap is not an indexed sourcemap")]
    RegularSourceMap,

    /// A section of an indexed map is itself indexed.
    #[error("indexed sourcemap section {0} is itself indexed")]
    NestedIndex(usize),

    /// Flattening was attempted on an index with an external reference.
    #[error("cannot flatten: section {0} references an external sourcemap")]
    CannotFlatten(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
