use thiserror::Error;

/// The unified error surface of the crate.
///
/// Parse, decode and dump failures land here; per-token and per-source
/// lookup misses do not — those are `Option` returns on the query surface,
/// since they are ordinary outcomes at interactive volume.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    SourceMap(#[from] retrace_sourcemap::Error),

    #[error(transparent)]
    MemDb(#[from] retrace_memdb::Error),

    /// A memdb dump was requested from a view that is already memdb-backed.
    #[error("view is already backed by a memdb")]
    AlreadyMemDb,

    /// Out-of-range indexed access on the token store.
    #[error("token index {0} out of range")]
    IndexOutOfRange(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
