//! ProGuard-style obfuscation mapping tables.
//!
//! Parses the line-oriented rename grammar emitted by bytecode obfuscators
//! and resolves obfuscated dotted class/method paths back to their original
//! names, optionally disambiguated by line number. Resolution is
//! best-effort throughout: an identifier the table does not know comes back
//! unchanged, never as an error.

pub use crate::mapping::ProguardMapping;

mod mapping;
