//! Error types and helpers.
use {core::str::Utf8Error, thiserror::Error};

/// Errors surfaced while decoding a message or while building one.
///
/// Decode failures are raised lazily, at the access that first touches the
/// offending bytes; unrelated parts of the same message stay readable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("bad magic at offset {offset}: found {found:#010x}, expected {expected:#010x}")]
    BadMagic {
        offset: usize,
        found: u32,
        expected: u32,
    },
    #[error("object at offset {offset} needs {size} bytes but the buffer holds {len}")]
    Truncated {
        offset: usize,
        size: usize,
        len: usize,
    },
    #[error("index {index} out of range for list of length {len}")]
    OutOfRange { index: usize, len: usize },
    #[error("text payload is not valid utf-8")]
    InvalidUtf8(#[from] Utf8Error),
    #[error("48-bit value {0} does not fit in usize")]
    Overflow(u64),
    #[error("union has no payload for this access")]
    EmptyUnion,
    #[error(
        "in-place child must be allocated directly after its owner \
         (owner ends at {expected}, write cursor at {found})"
    )]
    InplaceOrder { expected: usize, found: usize },
}

pub type Result<T> = core::result::Result<T, Error>;

#[cold]
pub(crate) const fn bad_magic(offset: usize, found: u32, expected: u32) -> Error {
    Error::BadMagic {
        offset,
        found,
        expected,
    }
}

#[cold]
pub(crate) const fn truncated(offset: usize, size: usize, len: usize) -> Error {
    Error::Truncated { offset, size, len }
}

#[cold]
pub(crate) const fn out_of_range(index: usize, len: usize) -> Error {
    Error::OutOfRange { index, len }
}

#[cold]
pub(crate) const fn overflow(value: u64) -> Error {
    Error::Overflow(value)
}

#[cold]
pub(crate) const fn empty_union() -> Error {
    Error::EmptyUnion
}

#[cold]
pub(crate) const fn inplace_order(expected: usize, found: usize) -> Error {
    Error::InplaceOrder { expected, found }
}
