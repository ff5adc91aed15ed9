//! Little-endian primitive codec shared by both halves of the runtime.
//!
//! Every multi-byte value on the wire is little-endian. Offsets and sizes are
//! 48-bit unsigned, stored as a 32-bit low part followed by a 16-bit high
//! part, and handled in memory as `u64` with an explicit range check on
//! write.
use crate::error::{overflow, Result};

/// Magic stamped at offset 0 of every finalized message.
pub const MESSAGE_MAGIC: u32 = 0xB5C0_C4B3;
/// Magic of heap text objects.
pub const TEXT_MAGIC: u32 = 0xD812_C8F5;
/// Magic of heap byte-blob objects.
pub const BYTES_MAGIC: u32 = 0xDCDB_BE10;
/// Magic of heap list objects.
pub const LIST_MAGIC: u32 = 0x3400_BB46;

/// Byte length of every heap object header: a 4-byte magic followed by a
/// 48-bit size or element count. The message header at offset 0 has the same
/// shape (magic + 48-bit root pointer).
pub const HEADER_SIZE: usize = 10;

/// Largest value a 48-bit field can carry.
pub const MAX_U48: u64 = (1 << 48) - 1;

/// Fixed-width little-endian scalars.
///
/// Implemented for the ten primitive field types the wire format knows.
/// Generated struct codecs use `read_le`/`write_le` to pack their fields.
pub trait Pod: Copy {
    const WIDTH: usize;
    /// Decode from the first `WIDTH` bytes of `src`.
    fn read_le(src: &[u8]) -> Self;
    /// Encode into the first `WIDTH` bytes of `dst`.
    fn write_le(self, dst: &mut [u8]);
}

macro_rules! impl_pod {
    ($($t:ty),* $(,)?) => {$(
        impl Pod for $t {
            const WIDTH: usize = core::mem::size_of::<$t>();

            #[inline]
            fn read_le(src: &[u8]) -> Self {
                let mut raw = [0u8; core::mem::size_of::<$t>()];
                raw.copy_from_slice(&src[..Self::WIDTH]);
                <$t>::from_le_bytes(raw)
            }

            #[inline]
            fn write_le(self, dst: &mut [u8]) {
                dst[..Self::WIDTH].copy_from_slice(&self.to_le_bytes());
            }
        }
    )*};
}

impl_pod!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Decode a 48-bit value from the first 6 bytes of `src`.
#[inline]
pub fn read_u48(src: &[u8]) -> u64 {
    let lo = u32::read_le(src) as u64;
    let hi = u16::read_le(&src[4..]) as u64;
    lo | hi << 32
}

/// Encode a 48-bit value into the first 6 bytes of `dst`.
///
/// Values outside the 48-bit range are a programming error: nothing the
/// writer allocates can legitimately produce one.
#[inline]
pub fn write_u48(dst: &mut [u8], value: u64) {
    assert!(value <= MAX_U48, "value does not fit in 48 bits");
    (value as u32).write_le(dst);
    ((value >> 32) as u16).write_le(&mut dst[4..]);
}

/// Narrow a decoded 48-bit value to `usize`, failing on 32-bit hosts where
/// it does not fit.
#[inline]
pub fn u48_to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| overflow(value))
}
