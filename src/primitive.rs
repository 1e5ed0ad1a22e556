//! Simple building-block data that can be read in one go.
//! Reading a primitive advances the input slice past it.

use crate::prelude::*;

/// Split off the first `len` bytes of the input.
#[inline]
pub(crate) fn read_slice<'a>(raw: &mut &'a [u8], len: usize) -> StdResult<&'a [u8], ErrorKind> {
    ensure!(raw.len() >= len, ErrorKind::TruncatedStream);
    let (take, rem) = raw.split_at(len);
    *raw = rem;
    Ok(take)
}

#[inline]
pub(crate) fn read_u8(raw: &mut &[u8]) -> StdResult<u8, ErrorKind> {
    Ok(read_slice(raw, 1)?[0])
}

#[inline]
pub(crate) fn read_u16(raw: &mut &[u8]) -> StdResult<u16, ErrorKind> {
    let buf = read_slice(raw, 2)?;
    Ok(u16::from_be_bytes([buf[0], buf[1]]))
}

#[inline]
pub(crate) fn read_u32(raw: &mut &[u8]) -> StdResult<u32, ErrorKind> {
    let buf = read_slice(raw, 4)?;
    Ok(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

/// The largest value that fits in a 4-byte varlen.
pub const VARLEN_MAX: u32 = (1 << 28) - 1;

/// Read a varlen, failing if the input ends before the last byte or if more than 4 bytes are
/// used.
#[inline]
pub(crate) fn read_varlen(raw: &mut &[u8]) -> StdResult<u32, ErrorKind> {
    let mut int: u32 = 0;
    for _ in 0..4 {
        let byte = read_u8(raw)?;
        int <<= 7;
        int |= (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok(int);
        }
    }
    Err(ErrorKind::VarlenOverflow)
}

/// Append the shortest varlen encoding of `int`.
#[inline]
pub(crate) fn write_varlen(out: &mut Vec<u8>, int: u32) -> StdResult<(), ErrorKind> {
    ensure!(int <= VARLEN_MAX, ErrorKind::VarlenOverflow);
    let mut skipping = true;
    for i in (0..4).rev() {
        let byte = ((int >> (i * 7)) & 0x7F) as u8;
        if skipping && byte == 0 && i != 0 {
            // Skip these leading zeros
        } else {
            skipping = false;
            // Every byte but the last one carries the continuation bit
            out.push(if i == 0 { byte } else { byte | 0x80 });
        }
    }
    Ok(())
}

/// Reads a slice represented in the input as a varlen `len` followed by `len` bytes.
#[inline]
pub(crate) fn read_varlen_slice<'a>(raw: &mut &'a [u8]) -> StdResult<&'a [u8], ErrorKind> {
    let len = read_varlen(raw)?;
    read_slice(raw, len as usize)
}

/// Write a slice as its varlen length and then the raw bytes.
#[inline]
pub(crate) fn write_varlen_slice(out: &mut Vec<u8>, data: &[u8]) -> StdResult<(), ErrorKind> {
    let len = u32::try_from(data.len()).map_err(|_| ErrorKind::VarlenOverflow)?;
    write_varlen(out, len)?;
    out.extend_from_slice(data);
    Ok(())
}

/// Decode a single varlen from the front of `raw`, advancing the slice past it.
///
/// Fails with `TruncatedStream` if the slice ends before a byte without the continuation bit,
/// and with `VarlenOverflow` if the value spans more than 4 bytes.
pub fn decode_varlen(raw: &mut &[u8]) -> Result<u32> {
    Ok(read_varlen(raw)?)
}

/// Encode a value as a minimal-length varlen.
///
/// Fails with `VarlenOverflow` if the value does not fit in 28 bits.
pub fn encode_varlen(int: u32) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(4);
    write_varlen(&mut out, int)?;
    Ok(out)
}

/// Slightly restricted integers.
macro_rules! restricted_int {
    {$(#[$attr:meta])* $name:ident : $inner:tt => $bits:expr} => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
        #[repr(transparent)]
        #[allow(non_camel_case_types)]
        pub struct $name($inner);
        impl From<$inner> for $name {
            /// Lossy conversion, masks off the top bits.
            #[inline]
            fn from(raw: $inner) -> $name {
                $name::new(raw)
            }
        }
        impl From<$name> for $inner {
            #[inline]
            fn from(restricted: $name) -> $inner {
                restricted.0
            }
        }
        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
        impl $name {
            const MASK: $inner = (1 << $bits) - 1;

            /// The maximum value that this restricted integer can hold.
            #[inline]
            pub const fn max_value() -> $name {
                $name(Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart by masking off the
            /// extra bits.
            #[inline]
            pub const fn new(raw: $inner) -> $name {
                $name(raw & Self::MASK)
            }

            /// Returns `Some` if the raw integer is within range of the restricted integer, and
            /// `None` otherwise.
            #[inline]
            pub fn try_from(raw: $inner) -> Option<$name> {
                if raw <= Self::MASK {
                    Some($name(raw))
                } else {
                    None
                }
            }

            /// Get the inner integer out of the wrapper.
            #[inline]
            pub const fn as_int(self) -> $inner {
                self.0
            }
        }
        impl PartialEq<$inner> for $name {
            fn eq(&self, rhs: &$inner) -> bool {
                self.as_int() == *rhs
            }
        }
        impl PartialEq<$name> for $inner {
            fn eq(&self, rhs: &$name) -> bool {
                *self == rhs.as_int()
            }
        }
    };
}
restricted_int! {
    /// A 4-bit integer type, used for MIDI channels.
    ///
    /// Wraps the `u8` type and ensures that the top 4 bits are always zero.
    u4: u8 => 4
}
restricted_int! {
    /// A 7-bit integer type, used for channel message data.
    ///
    /// Wraps the `u8` type and ensures that the top bit is always zero.
    u7: u8 => 7
}
restricted_int! {
    /// A 14-bit integer type, used for raw pitch bend values.
    ///
    /// Wraps the `u16` type and ensures that the top two bits are always zero.
    u14: u16 => 14
}
restricted_int! {
    /// A 24-bit integer type, used for tempos.
    ///
    /// Wraps the `u32` type and ensures that the top 8 bits are always zero.
    u24: u32 => 24
}
