// libpm3/src/buffer.rs

//! Fixed-length byte container with typed, endian-aware accessors.
//!
//! A [`ByteBuffer`] never changes length after construction, but its
//! content can be edited in place through the slice it dereferences to.
//! Offsets passed to the typed accessors may be negative, in which case
//! they count back from the end of the buffer.

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use derive_more::{Deref, DerefMut};

use crate::utils::{bytes_to_hex, bytes_to_hex_spaced, bytes_to_rhex, parse_hex};
use crate::{Error, Result};

const BASE64URL_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Byte order used by multi-byte accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Least significant byte first. The device speaks little-endian.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

/// Owned, fixed-length byte buffer.
#[derive(Clone, PartialEq, Eq, Hash, Default, Deref, DerefMut)]
#[deref(forward)]
#[deref_mut(forward)]
pub struct ByteBuffer(Box<[u8]>);

macro_rules! typed_accessors {
    ($($get:ident, $set:ident, $ty:ty, $read:ident, $write:ident, $width:expr;)*) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` at `offset`.")]
            pub fn $get(&self, offset: isize, endian: Endian) -> Result<$ty> {
                let at = self.resolve(offset, $width)?;
                let bytes = &self.0[at..at + $width];
                Ok(match endian {
                    Endian::Little => LittleEndian::$read(bytes),
                    Endian::Big => BigEndian::$read(bytes),
                })
            }

            #[doc = concat!("Write a `", stringify!($ty), "` at `offset`.")]
            pub fn $set(&mut self, offset: isize, value: $ty, endian: Endian) -> Result<()> {
                let at = self.resolve(offset, $width)?;
                let bytes = &mut self.0[at..at + $width];
                match endian {
                    Endian::Little => LittleEndian::$write(bytes, value),
                    Endian::Big => BigEndian::$write(bytes, value),
                }
                Ok(())
            }
        )*
    };
}

impl ByteBuffer {
    /// Zero-filled buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self(vec![0u8; len].into_boxed_slice())
    }

    /// Copy `bytes` into a new buffer.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    /// Parse hex text. Non-hex characters are ignored; with `reverse` the
    /// decoded bytes are stored back to front.
    pub fn from_hex(hex: &str, reverse: bool) -> Result<Self> {
        let mut bytes = parse_hex(hex).map_err(Error::InvalidArgument)?;
        if reverse {
            bytes.reverse();
        }
        Ok(Self::from(bytes))
    }

    /// Encode `text` as UTF-8.
    pub fn from_utf8(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Concatenate `parts` in order.
    pub fn merge<I, B>(parts: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut out = Vec::new();
        for part in parts {
            out.extend_from_slice(part.as_ref());
        }
        Self::from(out)
    }

    /// Split into consecutive views of `size` bytes; the last one may be
    /// shorter.
    pub fn chunk(&self, size: usize) -> Result<Vec<&[u8]>> {
        if size < 1 {
            return Err(Error::InvalidArgument(format!(
                "chunk size must be at least 1, got {}",
                size
            )));
        }
        Ok(self.0.chunks(size).collect())
    }

    /// Length-then-elementwise comparison.
    pub fn is_equal(&self, other: &[u8]) -> bool {
        self.0.len() == other.len() && self.0.iter().zip(other).all(|(a, b)| a == b)
    }

    pub fn is_len(&self, len: usize) -> bool {
        self.0.len() == len
    }

    /// Uppercase hex, two digits per byte.
    pub fn hex(&self) -> String {
        bytes_to_hex(&self.0)
    }

    /// Uppercase hex of the bytes in reverse order.
    pub fn rhex(&self) -> String {
        bytes_to_rhex(&self.0)
    }

    /// Spaced hex followed by the length, e.g. `"AA BB (len=2)"`.
    pub fn inspect(&self) -> String {
        format!("{} (len={})", bytes_to_hex_spaced(&self.0), self.0.len())
    }

    /// Decode as UTF-8, replacing invalid sequences.
    pub fn to_utf8(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// Unpadded base64 with the URL-safe alphabet.
    pub fn to_base64url(&self) -> String {
        let mut out = String::with_capacity(self.0.len().div_ceil(3) * 4);
        for group in self.0.chunks(3) {
            let mut u24 = 0u32;
            for (j, b) in group.iter().enumerate() {
                u24 |= (*b as u32) << (16 - j * 8);
            }
            for j in 0..group.len() + 1 {
                let idx = (u24 >> (18 - 6 * j)) & 0x3F;
                out.push(BASE64URL_CHARS[idx as usize] as char);
            }
        }
        out
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0.into_vec()
    }

    /// Map a possibly negative offset to an index with `width` readable bytes.
    fn resolve(&self, offset: isize, width: usize) -> Result<usize> {
        let len = self.0.len();
        let at = if offset < 0 {
            len.checked_sub(offset.unsigned_abs())
        } else {
            Some(offset as usize)
        };
        match at {
            Some(at) if at + width <= len => Ok(at),
            _ => Err(Error::InvalidArgument(format!(
                "offset {} out of range for a {}-byte access on {} bytes",
                offset, width, len
            ))),
        }
    }

    pub fn get_u8(&self, offset: isize) -> Result<u8> {
        let at = self.resolve(offset, 1)?;
        Ok(self.0[at])
    }

    pub fn set_u8(&mut self, offset: isize, value: u8) -> Result<()> {
        let at = self.resolve(offset, 1)?;
        self.0[at] = value;
        Ok(())
    }

    pub fn get_i8(&self, offset: isize) -> Result<i8> {
        Ok(self.get_u8(offset)? as i8)
    }

    pub fn set_i8(&mut self, offset: isize, value: i8) -> Result<()> {
        self.set_u8(offset, value as u8)
    }

    typed_accessors! {
        get_u16, set_u16, u16, read_u16, write_u16, 2;
        get_i16, set_i16, i16, read_i16, write_i16, 2;
        get_u32, set_u32, u32, read_u32, write_u32, 4;
        get_i32, set_i32, i32, read_i32, write_i32, 4;
        get_u64, set_u64, u64, read_u64, write_u64, 8;
        get_i64, set_i64, i64, read_i64, write_i64, 8;
        get_f32, set_f32, f32, read_f32, write_f32, 4;
        get_f64, set_f64, f64, read_f64, write_f64, 8;
    }

    /// Read a 24-bit unsigned value, composed of a 16-bit and an 8-bit
    /// access whose placement depends on `endian`.
    pub fn get_u24(&self, offset: isize, endian: Endian) -> Result<u32> {
        let at = self.resolve(offset, 3)? as isize;
        let (hi, lo) = match endian {
            Endian::Little => (self.get_u8(at + 2)?, self.get_u16(at, endian)?),
            Endian::Big => (self.get_u8(at)?, self.get_u16(at + 1, endian)?),
        };
        Ok(((hi as u32) << 16) | lo as u32)
    }

    /// Sign-extended counterpart of [`ByteBuffer::get_u24`].
    pub fn get_i24(&self, offset: isize, endian: Endian) -> Result<i32> {
        let raw = self.get_u24(offset, endian)?;
        Ok(((raw << 8) as i32) >> 8)
    }

    /// Write the low 24 bits of `value`.
    pub fn set_u24(&mut self, offset: isize, value: u32, endian: Endian) -> Result<()> {
        let at = self.resolve(offset, 3)? as isize;
        let hi = ((value >> 16) & 0xFF) as u8;
        let lo = (value & 0xFFFF) as u16;
        match endian {
            Endian::Little => {
                self.set_u16(at, lo, endian)?;
                self.set_u8(at + 2, hi)
            }
            Endian::Big => {
                self.set_u8(at, hi)?;
                self.set_u16(at + 1, lo, endian)
            }
        }
    }

    pub fn set_i24(&mut self, offset: isize, value: i32, endian: Endian) -> Result<()> {
        self.set_u24(offset, value as u32 & 0x00FF_FFFF, endian)
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl<const N: usize> From<[u8; N]> for ByteBuffer {
    fn from(bytes: [u8; N]) -> Self {
        Self::from_bytes(&bytes)
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteBuffer({})", self.inspect())
    }
}
