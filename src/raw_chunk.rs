use core::fmt::{Debug, Display, Write};

use bitfrob::u8_get_bit;

/// The CRC used by PNG chunks (the "ISO HDLC" polynomial, reflected).
const PNG_CRC: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

/// The four byte type tag of a chunk.
///
/// Bit 5 of each tag byte (the ascii case bit) carries a property flag, which
/// is why tags like `IHDR` and `tEXt` are cased the way they are.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkTy(pub [u8; 4]);
impl ChunkTy {
  /// Image Header
  pub const IHDR: Self = Self(*b"IHDR");
  /// Image Data
  pub const IDAT: Self = Self(*b"IDAT");
  /// Image End
  pub const IEND: Self = Self(*b"IEND");

  /// Bit 5 of byte 0: the chunk is not required to display the image.
  #[inline]
  #[must_use]
  pub fn is_ancillary(self) -> bool {
    u8_get_bit(5, self.0[0])
  }
  /// Bit 5 of byte 1: the chunk type is not a registered public one.
  #[inline]
  #[must_use]
  pub fn is_private(self) -> bool {
    u8_get_bit(5, self.0[1])
  }
  /// Bit 5 of byte 2: reserved, and should never be set today.
  #[inline]
  #[must_use]
  pub fn is_reserved_set(self) -> bool {
    u8_get_bit(5, self.0[2])
  }
  /// Bit 5 of byte 3: editors may copy the chunk without understanding it.
  #[inline]
  #[must_use]
  pub fn is_safe_to_copy(self) -> bool {
    u8_get_bit(5, self.0[3])
  }
}
impl Debug for ChunkTy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char(self.0[0] as char)?;
    f.write_char(self.0[1] as char)?;
    f.write_char(self.0[2] as char)?;
    f.write_char(self.0[3] as char)?;
    Ok(())
  }
}
impl Display for ChunkTy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    Debug::fmt(self, f)
  }
}

/// An unparsed chunk record pulled from a PNG byte stream.
///
/// The payload borrows from the input buffer, so a record costs nothing to
/// make and nothing to drop.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'b> {
  pub(crate) ty: ChunkTy,
  pub(crate) data: &'b [u8],
  pub(crate) declared_crc: u32,
}
impl Debug for RawChunk<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawChunk")
      .field("ty", &self.ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}
impl<'b> RawChunk<'b> {
  #[inline]
  #[must_use]
  pub const fn ty(&self) -> ChunkTy {
    self.ty
  }
  #[inline]
  #[must_use]
  pub const fn data(&self) -> &'b [u8] {
    self.data
  }
  /// The CRC the stream stored after the payload.
  #[inline]
  #[must_use]
  pub const fn declared_crc(&self) -> u32 {
    self.declared_crc
  }
  /// The CRC-32 of the type tag and payload, which a conforming stream
  /// stores as [`declared_crc`](Self::declared_crc).
  #[inline]
  #[must_use]
  pub fn compute_crc(&self) -> u32 {
    let mut digest = PNG_CRC.digest();
    digest.update(&self.ty.0);
    digest.update(self.data);
    digest.finalize()
  }
}

/// The byte stream stopped in the middle of a chunk structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkError {
  /// Fewer bytes remained than the length, tag, payload, or CRC needed.
  PrematureEof,
}
impl Display for ChunkError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::PrematureEof => f.write_str("premature end of chunk data"),
    }
  }
}

/// An iterator that walks the chunk records of a PNG byte stream.
///
/// Build it from the bytes *after* the 8-byte signature. Running out of bytes
/// exactly on a chunk boundary ends the iterator; running out anywhere else
/// yields one [`ChunkError::PrematureEof`] and then the iterator is done.
#[derive(Debug, Clone)]
pub struct RawChunkIter<'b> {
  spare: &'b [u8],
}
impl<'b> From<&'b [u8]> for RawChunkIter<'b> {
  #[inline]
  #[must_use]
  fn from(spare: &'b [u8]) -> Self {
    Self { spare }
  }
}
impl<'b> Iterator for RawChunkIter<'b> {
  type Item = Result<RawChunk<'b>, ChunkError>;

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    if self.spare.is_empty() {
      return None;
    }
    let (len, rest) = if self.spare.len() < 4 {
      self.spare = &[];
      return Some(Err(ChunkError::PrematureEof));
    } else {
      let (len_bytes, rest) = self.spare.split_at(4);
      (u32::from_be_bytes(len_bytes.try_into().unwrap()) as usize, rest)
    };
    let (ty, rest) = if rest.len() < 4 {
      self.spare = &[];
      return Some(Err(ChunkError::PrematureEof));
    } else {
      let (ty_bytes, rest) = rest.split_at(4);
      (ChunkTy(ty_bytes.try_into().unwrap()), rest)
    };
    let (data, rest) = if rest.len() < len {
      self.spare = &[];
      return Some(Err(ChunkError::PrematureEof));
    } else {
      rest.split_at(len)
    };
    let (declared_crc, rest) = if rest.len() < 4 {
      self.spare = &[];
      return Some(Err(ChunkError::PrematureEof));
    } else {
      let (crc_bytes, rest) = rest.split_at(4);
      (u32::from_be_bytes(crc_bytes.try_into().unwrap()), rest)
    };
    self.spare = rest;
    Some(Ok(RawChunk { ty, data, declared_crc }))
  }
}

#[test]
fn test_chunk_ty_property_bits() {
  let ty = ChunkTy(*b"IHDR");
  assert!(!ty.is_ancillary());
  assert!(!ty.is_private());
  assert!(!ty.is_reserved_set());
  assert!(!ty.is_safe_to_copy());
  //
  let ty = ChunkTy(*b"tEXt");
  assert!(ty.is_ancillary());
  assert!(!ty.is_private());
  assert!(!ty.is_reserved_set());
  assert!(ty.is_safe_to_copy());
}

#[test]
fn test_iend_crc_matches_the_known_value() {
  let iend = RawChunk { ty: ChunkTy::IEND, data: &[], declared_crc: 0 };
  assert_eq!(iend.compute_crc(), 0xAE42_6082);
}

#[test]
fn test_iter_ends_cleanly_on_a_chunk_boundary() {
  // length 0, "IEND", then the CRC for an empty IEND.
  let bytes = [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82];
  let mut it = RawChunkIter::from(bytes.as_slice());
  let chunk = it.next().unwrap().unwrap();
  assert_eq!(chunk.ty(), ChunkTy::IEND);
  assert_eq!(chunk.data(), &[]);
  assert_eq!(chunk.declared_crc(), chunk.compute_crc());
  assert!(it.next().is_none());
}

#[test]
fn test_iter_flags_truncation_once() {
  let bytes = [0, 0, 0, 9, b'I', b'D', b'A', b'T', 1, 2];
  let mut it = RawChunkIter::from(bytes.as_slice());
  assert_eq!(it.next(), Some(Err(ChunkError::PrematureEof)));
  assert!(it.next().is_none());
}
