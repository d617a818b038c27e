use core::fmt::{self, Write};

use adler32::RollingAdler32;
use bitfrob::{u8_get_bit, u8_get_value};

use crate::{u16_le, u32_be, Finding, Ihdr};

/// The two byte header on the front of a zlib data stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZlibHeader {
  /// Compression Method and Flags byte
  pub cmf: u8,
  /// FLaGs byte
  pub flg: u8,
}
impl ZlibHeader {
  /// Bits 0-3 of CMF. 8 means deflate, the only method PNG uses.
  #[inline]
  #[must_use]
  pub fn compression_method(self) -> u8 {
    u8_get_value(0, 3, self.cmf)
  }
  /// Bits 4-7 of CMF. 7 means a 32k window.
  #[inline]
  #[must_use]
  pub fn compression_info(self) -> u8 {
    u8_get_value(4, 7, self.cmf)
  }
  /// Bits 0-4 of FLG, the check bits for CMF and FLG.
  #[inline]
  #[must_use]
  pub fn fcheck(self) -> u8 {
    u8_get_value(0, 4, self.flg)
  }
  /// Bit 5 of FLG, set when a preset dictionary follows the header.
  #[inline]
  #[must_use]
  pub fn fdict(self) -> bool {
    u8_get_bit(5, self.flg)
  }
  /// Bits 6-7 of FLG, the compression level hint.
  #[inline]
  #[must_use]
  pub fn flevel(self) -> u8 {
    u8_get_value(6, 7, self.flg)
  }
  /// `(CMF*256 + FLG) % 31`, which a conforming stream keeps at 0.
  #[inline]
  #[must_use]
  pub fn fcheck_remainder(self) -> u8 {
    ((u16::from(self.cmf) * 256 + u16::from(self.flg)) % 31) as u8
  }
}

/// The bit fields of the first byte of a DEFLATE block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateBlockHeader {
  /// the raw byte
  pub raw: u8,
}
impl DeflateBlockHeader {
  /// Bit 0: this is the last block of the stream.
  #[inline]
  #[must_use]
  pub fn is_final(self) -> bool {
    u8_get_bit(0, self.raw)
  }
  /// Bits 1-2: 0 stored, 1 fixed Huffman, 2 dynamic Huffman, 3 invalid.
  #[inline]
  #[must_use]
  pub fn btype(self) -> u8 {
    u8_get_value(1, 2, self.raw)
  }
}

/// A bounds-checked view of one IDAT chunk's payload.
///
/// Each accessor names a field of the zlib/DEFLATE framing and hands back
/// `None` when the payload's declared length can't hold that field, so a
/// truncated or adversarial chunk can never cause an out-of-range read.
///
/// Layout assumed (stored blocks): 2 byte zlib header, 1 block header byte,
/// LEN and NLEN (little-endian), `LEN` data bytes, then a big-endian Adler-32
/// in the final 4 payload bytes.
#[derive(Debug, Clone, Copy)]
pub struct IdatView<'b>(&'b [u8]);
impl<'b> IdatView<'b> {
  /// Wraps a full IDAT payload.
  #[inline]
  #[must_use]
  pub const fn new(data: &'b [u8]) -> Self {
    Self(data)
  }
  /// The zlib stream header, when the payload holds one.
  #[inline]
  #[must_use]
  pub fn zlib_header(&self) -> Option<ZlibHeader> {
    match self.0 {
      [cmf, flg, ..] => Some(ZlibHeader { cmf: *cmf, flg: *flg }),
      _ => None,
    }
  }
  /// The first byte of the first DEFLATE block.
  #[inline]
  #[must_use]
  pub fn block_header(&self) -> Option<DeflateBlockHeader> {
    self.0.get(2).copied().map(|raw| DeflateBlockHeader { raw })
  }
  /// LEN and NLEN of a stored block.
  #[inline]
  #[must_use]
  pub fn stored_len_nlen(&self) -> Option<(u16, u16)> {
    let len = u16_le(self.0.get(3..5)?);
    let nlen = u16_le(self.0.get(5..7)?);
    Some((len, nlen))
  }
  /// The `len` stored data bytes that follow the LEN/NLEN pair.
  #[inline]
  #[must_use]
  pub fn stored_data(&self, len: u16) -> Option<&'b [u8]> {
    self.0.get(7..7 + usize::from(len))
  }
  /// The big-endian Adler-32 trailer in the last four payload bytes.
  #[inline]
  #[must_use]
  pub fn adler_trailer(&self) -> Option<u32> {
    Some(u32_be(self.0.get(self.0.len().checked_sub(4)?..)?))
  }
}

/// Checks one IDAT payload against the retained image header.
///
/// Writes the indented detail report to `out` and hands every defect to
/// `on_finding`. A mismatch never stops the later steps; only a payload too
/// short for the field being read does, with one [`Finding::IdatTooShort`].
/// Entropy-coded blocks (BTYPE 1 and 2) end the checks after the block
/// header report, since saying anything more would need a full inflate.
pub fn check_idat<W: Write, F: FnMut(&Finding)>(
  data: &[u8], ihdr: &Ihdr, out: &mut W, on_finding: &mut F,
) -> fmt::Result {
  let view = IdatView::new(data);
  let too_short = Finding::IdatTooShort { length: data.len() as u32 };
  //
  let zlib = match view.zlib_header() {
    Some(zlib) => zlib,
    None => {
      on_finding(&too_short);
      return write!(out, "{}\n\n", too_short);
    }
  };
  writeln!(out, "\t CMF={}", zlib.cmf)?;
  writeln!(
    out,
    "\t\t Compression Method={}  (should always be 8 for PNG; 8=deflate)",
    zlib.compression_method()
  )?;
  writeln!(out, "\t\t Compression Info={}  (7=32K window size)", zlib.compression_info())?;
  writeln!(out, "\t FLG={}", zlib.flg)?;
  writeln!(out, "\t\t FCHECK={}  (check bits for CMF and FLG)", zlib.fcheck())?;
  if zlib.fcheck_remainder() != 0 {
    let finding = Finding::FcheckMismatch { cmf: zlib.cmf, flg: zlib.flg };
    on_finding(&finding);
    write!(out, "{}\n\n", finding)?;
  }
  writeln!(out, "\t\t FDICT={}  (0=no preset dictionary)", zlib.fdict() as u8)?;
  writeln!(out, "\t\t FLEVEL={}  (2=use default algorithm)", zlib.flevel())?;
  //
  let block = match view.block_header() {
    Some(block) => block,
    None => {
      on_finding(&too_short);
      return write!(out, "{}\n\n", too_short);
    }
  };
  writeln!(
    out,
    "\t Block Format: First Byte={}   First 3-bits that matter={}",
    block.raw,
    block.raw & 7
  )?;
  writeln!(out, "\t\t BFINAL={}  (0=more blocks follow; 1=final block)", block.is_final() as u8)?;
  writeln!(
    out,
    "\t\t BTYPE={}  (0=no compression; 1=fixed Huffman; 2=dynamic Huffman; 3=error)",
    block.btype()
  )?;
  if block.btype() != 0 {
    return Ok(());
  }
  //
  let (len, nlen) = match view.stored_len_nlen() {
    Some(pair) => pair,
    None => {
      on_finding(&too_short);
      return write!(out, "{}\n\n", too_short);
    }
  };
  writeln!(out, "\t\t LEN={}", len)?;
  writeln!(out, "\t\t NLEN={}", nlen)?;
  if nlen != !len {
    let finding = Finding::NlenMismatch { len, nlen };
    on_finding(&finding);
    write!(out, "{}\n\n", finding)?;
  }
  let expected = ihdr.expected_stored_len();
  if u64::from(len) != expected {
    let finding = Finding::StoredLengthMismatch { len, expected };
    on_finding(&finding);
    write!(out, "{}\n\n", finding)?;
  }
  match (view.stored_data(len), view.adler_trailer()) {
    (Some(stored), Some(declared)) => {
      let mut rolling = RollingAdler32::new();
      rolling.update_buffer(stored);
      let computed = rolling.hash();
      writeln!(out, "\t\t FileAdler32={}  ComputedAdler32={}", declared, computed)?;
      if declared != computed {
        let finding = Finding::AdlerMismatch { stored: declared, computed };
        on_finding(&finding);
        write!(out, "{}\n\n", finding)?;
      }
    }
    _ => {
      on_finding(&too_short);
      write!(out, "{}\n\n", too_short)?;
    }
  }
  Ok(())
}

#[test]
fn test_zlib_header_field_decoding() {
  // the canonical default header
  let zlib = ZlibHeader { cmf: 0x78, flg: 0x9C };
  assert_eq!(zlib.compression_method(), 8);
  assert_eq!(zlib.compression_info(), 7);
  assert_eq!(zlib.fcheck(), 28);
  assert!(!zlib.fdict());
  assert_eq!(zlib.flevel(), 2);
  assert_eq!(zlib.fcheck_remainder(), 0);
}

#[test]
fn test_fcheck_remainder_catches_any_single_bit_of_flg() {
  for bit in 0..8 {
    let zlib = ZlibHeader { cmf: 0x78, flg: 0x9C ^ (1 << bit) };
    assert_ne!(zlib.fcheck_remainder(), 0, "failed bit:{}", bit);
  }
}

#[test]
fn test_deflate_block_header_bits() {
  let block = DeflateBlockHeader { raw: 0b0000_0001 };
  assert!(block.is_final());
  assert_eq!(block.btype(), 0);
  //
  let block = DeflateBlockHeader { raw: 0b0000_0100 };
  assert!(!block.is_final());
  assert_eq!(block.btype(), 2);
}

#[test]
fn test_idat_view_refuses_short_payloads() {
  let view = IdatView::new(&[0x78]);
  assert!(view.zlib_header().is_none());
  assert!(view.block_header().is_none());
  assert!(view.stored_len_nlen().is_none());
  assert!(view.stored_data(1).is_none());
  assert!(view.adler_trailer().is_none());
  //
  let view = IdatView::new(&[0x78, 0x9C, 0x01, 2, 0, 0xFD, 0xFF]);
  assert!(view.zlib_header().is_some());
  assert_eq!(view.stored_len_nlen(), Some((2, 0xFFFD)));
  // 7 bytes holds LEN/NLEN but no stored data yet
  assert!(view.stored_data(2).is_none());
}
