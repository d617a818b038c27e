use core::fmt::{self, Display};

use crate::ChunkTy;

/// The prefix on every error line of a report, bell character included.
const BELL_PREFIX: &str = "\u{7}!!! ERROR !!!";

/// One non-fatal defect discovered while checking a stream.
///
/// Findings never stop the walk; they accumulate, and a stream is only
/// "clean" when it produced none at all. The `Display` form of a finding is
/// the bell-prefixed error line that appears in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finding {
  /// One byte of the 8-byte signature is wrong.
  SignatureByteMismatch {
    /// 0-based byte position (reports print it 1-based).
    index: u8,
    /// what the signature says the byte should be
    expected: u8,
    /// what the stream held
    found: u8,
  },
  /// The stored chunk CRC does not match the recomputed one.
  CrcMismatch {
    /// tag of the offending chunk
    chunk: ChunkTy,
    /// CRC stored in the stream
    stored: u32,
    /// CRC computed over tag + payload
    computed: u32,
  },
  /// An IHDR payload that could not be decoded into a header record.
  MalformedIhdr {
    /// the payload length found (13 is the only valid one)
    length: u32,
  },
  /// The zlib header check bits don't make `CMF*256 + FLG` a multiple of 31.
  FcheckMismatch {
    /// the CMF byte
    cmf: u8,
    /// the FLG byte
    flg: u8,
  },
  /// An IDAT payload too short to hold the field being checked.
  IdatTooShort {
    /// the payload length found
    length: u32,
  },
  /// NLEN is not the one's complement of LEN.
  NlenMismatch {
    /// LEN as stored
    len: u16,
    /// NLEN as stored
    nlen: u16,
  },
  /// LEN does not match the byte count the header geometry calls for.
  StoredLengthMismatch {
    /// LEN as stored
    len: u16,
    /// the byte count computed from the image header
    expected: u64,
  },
  /// The stored Adler-32 trailer does not match the stored data.
  AdlerMismatch {
    /// Adler-32 stored in the trailer
    stored: u32,
    /// Adler-32 computed over the stored bytes
    computed: u32,
  },
  /// The stream ended inside a chunk, or before any IEND chunk.
  PrematureEof,
}
impl Display for Finding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::SignatureByteMismatch { index, expected, found } => write!(
        f,
        "{} Header Byte {} Mismatch; Expected={}, but Found={}",
        BELL_PREFIX,
        index + 1,
        expected,
        found
      ),
      Self::CrcMismatch { .. } => write!(f, "{} CRC MISMATCH", BELL_PREFIX),
      Self::MalformedIhdr { length } => {
        write!(f, "{} IHDR payload of {} bytes is not a valid header", BELL_PREFIX, length)
      }
      Self::FcheckMismatch { .. } => {
        write!(f, "{} FCHECK checksum mismatch, not multiple of 31", BELL_PREFIX)
      }
      Self::IdatTooShort { length } => write!(
        f,
        "{} IDAT payload of {} bytes is too short for the zlib framing",
        BELL_PREFIX, length
      ),
      Self::NlenMismatch { len, nlen } => write!(
        f,
        "{} One's complement of LEN ({}) is not equal to NLEN ({})",
        BELL_PREFIX,
        !*len,
        nlen
      ),
      Self::StoredLengthMismatch { len, expected } => write!(
        f,
        "{} Mismatch with uncompressed data length ({}) and expected length ({})",
        BELL_PREFIX, len, expected
      ),
      Self::AdlerMismatch { .. } => write!(f, "{} ADLER-32 MISMATCH", BELL_PREFIX),
      Self::PrematureEof => write!(f, "{} Premature end of file encountered", BELL_PREFIX),
    }
  }
}
