use core::fmt::{self, Write};

use log::{debug, trace};

use crate::{check_idat, try_split_off_byte_array, ChunkTy, Finding, Ihdr, RawChunkIter};

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Where a checking run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
  /// An IEND chunk was read, so the whole logical stream was seen.
  Done,
  /// The stream ran out before an IEND chunk could be read.
  Aborted,
}

/// Walks a whole PNG byte stream, writing the report to `out` and handing
/// every defect to `on_finding` in stream order.
///
/// The signature is checked byte by byte (all eight bytes, no
/// short-circuiting), then chunks are pulled, CRC-checked, and summarized
/// one line each until an IEND chunk ends the walk. IHDR payloads are
/// decoded and reported; IDAT payloads get their zlib framing checked
/// against the most recently decoded header. Findings never stop the walk;
/// only running out of bytes does.
///
/// The only error this can return is the sink's own [`fmt::Error`].
pub fn walk_png<W: Write, F: FnMut(&Finding)>(
  bytes: &[u8], out: &mut W, mut on_finding: F,
) -> Result<TerminalState, fmt::Error> {
  let rest = check_signature(bytes, out, &mut on_finding)?;
  let mut ihdr: Option<Ihdr> = None;
  let mut it = RawChunkIter::from(rest);
  loop {
    let chunk = match it.next() {
      Some(Ok(chunk)) => chunk,
      Some(Err(_)) | None => {
        let finding = Finding::PrematureEof;
        on_finding(&finding);
        writeln!(out, "{}", finding)?;
        return Ok(TerminalState::Aborted);
      }
    };
    trace!("pulled {:?}", chunk);
    let computed = chunk.compute_crc();
    writeln!(
      out,
      "Chunk={}  Ancillary={} Private={} Reserved={} SafeToCopy={}  Length={}  FileCRC={}  ComputedCRC={}",
      chunk.ty(),
      chunk.ty().is_ancillary() as u8,
      chunk.ty().is_private() as u8,
      chunk.ty().is_reserved_set() as u8,
      chunk.ty().is_safe_to_copy() as u8,
      chunk.data().len(),
      chunk.declared_crc(),
      computed
    )?;
    if chunk.declared_crc() != computed {
      let finding = Finding::CrcMismatch {
        chunk: chunk.ty(),
        stored: chunk.declared_crc(),
        computed,
      };
      on_finding(&finding);
      write!(out, "{}\n\n", finding)?;
    }
    match chunk.ty() {
      ChunkTy::IHDR => match Ihdr::try_from(chunk.data()) {
        Ok(header) => {
          header.report(out)?;
          debug!("retained header {:?}", header);
          ihdr = Some(header);
        }
        Err(()) => {
          let finding = Finding::MalformedIhdr { length: chunk.data().len() as u32 };
          on_finding(&finding);
          write!(out, "{}\n\n", finding)?;
        }
      },
      ChunkTy::IDAT => match ihdr.as_ref() {
        Some(header) => check_idat(chunk.data(), header, out, &mut on_finding)?,
        None => trace!("IDAT before any usable IHDR, semantic checks skipped"),
      },
      ChunkTy::IEND => return Ok(TerminalState::Done),
      _ => (),
    }
  }
}

/// Checks all eight signature bytes independently, then hands back the rest.
///
/// A stream shorter than the signature compares its missing bytes as zero,
/// so a short file still reports per-byte findings before the chunk loop
/// aborts on it.
fn check_signature<'b, W: Write, F: FnMut(&Finding)>(
  bytes: &'b [u8], out: &mut W, on_finding: &mut F,
) -> Result<&'b [u8], fmt::Error> {
  let (found, rest): ([u8; 8], &'b [u8]) = match try_split_off_byte_array::<8>(bytes) {
    Some((sig, rest)) => (sig, rest),
    None => {
      let mut sig = [0_u8; 8];
      sig[..bytes.len()].copy_from_slice(bytes);
      (sig, &[])
    }
  };
  for (index, (&expected, &found_byte)) in PNG_SIGNATURE.iter().zip(found.iter()).enumerate() {
    if expected != found_byte {
      let finding = Finding::SignatureByteMismatch {
        index: index as u8,
        expected,
        found: found_byte,
      };
      on_finding(&finding);
      write!(out, "{}\n\n", finding)?;
    }
  }
  Ok(rest)
}

/// Everything a full checking run produced.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
  /// The human readable report, one summary line per chunk plus detail and
  /// error lines.
  pub report: alloc::string::String,
  /// Every defect found, in stream order.
  pub findings: alloc::vec::Vec<Finding>,
  /// Whether the walk saw an IEND or died early.
  pub state: TerminalState,
}
#[cfg(feature = "alloc")]
impl CheckOutcome {
  /// `true` when the stream produced no findings at all and ended at IEND.
  #[inline]
  #[must_use]
  pub fn is_clean(&self) -> bool {
    self.findings.is_empty() && self.state == TerminalState::Done
  }
}

/// Checks a whole PNG byte stream, collecting the report and the findings.
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub fn check_png_bytes(bytes: &[u8]) -> CheckOutcome {
  use alloc::{string::String, vec::Vec};
  let mut report = String::new();
  let mut findings: Vec<Finding> = Vec::new();
  // writing into a String can't fail, so the sink error arm can't happen
  let state =
    walk_png(bytes, &mut report, |f| findings.push(*f)).unwrap_or(TerminalState::Aborted);
  CheckOutcome { report, findings, state }
}
