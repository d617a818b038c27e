use png_check::*;
use walkdir::WalkDir;

const CRC: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

/// Wraps a payload as a length + tag + payload + CRC chunk record.
fn chunk(ty: &[u8; 4], payload: &[u8]) -> Vec<u8> {
  let mut out = Vec::new();
  out.extend((payload.len() as u32).to_be_bytes());
  out.extend(ty);
  out.extend(payload);
  let mut digest = CRC.digest();
  digest.update(ty);
  digest.update(payload);
  out.extend(digest.finalize().to_be_bytes());
  out
}

fn ihdr_payload(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
  let mut payload = Vec::new();
  payload.extend(width.to_be_bytes());
  payload.extend(height.to_be_bytes());
  payload.extend([bit_depth, color_type, 0, 0, 0]);
  payload
}

/// One final stored block holding `rows`, zlib-framed with a good Adler-32.
fn stored_idat_payload(rows: &[u8]) -> Vec<u8> {
  let len = rows.len() as u16;
  let mut payload = vec![0x78, 0x9C, 0x01];
  payload.extend(len.to_le_bytes());
  payload.extend((!len).to_le_bytes());
  payload.extend(rows);
  let mut rolling = adler32::RollingAdler32::new();
  rolling.update_buffer(rows);
  payload.extend(rolling.hash().to_be_bytes());
  payload
}

/// A 1x1 8-bit greyscale PNG: one row of one filter byte and one sample.
fn minimal_png() -> Vec<u8> {
  let mut png = Vec::from(PNG_SIGNATURE);
  png.extend(chunk(b"IHDR", &ihdr_payload(1, 1, 8, 0)));
  png.extend(chunk(b"IDAT", &stored_idat_payload(&[0, 42])));
  png.extend(chunk(b"IEND", &[]));
  png
}

#[test]
fn test_minimal_valid_png_is_clean() {
  let outcome = check_png_bytes(&minimal_png());
  assert_eq!(outcome.findings, Vec::new());
  assert_eq!(outcome.state, TerminalState::Done);
  assert!(outcome.is_clean());
  // spot check the narration
  assert!(outcome.report.contains("Chunk=IHDR  Ancillary=0 Private=0 Reserved=0 SafeToCopy=0"));
  assert!(outcome.report.contains("\t width=1"));
  assert!(outcome.report.contains("\t\t LEN=2"));
  assert!(outcome.report.contains("FileAdler32="));
  assert!(outcome.report.contains("Chunk=IEND"));
  assert!(!outcome.report.contains("ERROR"));
}

#[test]
fn test_one_corrupt_signature_byte_is_one_finding_and_still_done() {
  let mut png = minimal_png();
  png[2] = 0;
  let outcome = check_png_bytes(&png);
  assert_eq!(
    outcome.findings,
    vec![Finding::SignatureByteMismatch { index: 2, expected: 78, found: 0 }]
  );
  assert_eq!(outcome.state, TerminalState::Done);
  assert!(!outcome.is_clean());
}

#[test]
fn test_truncation_mid_chunk_length_aborts() {
  let png = minimal_png();
  let outcome = check_png_bytes(&png[..10]);
  assert_eq!(outcome.findings, vec![Finding::PrematureEof]);
  assert_eq!(outcome.state, TerminalState::Aborted);
}

#[test]
fn test_truncation_mid_chunk_payload_aborts() {
  let mut png = Vec::from(PNG_SIGNATURE);
  png.extend(chunk(b"IHDR", &ihdr_payload(1, 1, 8, 0)));
  let keep = png.len() - 6;
  let outcome = check_png_bytes(&png[..keep]);
  assert_eq!(outcome.findings, vec![Finding::PrematureEof]);
  assert_eq!(outcome.state, TerminalState::Aborted);
}

#[test]
fn test_bit_flip_in_type_tag_is_one_crc_mismatch() {
  let mut png = minimal_png();
  // bit 5 of the IHDR tag's fourth byte, making the tag "IHDr"
  png[8 + 4 + 3] ^= 0x20;
  let outcome = check_png_bytes(&png);
  assert_eq!(outcome.findings.len(), 1);
  assert!(matches!(
    outcome.findings[0],
    Finding::CrcMismatch { chunk, .. } if chunk == ChunkTy(*b"IHDr")
  ));
  assert_eq!(outcome.state, TerminalState::Done);
}

#[test]
fn test_bit_flip_in_payload_is_one_crc_mismatch() {
  let mut png = minimal_png();
  // the IHDR interlace byte, 0 -> 1: the header still decodes, and the
  // stored-length arithmetic doesn't care, so only the CRC complains
  png[8 + 8 + 12] ^= 1;
  let outcome = check_png_bytes(&png);
  assert_eq!(outcome.findings.len(), 1);
  assert!(matches!(
    outcome.findings[0],
    Finding::CrcMismatch { chunk, .. } if chunk == ChunkTy(*b"IHDR")
  ));
  assert_eq!(outcome.state, TerminalState::Done);
}

#[test]
fn test_fcheck_mismatch_is_flagged() {
  let mut idat = stored_idat_payload(&[0, 42]);
  idat[1] ^= 0x20;
  let mut png = Vec::from(PNG_SIGNATURE);
  png.extend(chunk(b"IHDR", &ihdr_payload(1, 1, 8, 0)));
  png.extend(chunk(b"IDAT", &idat));
  png.extend(chunk(b"IEND", &[]));
  let outcome = check_png_bytes(&png);
  assert_eq!(
    outcome.findings,
    vec![Finding::FcheckMismatch { cmf: 0x78, flg: 0x9C ^ 0x20 }]
  );
  assert_eq!(outcome.state, TerminalState::Done);
}

#[test]
fn test_nlen_mismatch_is_flagged() {
  let mut idat = stored_idat_payload(&[0, 42]);
  idat[5] ^= 0xFF;
  let mut png = Vec::from(PNG_SIGNATURE);
  png.extend(chunk(b"IHDR", &ihdr_payload(1, 1, 8, 0)));
  png.extend(chunk(b"IDAT", &idat));
  png.extend(chunk(b"IEND", &[]));
  let outcome = check_png_bytes(&png);
  assert_eq!(outcome.findings, vec![Finding::NlenMismatch { len: 2, nlen: 0xFF02 }]);
  assert_eq!(outcome.state, TerminalState::Done);
}

#[test]
fn test_stored_length_mismatch_is_flagged() {
  // three stored bytes where the 1x1 image calls for two
  let mut png = Vec::from(PNG_SIGNATURE);
  png.extend(chunk(b"IHDR", &ihdr_payload(1, 1, 8, 0)));
  png.extend(chunk(b"IDAT", &stored_idat_payload(&[0, 42, 43])));
  png.extend(chunk(b"IEND", &[]));
  let outcome = check_png_bytes(&png);
  assert_eq!(
    outcome.findings,
    vec![Finding::StoredLengthMismatch { len: 3, expected: 2 }]
  );
  assert_eq!(outcome.state, TerminalState::Done);
}

#[test]
fn test_adler_mismatch_is_flagged() {
  let mut idat = stored_idat_payload(&[0, 42]);
  let last = idat.len() - 1;
  idat[last] ^= 0xFF;
  let mut png = Vec::from(PNG_SIGNATURE);
  png.extend(chunk(b"IHDR", &ihdr_payload(1, 1, 8, 0)));
  png.extend(chunk(b"IDAT", &idat));
  png.extend(chunk(b"IEND", &[]));
  let outcome = check_png_bytes(&png);
  assert_eq!(outcome.findings.len(), 1);
  assert!(matches!(outcome.findings[0], Finding::AdlerMismatch { .. }));
  assert_eq!(outcome.state, TerminalState::Done);
}

#[test]
fn test_entropy_coded_blocks_are_reported_but_not_checked() {
  // BTYPE=2 (dynamic Huffman): framing report only, nothing to flag
  let mut png = Vec::from(PNG_SIGNATURE);
  png.extend(chunk(b"IHDR", &ihdr_payload(1, 1, 8, 0)));
  png.extend(chunk(b"IDAT", &[0x78, 0x9C, 0x05, 1, 2, 3]));
  png.extend(chunk(b"IEND", &[]));
  let outcome = check_png_bytes(&png);
  assert_eq!(outcome.findings, Vec::new());
  assert!(outcome.report.contains("BTYPE=2"));
  assert_eq!(outcome.state, TerminalState::Done);
}

#[test]
fn test_stored_block_built_from_the_header_geometry_is_clean() {
  // 3x2 RGB at 8 bits: each row is 1 + 3*3 bytes
  let ihdr = Ihdr {
    width: 3,
    height: 2,
    bit_depth: 8,
    color_type: ColorType::RGB,
    compression_method: 0,
    filter_method: 0,
    interlace_method: 0,
  };
  let rows = vec![0_u8; ihdr.expected_stored_len() as usize];
  let mut png = Vec::from(PNG_SIGNATURE);
  png.extend(chunk(b"IHDR", &ihdr_payload(3, 2, 8, 2)));
  png.extend(chunk(b"IDAT", &stored_idat_payload(&rows)));
  png.extend(chunk(b"IEND", &[]));
  let outcome = check_png_bytes(&png);
  assert_eq!(outcome.findings, Vec::new());
  assert!(outcome.is_clean());
}

#[test]
fn test_malformed_ihdr_is_flagged_and_idat_is_skipped() {
  let mut png = Vec::from(PNG_SIGNATURE);
  png.extend(chunk(b"IHDR", &[0_u8; 5]));
  png.extend(chunk(b"IDAT", &stored_idat_payload(&[0, 42])));
  png.extend(chunk(b"IEND", &[]));
  let outcome = check_png_bytes(&png);
  assert_eq!(outcome.findings, vec![Finding::MalformedIhdr { length: 5 }]);
  assert_eq!(outcome.state, TerminalState::Done);
  // without a header there's no LEN report for the IDAT chunk
  assert!(!outcome.report.contains("LEN="));
}

#[test]
fn test_short_idat_payload_is_flagged_not_read_out_of_bounds() {
  let mut png = Vec::from(PNG_SIGNATURE);
  png.extend(chunk(b"IHDR", &ihdr_payload(1, 1, 8, 0)));
  png.extend(chunk(b"IDAT", &[0x78, 0x9C]));
  png.extend(chunk(b"IEND", &[]));
  let outcome = check_png_bytes(&png);
  assert_eq!(outcome.findings, vec![Finding::IdatTooShort { length: 2 }]);
  assert_eq!(outcome.state, TerminalState::Done);
}

#[test]
fn test_bytes_after_iend_are_ignored() {
  let mut png = minimal_png();
  png.extend([1, 2, 3, 4, 5]);
  let outcome = check_png_bytes(&png);
  assert!(outcome.is_clean());
}

#[test]
fn test_walk_never_panics_on_any_tests_file() {
  // every file under tests/, none of which are PNG data, plus random bytes:
  // the checker should always come back with *some* outcome.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    let bytes = match std::fs::read(entry.path()) {
      Ok(bytes) => bytes,
      Err(_) => continue,
    };
    let _ = check_png_bytes(&bytes);
    for _ in RawChunkIter::from(bytes.as_slice()) {
      //
    }
  }
  for _ in 0..10 {
    let bytes = super::rand_bytes(1024);
    let _ = check_png_bytes(&bytes);
  }
}
