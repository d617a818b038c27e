use core::fmt::{self, Write};

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl ColorType {
  /// The number of samples in each pixel of this color type.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> u64 {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }
}
impl TryFrom<u8> for ColorType {
  type Error = ();
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => ColorType::Y,
      2 => ColorType::RGB,
      3 => ColorType::Index,
      4 => ColorType::YA,
      6 => ColorType::RGBA,
      _ => return Err(()),
    })
  }
}

/// The image header record.
///
/// Decoding checks that each field holds one of its allowed values, but it
/// does *not* cross-check the bit depth against the color type. An illegal
/// pairing (say indexed color at 16 bits) decodes fine and is simply reported
/// as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ihdr {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per sample: 1, 2, 4, 8, or 16
  pub bit_depth: u8,
  /// how samples make up a pixel
  pub color_type: ColorType,
  /// expected to be 0 (deflate/inflate with a 32k window)
  pub compression_method: u8,
  /// expected to be 0 (adaptive filtering, five filter types)
  pub filter_method: u8,
  /// 0 for sequential, 1 for Adam7 interlacing
  pub interlace_method: u8,
}
impl TryFrom<&[u8]> for Ihdr {
  type Error = ();
  fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
    match value {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] => {
        Ok(Self {
          width: u32::from_be_bytes([*w0, *w1, *w2, *w3]),
          height: u32::from_be_bytes([*h0, *h1, *h2, *h3]),
          bit_depth: match *bit_depth {
            1 | 2 | 4 | 8 | 16 => *bit_depth,
            _ => return Err(()),
          },
          color_type: ColorType::try_from(*color_type)?,
          compression_method: *compression_method,
          filter_method: *filter_method,
          interlace_method: match *interlace_method {
            0 | 1 => *interlace_method,
            _ => return Err(()),
          },
        })
      }
      _ => Err(()),
    }
  }
}
impl Ihdr {
  /// The byte count a single stored DEFLATE block needs to hold every
  /// filtered row of the image.
  ///
  /// Each row is one filter type byte plus the packed sample bytes, with
  /// sub-byte depths rounding the row up to a whole byte. This models the
  /// entire image living in one stored block inside one IDAT chunk; streams
  /// that split their image data across blocks or chunks won't match it.
  #[must_use]
  pub fn expected_stored_len(&self) -> u64 {
    let mut expected: u64 =
      u64::from(self.width).saturating_mul(self.color_type.channel_count());
    let mut need_filler = 0_u64;
    match self.bit_depth {
      1 => {
        if expected % 8 != 0 {
          need_filler = 1;
        }
        expected >>= 3;
      }
      2 => {
        if expected % 4 != 0 {
          need_filler = 1;
        }
        expected >>= 2;
      }
      4 => {
        if expected % 2 != 0 {
          need_filler = 1;
        }
        expected >>= 1;
      }
      16 => expected = expected.saturating_mul(2),
      _ => (),
    }
    expected = expected.saturating_add(need_filler);
    // one filter type byte on the front of every row
    expected = expected.saturating_add(1);
    expected.saturating_mul(u64::from(self.height))
  }

  /// Writes the indented field-by-field report for this header.
  pub fn report<W: Write>(&self, out: &mut W) -> fmt::Result {
    writeln!(out, "\t width={}", self.width)?;
    writeln!(out, "\t height={}", self.height)?;
    writeln!(out, "\t bit_depth={}", self.bit_depth)?;
    writeln!(out, "\t color_type={}", self.color_type as u8)?;
    writeln!(out, "\t comp_method={}", self.compression_method)?;
    writeln!(out, "\t filter_method={}", self.filter_method)?;
    writeln!(out, "\t interlace_method={}", self.interlace_method)
  }
}

#[test]
fn test_ihdr_decodes_thirteen_bytes() {
  let bytes =
    [0, 0, 0, 2, 0, 0, 0, 3, 8, 2, 0, 0, 1];
  let ihdr = Ihdr::try_from(bytes.as_slice()).unwrap();
  assert_eq!(ihdr.width, 2);
  assert_eq!(ihdr.height, 3);
  assert_eq!(ihdr.bit_depth, 8);
  assert_eq!(ihdr.color_type, ColorType::RGB);
  assert_eq!(ihdr.compression_method, 0);
  assert_eq!(ihdr.filter_method, 0);
  assert_eq!(ihdr.interlace_method, 1);
}

#[test]
fn test_ihdr_rejects_bad_payloads() {
  // wrong length
  assert!(Ihdr::try_from([0_u8; 12].as_slice()).is_err());
  assert!(Ihdr::try_from([0_u8; 14].as_slice()).is_err());
  // color type 5 is not a thing
  let bytes = [0, 0, 0, 1, 0, 0, 0, 1, 8, 5, 0, 0, 0];
  assert!(Ihdr::try_from(bytes.as_slice()).is_err());
  // bit depth 3 is not a thing
  let bytes = [0, 0, 0, 1, 0, 0, 0, 1, 3, 0, 0, 0, 0];
  assert!(Ihdr::try_from(bytes.as_slice()).is_err());
  // interlace method 2 is not a thing
  let bytes = [0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 2];
  assert!(Ihdr::try_from(bytes.as_slice()).is_err());
}

#[test]
fn test_expected_stored_len_formulas() {
  let mut ihdr = Ihdr {
    width: 5,
    height: 7,
    bit_depth: 8,
    color_type: ColorType::RGB,
    compression_method: 0,
    filter_method: 0,
    interlace_method: 0,
  };
  // 8-bit RGB: height * (1 + 3 * width)
  assert_eq!(ihdr.expected_stored_len(), 7 * (1 + 3 * 5));
  // 1-bit greyscale: height * (1 + ceil(width / 8))
  ihdr.bit_depth = 1;
  ihdr.color_type = ColorType::Y;
  ihdr.width = 10;
  assert_eq!(ihdr.expected_stored_len(), 7 * (1 + 2));
  ihdr.width = 16;
  assert_eq!(ihdr.expected_stored_len(), 7 * (1 + 2));
  // 4-bit palette data, odd width needs the filler byte
  ihdr.bit_depth = 4;
  ihdr.color_type = ColorType::Index;
  ihdr.width = 3;
  assert_eq!(ihdr.expected_stored_len(), 7 * (1 + 2));
  // 16-bit RGBA doubles the sample bytes
  ihdr.bit_depth = 16;
  ihdr.color_type = ColorType::RGBA;
  ihdr.width = 2;
  assert_eq!(ihdr.expected_stored_len(), 7 * (1 + 2 * 4 * 2));
}
