#![no_std]
#![forbid(unsafe_code)]
#![cfg_attr(docs_rs, feature(doc_cfg))]

//! A crate to check the structural and checksum integrity of PNG data.
//!
//! This is a *checker*, not a decoder: it never reconstructs pixel data. It
//! walks the chunk stream, recomputes the checksums the stream claims, decodes
//! the image header, and peeks at the zlib framing inside the image data.
//! Everything suspicious becomes a [`Finding`], and the whole walk is narrated
//! as a line-oriented report suitable for eyeballing a hand-crafted or
//! corrupted file.
//!
//! ## Automatic Checking
//!
//! With the `alloc` feature (on by default) just call [`check_png_bytes`] on
//! the full PNG byte stream and you get back a [`CheckOutcome`] holding the
//! report text, the findings in stream order, and the terminal state.
//!
//! ## Manual Checking
//!
//! If you want control over where the report goes you can drive things
//! yourself:
//!
//! 1) Call [`walk_png`] with any [`core::fmt::Write`] sink and a closure that
//!    receives each [`Finding`] as it is produced.
//! 2) Or go lower still: build a [`RawChunkIter`] over the bytes after the
//!    8-byte signature and pull [`RawChunk`] records one at a time, using
//!    [`Ihdr`] and [`IdatView`] to interpret the payloads you care about.
//!
//! ## What gets flagged
//!
//! Only the premature end of the byte stream stops a walk. Every other defect
//! (signature bytes, chunk CRCs, the zlib FCHECK, stored-block LEN/NLEN and
//! length arithmetic, the Adler-32 trailer) is reported and the walk carries
//! on, so one pass lists everything wrong with every chunk it can reach.
//!
//! Entropy-coded DEFLATE blocks (BTYPE 1 and 2) are reported but never
//! inflated, and the stored-block length check models the whole image living
//! in a single stored block in a single IDAT chunk. Streams that split their
//! image data will be flagged; that is the tool being honest about what it
//! checked, not an accident.

#[cfg(feature = "alloc")]
extern crate alloc;

mod parser_helpers;
pub(crate) use parser_helpers::*;

mod raw_chunk;
pub use raw_chunk::*;

mod ihdr;
pub use ihdr::*;

mod idat;
pub use idat::*;

mod finding;
pub use finding::*;

mod driver;
pub use driver::*;
