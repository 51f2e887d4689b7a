#![no_std]

//! Minimal no_std bitfont reader, glyph renderer and text layout.
//!
//! File format ("ftbw", little-endian):
//! - Header: magic, u8 typecase version (=2), u8 font version, u8 width, u8 height,
//!   u8 min/max x advance, u8 baseline x/y, u8 line height, u8 flags, u16 fallback
//! - Names: two Pascal strings (full, short)
//! - u8 range count, then per range:
//!   u16 first, u16 count, u8 offset x/y, u8 height bytes/pixels, u8 width,
//!   u32 widths_off, u32 offsets_off, u32 glyphs_off (absolute; the first two are 0
//!   when `width != 0`)
//! - Glyph bitmaps are column-major, one bit per pixel, `ceil(h/8)` bytes per column.
//!
//! Everything below the loader works on any [`Face`]: the bitmap decoder, the
//! scaled adapter and whatever a caller implements on top of the same contract.

extern crate alloc;

mod bwfont;
mod cursor;
mod encoding;
mod font;
mod justify;
mod kerning;
mod loader;
mod registry;
mod rlefont;
mod scaled;
#[cfg(feature = "embedded-graphics")]
mod style;
mod typecase;
mod wordwrap;

pub mod fonts;

pub use bwfont::{BwFont, CharRange, Span};
pub use encoding::{chars, getchar, rewind, Chars};
pub use font::{
  Codepoint, Face, FnSink, Font, FontFlags, FontInfo, FontKind, PixelRun, PixelSink, Whitespace, ALPHA_FULL, INK_THRESHOLD,
};
pub use justify::{render_aligned, render_justified, string_width, Align};
#[cfg(feature = "kerning")]
pub use kerning::compute_kerning;
pub use kerning::{KerningPair, KerningTable};
pub use loader::{load, load_owned, BWFONT_VERSION, BW_MAGIC, RANGE_RECORD_LEN, RLE_MAGIC, TYPECASE_VERSION};
pub use registry::{find_font, font_list, FontList, FontListIter, INCLUDED_FONTS};
pub use rlefont::RleFont;
pub use scaled::ScaledFont;
#[cfg(feature = "embedded-graphics")]
pub use style::BitTextStyle;
pub use typecase::{FaceEntry, TypeCase, TYPECASE_MAGIC};
pub use wordwrap::wordwrap;

/// Parsing/validation errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
  /// Wrong magic (expected "ftbw", "ftrl" or "case").
  BadMagic,
  /// Magic names a variant this reader cannot construct ("ftrl").
  UnsupportedVariant,
  /// Unsupported typecase version (expected 2).
  BadVersion(u8),
  /// Buffer ends before a header field, table or glyph block.
  Truncated,
  /// Tables are present but inconsistent (unsorted ranges, decreasing offsets, ...).
  Malformed,
  /// A name string is not valid UTF-8.
  BadName,
}

impl core::fmt::Display for Error {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Error::BadMagic => f.write_str("bad magic"),
      Error::UnsupportedVariant => f.write_str("font variant not supported by this reader"),
      Error::BadVersion(v) => write!(f, "unsupported version {v}"),
      Error::Truncated => f.write_str("font data truncated"),
      Error::Malformed => f.write_str("malformed font tables"),
      Error::BadName => f.write_str("font name is not valid UTF-8"),
    }
  }
}

impl core::error::Error for Error {}

#[inline]
pub const fn ceil_div_u8(v: u8, d: u8) -> u8 {
  ((v as u16 + (d as u16 - 1)) / d as u16) as u8
}
