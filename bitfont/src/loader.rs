//! Parses an encoded font buffer into a live [`Font`].

use alloc::borrow::Cow;
use alloc::string::ToString;
use alloc::vec::Vec;

use log::debug;

use crate::bwfont::{BwFont, CharRange, Span};
use crate::cursor::Cursor;
use crate::font::{Font, FontFlags, FontInfo, FontKind};
use crate::kerning::KerningTable;
use crate::Error;

pub const BW_MAGIC: &[u8; 4] = b"ftbw";
pub const RLE_MAGIC: &[u8; 4] = b"ftrl";

/// The only typecase version this reader accepts.
pub const TYPECASE_VERSION: u8 = 2;

/// Bitmap glyph-table version written by the encoder.
pub const BWFONT_VERSION: u8 = 4;

/// Size of one range record in the header.
pub const RANGE_RECORD_LEN: usize = 2 + 2 + 5 + 4 * 3;

/// Parses `data` without copying it; glyph tables keep pointing into the buffer.
pub fn load(data: &[u8]) -> Result<Font<'_>, Error> {
  parse(Cow::Borrowed(data))
}

/// Parses `data` and keeps the buffer inside the returned font.
pub fn load_owned(data: Vec<u8>) -> Result<Font<'static>, Error> {
  parse(Cow::Owned(data))
}

fn parse(data: Cow<'_, [u8]>) -> Result<Font<'_>, Error> {
  let (info, version, ranges) = parse_tables(&data)?;
  debug!(
    "loaded font {:?} ({} ranges, {} bytes)",
    info.full_name,
    ranges.len(),
    data.len()
  );
  Ok(Font {
    info,
    kind: FontKind::Bitmap(BwFont { version, data, ranges: Cow::Owned(ranges) }),
    kerning: KerningTable::EMPTY,
  })
}

fn parse_tables(data: &[u8]) -> Result<(FontInfo<'static>, u8, Vec<CharRange>), Error> {
  let mut c = Cursor::new(data);

  let magic = c.bytes(4)?;
  if magic == RLE_MAGIC {
    return Err(Error::UnsupportedVariant);
  }
  if magic != BW_MAGIC {
    return Err(Error::BadMagic);
  }
  let typecase_version = c.u8()?;
  if typecase_version != TYPECASE_VERSION {
    return Err(Error::BadVersion(typecase_version));
  }
  let version = c.u8()?;

  let width = c.u8()?;
  let height = c.u8()?;
  let min_x_advance = c.u8()?;
  let max_x_advance = c.u8()?;
  let baseline_x = c.u8()?;
  let baseline_y = c.u8()?;
  let line_height = c.u8()?;
  // Black-and-white glyph storage is implied by the magic.
  let flags = FontFlags::from_bits_retain(c.u8()?) | FontFlags::BW;
  let fallback_character = c.u16_le()?;
  let full_name = Cow::Owned(c.pascal_str()?.to_string());
  let short_name = Cow::Owned(c.pascal_str()?.to_string());

  let range_count = c.u8()? as usize;
  let mut ranges = Vec::with_capacity(range_count);
  let mut prev_end = 0u32;
  for _ in 0..range_count {
    let range = parse_range(&mut c, data)?;
    if (range.first_char as u32) < prev_end {
      return Err(Error::Malformed);
    }
    prev_end = range.end_char();
    ranges.push(range);
  }

  let info = FontInfo {
    full_name,
    short_name,
    width,
    height,
    min_x_advance,
    max_x_advance,
    baseline_x,
    baseline_y,
    line_height,
    flags,
    fallback_character,
  };
  Ok((info, version, ranges))
}

fn parse_range(c: &mut Cursor<'_>, data: &[u8]) -> Result<CharRange, Error> {
  let first_char = c.u16_le()?;
  let char_count = c.u16_le()?;
  let offset_x = c.u8()?;
  let offset_y = c.u8()?;
  let height_bytes = c.u8()?;
  let height_pixels = c.u8()?;
  let width = c.u8()?;
  let widths_off = c.u32_le()?;
  let offsets_off = c.u32_le()?;
  let glyphs_off = c.u32_le()?;
  if char_count == 0 {
    return Err(Error::Malformed);
  }

  let (glyph_widths, glyph_offsets, columns) = if width != 0 {
    (Span::EMPTY, Span::EMPTY, width as u32 * char_count as u32)
  } else {
    let offsets = Span::new(offsets_off, (char_count as u32 + 1) * 2);
    let table = offsets.get(data).ok_or(Error::Truncated)?;
    let last = table.len() - 2;
    let columns = u16::from_le_bytes([table[last], table[last + 1]]) as u32;
    (Span::new(widths_off, char_count as u32), offsets, columns)
  };

  let range = CharRange {
    first_char,
    char_count,
    offset_x,
    offset_y,
    height_bytes,
    height_pixels,
    width,
    glyph_widths,
    glyph_offsets,
    glyph_data: Span::new(glyphs_off, columns * height_bytes as u32),
  };
  range.validate(data)?;
  Ok(range)
}
