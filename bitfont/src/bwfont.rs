use alloc::borrow::Cow;

use crate::font::{Codepoint, PixelRun, PixelSink, ALPHA_FULL};
use crate::Error;

/// Byte range inside a font's data block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Span {
  pub start: u32,
  pub len: u32,
}

impl Span {
  pub const EMPTY: Span = Span { start: 0, len: 0 };

  #[inline]
  pub const fn new(start: u32, len: u32) -> Self {
    Span { start, len }
  }

  #[inline]
  pub fn end(&self) -> Option<usize> {
    (self.start as usize).checked_add(self.len as usize)
  }

  #[inline]
  pub fn get<'d>(&self, data: &'d [u8]) -> Option<&'d [u8]> {
    data.get(self.start as usize..self.end()?)
  }
}

/// A contiguous block of codepoints `[first_char, first_char + char_count)` sharing one
/// crop offset and one glyph-data block.
///
/// `width != 0` means every glyph is `width` columns wide and advances by `width`;
/// otherwise `glyph_widths` holds one advance per glyph and `glyph_offsets` holds
/// `char_count + 1` little-endian u16 column offsets into `glyph_data`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CharRange {
  pub first_char: Codepoint,
  pub char_count: u16,
  pub offset_x: u8,
  pub offset_y: u8,
  pub height_bytes: u8,
  pub height_pixels: u8,
  pub width: u8,
  pub glyph_widths: Span,
  pub glyph_offsets: Span,
  pub glyph_data: Span,
}

impl CharRange {
  /// Index of `character` inside this range.
  #[inline]
  pub fn index_of(&self, character: Codepoint) -> Option<u16> {
    let index = character.wrapping_sub(self.first_char);
    (character >= self.first_char && index < self.char_count).then_some(index)
  }

  /// One past the last codepoint covered.
  #[inline]
  pub fn end_char(&self) -> u32 {
    self.first_char as u32 + self.char_count as u32
  }

  #[inline]
  fn glyph_offset(&self, data: &[u8], index: u16) -> Option<u16> {
    let table = self.glyph_offsets.get(data)?;
    let at = index as usize * 2;
    let bytes = table.get(at..at + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
  }

  /// Advance of glyph `index` (0 marks a placeholder).
  fn advance(&self, data: &[u8], index: u16) -> u8 {
    if self.width != 0 {
      return self.width;
    }
    self
      .glyph_widths
      .get(data)
      .and_then(|w| w.get(index as usize))
      .copied()
      .unwrap_or(0)
  }

  /// Column-major bytes of glyph `index` and its column count.
  fn columns<'d>(&self, data: &'d [u8], index: u16) -> Option<(&'d [u8], usize)> {
    let stride = self.height_bytes as usize;
    let block = self.glyph_data.get(data)?;
    let (start, cols) = if self.width != 0 {
      let cols = self.width as usize;
      (cols * index as usize, cols)
    } else {
      let a = self.glyph_offset(data, index)? as usize;
      let b = self.glyph_offset(data, index + 1)? as usize;
      (a, b.checked_sub(a)?)
    };
    let bytes = block.get(start * stride..(start + cols) * stride)?;
    Some((bytes, cols))
  }

  /// Checks that every table this range references lies inside `data`.
  pub fn validate(&self, data: &[u8]) -> Result<(), Error> {
    if (self.height_bytes as usize) * 8 < self.height_pixels as usize {
      return Err(Error::Malformed);
    }
    let stride = self.height_bytes as usize;
    if self.width != 0 {
      let need = self.width as usize * self.char_count as usize * stride;
      if (self.glyph_data.len as usize) < need || self.glyph_data.get(data).is_none() {
        return Err(Error::Truncated);
      }
      return Ok(());
    }
    if self.glyph_widths.len as usize != self.char_count as usize || self.glyph_widths.get(data).is_none() {
      return Err(Error::Truncated);
    }
    if self.glyph_offsets.len as usize != (self.char_count as usize + 1) * 2 || self.glyph_offsets.get(data).is_none() {
      return Err(Error::Truncated);
    }
    let mut prev = 0u16;
    for i in 0..=self.char_count {
      let off = self.glyph_offset(data, i).ok_or(Error::Truncated)?;
      if off < prev {
        return Err(Error::Malformed);
      }
      prev = off;
    }
    if (self.glyph_data.len as usize) < prev as usize * stride || self.glyph_data.get(data).is_none() {
      return Err(Error::Truncated);
    }
    Ok(())
  }
}

/// Bit-packed black-and-white glyph storage.
///
/// `data` holds every range's width table, offset table and glyph bitmaps; ranges
/// address it through [`Span`]s so the same type serves static tables, borrowed
/// buffers and owned buffers.
#[derive(Clone, Debug)]
pub struct BwFont<'a> {
  pub version: u8,
  pub data: Cow<'a, [u8]>,
  pub ranges: Cow<'a, [CharRange]>,
}

impl BwFont<'_> {
  /// Range containing `character` and the glyph index inside it.
  pub fn find_range(&self, character: Codepoint) -> Option<(&CharRange, u16)> {
    let after = self.ranges.partition_point(|r| r.first_char <= character);
    let range = self.ranges.get(after.checked_sub(1)?)?;
    range.index_of(character).map(|index| (range, index))
  }

  pub fn character_width(&self, character: Codepoint) -> u8 {
    match self.find_range(character) {
      Some((range, index)) => range.advance(&self.data, index),
      None => 0,
    }
  }

  /// Emits the inked runs of `character`, row by row, and returns its advance.
  pub fn render_character<S: PixelSink + ?Sized>(
    &self,
    x0: i16,
    y0: i16,
    character: Codepoint,
    sink: &mut S,
  ) -> Result<u8, S::Error> {
    let Some((range, index)) = self.find_range(character) else {
      return Ok(0);
    };
    let advance = range.advance(&self.data, index);
    if advance == 0 {
      return Ok(0);
    }
    let Some((bytes, cols)) = range.columns(&self.data, index) else {
      debug_assert!(false, "glyph U+{:04X} outside font data", character);
      return Ok(advance);
    };

    let stride = range.height_bytes as usize;
    let x0 = x0.wrapping_add(range.offset_x as i16);
    let y0 = y0.wrapping_add(range.offset_y as i16);

    for y in 0..range.height_pixels as usize {
      let band = y / 8;
      let mask = 1u8 << (y % 8);
      let row_y = y0.wrapping_add(y as i16);
      let mut run_start = 0usize;
      let mut run_len = 0usize;
      for x in 0..cols {
        let inked = bytes[x * stride + band] & mask != 0;
        if inked {
          if run_len == 0 {
            run_start = x;
          }
          run_len += 1;
          if run_len == u8::MAX as usize {
            emit(sink, x0, row_y, run_start, run_len)?;
            run_len = 0;
          }
        } else if run_len > 0 {
          emit(sink, x0, row_y, run_start, run_len)?;
          run_len = 0;
        }
      }
      if run_len > 0 {
        emit(sink, x0, row_y, run_start, run_len)?;
      }
    }
    Ok(advance)
  }

  /// Checks range ordering and every range's tables.
  pub fn validate(&self) -> Result<(), Error> {
    let mut prev_end = 0u32;
    for range in self.ranges.iter() {
      if (range.first_char as u32) < prev_end {
        return Err(Error::Malformed);
      }
      range.validate(&self.data)?;
      prev_end = range.end_char();
    }
    Ok(())
  }
}

#[inline]
fn emit<S: PixelSink + ?Sized>(sink: &mut S, x0: i16, y: i16, start: usize, len: usize) -> Result<(), S::Error> {
  sink.run(PixelRun { x: x0.wrapping_add(start as i16), y, count: len as u8, alpha: ALPHA_FULL })
}
