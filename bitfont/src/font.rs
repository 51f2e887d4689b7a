//! Font descriptor and the render/measure dispatch every variant shares.

use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::convert::Infallible;

use bitflags::bitflags;
use log::trace;

use crate::bwfont::BwFont;
use crate::kerning::KerningTable;
use crate::rlefont::RleFont;

/// Character identifier as stored in the font tables (not a raw byte).
pub type Codepoint = u16;

/// Coverage reported for an inked pixel.
pub const ALPHA_FULL: u8 = 16;

/// Runs with alpha above this value count as ink.
pub const INK_THRESHOLD: u8 = 7;

bitflags! {
  #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
  pub struct FontFlags: u8 {
    /// Every glyph has the same advance.
    const MONOSPACE = 0x01;
    /// Glyphs carry one bit per pixel.
    const BW = 0x02;
  }
}

/// Immutable metadata shared by every font variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontInfo<'a> {
  pub full_name: Cow<'a, str>,
  pub short_name: Cow<'a, str>,
  /// Bounding box of the largest glyph.
  pub width: u8,
  pub height: u8,
  pub min_x_advance: u8,
  pub max_x_advance: u8,
  /// Baseline position inside the bounding box.
  pub baseline_x: u8,
  pub baseline_y: u8,
  pub line_height: u8,
  pub flags: FontFlags,
  /// Rendered in place of any codepoint no range covers.
  pub fallback_character: Codepoint,
}

/// One horizontal run of same-alpha pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelRun {
  pub x: i16,
  pub y: i16,
  pub count: u8,
  /// Coverage, 0..=16.
  pub alpha: u8,
}

/// Receives pixel runs while a glyph is rendered.
///
/// A failing sink aborts the render immediately; nothing already emitted is retracted.
pub trait PixelSink {
  type Error;

  fn run(&mut self, run: PixelRun) -> Result<(), Self::Error>;
}

impl<S: PixelSink + ?Sized> PixelSink for &mut S {
  type Error = S::Error;

  #[inline]
  fn run(&mut self, run: PixelRun) -> Result<(), Self::Error> {
    (**self).run(run)
  }
}

impl PixelSink for Vec<PixelRun> {
  type Error = Infallible;

  #[inline]
  fn run(&mut self, run: PixelRun) -> Result<(), Self::Error> {
    self.push(run);
    Ok(())
  }
}

/// Adapts a closure into a [`PixelSink`].
pub struct FnSink<F>(pub F);

impl<F, E> PixelSink for FnSink<F>
where
  F: FnMut(PixelRun) -> Result<(), E>,
{
  type Error = E;

  #[inline]
  fn run(&mut self, run: PixelRun) -> Result<(), E> {
    (self.0)(run)
  }
}

/// Blank margins around the inked part of a glyph, measured against the font's bounding box.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Whitespace {
  pub left: u8,
  pub top: u8,
  pub right: u8,
  pub bottom: u8,
}

/// The contract every font variant implements.
///
/// Implementors provide the raw per-variant operations ([`Face::glyph_width`] and
/// [`Face::render_glyph`]), which return 0 without emitting anything for a codepoint
/// no range covers. The provided methods add the single fallback-character retry.
pub trait Face {
  fn info(&self) -> &FontInfo<'_>;

  /// Advance of `character`, or 0 if the font does not map it.
  fn glyph_width(&self, character: Codepoint) -> u8;

  /// Renders `character` with its bounding box at `(x0, y0)` and returns its advance,
  /// or 0 (and no runs) if the font does not map it.
  fn render_glyph<S: PixelSink + ?Sized>(
    &self,
    x0: i16,
    y0: i16,
    character: Codepoint,
    sink: &mut S,
  ) -> Result<u8, S::Error>;

  /// Signed advance adjustment between two adjacent characters.
  fn kerning(&self, _left: Codepoint, _right: Codepoint) -> i8 {
    0
  }

  /// Advance of `character`, falling back once to the fallback character.
  fn character_width(&self, character: Codepoint) -> u8 {
    match self.glyph_width(character) {
      0 => self.glyph_width(self.info().fallback_character),
      w => w,
    }
  }

  /// Renders `character`, falling back once to the fallback character.
  fn render_character<S: PixelSink + ?Sized>(
    &self,
    x0: i16,
    y0: i16,
    character: Codepoint,
    sink: &mut S,
  ) -> Result<u8, S::Error> {
    let width = self.render_glyph(x0, y0, character, sink)?;
    if width != 0 {
      return Ok(width);
    }
    let fallback = self.info().fallback_character;
    trace!("U+{:04X} unmapped, falling back to U+{:04X}", character, fallback);
    self.render_glyph(x0, y0, fallback, sink)
  }

  /// Measures the blank margins of `character`.
  ///
  /// A glyph without ink reports `left = width, top = height, right = bottom = 0`.
  fn character_whitespace(&self, character: Codepoint) -> Whitespace {
    let mut bounds = InkBounds::default();
    let _ = self.render_character(0, 0, character, &mut bounds);
    let info = self.info();
    match bounds.extent {
      None => Whitespace { left: info.width, top: info.height, right: 0, bottom: 0 },
      Some((min_x, min_y, max_x, max_y)) => Whitespace {
        left: clamp_u8(min_x as i32),
        top: clamp_u8(min_y as i32),
        right: clamp_u8(info.width as i32 - max_x as i32 - 1),
        bottom: clamp_u8(info.height as i32 - max_y as i32 - 1),
      },
    }
  }
}

/// Tracks the extent of runs above [`INK_THRESHOLD`].
#[derive(Default)]
struct InkBounds {
  extent: Option<(i16, i16, i16, i16)>,
}

impl PixelSink for InkBounds {
  type Error = Infallible;

  fn run(&mut self, run: PixelRun) -> Result<(), Infallible> {
    if run.alpha > INK_THRESHOLD && run.count > 0 {
      let last_x = run.x.saturating_add(run.count as i16 - 1);
      self.extent = Some(match self.extent {
        None => (run.x, run.y, last_x, run.y),
        Some((x0, y0, x1, y1)) => (x0.min(run.x), y0.min(run.y), x1.max(last_x), y1.max(run.y)),
      });
    }
    Ok(())
  }
}

#[inline]
fn clamp_u8(v: i32) -> u8 {
  v.clamp(0, u8::MAX as i32) as u8
}

/// The closed set of glyph encodings.
#[derive(Clone, Debug)]
pub enum FontKind<'a> {
  Bitmap(BwFont<'a>),
  RunLength(RleFont<'a>),
}

/// A complete font: metadata, glyph storage and an optional kerning table.
///
/// Statically compiled fonts borrow `'static` tables; fonts from [`crate::load`] borrow
/// the caller's buffer and [`crate::load_owned`] fonts own it.
#[derive(Clone, Debug)]
pub struct Font<'a> {
  pub info: FontInfo<'a>,
  pub kind: FontKind<'a>,
  pub kerning: KerningTable<'a>,
}

impl<'a> Font<'a> {
  /// Replaces the kerning table.
  pub fn with_kerning(mut self, kerning: KerningTable<'a>) -> Self {
    self.kerning = kerning;
    self
  }

  /// Bitmap glyph storage, if this is a bitmap font.
  pub fn bitmap(&self) -> Option<&BwFont<'a>> {
    match &self.kind {
      FontKind::Bitmap(bw) => Some(bw),
      FontKind::RunLength(_) => None,
    }
  }
}

impl Face for Font<'_> {
  #[inline]
  fn info(&self) -> &FontInfo<'_> {
    &self.info
  }

  fn glyph_width(&self, character: Codepoint) -> u8 {
    match &self.kind {
      FontKind::Bitmap(bw) => bw.character_width(character),
      FontKind::RunLength(rle) => rle.character_width(character),
    }
  }

  fn render_glyph<S: PixelSink + ?Sized>(
    &self,
    x0: i16,
    y0: i16,
    character: Codepoint,
    sink: &mut S,
  ) -> Result<u8, S::Error> {
    match &self.kind {
      FontKind::Bitmap(bw) => bw.render_character(x0, y0, character, sink),
      FontKind::RunLength(rle) => rle.render_character(x0, y0, character, sink),
    }
  }

  fn kerning(&self, left: Codepoint, right: Codepoint) -> i8 {
    self.kerning.get(left, right).unwrap_or(0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bwfont::{CharRange, Span};
  use alloc::vec;

  // 'A' only: 5 columns, 8 rows, row 3 fully inked.
  fn one_glyph_font(data: &'static [u8]) -> Font<'static> {
    Font {
      info: FontInfo {
        full_name: Cow::Borrowed("Test One"),
        short_name: Cow::Borrowed("one"),
        width: 5,
        height: 8,
        min_x_advance: 5,
        max_x_advance: 5,
        baseline_x: 0,
        baseline_y: 7,
        line_height: 9,
        flags: FontFlags::BW,
        fallback_character: b'A' as Codepoint,
      },
      kind: FontKind::Bitmap(BwFont {
        version: 4,
        data: Cow::Borrowed(data),
        ranges: Cow::Owned(vec![CharRange {
          first_char: 65,
          char_count: 1,
          offset_x: 0,
          offset_y: 0,
          height_bytes: 1,
          height_pixels: 8,
          width: 5,
          glyph_widths: Span::EMPTY,
          glyph_offsets: Span::EMPTY,
          glyph_data: Span::new(0, 5),
        }]),
      }),
      kerning: KerningTable::EMPTY,
    }
  }

  static ROW3: [u8; 5] = [0x08; 5];

  #[test]
  fn render_emits_one_full_alpha_run_per_inked_row() {
    let font = one_glyph_font(&ROW3);
    let mut runs = Vec::new();
    let w = font.render_character(0, 0, b'A' as Codepoint, &mut runs).unwrap();
    assert_eq!(w, 5);
    assert_eq!(runs, vec![PixelRun { x: 0, y: 3, count: 5, alpha: ALPHA_FULL }]);
    assert_eq!(font.character_width(b'A' as Codepoint), 5);
  }

  #[test]
  fn unmapped_codepoint_uses_fallback() {
    let font = one_glyph_font(&ROW3);
    assert_eq!(font.glyph_width(b'B' as Codepoint), 0);
    assert_eq!(font.character_width(b'B' as Codepoint), font.character_width(b'A' as Codepoint));
    let mut runs = Vec::new();
    let w = font.render_character(10, 20, b'B' as Codepoint, &mut runs).unwrap();
    assert_eq!(w, 5);
    assert_eq!(runs, vec![PixelRun { x: 10, y: 23, count: 5, alpha: ALPHA_FULL }]);
  }

  #[test]
  fn unmapped_fallback_is_silent_zero() {
    let mut font = one_glyph_font(&ROW3);
    font.info.fallback_character = b'Z' as Codepoint;
    let mut runs = Vec::new();
    assert_eq!(font.render_character(0, 0, b'B' as Codepoint, &mut runs).unwrap(), 0);
    assert!(runs.is_empty());
    assert_eq!(font.character_width(b'B' as Codepoint), 0);
  }

  #[test]
  fn whitespace_of_inked_row() {
    let font = one_glyph_font(&ROW3);
    let ws = font.character_whitespace(b'A' as Codepoint);
    assert_eq!(ws, Whitespace { left: 0, top: 3, right: 0, bottom: 4 });
  }

  static BLANK: [u8; 5] = [0; 5];

  #[test]
  fn whitespace_of_blank_glyph() {
    let font = one_glyph_font(&BLANK);
    let ws = font.character_whitespace(b'A' as Codepoint);
    assert_eq!(ws, Whitespace { left: 5, top: 8, right: 0, bottom: 0 });
  }

  #[test]
  fn failing_sink_aborts_render() {
    let font = one_glyph_font(&ROW3);
    let mut calls = 0;
    let mut sink = FnSink(|_run: PixelRun| -> Result<(), &str> {
      calls += 1;
      Err("display gone")
    });
    assert_eq!(font.render_character(0, 0, b'A' as Codepoint, &mut sink), Err("display gone"));
    drop(sink);
    assert_eq!(calls, 1);
  }
}
